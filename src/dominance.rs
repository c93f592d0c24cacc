//! Two-objective Pareto dominance (both objectives minimized).

/// Returns true if `a` dominates `b`: no worse on both objectives and strictly
/// better on at least one.
pub fn dominates(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 <= b.0 && a.1 <= b.1 && (a.0 < b.0 || a.1 < b.1)
}

/// Pareto flag for every point: `true` if no other point dominates it.
///
/// Exact duplicates do not dominate each other, so both copies stay flagged
/// here and are merged later by the canonicalizer.
pub fn pareto_flags(points: &[(f64, f64)]) -> Vec<bool> {
    points
        .iter()
        .enumerate()
        .map(|(i, &candidate)| {
            !points
                .iter()
                .enumerate()
                .any(|(j, &other)| i != j && dominates(other, candidate))
        })
        .collect()
}

/// Indices of the non-dominated points, in input order.
pub fn non_dominated_indices(points: &[(f64, f64)]) -> Vec<usize> {
    pareto_flags(points)
        .into_iter()
        .enumerate()
        .filter_map(|(i, is_pareto)| is_pareto.then_some(i))
        .collect()
}

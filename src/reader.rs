//! Reader for the raw per-generation dumps written by the optimizer.
//!
//! Three line grammars are accepted:
//!
//! * `f1 f2 - IDs instalados: id1 id2 ...`
//! * `f1 f2 id1 id2 ...`
//! * `f1 f2 FLAG id1 id2 ... | coverage` with `FLAG` one of `P`/`D`
//!
//! Empty lines and lines starting with `#` are ignored. A line that does not
//! yield at least the `(f1, f2)` pair is reported as unparseable and skipped
//! by the file readers.

use crate::error::{Error, Result};
use crate::solution::{ParetoFlag, Solution};
use itertools::Itertools;
use log::debug;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const INSTALLED_IDS_MARKER: &str = "- IDs instalados:";

/// One solution as it appears in a raw or annotated file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    pub f1: f64,
    pub f2: f64,
    pub facility_ids: Vec<u32>,
    /// Flag carried by annotated lines, if any
    pub flag: Option<ParetoFlag>,
    /// Coverage suffix carried by annotated lines, if any
    pub coverage: Option<f64>,
}

impl RawSolution {
    /// Objective pair `(f1, f2)`.
    pub fn objectives(&self) -> (f64, f64) {
        (self.f1, self.f2)
    }

    /// Drop the carried flag and coverage; both are recomputed downstream.
    pub fn into_solution(self) -> Solution {
        Solution::new(self.f1, self.f2, self.facility_ids)
    }

    /// Keep the carried flag and coverage, as read from an annotated file.
    /// A missing flag counts as dominated.
    pub fn into_annotated(self) -> Solution {
        Solution {
            f1: self.f1,
            f2: self.f2,
            facility_ids: self.facility_ids,
            is_pareto_optimal: self.flag == Some(ParetoFlag::P),
            coverage_percent: self.coverage,
        }
    }
}

/// Result of parsing one line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Empty line or `#` comment
    Blank,
    Solution(RawSolution),
    /// The line did not start with two numeric objectives
    Unparseable,
}

/// Parse one line of a raw generation file.
pub fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return ParsedLine::Blank;
    }

    let (body, coverage) = match trimmed.split_once('|') {
        Some((left, right)) => (
            left.trim(),
            right
                .split_whitespace()
                .next()
                .and_then(|token| token.parse::<f64>().ok()),
        ),
        None => (trimmed, None),
    };

    if let Some((objectives, ids)) = body.split_once(INSTALLED_IDS_MARKER) {
        let mut tokens = objectives.split_whitespace();
        return match parse_objectives(&mut tokens) {
            Some((f1, f2)) => ParsedLine::Solution(RawSolution {
                f1,
                f2,
                facility_ids: parse_ids(ids.split_whitespace()),
                flag: None,
                coverage,
            }),
            None => ParsedLine::Unparseable,
        };
    }

    let mut tokens = body.split_whitespace().peekable();
    let Some((f1, f2)) = parse_objectives(&mut tokens) else {
        return ParsedLine::Unparseable;
    };

    let flag = tokens.peek().and_then(|token| ParetoFlag::from_token(token));
    if flag.is_some() {
        tokens.next();
    }

    ParsedLine::Solution(RawSolution {
        f1,
        f2,
        facility_ids: parse_ids(tokens),
        flag,
        coverage,
    })
}

fn parse_objectives<'a, I: Iterator<Item = &'a str>>(tokens: &mut I) -> Option<(f64, f64)> {
    let f1 = tokens.next()?.parse::<f64>().ok()?;
    let f2 = tokens.next()?.parse::<f64>().ok()?;
    if f1.is_finite() && f2.is_finite() {
        Some((f1, f2))
    } else {
        None
    }
}

/// Non-integer tokens among the IDs are ignored.
fn parse_ids<'a, I: Iterator<Item = &'a str>>(tokens: I) -> Vec<u32> {
    tokens.filter_map(|token| token.parse::<u32>().ok()).collect()
}

/// Read all parseable solutions from a reader, in input order.
pub fn read_solutions<R: BufRead>(reader: R) -> std::io::Result<Vec<RawSolution>> {
    let mut solutions = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            ParsedLine::Solution(solution) => solutions.push(solution),
            ParsedLine::Blank => {}
            ParsedLine::Unparseable => {
                debug!("skipping unparseable line {}: {:?}", line_number + 1, line);
            }
        }
    }

    Ok(solutions)
}

/// Read one generation file. The file is never modified.
pub fn read_generation_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawSolution>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    read_solutions(BufReader::new(file)).map_err(|e| Error::io(path, e))
}

/// Extract the generation number from a file name such as `POF_x_GEN_36.dat`,
/// `x_GEN36.dat` or `x_GEN-36.txt`. Names without one sort last.
pub fn generation_number<P: AsRef<Path>>(path: P) -> u64 {
    let name = match path.as_ref().file_name() {
        Some(name) => name.to_string_lossy(),
        None => return u64::MAX,
    };

    for (start, _) in name.match_indices("GEN") {
        let rest = &name[start + 3..];
        let rest = rest
            .strip_prefix('_')
            .or_else(|| rest.strip_prefix('-'))
            .unwrap_or(rest);
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(number) = digits.parse::<u64>() {
            return number;
        }
    }

    u64::MAX
}

/// List the raw generation files `POF_<name>_GEN_*.dat` of an instance,
/// ordered by generation number.
pub fn raw_generation_files<P: AsRef<Path>>(raw_dir: P, instance_name: &str) -> Result<Vec<PathBuf>> {
    let dir = raw_dir.as_ref().join(instance_name);
    if !dir.is_dir() {
        return Err(Error::not_found(format!(
            "raw generation directory {}",
            dir.display()
        )));
    }

    let prefix = format!("POF_{}_GEN_", instance_name);
    let entries = fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) && name.ends_with(".dat") {
            files.push(entry.path());
        }
    }

    Ok(files
        .into_iter()
        .sorted_by(|a, b| {
            generation_number(a)
                .cmp(&generation_number(b))
                .then_with(|| a.cmp(b))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids_ignores_garbage() {
        let ids = parse_ids("3 x 7 -1 2.5 11".split_whitespace());
        assert_eq!(ids, vec![3, 7, 11]);
    }

    #[test]
    fn test_parse_objectives_rejects_non_finite() {
        let mut tokens = "nan 1.0".split_whitespace();
        assert_eq!(parse_objectives(&mut tokens), None);
    }
}

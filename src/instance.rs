//! Instance coordinate tables and the demand model derived from them.

use crate::error::{Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Site flag for a demand point.
pub const FLAG_DEMAND: i32 = 0;
/// Site flag for a preinstalled facility.
pub const FLAG_PREINSTALLED: i32 = 1;

/// One row of the instance table: `id x y flag probability`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub flag: i32,
    pub probability: f64,
}

impl Site {
    /// Create a new site.
    pub fn new(id: u32, x: f64, y: f64, flag: i32, probability: f64) -> Self {
        Site {
            id,
            x,
            y,
            flag,
            probability,
        }
    }

    pub fn is_demand(&self) -> bool {
        self.flag == FLAG_DEMAND
    }

    pub fn is_preinstalled(&self) -> bool {
        self.flag == FLAG_PREINSTALLED
    }

    /// Squared Euclidean distance to a point.
    pub fn squared_distance(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

/// A demand point weighted by its probability mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

/// Demand points, preinstalled facilities and the coverage radius of an
/// instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandModel {
    pub demand_points: Vec<DemandPoint>,
    pub preinstalled_facilities: Vec<(f64, f64)>,
    pub coverage_radius: f64,
}

impl DemandModel {
    /// Sum of all demand weights, the denominator of coverage percentages.
    pub fn total_weight(&self) -> f64 {
        self.demand_points.iter().map(|p| p.weight).sum()
    }
}

/// A facility-location instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub sites: Vec<Site>,
    pub coverage_radius: f64,
    coordinates: HashMap<u32, (f64, f64)>,
}

impl Instance {
    /// Create an instance from its sites.
    pub fn new(name: String, sites: Vec<Site>, coverage_radius: f64) -> Self {
        let coordinates = sites.iter().map(|s| (s.id, (s.x, s.y))).collect();

        Instance {
            name,
            sites,
            coverage_radius,
            coordinates,
        }
    }

    /// Coordinates of a site by ID.
    pub fn coordinates(&self, id: u32) -> Option<(f64, f64)> {
        self.coordinates.get(&id).copied()
    }

    /// Resolve facility IDs to coordinates. IDs missing from the table are
    /// left out.
    pub fn resolve(&self, ids: &[u32]) -> Vec<(f64, f64)> {
        ids.iter().filter_map(|&id| self.coordinates(id)).collect()
    }

    pub fn demand_count(&self) -> usize {
        self.sites.iter().filter(|s| s.is_demand()).count()
    }

    pub fn preinstalled_count(&self) -> usize {
        self.sites.iter().filter(|s| s.is_preinstalled()).count()
    }

    /// Build the demand model consumed by the coverage evaluator.
    pub fn demand_model(&self) -> DemandModel {
        DemandModel {
            demand_points: self
                .sites
                .iter()
                .filter(|s| s.is_demand())
                .map(|s| DemandPoint {
                    x: s.x,
                    y: s.y,
                    weight: s.probability,
                })
                .collect(),
            preinstalled_facilities: self
                .sites
                .iter()
                .filter(|s| s.is_preinstalled())
                .map(|s| (s.x, s.y))
                .collect(),
            coverage_radius: self.coverage_radius,
        }
    }

    /// Load an instance file.
    ///
    /// The radius comes from a `param R := <value>` declaration, or failing
    /// that from a `radius` field in `<file>.meta.json`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::not_found(format!("instance file {}", path.display())));
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let radius = match parse_radius(&text) {
            Some(radius) => radius,
            None => radius_from_meta(path)?.ok_or_else(|| {
                Error::invalid_instance(path, "no coverage radius (param R) declared")
            })?,
        };
        if !(radius.is_finite() && radius > 0.0) {
            return Err(Error::invalid_instance(
                path,
                format!("coverage radius must be positive, got {}", radius),
            ));
        }

        let sites = parse_sites(&text);
        debug!(
            "read {} sites from {} (radius {})",
            sites.len(),
            path.display(),
            radius
        );

        Ok(Instance::new(instance_name(path), sites, radius))
    }
}

/// Instance name: the file name without its extension.
pub fn instance_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Find `param R := <value>` in the instance text.
pub fn parse_radius(text: &str) -> Option<f64> {
    text.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("param")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start().strip_prefix('R')?;
        let rest = rest.trim_start().strip_prefix(":=")?;
        let value = rest.split_whitespace().next()?.trim_end_matches(';');
        value.parse::<f64>().ok()
    })
}

/// Data rows start with a digit and carry at least `id x y flag probability`.
fn parse_sites(text: &str) -> Vec<Site> {
    text.lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 {
                return None;
            }
            Some(Site::new(
                parts[0].parse().ok()?,
                parts[1].parse().ok()?,
                parts[2].parse().ok()?,
                parts[3].parse().ok()?,
                parts[4].parse().ok()?,
            ))
        })
        .collect()
}

fn radius_from_meta(instance_path: &Path) -> Result<Option<f64>> {
    let mut meta_name = instance_path.as_os_str().to_owned();
    meta_name.push(".meta.json");
    let meta_path = PathBuf::from(meta_name);
    if !meta_path.is_file() {
        return Ok(None);
    }

    let text = fs::read_to_string(&meta_path).map_err(|e| Error::io(&meta_path, e))?;
    let meta: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| Error::invalid_instance(&meta_path, e.to_string()))?;

    Ok(meta
        .get("radius")
        .or_else(|| meta.get("R"))
        .and_then(|v| v.as_f64()))
}

/// Loaded instances keyed by file name, with an explicit load/invalidate
/// lifecycle.
#[derive(Debug, Default)]
pub struct InstanceCatalog {
    instances_dir: PathBuf,
    loaded: HashMap<String, Arc<Instance>>,
}

impl InstanceCatalog {
    pub fn new<P: Into<PathBuf>>(instances_dir: P) -> Self {
        InstanceCatalog {
            instances_dir: instances_dir.into(),
            loaded: HashMap::new(),
        }
    }

    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    /// Full path of an instance file.
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.instances_dir.join(file_name)
    }

    /// Read the instance from disk, replacing any loaded copy.
    pub fn load(&mut self, file_name: &str) -> Result<Arc<Instance>> {
        let instance = Arc::new(Instance::from_file(self.path_of(file_name))?);
        info!(
            "loaded instance {} ({} demand points, {} preinstalled)",
            instance.name,
            instance.demand_count(),
            instance.preinstalled_count()
        );
        self.loaded
            .insert(file_name.to_string(), Arc::clone(&instance));
        Ok(instance)
    }

    /// Return the loaded instance, reading it on first use.
    pub fn get_or_load(&mut self, file_name: &str) -> Result<Arc<Instance>> {
        match self.loaded.get(file_name) {
            Some(instance) => Ok(Arc::clone(instance)),
            None => self.load(file_name),
        }
    }

    pub fn is_loaded(&self, file_name: &str) -> bool {
        self.loaded.contains_key(file_name)
    }

    /// Forget a loaded instance so the next access re-reads it.
    pub fn invalidate(&mut self, file_name: &str) -> bool {
        self.loaded.remove(file_name).is_some()
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
    }

    /// Instance files (`*.dat`) available in the directory, sorted by name.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.instances_dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(&self.instances_dir).map_err(|e| Error::io(&self.instances_dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.instances_dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.to_lowercase().ends_with(".dat") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

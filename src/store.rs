//! On-disk cache of processed instances.
//!
//! Per instance the cache holds one directory of front files plus the
//! hypervolume summary, and one directory of annotated-solution files:
//!
//! ```text
//! <fronts_dir>/<name>/<name>_GEN<n>.dat
//! <fronts_dir>/<name>/<name>_HV_summary.txt
//! <fronts_dir>/<name>/<name>_raw.fingerprint
//! <annotated_dir>/<name>/<name>_Ubicaciones_GEN<n>.dat
//! ```
//!
//! A recompute writes everything into staging directories first and swaps
//! them in at the end, under a per-instance lock, so readers never see a mix
//! of old and new generations.

use crate::canonical::{self, CanonicalFront};
use crate::error::{Error, Result};
use crate::reader;
use crate::reference::ReferencePoint;
use crate::solution::Precision;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Paths of one instance's cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLayout {
    pub name: String,
    pub front_dir: PathBuf,
    pub annotated_dir: PathBuf,
}

impl CacheLayout {
    pub fn new<F: AsRef<Path>, A: AsRef<Path>>(fronts_root: F, annotated_root: A, name: &str) -> Self {
        CacheLayout {
            name: name.to_string(),
            front_dir: fronts_root.as_ref().join(name),
            annotated_dir: annotated_root.as_ref().join(name),
        }
    }

    /// True when front and annotated files live in the same directory.
    pub fn is_shared(&self) -> bool {
        self.front_dir == self.annotated_dir
    }

    /// Sibling layout the next recompute is written to. A shared directory
    /// gets a single staging directory.
    pub fn staging(&self) -> Self {
        let staged = |dir: &Path, role: &str| {
            let name = format!(".{}.{}.staging", self.name, role);
            match dir.parent() {
                Some(parent) => parent.join(name),
                None => PathBuf::from(name),
            }
        };
        if self.is_shared() {
            let dir = staged(&self.front_dir, "cache");
            return CacheLayout {
                name: self.name.clone(),
                front_dir: dir.clone(),
                annotated_dir: dir,
            };
        }
        CacheLayout {
            name: self.name.clone(),
            front_dir: staged(&self.front_dir, "fronts"),
            annotated_dir: staged(&self.annotated_dir, "annotated"),
        }
    }

    pub fn summary_path(&self) -> PathBuf {
        self.front_dir.join(format!("{}_HV_summary.txt", self.name))
    }

    pub fn fingerprint_path(&self) -> PathBuf {
        self.front_dir.join(format!("{}_raw.fingerprint", self.name))
    }

    pub fn front_file(&self, generation: u64) -> PathBuf {
        self.front_dir
            .join(format!("{}_GEN{}.dat", self.name, generation))
    }

    pub fn annotated_file(&self, generation: u64) -> PathBuf {
        self.annotated_dir
            .join(format!("{}_Ubicaciones_GEN{}.dat", self.name, generation))
    }

    /// Cached annotated files, ordered by generation.
    pub fn annotated_files(&self) -> Vec<PathBuf> {
        self.list(&self.annotated_dir, &format!("{}_Ubicaciones_GEN", self.name))
    }

    /// Cached front files, ordered by generation.
    pub fn front_files(&self) -> Vec<PathBuf> {
        self.list(&self.front_dir, &format!("{}_GEN", self.name))
    }

    fn list(&self, dir: &Path, prefix: &str) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy())
                    .map_or(false, |n| n.starts_with(prefix) && n.ends_with(".dat"))
            })
            .sorted_by(|a, b| {
                reader::generation_number(a)
                    .cmp(&reader::generation_number(b))
                    .then_with(|| a.cmp(b))
            })
            .collect()
    }
}

/// Hypervolume of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationHypervolume {
    pub generation: u64,
    pub hypervolume: f64,
}

/// Content of the summary file: the reference point, then one hypervolume
/// per generation in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypervolumeSummary {
    pub reference: ReferencePoint,
    pub generations: Vec<GenerationHypervolume>,
}

impl HypervolumeSummary {
    pub fn new(reference: ReferencePoint) -> Self {
        HypervolumeSummary {
            reference,
            generations: Vec::new(),
        }
    }

    pub fn push(&mut self, generation: u64, hypervolume: f64) {
        self.generations.push(GenerationHypervolume {
            generation,
            hypervolume,
        });
    }

    pub fn hypervolumes(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.hypervolume).collect()
    }

    /// `refX refY`, then `GEN<n> <hv>` lines with four decimals, then `#`.
    pub fn render(&self) -> String {
        let mut text = format!("{}\n", self.reference);
        for g in &self.generations {
            text.push_str(&format!("GEN{} {:.4}\n", g.generation, g.hypervolume));
        }
        text.push_str("#\n");
        text
    }

    /// Parse a summary. Returns `None` without a readable reference line.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        let mut coordinates = lines.next()?.split_whitespace();
        let x = coordinates.next()?.parse().ok()?;
        let y = coordinates.next()?.parse().ok()?;
        let mut summary = HypervolumeSummary::new(ReferencePoint::new(x, y));

        for line in lines {
            let mut tokens = line.split_whitespace();
            let parsed = tokens.next().zip(tokens.next()).and_then(|(label, hv)| {
                let generation = label.strip_prefix("GEN")?.parse().ok()?;
                Some((generation, hv.parse().ok()?))
            });
            match parsed {
                Some((generation, hv)) => summary.push(generation, hv),
                None => debug!("ignoring summary line {:?}", line),
            }
        }

        Some(summary)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render()).map_err(|e| Error::io(path, e))
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text)
            .ok_or_else(|| Error::not_found(format!("reference point in {}", path.display())))
    }
}

/// Everything persisted for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceCacheEntry {
    pub summary: HypervolumeSummary,
    pub front_files: Vec<PathBuf>,
    pub annotated_files: Vec<PathBuf>,
}

/// Cache status of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheState {
    /// Nothing cached
    Absent,
    /// Partially present, or computed from different raw files
    Stale,
    /// Summary and annotated files present and current
    Fresh,
}

/// SHA-256 over the names and contents of the raw generation files, in the
/// given order.
pub fn fingerprint<P: AsRef<Path>>(files: &[P]) -> Result<String> {
    let mut hasher = Sha256::new();
    for file in files {
        let file = file.as_ref();
        let bytes = fs::read(file).map_err(|e| Error::io(file, e))?;
        if let Some(name) = file.file_name() {
            hasher.update(name.to_string_lossy().as_bytes());
        }
        hasher.update([0u8]);
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

/// One mutex per instance name.
#[derive(Debug, Default)]
pub struct InstanceLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InstanceLocks {
    /// Run `f` while holding the lock of `name`.
    pub fn with_lock<T, F: FnOnce() -> Result<T>>(&self, name: &str, f: F) -> Result<T> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| Error::Lock(name.to_string()))?;
            Arc::clone(locks.entry(name.to_string()).or_default())
        };
        let _guard = lock.lock().map_err(|_| Error::Lock(name.to_string()))?;
        f()
    }
}

/// Front and annotated file written for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationFiles {
    /// Front file in the staging directory, fed to the oracle
    pub front_file: PathBuf,
    /// Where the annotated file ends up once committed
    pub annotated_file: PathBuf,
}

/// Writes a recompute into staging directories.
#[derive(Debug)]
pub struct CacheWriter {
    target: CacheLayout,
    staging: CacheLayout,
    precision: Precision,
    written: Vec<u64>,
}

impl CacheWriter {
    /// Write the annotated and front files of one generation.
    pub fn write_generation(
        &mut self,
        generation: u64,
        front: &CanonicalFront,
    ) -> Result<GenerationFiles> {
        canonical::write_annotated_file(
            self.staging.annotated_file(generation),
            &front.annotated,
            self.precision,
        )?;
        let front_file = self.staging.front_file(generation);
        canonical::write_front_file(&front_file, &front.front, self.precision)?;
        self.written.push(generation);

        Ok(GenerationFiles {
            front_file,
            annotated_file: self.target.annotated_file(generation),
        })
    }

    /// Write the summary and swap the staging directories into place.
    pub fn commit(
        self,
        summary: &HypervolumeSummary,
        fingerprint: Option<&str>,
    ) -> Result<InstanceCacheEntry> {
        summary.write(self.staging.summary_path())?;
        if let Some(fingerprint) = fingerprint {
            let path = self.staging.fingerprint_path();
            fs::write(&path, fingerprint).map_err(|e| Error::io(&path, e))?;
        }

        let mut moves = vec![(&self.staging.front_dir, &self.target.front_dir)];
        if !self.target.is_shared() {
            moves.push((&self.staging.annotated_dir, &self.target.annotated_dir));
        }
        for (staged, target) in moves {
            remove_dir_if_exists(target)?;
            fs::rename(staged, target).map_err(|e| Error::io(target, e))?;
        }

        info!(
            "cached {} generations for {}",
            summary.generations.len(),
            self.target.name
        );

        Ok(InstanceCacheEntry {
            summary: summary.clone(),
            front_files: self
                .written
                .iter()
                .map(|&g| self.target.front_file(g))
                .collect(),
            annotated_files: self
                .written
                .iter()
                .map(|&g| self.target.annotated_file(g))
                .collect(),
        })
    }

    /// Drop the staging directories without touching the cache.
    pub fn abort(self) -> Result<()> {
        remove_dir_if_exists(&self.staging.front_dir)?;
        remove_dir_if_exists(&self.staging.annotated_dir)
    }
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!("removing {}", dir.display());
        fs::remove_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    Ok(())
}

/// The result cache. Clones share their instance locks.
#[derive(Debug, Clone)]
pub struct ResultStore {
    fronts_root: PathBuf,
    annotated_root: PathBuf,
    precision: Precision,
    locks: Arc<InstanceLocks>,
}

impl ResultStore {
    pub fn new<F: Into<PathBuf>, A: Into<PathBuf>>(
        fronts_root: F,
        annotated_root: A,
        precision: Precision,
    ) -> Self {
        ResultStore {
            fronts_root: fronts_root.into(),
            annotated_root: annotated_root.into(),
            precision,
            locks: Arc::new(InstanceLocks::default()),
        }
    }

    pub fn layout(&self, name: &str) -> CacheLayout {
        CacheLayout::new(&self.fronts_root, &self.annotated_root, name)
    }

    pub fn with_lock<T, F: FnOnce() -> Result<T>>(&self, name: &str, f: F) -> Result<T> {
        self.locks.with_lock(name, f)
    }

    /// Cache state of an instance. With `current_fingerprint` given, a cache
    /// whose stored fingerprint differs is stale; a cache without a stored
    /// fingerprint is taken as current.
    pub fn state(&self, name: &str, current_fingerprint: Option<&str>) -> CacheState {
        let layout = self.layout(name);
        let summary = layout.summary_path();
        let annotated = layout.annotated_files();

        if !layout.front_dir.exists() && !layout.annotated_dir.exists() {
            return CacheState::Absent;
        }
        if !summary.is_file() || annotated.is_empty() {
            return CacheState::Stale;
        }

        if let Some(current) = current_fingerprint {
            if let Ok(stored) = fs::read_to_string(layout.fingerprint_path()) {
                if stored.trim() != current {
                    info!("raw generation files of {} changed since caching", name);
                    return CacheState::Stale;
                }
            }
        }

        CacheState::Fresh
    }

    /// Read the cached entry of an instance.
    pub fn read(&self, name: &str) -> Result<InstanceCacheEntry> {
        let layout = self.layout(name);
        Ok(InstanceCacheEntry {
            summary: HypervolumeSummary::read(layout.summary_path())?,
            front_files: layout.front_files(),
            annotated_files: layout.annotated_files(),
        })
    }

    /// Start a recompute, clearing leftovers of an interrupted one.
    pub fn begin(&self, name: &str) -> Result<CacheWriter> {
        let target = self.layout(name);
        let staging = target.staging();

        for dir in [&staging.front_dir, &staging.annotated_dir] {
            remove_dir_if_exists(dir)?;
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }

        Ok(CacheWriter {
            target,
            staging,
            precision: self.precision,
            written: Vec::new(),
        })
    }
}

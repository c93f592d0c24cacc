//! # POF fronts
//!
//! Post-processing of the per-generation population dumps written by a
//! multi-objective evolutionary optimizer for facility placement
//! (defibrillators, cameras).
//!
//! For every generation the pipeline flags the non-dominated solutions,
//! evaluates the weighted demand coverage of each solution, merges solutions
//! sharing the same rounded objectives, and writes an annotated solutions file
//! plus a Pareto front file. The fronts of all generations are measured by a
//! hypervolume oracle against one instance-wide reference point, and the
//! results are cached on disk until a recompute is requested or the raw
//! generation files change.

pub mod canonical;
pub mod config;
pub mod coverage;
pub mod dominance;
pub mod error;
pub mod hypervolume;
pub mod instance;
pub mod optimizer;
pub mod reader;
pub mod reference;
pub mod solution;
pub mod store;
pub mod utils;

use crate::canonical::{CanonicalFront, Canonicalizer};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::hypervolume::{hypervolume_or_zero, ExternalHypervolume, HypervolumeOracle};
use crate::instance::{instance_name, DemandModel, Instance, InstanceCatalog};
use crate::optimizer::Optimizer;
use crate::reader::RawSolution;
use crate::reference::ReferencePoint;
use crate::solution::Solution;
use crate::store::{CacheState, CacheWriter, HypervolumeSummary, InstanceCacheEntry, ResultStore};
use crate::utils::SolutionStats;

use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One processed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRecord {
    pub generation_index: u64,
    /// Canonical solutions, ordered by `f1` then `f2`
    pub solutions: Vec<Solution>,
    /// Hypervolume of the Pareto-optimal subset of `solutions`
    pub hypervolume: f64,
}

/// Options of a load request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadRequest {
    /// Recompute even if the cache is fresh
    pub recompute: bool,
    /// Never recompute when nothing is cached; answer an empty result instead
    pub strict: bool,
}

/// Where a [`LoadOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeSource {
    Cached,
    Recomputed,
    /// Nothing cached and nothing computed
    Empty,
}

/// Annotated files and hypervolumes of an instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadOutcome {
    /// Annotated-solution files, in generation order
    pub files: Vec<PathBuf>,
    /// One hypervolume per generation, including empty generations
    pub hypervolumes: Vec<f64>,
    pub source: OutcomeSource,
}

impl LoadOutcome {
    pub fn empty() -> Self {
        LoadOutcome {
            files: Vec::new(),
            hypervolumes: Vec::new(),
            source: OutcomeSource::Empty,
        }
    }

    fn from_entry(entry: InstanceCacheEntry, source: OutcomeSource) -> Self {
        LoadOutcome {
            hypervolumes: entry.summary.hypervolumes(),
            files: entry.annotated_files,
            source,
        }
    }
}

/// Turns raw generation dumps into cached fronts, coverage and hypervolumes.
pub struct FrontPipeline {
    pub config: Config,
    pub catalog: InstanceCatalog,
    pub store: ResultStore,
    pub canonicalizer: Canonicalizer,
    oracle: Box<dyn HypervolumeOracle>,
}

impl FrontPipeline {
    /// Create a pipeline using the external hypervolume binary.
    pub fn new(config: Config) -> Self {
        let mut oracle = ExternalHypervolume::new(&config.hv_executable);
        oracle.timeout = config.hv_timeout;
        Self::with_oracle(config, Box::new(oracle))
    }

    /// Create a pipeline with a given hypervolume oracle.
    pub fn with_oracle(config: Config, oracle: Box<dyn HypervolumeOracle>) -> Self {
        FrontPipeline {
            catalog: InstanceCatalog::new(&config.instances_dir),
            store: ResultStore::new(&config.fronts_dir, &config.annotated_dir, config.precision),
            canonicalizer: Canonicalizer::new(config.precision),
            oracle,
            config,
        }
    }

    /// Flag, evaluate and canonicalize the solutions of one generation.
    pub fn evaluate_generation(
        &self,
        raw: Vec<RawSolution>,
        instance: &Instance,
        model: &DemandModel,
    ) -> CanonicalFront {
        let points: Vec<(f64, f64)> = raw.iter().map(RawSolution::objectives).collect();
        let flags = dominance::pareto_flags(&points);

        let solutions = raw
            .into_iter()
            .zip(flags)
            .map(|(raw, is_pareto_optimal)| {
                let mut solution = raw.into_solution();
                solution.is_pareto_optimal = is_pareto_optimal;
                solution.coverage_percent = Some(
                    coverage::evaluate_ids(&solution.facility_ids, instance, model).percent,
                );
                solution
            })
            .collect();

        self.canonicalizer.canonicalize(solutions)
    }

    /// Process one raw generation file into the cache being written.
    ///
    /// Unreadable or empty generations and oracle failures yield a zero
    /// hypervolume; only cache write errors are returned.
    pub fn process_generation(
        &self,
        raw_file: &Path,
        generation: u64,
        instance: &Instance,
        model: &DemandModel,
        reference: &ReferencePoint,
        writer: &mut CacheWriter,
    ) -> Result<GenerationRecord> {
        let raw = match reader::read_generation_file(raw_file) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("generation {}: {}", generation, e);
                Vec::new()
            }
        };

        if raw.is_empty() {
            warn!("generation {} has no solutions", generation);
            return Ok(GenerationRecord {
                generation_index: generation,
                solutions: Vec::new(),
                hypervolume: 0.0,
            });
        }

        let front = self.evaluate_generation(raw, instance, model);
        let files = writer.write_generation(generation, &front)?;
        let hypervolume =
            hypervolume_or_zero(self.oracle.as_ref(), &files.front_file, reference, generation);

        Ok(GenerationRecord {
            generation_index: generation,
            solutions: front.annotated,
            hypervolume,
        })
    }

    /// Recompute every generation of an instance and replace its cache.
    ///
    /// Fails with a not found error if the instance file, the raw directory or
    /// the raw files are missing.
    pub fn process(&mut self, instance_file: &str) -> Result<LoadOutcome> {
        let name = instance_name(instance_file);
        let cache = self.store.clone();
        cache.with_lock(&name, || {
            let raw_files = reader::raw_generation_files(&self.config.raw_dir, &name)?;
            if raw_files.is_empty() {
                return Err(Error::not_found(format!(
                    "raw generation files for {}",
                    name
                )));
            }
            let instance = self.catalog.load(instance_file)?;
            let entry = self.recompute(&name, &instance, &raw_files)?;
            Ok(LoadOutcome::from_entry(entry, OutcomeSource::Recomputed))
        })
    }

    /// Serve an instance from the cache, recomputing only when required.
    pub fn load(&mut self, instance_file: &str, request: LoadRequest) -> Result<LoadOutcome> {
        let name = instance_name(instance_file);
        let cache = self.store.clone();
        cache.with_lock(&name, || {
            let raw_files = match reader::raw_generation_files(&self.config.raw_dir, &name) {
                Ok(files) => files,
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e),
            };
            let current = if self.config.auto_invalidate && !raw_files.is_empty() {
                Some(store::fingerprint(&raw_files)?)
            } else {
                None
            };

            let state = cache.state(&name, current.as_deref());
            if !request.recompute && state == CacheState::Fresh {
                info!("serving cached results for {}", name);
                return Ok(LoadOutcome::from_entry(
                    cache.read(&name)?,
                    OutcomeSource::Cached,
                ));
            }

            if request.strict && cache.layout(&name).annotated_files().is_empty() {
                info!("strict mode: nothing cached for {}, not recomputing", name);
                return Ok(LoadOutcome::empty());
            }

            if raw_files.is_empty() {
                warn!("no raw generation files for {}", name);
                return Ok(LoadOutcome::empty());
            }

            if request.recompute {
                info!("recomputing {} as requested", name);
            } else {
                info!("cache for {} is {:?}, processing raw results", name, state);
            }

            let instance = if request.recompute {
                self.catalog.load(instance_file)?
            } else {
                self.catalog.get_or_load(instance_file)?
            };
            let entry = self.recompute(&name, &instance, &raw_files)?;
            Ok(LoadOutcome::from_entry(entry, OutcomeSource::Recomputed))
        })
    }

    /// Run the optimizer on an instance, then recompute its cache.
    pub fn run(&mut self, instance_file: &str, seed: u64, num_vars: u32) -> Result<LoadOutcome> {
        let optimizer = Optimizer::new(
            &self.config.optimizer_executable,
            &self.config.optimizer_workdir,
        );
        optimizer.run(&self.catalog.path_of(instance_file), seed, num_vars)?;
        self.process(instance_file)
    }

    /// Coverage statistics of a facility set on an instance.
    pub fn stats(&mut self, instance_file: &str, ids: &[u32]) -> Result<SolutionStats> {
        let instance = self.catalog.get_or_load(instance_file)?;
        Ok(SolutionStats::compute(&instance, ids))
    }

    fn recompute(
        &self,
        name: &str,
        instance: &Instance,
        raw_files: &[PathBuf],
    ) -> Result<InstanceCacheEntry> {
        let model = instance.demand_model();
        let reference = ReferencePoint::from_generation_files(
            raw_files,
            self.config.reference_epsilon,
            self.config.zero_reference_fallback,
        );

        let mut writer = self.store.begin(name)?;
        let mut summary = HypervolumeSummary::new(reference);

        for raw_file in raw_files {
            let generation = reader::generation_number(raw_file);
            match self.process_generation(
                raw_file,
                generation,
                instance,
                &model,
                &reference,
                &mut writer,
            ) {
                Ok(record) => summary.push(generation, record.hypervolume),
                Err(e) => {
                    writer.abort()?;
                    return Err(e);
                }
            }
        }

        let fingerprint = if self.config.auto_invalidate {
            Some(store::fingerprint(raw_files)?)
        } else {
            None
        };
        writer.commit(&summary, fingerprint.as_deref())
    }
}

//! Rewriting source units.
//!
//! ```text
//! UNIT.json ─► SourceUnit::read ─► schedule for the unit's level
//!     │
//!     ▼
//! run (fixed point) ─► UnitReport { unit, outcome, diagnostics }
//!     │
//!     ▼
//! write_unit ─► rewritten UNIT.json
//! ```
//!
//! A [`Plan`] holds the schedules of a run, computed once. Batches fan the
//! units out to a pool of scoped worker threads fed by a channel. Every unit
//! gets its own resolver and diagnostics, so workers share nothing but the
//! catalog and the plan, both read-only.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};
use polish_engine::{
    CatalogError, Diagnostics, RuleCatalog, RunOutcome, Schedule, ScheduleError,
    compute_active_schedule, run,
};
use polish_syntax::{LanguageLevel, LoadError, ScopeResolver, SourceUnit};

use crate::config::EngineConfig;

/// Errors raised while processing a unit.
#[derive(Debug, Display, Error, From)]
pub enum PipelineError {
    #[display("{_0}")]
    Catalog(#[error(source)] CatalogError),

    #[display("{_0}")]
    Schedule(#[error(source)] ScheduleError),

    #[display("{_0}")]
    Load(#[error(source)] LoadError),

    #[display("cannot encode {path}: {source}")]
    #[from(ignore)]
    Encode {
        path: String,
        source: serde_json::Error,
    },

    #[display("cannot write {path}: {source}")]
    #[from(ignore)]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[display("{first} and {second} would both be written to {path}")]
    #[from(ignore)]
    OutputCollision {
        path: String,
        first: String,
        second: String,
    },
}

/// The outcome of rewriting one unit.
#[derive(Debug)]
pub struct UnitReport {
    /// The rewritten unit.
    pub unit: SourceUnit,
    pub outcome: RunOutcome,
    pub diagnostics: Diagnostics,
}

/// A catalog plus the configuration to apply it with.
pub struct Engine {
    catalog: RuleCatalog,
    config: EngineConfig,
}

impl Engine {
    /// An engine over the built-in rule library.
    pub fn new(config: EngineConfig) -> Result<Self, PipelineError> {
        Ok(Self::with_catalog(polish_rules::catalog()?, config))
    }

    pub fn with_catalog(catalog: RuleCatalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The active schedule for a unit targeting `level`.
    pub fn schedule(&self, level: LanguageLevel) -> Result<Schedule<'_>, ScheduleError> {
        let selection = self.config.selection.clone().language_level(level);
        compute_active_schedule(&self.catalog, &selection)
    }

    /// Schedules for every language level a unit may declare.
    ///
    /// The active set only changes at the minimum levels of catalog rules, so
    /// one schedule per such threshold covers all levels. A selection that is
    /// broken at any level fails here, before any unit is read.
    pub fn plan(&self) -> Result<Plan<'_>, ScheduleError> {
        let mut thresholds: BTreeSet<LanguageLevel> = self
            .catalog
            .entries()
            .iter()
            .map(|entry| entry.descriptor.min_level)
            .collect();
        thresholds.insert(LanguageLevel(0));
        let schedules = thresholds
            .into_iter()
            .map(|level| Ok((level, self.schedule(level)?)))
            .collect::<Result<_, ScheduleError>>()?;
        Ok(Plan {
            engine: self,
            schedules,
        })
    }

    /// Rewrite `unit` to a fixed point.
    pub fn rewrite(&self, unit: SourceUnit) -> Result<UnitReport, PipelineError> {
        self.plan()?.rewrite(unit)
    }

    pub fn rewrite_file(&self, path: &Path) -> Result<UnitReport, PipelineError> {
        self.rewrite(SourceUnit::read(path)?)
    }
}

/// Precomputed schedules of an [`Engine`], shared by every unit of a run.
pub struct Plan<'e> {
    engine: &'e Engine,
    schedules: BTreeMap<LanguageLevel, Schedule<'e>>,
}

impl<'e> Plan<'e> {
    /// The schedule for units targeting `level`.
    pub fn schedule(&self, level: LanguageLevel) -> &Schedule<'e> {
        self.schedules
            .range(..=level)
            .next_back()
            .map(|(_, schedule)| schedule)
            .expect("plan always has a schedule for level 0")
    }

    /// Rewrite `unit` to a fixed point.
    pub fn rewrite(&self, mut unit: SourceUnit) -> Result<UnitReport, PipelineError> {
        let span = tracing::info_span!("unit", path = %unit.path);
        let _enter = span.enter();

        let schedule = self.schedule(unit.language_level);
        tracing::debug!(rules = schedule.len(), level = %unit.language_level, "schedule ready");
        let resolver = ScopeResolver::with_classes(unit.classes.iter().cloned());
        let mut diagnostics = Diagnostics::new();
        let outcome = run(
            &mut unit.tree,
            &resolver,
            schedule,
            self.engine.config.driver,
            &mut diagnostics,
        );
        tracing::info!(
            rewrites = outcome.rewrites,
            passes = outcome.passes,
            converged = outcome.converged,
            "unit rewritten"
        );
        Ok(UnitReport {
            unit,
            outcome,
            diagnostics,
        })
    }

    pub fn rewrite_file(&self, path: &Path) -> Result<UnitReport, PipelineError> {
        self.rewrite(SourceUnit::read(path)?)
    }

    /// Rewrite every file in `paths` on up to `jobs` threads.
    ///
    /// Results come back in the order of `paths`; one failing unit does not
    /// stop the others.
    pub fn rewrite_batch(
        &self,
        paths: &[PathBuf],
        jobs: usize,
    ) -> Vec<Result<UnitReport, PipelineError>> {
        let (work_tx, work_rx) = crossbeam_channel::unbounded::<(usize, &Path)>();
        for (index, path) in paths.iter().enumerate() {
            work_tx
                .send((index, path.as_path()))
                .expect("work queue receiver is alive");
        }
        drop(work_tx);

        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let workers = jobs.clamp(1, paths.len().max(1));
        tracing::debug!(units = paths.len(), workers, "starting batch");
        std::thread::scope(|scope| {
            for worker in 0..workers {
                let work_rx = work_rx.clone();
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    for (index, path) in work_rx {
                        tracing::trace!(worker, path = %path.display(), "picked up unit");
                        if done_tx.send((index, self.rewrite_file(path))).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(done_tx);

        let mut results: Vec<Option<Result<UnitReport, PipelineError>>> =
            paths.iter().map(|_| None).collect();
        for (index, result) in done_rx {
            results[index] = Some(result);
        }
        results.into_iter().flatten().collect()
    }
}

/// Where each of `units` is written: under `out_dir` by file name, or over
/// the input itself.
///
/// Fails when two units would land on the same file.
pub fn output_paths(
    units: &[PathBuf],
    out_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    let mut outputs = Vec::with_capacity(units.len());
    for unit in units {
        let output = match (out_dir, unit.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => unit.clone(),
        };
        if let Some(first) = claimed.insert(output.clone(), unit.as_path()) {
            return Err(PipelineError::OutputCollision {
                path: output.display().to_string(),
                first: first.display().to_string(),
                second: unit.display().to_string(),
            });
        }
        outputs.push(output);
    }
    Ok(outputs)
}

/// Write `unit` as interchange JSON to `path`.
pub fn write_unit(unit: &SourceUnit, path: &Path) -> Result<(), PipelineError> {
    let display = || path.display().to_string();
    let json = unit.to_json().map_err(|source| PipelineError::Encode {
        path: display(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| PipelineError::Write {
        path: display(),
        source,
    })
}

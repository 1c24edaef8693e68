//! polish CLI entry point.

mod cli;

use std::error::Error;

use clap::Parser;
use cli::{Cli, Command};
use polish::config::{ConfigError, EngineConfig};
use polish::pipeline::{Engine, output_paths, write_unit};
use polish::report;
use polish_syntax::printer::print_tree;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(e) = execute(cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `--log-level`, then `POLISH_LOG`, then `warn`.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_env("POLISH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Rules { all } => {
            let engine = Engine::new(EngineConfig::default())?;
            print!("{}", report::rule_table(engine.catalog(), all));
        }
        Command::Schedule { config } => {
            let engine = Engine::new(EngineConfig::load_or_default(config.as_deref())?)?;
            let schedule = engine.schedule(engine.config().selection.language_level)?;
            print!("{}", report::schedule_listing(&schedule));
        }
        Command::Rewrite {
            unit,
            config,
            out,
            print,
        } => {
            let engine = Engine::new(EngineConfig::load_or_default(config.as_deref())?)?;
            let rewritten = engine.rewrite_file(&unit)?;
            if print {
                eprint!("{}", report::unit_summary(&rewritten));
                println!("{}", print_tree(&rewritten.unit.tree));
            } else {
                write_unit(&rewritten.unit, out.as_deref().unwrap_or(unit.as_path()))?;
                print!("{}", report::unit_summary(&rewritten));
            }
        }
        Command::Batch {
            units,
            jobs,
            config,
            out_dir,
        } => {
            let engine = Engine::new(EngineConfig::load_or_default(config.as_deref())?)?;
            // Selection errors at any level surface before a unit is read.
            let plan = engine.plan()?;
            let jobs = jobs.unwrap_or_else(|| engine.config().jobs());
            if jobs == 0 {
                return Err(ConfigError::NoWorkers.into());
            }
            let outputs = output_paths(&units, out_dir.as_deref())?;
            if let Some(dir) = &out_dir {
                std::fs::create_dir_all(dir)?;
            }

            let mut failed = 0;
            let results = plan.rewrite_batch(&units, jobs);
            for ((path, output), result) in units.iter().zip(&outputs).zip(results) {
                let written = result.and_then(|rewritten| {
                    write_unit(&rewritten.unit, output)?;
                    Ok(rewritten)
                });
                match written {
                    Ok(rewritten) => print!("{}", report::unit_summary(&rewritten)),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {e}", path.display());
                    }
                }
            }
            if failed > 0 {
                return Err(format!("{failed} of {} unit(s) failed", units.len()).into());
            }
        }
    }
    Ok(())
}

//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments into run configs
//! - runs the gas or oil pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GasArgs, OilArgs, OutputArgs, PlotArgs};
use crate::domain::{
    ComparisonTable, ErrorReport, GasConfig, GasSource, OilConfig, OilInput, OilSource, OutputConfig, RateTest,
    ReservoirState, RunFile, SampleSpec,
};
use crate::error::AppError;
use crate::report::PlotBounds;

pub mod pipeline;

/// Entry point for the `ipr` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Gas(args) => handle_gas(&args),
        Command::Oil(args) => handle_oil(&args),
        Command::Plot(args) => handle_plot(&args),
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_gas(args: &GasArgs) -> Result<(), AppError> {
    let config = gas_config_from_args(args);
    let run = pipeline::run_gas(&config)?;

    println!("{}", crate::report::format::format_gas_summary(&run.dataset, &run.fits));
    if !run.row_errors.is_empty() {
        println!("Skipped rows:");
        for e in &run.row_errors {
            println!("  line {}: {}", e.line, e.message);
        }
        println!();
    }
    print_tables(&run.table, &run.errors);
    if config.output.plot {
        println!("{}", plot_run(&run.run_file, run.bounds, &config.output));
    }

    write_exports(&config.output, &run.table, &run.run_file)
}

fn handle_oil(args: &OilArgs) -> Result<(), AppError> {
    let config = oil_config_from_args(args)?;
    let run = pipeline::run_oil(&config)?;

    println!("{}", crate::report::format::format_oil_summary(&run.input, &run.fit));
    print_tables(&run.table, &run.errors);
    if config.output.plot {
        println!("{}", plot_run(&run.run_file, run.bounds, &config.output));
    }

    write_exports(&config.output, &run.table, &run.run_file)
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let run = crate::io::curve::read_run_json(&args.curves)?;
    println!("{}", crate::plot::render_run_file(&run, args.width, args.height));
    Ok(())
}

fn print_tables(table: &ComparisonTable, errors: &[ErrorReport]) {
    println!("{}", crate::report::format::format_comparison(table));
    let errors = crate::report::format::format_errors(errors);
    if !errors.is_empty() {
        println!("{errors}");
    }
}

fn plot_run(run: &RunFile, bounds: PlotBounds, output: &OutputConfig) -> String {
    crate::plot::render_ipr_plot(&run.curves, run.bubble_point, bounds, output.plot_width, output.plot_height)
}

fn write_exports(output: &OutputConfig, table: &ComparisonTable, run: &RunFile) -> Result<(), AppError> {
    if let Some(path) = &output.export_table {
        crate::io::export::write_comparison_csv(path, table)?;
        tracing::info!(path = %path.display(), "comparison table exported");
    }
    if let Some(path) = &output.export_curves {
        crate::io::curve::write_run_json(path, run)?;
        tracing::info!(path = %path.display(), "run exported");
    }
    Ok(())
}

pub fn gas_config_from_args(args: &GasArgs) -> GasConfig {
    let source = match (&args.csv, args.sample) {
        (Some(path), _) => GasSource::Csv(path.clone()),
        (None, true) => GasSource::Synthetic(SampleSpec {
            seed: args.seed,
            n_points: args.sample_points,
            c: args.sample_c,
            n: args.sample_n,
            reservoir_pressure: args.sample_pr,
            noise: args.noise,
        }),
        (None, false) => GasSource::BuiltIn,
    };
    GasConfig {
        source,
        grid_points: args.grid_points,
        baseline: args.baseline,
        mp_projection: args.mp_projection,
        output: output_config_from_args(&args.output),
    }
}

pub fn oil_config_from_args(args: &OilArgs) -> Result<OilConfig, AppError> {
    let source = match &args.csv {
        Some(path) => OilSource::Csv(path.clone()),
        None => {
            let missing = |name: &str| AppError::new(2, format!("--{name} is required without --csv"));
            let pws = args.pws.ok_or_else(|| missing("pws"))?;
            let pwf = args.pwf.ok_or_else(|| missing("pwf"))?;
            let qwf = args.qwf.ok_or_else(|| missing("qwf"))?;
            let second_test = match (args.pwf2, args.qwf2) {
                (Some(pwf), Some(rate)) => Some(RateTest { pwf, rate }),
                (None, None) => None,
                _ => return Err(AppError::new(2, "--pwf2 and --qwf2 must be given together")),
            };
            OilSource::Inline(OilInput {
                reservoir: ReservoirState { pws, pb: args.pb },
                test: RateTest { pwf, rate: qwf },
                second_test,
            })
        }
    };
    Ok(OilConfig {
        source,
        segment_points: args.segment_points,
        baseline: args.baseline,
        output: output_config_from_args(&args.output),
    })
}

fn output_config_from_args(args: &OutputArgs) -> OutputConfig {
    OutputConfig {
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_table: args.export.clone(),
        export_curves: args.export_curves.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Method;

    #[test]
    fn gas_source_selection() {
        let cli = Cli::parse_from(["ipr", "gas", "--sample", "--seed", "7", "--noise", "0"]);
        let Command::Gas(args) = cli.command else {
            panic!("expected gas command");
        };
        let config = gas_config_from_args(&args);
        match config.source {
            GasSource::Synthetic(spec) => {
                assert_eq!(spec.seed, 7);
                assert_eq!(spec.noise, 0.0);
            }
            other => panic!("unexpected source {other:?}"),
        }
        assert!(config.output.plot);
    }

    #[test]
    fn oil_inline_config() {
        let cli = Cli::parse_from(["ipr", "oil", "--pws", "3000", "--pb", "2200", "--pwf", "2600", "--qwf", "400", "--no-plot"]);
        let Command::Oil(args) = cli.command else {
            panic!("expected oil command");
        };
        let config = oil_config_from_args(&args).unwrap();
        assert_eq!(config.baseline, Method::Vogel);
        assert!(!config.output.plot);
        match config.source {
            OilSource::Inline(input) => {
                assert_eq!(input.reservoir.pb, Some(2200.0));
                assert_eq!(input.second_test, None);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }
}

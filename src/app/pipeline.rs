//! Shared run pipelines for the `gas` and `oil` commands.
//!
//! Keeping the workflow here (load -> fit -> compare -> run record) leaves `app` with
//! presentation and exports only, and lets integration tests drive a full run without
//! spawning the binary.

use chrono::Utc;
use tracing::{info, warn};

use crate::data::{builtin_gas_dataset, generate_gas_sample};
use crate::domain::{
    ComparisonTable, CurvePrediction, ErrorReport, Fluid, GasConfig, GasDataset, GasSource, Method, MethodSummary,
    OilConfig, OilInput, OilSource, RunFile,
};
use crate::error::{AppError, IprError};
use crate::fit::{GasFitOptions, GasFitSet, OilFit, OilFitOptions, Regime, fit_all_gas, fit_oil};
use crate::io::ingest::{RowError, load_gas_csv, load_oil_csv};
use crate::models::FittedModel;
use crate::plot::PLOT_MARGIN;
use crate::report::{PlotBounds, build_comparison, error_reports};

/// Everything computed by one `ipr gas` run.
#[derive(Debug, Clone)]
pub struct GasRunOutput {
    pub dataset: GasDataset,
    pub row_errors: Vec<RowError>,
    pub fits: GasFitSet,
    pub table: ComparisonTable,
    pub errors: Vec<ErrorReport>,
    pub bounds: PlotBounds,
    pub run_file: RunFile,
}

/// Everything computed by one `ipr oil` run.
#[derive(Debug, Clone)]
pub struct OilRunOutput {
    pub input: OilInput,
    pub fit: OilFit,
    pub table: ComparisonTable,
    pub errors: Vec<ErrorReport>,
    pub bounds: PlotBounds,
    pub run_file: RunFile,
}

pub fn run_gas(config: &GasConfig) -> Result<GasRunOutput, AppError> {
    let (dataset, row_errors) = match &config.source {
        GasSource::Csv(path) => {
            let ingest = load_gas_csv(path)?;
            (ingest.dataset, ingest.row_errors)
        }
        GasSource::BuiltIn => (builtin_gas_dataset()?, Vec::new()),
        GasSource::Synthetic(spec) => (generate_gas_sample(spec)?, Vec::new()),
    };
    run_gas_with_dataset(config, dataset, row_errors)
}

/// Run the gas pipeline on an already loaded dataset.
pub fn run_gas_with_dataset(
    config: &GasConfig,
    dataset: GasDataset,
    row_errors: Vec<RowError>,
) -> Result<GasRunOutput, AppError> {
    check_baseline(config.baseline, Fluid::Gas)?;

    let opts = GasFitOptions {
        grid_points: config.grid_points,
        mp_projection: config.mp_projection,
    };
    let fits = fit_all_gas(&dataset, &opts)?;

    let curves = fits.curves();
    let table = build_comparison(&curves)?;
    let errors = deviations(&table, config.baseline)?;
    let bounds = PlotBounds::from_curves(&curves, PLOT_MARGIN);
    info!(
        points = dataset.points().len(),
        fitted = fits.results.len(),
        failed = fits.failed.len(),
        "gas run complete"
    );

    let run_file = run_record(
        Fluid::Gas,
        dataset.reservoir_pressure(),
        None,
        fits.results.iter().map(|r| (&r.fitted, &r.curve)),
        &errors,
    );

    Ok(GasRunOutput {
        dataset,
        row_errors,
        fits,
        table,
        errors,
        bounds,
        run_file,
    })
}

pub fn run_oil(config: &OilConfig) -> Result<OilRunOutput, AppError> {
    let input = match &config.source {
        OilSource::Csv(path) => load_oil_csv(path)?,
        OilSource::Inline(input) => *input,
    };
    run_oil_with_input(config, input)
}

/// Run the oil pipeline on an input record.
pub fn run_oil_with_input(config: &OilConfig, input: OilInput) -> Result<OilRunOutput, AppError> {
    check_baseline(config.baseline, Fluid::Oil)?;

    let opts = OilFitOptions {
        segment_points: config.segment_points,
    };
    let fit = fit_oil(&input, &opts)?;

    let curves = fit.curves();
    let table = build_comparison(&curves)?;
    let errors = deviations(&table, config.baseline)?;
    let bounds = PlotBounds::from_curves(&curves, PLOT_MARGIN);
    info!(regime = fit.regime.label(), curves = fit.results.len(), "oil run complete");

    let bubble_point = match fit.regime {
        Regime::Undersaturated { bubble_point, .. } => Some(bubble_point),
        Regime::Saturated => None,
    };
    let run_file = run_record(
        Fluid::Oil,
        input.reservoir.pws,
        bubble_point,
        fit.results.iter().map(|r| (&r.fitted, &r.curve)),
        &errors,
    );

    Ok(OilRunOutput {
        input,
        fit,
        table,
        errors,
        bounds,
        run_file,
    })
}

fn check_baseline(baseline: Method, fluid: Fluid) -> Result<(), AppError> {
    if baseline.fluid() != fluid {
        return Err(IprError::validation(format!("{baseline} is not a {fluid:?} method and cannot be the baseline")).into());
    }
    Ok(())
}

/// Deviation reports, or none when the baseline curve was not produced.
fn deviations(table: &ComparisonTable, baseline: Method) -> Result<Vec<ErrorReport>, AppError> {
    if table.column(baseline).is_none() {
        warn!(baseline = %baseline, "baseline curve not available; skipping deviation report");
        return Ok(Vec::new());
    }
    Ok(error_reports(table, baseline)?)
}

fn run_record<'a>(
    fluid: Fluid,
    reservoir_pressure: f64,
    bubble_point: Option<f64>,
    results: impl Iterator<Item = (&'a FittedModel, &'a CurvePrediction)>,
    errors: &[ErrorReport],
) -> RunFile {
    let (methods, curves): (Vec<_>, Vec<_>) = results
        .map(|(fitted, curve)| {
            let summary = MethodSummary {
                method: fitted.method,
                equation: fitted.equation(),
                parameters: fitted.parameters(),
                aof: curve.aof(),
                bubble_point_rate: fitted.bubble_point_rate(),
            };
            (summary, curve.clone())
        })
        .unzip();

    RunFile {
        tool: "ipr".to_string(),
        generated_at: Utc::now(),
        fluid,
        reservoir_pressure,
        bubble_point,
        methods,
        curves,
        errors: errors.to_vec(),
    }
}

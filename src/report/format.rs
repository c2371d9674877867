//! Formatted terminal output.
//!
//! Formatting lives in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized (and covered by snapshot tests)

use crate::domain::{ComparisonTable, ErrorReport, GasDataset, OilInput};
use crate::fit::{GasFitSet, OilFit};
use crate::models::FittedModel;

/// Gas run summary: dataset, per-method equations and AOF, failed methods.
pub fn format_gas_summary(dataset: &GasDataset, fits: &GasFitSet) -> String {
    let mut out = String::new();
    let points = dataset.points();
    let (p_min, p_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.pwf), hi.max(p.pwf)));
    let with_mp = points.iter().filter(|p| p.pseudopressure.is_some()).count();

    out.push_str("=== ipr - Gas Deliverability ===\n");
    out.push_str(&format!(
        "Points: n={} | Pwf=[{p_min:.2}, {p_max:.2}] | Qg max={:.2} | m(p) on {with_mp}/{}\n",
        points.len(),
        dataset.max_rate(),
        points.len()
    ));
    out.push_str(&format!("Reservoir pressure (max Pwf): {:.2}\n", dataset.reservoir_pressure()));

    out.push_str("\nMethods:\n");
    for r in &fits.results {
        push_method(&mut out, &r.fitted, r.aof());
    }
    for (method, err) in &fits.failed {
        out.push_str(&format!("  (failed {method}) {err}\n"));
    }
    out
}

/// Oil run summary: inputs, regime, per-method equations, AOF and Qb.
pub fn format_oil_summary(input: &OilInput, fit: &OilFit) -> String {
    let mut out = String::new();
    let pb = input
        .reservoir
        .pb
        .map(|pb| format!("{pb:.2}"))
        .unwrap_or_else(|| "-".to_string());

    out.push_str("=== ipr - Oil IPR ===\n");
    out.push_str(&format!("Pws={:.2} | Pb={pb}\n", input.reservoir.pws));
    out.push_str(&format!("Test: Pwf={:.2} Q={:.2}\n", input.test.pwf, input.test.rate));
    if let Some(second) = input.second_test {
        out.push_str(&format!("Second test: Pwf={:.2} Q={:.2}\n", second.pwf, second.rate));
    }
    out.push_str(&format!("Regime: {}\n", fit.regime.label()));

    out.push_str("\nMethods:\n");
    for r in &fit.results {
        push_method(&mut out, &r.fitted, r.aof());
    }
    for (method, reason) in &fit.skipped {
        out.push_str(&format!("  (skipped {method}) {reason}\n"));
    }
    out
}

fn push_method(out: &mut String, fitted: &FittedModel, aof: f64) {
    out.push_str(&format!("- {}\n", fitted.method));
    out.push_str(&format!("    {}\n", fitted.equation()));
    let params: Vec<String> = fitted
        .parameters()
        .iter()
        .map(|p| format!("{}={}", p.name, fmt_num(p.value)))
        .collect();
    out.push_str(&format!("    {}\n", params.join(" ")));
    if let Some(d) = &fitted.diagnostics {
        out.push_str(&format!(
            "    R²={:.4} SSE={} (used {}, masked {})\n",
            d.r_squared,
            fmt_num(d.sse),
            d.n_used,
            d.n_masked
        ));
    }
    if let Some(qb) = fitted.bubble_point_rate() {
        out.push_str(&format!("    Qb = {qb:.2}\n"));
    }
    out.push_str(&format!("    AOF = {aof:.2}\n"));
}

/// Rates of every method on the shared grid, one row per pressure.
pub fn format_comparison(table: &ComparisonTable) -> String {
    let mut out = String::new();

    let mut header = format!("{:>10}", "Pwf");
    let mut rule = format!("{:->10}", "");
    for c in &table.columns {
        header.push_str(&format!(" {:>14}", c.method.column_label()));
        rule.push_str(&format!(" {:->14}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for (i, p) in table.pressures.iter().enumerate() {
        let mut row = format!("{p:>10.2}");
        for c in &table.columns {
            row.push_str(&format!(" {:>14.2}", c.rates[i]));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

/// Deviation of each method against the baseline.
pub fn format_errors(reports: &[ErrorReport]) -> String {
    let Some(first) = reports.first() else {
        return String::new();
    };
    let mut out = format!("Deviation vs {} (mean absolute %):\n", first.baseline);
    for r in reports {
        out.push_str(&format!(
            "  {:<28} {:>9.2}%  (n={})\n",
            r.method.display_name(),
            r.mean_absolute_percent_error,
            r.points_used
        ));
    }
    out
}

fn fmt_num(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e6).contains(&a) {
        format!("{v:.4e}")
    } else {
        format!("{v:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComparisonColumn, Method, RateTest, ReservoirState};
    use crate::fit::{OilFitOptions, fit_oil};

    #[test]
    fn comparison_golden_snapshot() {
        let table = ComparisonTable {
            pressures: vec![2000.0, 1000.0, 0.0],
            columns: vec![
                ComparisonColumn { method: Method::Vogel, rates: vec![0.0, 525.0, 750.0] },
                ComparisonColumn { method: Method::ConstantJ, rates: vec![0.0, 600.0, 1200.0] },
            ],
        };
        let expected = concat!(
            "       Pwf          vogel     constant_j\n",
            "---------- -------------- --------------\n",
            "   2000.00           0.00           0.00\n",
            "   1000.00         525.00         600.00\n",
            "      0.00         750.00        1200.00\n",
        );
        assert_eq!(format_comparison(&table), expected);
    }

    #[test]
    fn errors_table_names_baseline() {
        let reports = vec![ErrorReport {
            method: Method::ConstantJ,
            baseline: Method::Vogel,
            mean_absolute_percent_error: 12.346,
            points_used: 9,
        }];
        let txt = format_errors(&reports);
        assert_eq!(
            txt,
            "Deviation vs Vogel (mean absolute %):\n  Constant-J                       12.35%  (n=9)\n"
        );
        assert!(format_errors(&[]).is_empty());
    }

    #[test]
    fn oil_summary_lists_regime_and_skipped_methods() {
        let input = OilInput {
            reservoir: ReservoirState { pws: 2000.0, pb: None },
            test: RateTest { pwf: 1500.0, rate: 300.0 },
            second_test: None,
        };
        let fit = fit_oil(&input, &OilFitOptions::default()).unwrap();
        let txt = format_oil_summary(&input, &fit);
        assert!(txt.contains("Pb=-"));
        assert!(txt.contains("Regime: saturated"));
        assert!(txt.contains("AOF = 750.00"));
        assert!(txt.contains("AOF = 1200.00"));
        assert!(txt.contains("(skipped Fetkovich)"));
    }

    #[test]
    fn number_format_switches_to_scientific() {
        assert_eq!(fmt_num(0.5), "0.5000");
        assert_eq!(fmt_num(0.0), "0.0000");
        assert_eq!(fmt_num(1.5e-6), "1.5000e-6");
        assert_eq!(fmt_num(6.0e8), "6.0000e8");
    }
}

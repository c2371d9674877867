//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, rate on the x axis and flowing pressure on the y axis
//! (reservoir pressure at the top, AOF on the bottom row). Deterministic output, so it is
//! covered by golden tests.
//!
//! Plot elements:
//! - one glyph per method, drawn as a connected line
//! - bubble point: a `.` row (oil, undersaturated)

use crate::domain::{CurvePrediction, Method, RunFile};
use crate::report::PlotBounds;

const BUBBLE: char = '.';

/// Margin used when a plot computes its own bounds.
pub const PLOT_MARGIN: f64 = 0.05;

pub fn glyph(method: Method) -> char {
    match method {
        Method::Backpressure => 'b',
        Method::LitPressureSquared => '2',
        Method::LitPressureApprox => 'p',
        Method::LitPseudopressure => 'm',
        Method::Vogel => 'v',
        Method::ConstantJ => 'j',
        Method::Fetkovich => 'f',
    }
}

/// Render all curves into one plot.
pub fn render_ipr_plot(
    curves: &[CurvePrediction],
    bubble_point: Option<f64>,
    bounds: PlotBounds,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let mut grid = vec![vec![' '; width]; height];

    if let Some(pb) = bubble_point.filter(|pb| pb.is_finite() && *pb > 0.0) {
        let row = map_y(pb, bounds.pressure_max, height);
        grid[row].iter_mut().for_each(|c| *c = BUBBLE);
    }

    for c in curves {
        draw_curve(&mut grid, c, glyph(c.method), bounds);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: rate=[0.00, {:.2}] | Pwf=[0.00, {:.2}]\n",
        bounds.rate_max, bounds.pressure_max
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let mut legend: Vec<String> = curves
        .iter()
        .map(|c| format!("{}={}", glyph(c.method), c.method))
        .collect();
    if let Some(pb) = bubble_point {
        legend.push(format!("{BUBBLE}=Pb ({pb:.2})"));
    }
    out.push_str(&format!("Legend: {}\n", legend.join("  ")));
    out
}

/// Render a saved run file, computing bounds from its curves.
pub fn render_run_file(run: &RunFile, width: usize, height: usize) -> String {
    let bounds = PlotBounds::from_curves(&run.curves, PLOT_MARGIN);
    render_ipr_plot(&run.curves, run.bubble_point, bounds, width, height)
}

fn map_x(rate: f64, rate_max: f64, width: usize) -> usize {
    let u = (rate / rate_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(pressure: f64, pressure_max: f64, height: usize) -> usize {
    let u = (pressure / pressure_max).clamp(0.0, 1.0);
    // max pressure -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &CurvePrediction, ch: char, bounds: PlotBounds) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for p in &curve.points {
        let x = map_x(p.rate, bounds.rate_max, width);
        let y = map_y(p.pressure, bounds.pressure_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => plot_cell(grid, x as isize, y as isize, ch),
        }
        prev = Some((x, y));
    }
}

/// Background cells (blank or the bubble-point row) can be overwritten; other curves cannot.
fn plot_cell(grid: &mut [Vec<char>], x: isize, y: isize, ch: char) {
    if y < 0 || x < 0 {
        return;
    }
    let Some(cell) = grid.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) else {
        return;
    };
    if *cell == ' ' || *cell == BUBBLE {
        *cell = ch;
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot_cell(grid, x0, y0, ch);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurvePoint;

    fn straight_line() -> CurvePrediction {
        CurvePrediction::new(
            Method::ConstantJ,
            vec![
                CurvePoint { pressure: 10.0, rate: 0.0 },
                CurvePoint { pressure: 0.0, rate: 10.0 },
            ],
        )
        .unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let curve = straight_line();
        let bounds = PlotBounds::from_curves(std::slice::from_ref(&curve), 0.0);
        let txt = render_ipr_plot(&[curve], Some(5.0), bounds, 10, 5);
        let expected = concat!(
            "Plot: rate=[0.00, 10.00] | Pwf=[0.00, 10.00]\n",
            "jj\n",
            "  jj\n",
            "....jj....\n",
            "      jj\n",
            "        jj\n",
            "Legend: j=Constant-J  .=Pb (5.00)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn later_curves_do_not_overwrite_earlier_ones() {
        let a = straight_line();
        let mut b = straight_line();
        b.method = Method::Vogel;
        let bounds = PlotBounds::from_curves(std::slice::from_ref(&a), 0.0);
        let txt = render_ipr_plot(&[a, b], None, bounds, 10, 5);
        assert!(!txt.lines().nth(1).unwrap_or("").contains('v'));
        assert!(txt.ends_with("Legend: j=Constant-J  v=Vogel\n"));
    }
}

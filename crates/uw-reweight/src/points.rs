//! Corrected-yield point tables.
//!
//! Each measurement bin is stored as a small markdown table: a header row, a
//! separator row and one data row, e.g.
//!
//! ```text
//! | ptmin | ptmax | ymin | ymax | correctedYield | correctedYieldError |
//! |-------|-------|------|------|----------------|---------------------|
//! | 2     | 5     | -2   | -1   | 1520.3         | 88.1                |
//! ```
//!
//! Column names are matched case-insensitively and may appear in any order;
//! extra columns are ignored.

use std::path::Path;

use uw_core::{Error, GraphPoint, Point, Result};

fn cells(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t')) && line.contains('-')
}

/// Parse one point from markdown table text.
pub fn parse_point_table(text: &str) -> Result<Point> {
    let mut rows = text.lines().map(str::trim).filter(|l| l.starts_with('|'));
    let header = rows.next().ok_or_else(|| Error::Validation("no table header row".into()))?;
    match rows.next() {
        Some(sep) if is_separator(sep) => {}
        _ => return Err(Error::Validation("missing table separator row".into())),
    }
    let data = rows.next().ok_or_else(|| Error::Validation("no table data row".into()))?;

    let names: Vec<String> = cells(header).iter().map(|c| c.to_ascii_lowercase()).collect();
    let values = cells(data);
    if values.len() != names.len() {
        return Err(Error::Validation(format!(
            "data row has {} cells, header has {}",
            values.len(),
            names.len()
        )));
    }

    let column = |name: &str| -> Result<Option<f64>> {
        let Some(i) = names.iter().position(|n| n == name) else {
            return Ok(None);
        };
        values[i].parse::<f64>().map(Some).map_err(|_| {
            Error::Validation(format!("column '{name}': cannot parse '{}' as a number", values[i]))
        })
    };
    let required = |name: &str| -> Result<f64> {
        column(name)?.ok_or_else(|| Error::Validation(format!("missing column '{name}'")))
    };

    Ok(Point {
        ymin: required("ymin")?,
        ymax: required("ymax")?,
        corrected_yield: required("correctedyield")?,
        corrected_yield_error: required("correctedyielderror")?,
        ptmin: column("ptmin")?,
        ptmax: column("ptmax")?,
    })
}

/// Read one point table from disk.
pub fn read_point(path: &Path) -> Result<Point> {
    let text = std::fs::read_to_string(path)?;
    parse_point_table(&text).map_err(|e| match e {
        Error::Validation(msg) => Error::Validation(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Read point tables in order.
pub fn read_points<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Point>> {
    paths.iter().map(|p| read_point(p.as_ref())).collect()
}

/// Count points whose recorded pt window differs from `[ptmin, ptmax]`,
/// warning for each. Points without a recorded window are accepted.
pub fn check_pt_window(points: &[Point], ptmin: f64, ptmax: f64) -> usize {
    let mut mismatches = 0;
    for (i, p) in points.iter().enumerate() {
        let lo_ok = p.ptmin.is_none_or(|v| v == ptmin);
        let hi_ok = p.ptmax.is_none_or(|v| v == ptmax);
        if !(lo_ok && hi_ok) {
            tracing::warn!(
                index = i,
                ptmin = ?p.ptmin,
                ptmax = ?p.ptmax,
                expected_min = ptmin,
                expected_max = ptmax,
                "point table pt window does not match"
            );
            mismatches += 1;
        }
    }
    mismatches
}

/// Spectrum graph: x at bin center, x error half the bin width.
pub fn to_graph(points: &[Point]) -> Vec<GraphPoint> {
    points.iter().copied().map(GraphPoint::from).collect()
}

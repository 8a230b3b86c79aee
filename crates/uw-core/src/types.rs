//! Measured-spectrum data types

use serde::{Deserialize, Serialize};

/// One rapidity bin of a measured spectrum, as stored in a corrected-yield table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Lower rapidity edge.
    pub ymin: f64,
    /// Upper rapidity edge.
    pub ymax: f64,
    /// Efficiency-corrected yield.
    pub corrected_yield: f64,
    /// Uncertainty on the corrected yield.
    pub corrected_yield_error: f64,
    /// Lower transverse-momentum edge of the measurement, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptmin: Option<f64>,
    /// Upper transverse-momentum edge of the measurement, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptmax: Option<f64>,
}

impl Point {
    /// Create a point without a recorded pt window.
    pub fn new(ymin: f64, ymax: f64, corrected_yield: f64, corrected_yield_error: f64) -> Self {
        Self { ymin, ymax, corrected_yield, corrected_yield_error, ptmin: None, ptmax: None }
    }

    /// Bin center.
    pub fn y_center(&self) -> f64 {
        (self.ymax + self.ymin) / 2.0
    }

    /// Half bin width.
    pub fn y_half_width(&self) -> f64 {
        (self.ymax - self.ymin) / 2.0
    }
}

/// A point with symmetric errors on both coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphPoint {
    /// x value
    pub x: f64,
    /// y value
    pub y: f64,
    /// x error
    pub x_err: f64,
    /// y error
    pub y_err: f64,
}

impl GraphPoint {
    /// Create a graph point.
    pub fn new(x: f64, y: f64, x_err: f64, y_err: f64) -> Self {
        Self { x, y, x_err, y_err }
    }
}

impl From<Point> for GraphPoint {
    fn from(p: Point) -> Self {
        Self {
            x: p.y_center(),
            y: p.corrected_yield,
            x_err: p.y_half_width(),
            y_err: p.corrected_yield_error,
        }
    }
}

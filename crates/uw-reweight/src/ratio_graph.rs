//! Ratio of two mirrored 1-D spectra.

use uw_core::{Error, GraphPoint, Result};

/// Point-by-point ratio `numerator / denominator` of two spectra measured at
/// mirrored x positions.
///
/// Points are paired by index. A pair is skipped when `x1 != -x2` or when the
/// denominator value is exactly zero, so the output may be shorter than the
/// inputs. The output x is the numerator's, the x error is the mean of both.
pub fn mirror_ratio(
    numerator: &[GraphPoint],
    denominator: &[GraphPoint],
) -> Result<Vec<GraphPoint>> {
    if numerator.len() != denominator.len() {
        return Err(Error::shape_mismatch(
            format!("{} points", numerator.len()),
            format!("{} points", denominator.len()),
        ));
    }

    let mut out = Vec::with_capacity(numerator.len());
    for (i, (p1, p2)) in numerator.iter().zip(denominator).enumerate() {
        if p1.x != -p2.x {
            tracing::warn!(index = i, x1 = p1.x, x2 = p2.x, "points are not mirrored, skipped");
            continue;
        }
        if p2.y == 0.0 {
            tracing::warn!(index = i, x = p1.x, "zero denominator, point skipped");
            continue;
        }
        let ratio = p1.y / p2.y;
        // |r| * sqrt((e1/y1)^2 + (e2/y2)^2), finite at y1 == 0
        let err = p1.y_err.hypot(ratio * p2.y_err) / p2.y.abs();
        out.push(GraphPoint::new(p1.x, ratio, 0.5 * (p1.x_err + p2.x_err), err));
    }
    Ok(out)
}

//! Human-readable calibration report.

use std::fmt;

use crate::CalibrationResult;

/// Render a coefficient vector the way numpy prints a float array with
/// `precision=6, suppress=True`: decimal points aligned, trailing zeros
/// trimmed, e.g. `[-0.167291  0.543998  0.        0.        0.      ]`.
pub fn format_coefficients(values: &[f64]) -> String {
    let parts: Vec<(String, String)> = values
        .iter()
        .map(|v| {
            let s = format!("{:.6}", v);
            let (int, frac) = s.split_once('.').unwrap_or((s.as_str(), ""));
            (int.to_string(), frac.trim_end_matches('0').to_string())
        })
        .collect();
    let int_w = parts.iter().map(|(i, _)| i.len()).max().unwrap_or(0);
    let frac_w = parts.iter().map(|(_, f)| f.len()).max().unwrap_or(0);
    let cells: Vec<String> = parts
        .iter()
        .map(|(int, frac)| format!("{int:>int_w$}.{frac:<frac_w$}"))
        .collect();
    format!("[{}]", cells.join(" "))
}

impl fmt::Display for CalibrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let k = &self.intrinsics;
        writeln!(f, "=== Camera Intrinsic Parameters ===")?;
        writeln!(f, "fx: {:.4}, fy: {:.4}", k.fx(), k.fy())?;
        writeln!(f, "cx: {:.4}, cy: {:.4}", k.cx(), k.cy())?;
        writeln!(
            f,
            "Distortion Coefficients: {}",
            format_coefficients(&self.distortion.as_array())
        )?;
        write!(f, "Reprojection Error (RMSE): {:.4}", self.rmse)
    }
}

//! Link colour evaluation.

use std::collections::BTreeMap;

use crate::error::ExecuteError;
use crate::spec::{ColorSpec, EdgeSpec};

pub(crate) const FALLBACK_COLOR: &str = "#cccccc";

/// Computes the colour of one link from its edge and aggregated data.
pub fn link_color(
    spec: &ColorSpec,
    edge: &EdgeSpec,
    data: &BTreeMap<String, f64>,
) -> Result<String, ExecuteError> {
    match spec {
        ColorSpec::Categorical {
            attr,
            lookup,
            default,
        } => {
            let value = match attr.as_str() {
                "type" => Some(edge.kind.clone()),
                "source" => edge.source.clone(),
                "target" => edge.target.clone(),
                "time" => Some(edge.time.clone()),
                other => data.get(other).map(format_number),
            };
            Ok(value
                .and_then(|v| lookup.get(&v))
                .cloned()
                .unwrap_or_else(|| default.clone()))
        }
        ColorSpec::Quantitative {
            attr,
            intensity,
            domain,
            palette,
        } => {
            let mut value = data.get(attr).copied().unwrap_or(0.0);

            if let Some(column) = intensity {
                let divisor = data.get(column).copied().unwrap_or(1.0);
                if divisor != 0.0 {
                    value /= divisor;
                }
            }

            let (low, high) = *domain;
            let normed = if high != low {
                (value - low) / (high - low)
            } else {
                0.5
            };
            let normed = normed.clamp(0.0, 1.0);

            interpolate(palette, normed)
        }
    }
}

/// Linear interpolation between adjacent palette anchors.
///
/// Channels are truncated, not rounded, so the result is bit-exact across
/// implementations.
fn interpolate(palette: &[String], t: f64) -> Result<String, ExecuteError> {
    if palette.is_empty() {
        return Ok(FALLBACK_COLOR.to_string());
    }

    let position = t * (palette.len() - 1) as f64;
    let low = position.floor() as usize;
    let high = (low + 1).min(palette.len() - 1);

    if low == high {
        return Ok(palette[low].clone());
    }

    let fraction = position - low as f64;
    let (r0, g0, b0) = hex_to_rgb(&palette[low])?;
    let (r1, g1, b1) = hex_to_rgb(&palette[high])?;

    let channel = |a: u8, b: u8| -> u8 { (a as f64 + fraction * (b as f64 - a as f64)).floor() as u8 };

    Ok(format!(
        "#{:02x}{:02x}{:02x}",
        channel(r0, r1),
        channel(g0, g1),
        channel(b0, b1)
    ))
}

fn hex_to_rgb(color: &str) -> Result<(u8, u8, u8), ExecuteError> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 {
        return Err(ExecuteError::InvalidColor(color.to_string()));
    }
    let parse = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| ExecuteError::InvalidColor(color.to_string()))
    };
    Ok((parse(0..2)?, parse(2..4)?, parse(4..6)?))
}

fn format_number(value: &f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", *value as i64)
    } else {
        value.to_string()
    }
}

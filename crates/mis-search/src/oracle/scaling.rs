//! Conversion of real-valued dimensions to an integer grid.

use super::{OracleFailure, SolveRequest};
use crate::model::Position;

/// At most six decimal places are honoured.
const MAX_DECIMAL_PLACES: u32 = 6;

/// Number of digits after the decimal point in the shortest representation.
fn decimal_places(value: f64) -> u32 {
    let text = format!("{}", value);
    match text.split_once('.') {
        Some((_, fraction)) => fraction.len() as u32,
        None => 0,
    }
}

/// `10^p` where `p` is the largest number of decimal places among `values`.
pub(crate) fn scale_factor(values: impl IntoIterator<Item = f64>) -> i64 {
    let places = values
        .into_iter()
        .map(decimal_places)
        .max()
        .unwrap_or(0)
        .min(MAX_DECIMAL_PLACES);
    10i64.pow(places)
}

/// A request expressed in integer units.
#[derive(Debug, Clone)]
pub(crate) struct ScaledProblem {
    pub scale: i64,
    pub length: i64,
    pub width: i64,
    /// (width, height) per item, in request order.
    pub items: Vec<(i64, i64)>,
}

impl ScaledProblem {
    pub fn from_request(request: &SolveRequest<'_>) -> Result<Self, OracleFailure> {
        let values = [request.length, request.width]
            .into_iter()
            .chain(request.items.iter().flat_map(|d| [d.width, d.height]));
        if values.clone().any(|v| !v.is_finite() || v < 0.0) {
            return Err(OracleFailure::Fault("dimensions must be finite and non-negative".into()));
        }

        let scale = scale_factor(values);
        let to_int = |v: f64| (v * scale as f64).round() as i64;

        Ok(Self {
            scale,
            length: to_int(request.length),
            width: to_int(request.width),
            items: request.items.iter().map(|d| (to_int(d.width), to_int(d.height))).collect(),
        })
    }

    pub fn to_position(&self, x: i64, y: i64) -> Position {
        let scale = self.scale as f64;
        Position {
            x: x as f64 / scale,
            y: y as f64 / scale,
        }
    }

    /// Orientations an item may take: as given, plus rotated if permitted
    /// and the item is not square.
    pub fn orientations(&self, index: usize, rotation: bool) -> Vec<(i64, i64)> {
        let (w, h) = self.items[index];
        let mut out = Vec::with_capacity(2);
        if w <= self.length && h <= self.width {
            out.push((w, h));
        }
        if rotation && w != h && h <= self.length && w <= self.width {
            out.push((h, w));
        }
        out
    }

    /// Necessary conditions: total area fits and every item fits somehow.
    pub fn trivially_infeasible(&self, rotation: bool) -> bool {
        let area: i128 = self.items.iter().map(|&(w, h)| w as i128 * h as i128).sum();
        if area > self.length as i128 * self.width as i128 {
            return true;
        }
        (0..self.items.len()).any(|i| self.orientations(i, rotation).is_empty())
    }
}

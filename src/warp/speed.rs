//! Warp factor -> speed lookup
//!
//! Speeds come from a sparse tuning table with linear interpolation between
//! the two bracketing breakpoints. The breakpoints are gameplay tuning and
//! must not be replaced with a fitted curve.

use serde::Serialize;

/// Factor -> multiple of light speed
pub const DEFAULT_SPEED_TABLE: [[f32; 2]; 11] = [
    [1.0, 1.0],
    [2.0, 10.0],
    [3.0, 39.0],
    [4.0, 102.0],
    [5.0, 214.0],
    [6.0, 392.0],
    [7.0, 656.0],
    [8.0, 1024.0],
    [9.0, 1516.0],
    [9.9, 3053.0],
    [9.99, 7912.0],
];

#[derive(Debug, Clone, Serialize)]
pub struct WarpSpeedTable {
    entries: Vec<(f32, f32)>,
}

impl Default for WarpSpeedTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_SPEED_TABLE.iter().map(|[f, c]| (*f, *c)).collect(),
        }
    }
}

impl WarpSpeedTable {
    /// Build from `[factor, multiple]` rows; factors must be strictly increasing
    pub fn from_entries(rows: &[[f32; 2]]) -> Result<Self, String> {
        if rows.len() < 2 {
            return Err("warp speed table needs at least two entries".into());
        }
        for pair in rows.windows(2) {
            let [f0, c0] = pair[0];
            let [f1, c1] = pair[1];
            if f1 <= f0 {
                return Err(format!(
                    "warp speed table factors must increase ({} then {})",
                    f0, f1
                ));
            }
            if c1 < c0 {
                return Err(format!(
                    "warp speed must not drop between factor {} and {}",
                    f0, f1
                ));
            }
        }
        if rows.iter().any(|[f, c]| !f.is_finite() || !c.is_finite() || *c <= 0.0) {
            return Err("warp speed table values must be finite and positive".into());
        }
        Ok(Self {
            entries: rows.iter().map(|[f, c]| (*f, *c)).collect(),
        })
    }

    pub fn entries(&self) -> &[(f32, f32)] {
        &self.entries
    }

    /// Multiple of light speed at `factor`, clamped to the table's ends
    pub fn multiple_of_c(&self, factor: f32) -> f32 {
        let first = self.entries[0];
        let last = self.entries[self.entries.len() - 1];
        if factor <= first.0 {
            return first.1;
        }
        if factor >= last.0 {
            return last.1;
        }

        // First entry strictly above `factor`; the one before brackets from below
        let upper = self.entries.partition_point(|(f, _)| *f <= factor);
        let (f0, c0) = self.entries[upper - 1];
        let (f1, c1) = self.entries[upper];
        let t = (factor - f0) / (f1 - f0);
        c0 + (c1 - c0) * t
    }
}

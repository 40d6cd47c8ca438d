//! The validated allocator every power write funnels through

use serde::Serialize;

use super::{PowerChannel, PowerDistribution, PowerError, PowerPreset};

/// Owner of the live power table
#[derive(Debug, Clone, Default, Serialize)]
pub struct PowerSystem {
    distribution: PowerDistribution,
}

impl PowerSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distribution(distribution: PowerDistribution) -> Result<Self, PowerError> {
        distribution.validate()?;
        Ok(Self { distribution })
    }

    pub fn distribution(&self) -> &PowerDistribution {
        &self.distribution
    }

    pub fn get(&self, channel: PowerChannel) -> f32 {
        self.distribution.get(channel)
    }

    /// Replace the whole table; nothing changes unless the new table is valid
    pub fn set_distribution(&mut self, distribution: PowerDistribution) -> Result<(), PowerError> {
        distribution.validate()?;
        self.distribution = distribution;
        Ok(())
    }

    /// Move `delta` points into `channel`, taking the inverse evenly from the other three.
    ///
    /// All-or-nothing: if any channel would leave [0, 100] the table is left
    /// untouched and the error names the first channel that broke the bounds.
    pub fn modify(&mut self, channel: PowerChannel, delta: f32) -> Result<(), PowerError> {
        let next = Self::modified(&self.distribution, channel, delta)?;
        self.distribution = next;
        Ok(())
    }

    /// Compute the table `modify` would produce without committing it
    pub fn modified(
        base: &PowerDistribution,
        channel: PowerChannel,
        delta: f32,
    ) -> Result<PowerDistribution, PowerError> {
        if !delta.is_finite() {
            return Err(PowerError::NotFinite);
        }

        let share = delta / 3.0;
        let mut next = *base;
        next.set(channel, base.get(channel) + delta);
        for other in channel.others() {
            next.set(other, base.get(other) - share);
        }

        // The changed channel is reported first, then the donors in table order
        let order = std::iter::once(channel).chain(channel.others());
        for ch in order {
            let value = next.get(ch);
            if value < -1e-4 || value > 100.0 + 1e-4 {
                return Err(PowerError::OutOfBounds { channel: ch, value });
            }
            next.set(ch, value.clamp(0.0, 100.0));
        }

        next.validate()?;
        Ok(next)
    }

    pub fn apply_preset(&mut self, preset: PowerPreset) {
        self.distribution = preset.distribution();
    }

    /// Apply a preset by name
    pub fn apply_preset_named(&mut self, name: &str) -> Result<PowerPreset, PowerError> {
        let preset: PowerPreset = name.parse()?;
        self.apply_preset(preset);
        Ok(preset)
    }
}

//! Power allocation
//!
//! A zero-sum table of four channels that always sums to 100%. Every
//! mutation path validates the whole table before committing it, so no
//! sequence of public calls can leave an invalid allocation behind.

pub mod allocator;
pub mod distribution;
pub mod preset;

pub use allocator::PowerSystem;
pub use distribution::{PowerChannel, PowerDistribution, SUM_TOLERANCE};
pub use preset::PowerPreset;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PowerError {
    #[error("unknown power channel '{0}'")]
    UnknownChannel(String),

    #[error("distribution is missing the {0} channel")]
    MissingChannel(PowerChannel),

    #[error("{channel} set to {value:.1}%, must be within 0-100%")]
    OutOfRange { channel: PowerChannel, value: f32 },

    #[error("channels sum to {sum:.1}%, must total 100%")]
    BadSum { sum: f32 },

    #[error("redistribution would push {channel} to {value:.1}%")]
    OutOfBounds { channel: PowerChannel, value: f32 },

    #[error("unknown power preset '{0}' (expected balanced, combat, evasive or science)")]
    UnknownPreset(String),

    #[error("power values must be finite numbers")]
    NotFinite,
}

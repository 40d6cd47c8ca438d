//! Warp propulsion
//!
//! Impulse -> Charging -> AtWarp -> Impulse, with a cancel path from
//! Charging straight back to Impulse. Engagement is gated by a proximity
//! check that a rapid-keystroke override can bypass exactly once.

pub mod drive;
pub mod safety;
pub mod speed;

pub use drive::{DisengageOutcome, WarpDrive, WarpMode, WarpState};
pub use safety::SafetyOverride;
pub use speed::WarpSpeedTable;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WarpError {
    #[error("Warp drive is already charging")]
    AlreadyCharging,

    #[error("Already at warp")]
    AlreadyAtWarp,

    #[error(
        "Warp engagement blocked: {body} is {distance:.0} units away, need {remaining:.0} more for safe clearance"
    )]
    Blocked {
        body: String,
        distance: f32,
        remaining: f32,
    },

    #[error("Warp factor {factor} out of range (1 - {max})")]
    InvalidFactor { factor: f32, max: f32 },

    #[error("Warp drive is not charging")]
    NotCharging,

    #[error("Not at warp")]
    NotAtWarp,
}

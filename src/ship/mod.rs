//! The ship: coordinator, shared context, and the world it flies through

pub mod body;
pub mod chart;
pub mod context;
pub mod coordinator;
pub mod events;
pub mod subsystem;

pub use body::ShipBody;
pub use chart::{BodyClass, CelestialBody, StarChart};
pub use context::ShipContext;
pub use coordinator::StarshipCore;
pub use events::{EventLog, ShipEvent};
pub use subsystem::Subsystem;

pub mod config;
pub mod error;
pub mod types;

pub use config::ShipConfig;
pub use error::{BridgeError, Result};
pub use types::{AlertLevel, Department};

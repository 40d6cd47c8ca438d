//! Command pipeline
//!
//! Wire message -> routing + normalisation -> typed order -> department:
//! BridgeCommand -> Route -> ShipOrder -> Subsystem::execute -> CommandResult

pub mod message;
pub mod normalize;
pub mod order;
pub mod result;

pub use message::BridgeCommand;
pub use normalize::{canonical_intent, normalize_target, resolve_route, Route};
pub use order::{CoreOrder, EngineeringOrder, HelmOrder, OpsOrder, ShipOrder, TacticalOrder};
pub use result::{CommandResult, StatusMap};

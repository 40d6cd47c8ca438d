//! The contract every department implements

use std::any::Any;

use crate::command::{CommandResult, ShipOrder, StatusMap};
use crate::core::error::Result;
use crate::core::types::{AlertLevel, Department};
use crate::power::PowerDistribution;

use super::context::ShipContext;

/// One department's state machine.
///
/// Every call receives the shared [`ShipContext`] explicitly; a subsystem
/// holds no handle to the coordinator or to other departments.
pub trait Subsystem: Any {
    fn department(&self) -> Department;

    /// Called once on registration, after the context is fully built
    fn init(&mut self, _ctx: &mut ShipContext) {}

    /// Run one order addressed to this department
    fn execute(&mut self, order: &ShipOrder, ctx: &mut ShipContext) -> Result<CommandResult>;

    /// Advance timers by `dt` seconds
    fn tick(&mut self, dt: f32, ctx: &mut ShipContext);

    /// Read-only snapshot for telemetry
    fn status(&self, ctx: &ShipContext) -> StatusMap;

    fn on_alert_changed(&mut self, _level: AlertLevel, _ctx: &mut ShipContext) {}

    fn on_power_changed(&mut self, _distribution: &PowerDistribution, _ctx: &mut ShipContext) {}

    /// Seen by every subsystem after an order succeeds
    fn on_command_completed(&mut self, _order: &ShipOrder, _result: &CommandResult) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

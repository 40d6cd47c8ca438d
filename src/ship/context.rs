//! Shared ship state handed to every subsystem call
//!
//! The coordinator owns exactly one `ShipContext` and lends it out as
//! `&mut` for the duration of a hook. Subsystems never keep a reference to
//! it between calls.

use glam::Vec3;

use crate::core::config::ShipConfig;
use crate::core::error::{BridgeError, Result};
use crate::core::types::{AlertLevel, Seconds};
use crate::power::{PowerDistribution, PowerError, PowerSystem};
use crate::warp::WarpDrive;

use super::body::ShipBody;
use super::chart::StarChart;
use super::events::EventLog;

/// Power write not yet broadcast to the subsystems
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PendingPowerChange {
    pub settled: bool,
}

pub struct ShipContext {
    alert: AlertLevel,
    power: PowerSystem,
    pending_power: Option<PendingPowerChange>,
    clock: Seconds,
    pub warp: WarpDrive,
    pub body: ShipBody,
    pub chart: StarChart,
    pub events: EventLog,
}

impl ShipContext {
    pub fn new(config: &ShipConfig, chart: StarChart) -> Result<Self> {
        let warp = WarpDrive::new(config.warp.clone()).map_err(BridgeError::Configuration)?;
        let body = ShipBody::new(
            Vec3::from(config.helm.start_position),
            config.helm.turn_rate,
            config.helm.max_impulse_speed,
        );
        Ok(Self {
            alert: AlertLevel::default(),
            power: PowerSystem::new(),
            pending_power: None,
            clock: 0.0,
            warp,
            body,
            chart,
            events: EventLog::new(),
        })
    }

    pub fn alert(&self) -> AlertLevel {
        self.alert
    }

    /// Only the coordinator changes the alert level, so it can broadcast
    pub(crate) fn set_alert(&mut self, level: AlertLevel) -> AlertLevel {
        std::mem::replace(&mut self.alert, level)
    }

    pub fn power(&self) -> &PowerSystem {
        &self.power
    }

    pub fn distribution(&self) -> &PowerDistribution {
        self.power.distribution()
    }

    /// Validated write of the live power table.
    ///
    /// The change is broadcast by the coordinator before control returns
    /// to the caller or the next subsystem ticks.
    pub fn push_power(
        &mut self,
        distribution: PowerDistribution,
        settled: bool,
    ) -> std::result::Result<(), PowerError> {
        self.power.set_distribution(distribution)?;
        self.pending_power = Some(PendingPowerChange { settled });
        Ok(())
    }

    pub(crate) fn take_power_change(&mut self) -> Option<PendingPowerChange> {
        self.pending_power.take()
    }

    /// Simulation time in seconds
    pub fn now(&self) -> Seconds {
        self.clock
    }

    pub(crate) fn advance_clock(&mut self, dt: f32) {
        self.clock += dt as Seconds;
    }
}

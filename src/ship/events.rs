//! One-way notifications for visual/audio collaborators
//!
//! The core never waits for acknowledgement; consumers drain the log
//! after each tick or command.

use serde::{Deserialize, Serialize};

use crate::core::types::AlertLevel;
use crate::power::PowerDistribution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShipEvent {
    AlertChanged {
        from: AlertLevel,
        to: AlertLevel,
    },
    /// Alarm cue toggled on entering red alert and off on leaving it
    RedAlertKlaxon {
        active: bool,
        duration: f32,
    },
    PowerChanged {
        distribution: PowerDistribution,
        /// False while an engineering ramp is still under way
        settled: bool,
    },
    ShieldStrengthChanged {
        strength: f32,
        raised: bool,
    },
    ShieldsCollapsed,
    TargetLocked {
        target: String,
    },
    WeaponFired {
        weapon: String,
        target: String,
        damage: f32,
    },
    WarpChargingStarted {
        factor: f32,
        charge_seconds: f32,
    },
    WarpEngaged {
        factor: f32,
    },
    WarpChargeCancelled,
    WarpDisengaged {
        full_stop: bool,
    },
    WarpBlocked {
        reason: String,
        nearest_body: String,
        distance_remaining: f32,
    },
    SafetyOverrideArmed,
    SafetyOverrideUsed {
        obstruction: String,
    },
    SystemDamaged {
        system: String,
        health: f32,
    },
    SystemRepaired {
        system: String,
    },
    ScanComplete {
        target: String,
        scan_type: String,
    },
    CourseSet {
        destination: String,
    },
    ArrivedAtDestination {
        destination: String,
    },
    OrbitRequested {
        target: String,
    },
}

/// Buffered events awaiting pickup
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pending: Vec<ShipEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ShipEvent) {
        tracing::trace!(?event, "ship event");
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[ShipEvent] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<ShipEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = ShipEvent::WarpBlocked {
            reason: "proximity".into(),
            nearest_body: "Earth".into(),
            distance_remaining: 120.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "warp_blocked");
        assert_eq!(json["nearest_body"], "Earth");
    }

    #[test]
    fn test_drain_empties_log() {
        let mut log = EventLog::new();
        log.push(ShipEvent::ShieldsCollapsed);
        log.push(ShipEvent::WarpChargeCancelled);
        assert_eq!(log.drain().len(), 2);
        assert!(log.is_empty());
    }
}

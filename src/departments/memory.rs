//! Helm's short-term memory of recent orders
//!
//! Lets follow-ups like "engage" or "take us back" omit what the previous
//! order already said.

use serde::Serialize;
use serde_json::Value;

use crate::command::{CommandResult, HelmOrder, ShipOrder, TacticalOrder};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandMemory {
    pub last_destination: Option<String>,
    pub last_warp_factor: Option<f32>,
    pub last_impulse: Option<f32>,
    pub shields_raised: bool,
    pub at_warp: bool,
}

impl CommandMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful order. Failed orders leave memory untouched.
    pub fn update(&mut self, order: &ShipOrder, result: &CommandResult) {
        if !result.success {
            return;
        }

        if let Some(dest) = result.data.get("destination").and_then(Value::as_str) {
            self.last_destination = Some(dest.to_string());
        }
        if let Some(factor) = result.data.get("warp_factor").and_then(Value::as_f64) {
            self.last_warp_factor = Some(factor as f32);
        }

        match order {
            ShipOrder::Helm(HelmOrder::Impulse { percent }) => {
                self.last_impulse = Some(*percent);
                self.at_warp = false;
            }
            ShipOrder::Helm(HelmOrder::Warp { .. }) => self.at_warp = true,
            ShipOrder::Helm(
                HelmOrder::Navigate { warp_factor, .. }
                | HelmOrder::NavigateCoordinates { warp_factor, .. },
            ) if warp_factor.is_some() => self.at_warp = true,
            ShipOrder::Helm(
                HelmOrder::Stop
                | HelmOrder::Disengage
                | HelmOrder::CancelWarp
                | HelmOrder::Orbit { .. },
            ) => self.at_warp = false,
            ShipOrder::Tactical(TacticalOrder::RaiseShields) => self.shields_raised = true,
            ShipOrder::Tactical(TacticalOrder::LowerShields) => self.shields_raised = false,
            _ => {}
        }
    }

    /// One-line summary for operators and the voice bridge prompt
    pub fn context_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(dest) = &self.last_destination {
            parts.push(format!("Last destination: {}", dest));
        }
        if let Some(factor) = self.last_warp_factor {
            parts.push(format!("Last warp factor: {}", factor));
        }
        if self.at_warp {
            parts.push("Ship is currently at warp".to_string());
        }
        if self.shields_raised {
            parts.push("Shields are currently raised".to_string());
        }

        if parts.is_empty() {
            "No previous context".to_string()
        } else {
            parts.join("; ")
        }
    }
}

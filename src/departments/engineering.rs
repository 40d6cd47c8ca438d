//! Engineering: power ramps, system health and damage control

use std::any::Any;
use std::collections::VecDeque;

use ahash::AHashMap;
use serde_json::{json, Value};

use crate::command::{CommandResult, EngineeringOrder, ShipOrder, StatusMap};
use crate::core::config::EngineeringConfig;
use crate::core::error::{BridgeError, Result};
use crate::core::types::Department;
use crate::power::{PowerChannel, PowerDistribution, PowerPreset, PowerSystem};
use crate::ship::{ShipContext, ShipEvent, Subsystem};

pub const MAX_HEALTH: f32 = 100.0;

/// A power change being ramped into the live table
#[derive(Debug, Clone)]
pub struct PowerTransition {
    pub from: PowerDistribution,
    pub to: PowerDistribution,
    pub elapsed: f32,
}

#[derive(Debug)]
pub struct Engineering {
    config: EngineeringConfig,
    health: AHashMap<String, f32>,
    repair_queue: VecDeque<String>,
    repairing: Option<String>,
    transition: Option<PowerTransition>,
}

impl Engineering {
    pub fn new(config: &EngineeringConfig) -> Self {
        let health = config
            .systems
            .iter()
            .map(|name| (name.clone(), MAX_HEALTH))
            .collect();
        Self {
            config: config.clone(),
            health,
            repair_queue: VecDeque::new(),
            repairing: None,
            transition: None,
        }
    }

    pub fn health(&self, system: &str) -> Option<f32> {
        self.health.get(system).copied()
    }

    pub fn repairing(&self) -> Option<&str> {
        self.repairing.as_deref()
    }

    pub fn repair_queue(&self) -> impl Iterator<Item = &str> {
        self.repair_queue.iter().map(String::as_str)
    }

    pub fn transition(&self) -> Option<&PowerTransition> {
        self.transition.as_ref()
    }

    /// Table the ship is heading toward: the ramp target, or the live table
    pub fn target_distribution(&self, ctx: &ShipContext) -> PowerDistribution {
        self.transition
            .as_ref()
            .map(|t| t.to)
            .unwrap_or(*ctx.distribution())
    }

    /// Fails for a system name not on the health board
    pub fn check_system(&self, system: &str) -> Result<()> {
        if self.health.contains_key(system) {
            Ok(())
        } else {
            Err(BridgeError::InvalidParameter(format!(
                "unknown system '{}' (known: {})",
                system,
                self.system_names().join(", ")
            )))
        }
    }

    fn system_names(&self) -> Vec<&str> {
        // Config order, not hash order
        self.config.systems.iter().map(String::as_str).collect()
    }

    /// Reduce a system's health; returns the new value
    pub fn apply_damage(
        &mut self,
        system: &str,
        amount: f32,
        ctx: &mut ShipContext,
    ) -> Result<f32> {
        self.check_system(system)?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(BridgeError::InvalidParameter(format!(
                "damage must be a non-negative number (got {})",
                amount
            )));
        }

        let health = self.health.entry(system.to_string()).or_insert(MAX_HEALTH);
        let before = *health;
        *health = (before - amount).clamp(0.0, MAX_HEALTH);
        let after = *health;

        if after < before {
            tracing::warn!("{} damaged: {:.0}% -> {:.0}%", system, before, after);
            ctx.events.push(ShipEvent::SystemDamaged {
                system: system.to_string(),
                health: after,
            });
        }
        Ok(after)
    }

    /// Queue a system for repair. Idempotent for queued or in-progress systems.
    pub fn repair(&mut self, system: &str) -> Result<CommandResult> {
        self.check_system(system)?;
        let health = self.health(system).unwrap_or(MAX_HEALTH);

        if self.repairing.as_deref() == Some(system) {
            return Ok(CommandResult::ok(format!("Repairs to {} already under way", system))
                .with_field("health", health));
        }
        if let Some(pos) = self.repair_queue.iter().position(|s| s == system) {
            return Ok(
                CommandResult::ok(format!("{} already queued for repair", system))
                    .with_field("queue_position", pos + 1),
            );
        }
        if health >= MAX_HEALTH {
            return Ok(CommandResult::ok(format!("{} is fully operational", system))
                .with_field("health", health));
        }

        self.repair_queue.push_back(system.to_string());
        tracing::info!("{} queued for repair", system);
        let position = self.repair_queue.len() + usize::from(self.repairing.is_some());
        Ok(
            CommandResult::ok(format!("Damage control team dispatched to {}", system))
                .with_field("queue_position", position)
                .with_field("health", health),
        )
    }

    /// Start ramping toward `target`, from whatever is live right now
    fn begin_transition(&mut self, target: PowerDistribution, ctx: &ShipContext) {
        tracing::info!("Power transition to {}", target);
        self.transition = Some(PowerTransition {
            from: *ctx.distribution(),
            to: target,
            elapsed: 0.0,
        });
    }

    fn adjust_power(
        &mut self,
        channel: PowerChannel,
        delta: f32,
        ctx: &ShipContext,
    ) -> Result<CommandResult> {
        let base = self.target_distribution(ctx);
        let target = PowerSystem::modified(&base, channel, delta)?;
        self.begin_transition(target, ctx);

        let verb = if delta >= 0.0 { "Diverting" } else { "Reducing" };
        Ok(CommandResult::ok(format!(
            "{} {:.0}% {} {}",
            verb,
            delta.abs(),
            if delta >= 0.0 { "to" } else { "from" },
            channel
        ))
        .with_data(distribution_json(&target)))
    }

    fn damage_report(&self) -> CommandResult {
        let damaged: Vec<Value> = self
            .system_names()
            .into_iter()
            .filter_map(|name| {
                let health = self.health(name)?;
                (health < MAX_HEALTH).then(|| json!({ "system": name, "health": health }))
            })
            .collect();

        let message = if damaged.is_empty() {
            "All systems operational".to_string()
        } else {
            format!("{} system(s) damaged", damaged.len())
        };
        CommandResult::ok(message)
            .with_field("damaged", damaged)
            .with_field("repairing", self.repairing.clone())
            .with_field("queue", self.repair_queue.iter().cloned().collect::<Vec<_>>())
    }

    fn tick_transition(&mut self, dt: f32, ctx: &mut ShipContext) {
        let Some(transition) = self.transition.as_mut() else {
            return;
        };
        transition.elapsed += dt;
        let t = (transition.elapsed / self.config.power_transition_seconds).min(1.0);
        let settled = t >= 1.0;
        let next = if settled {
            transition.to
        } else {
            PowerDistribution::lerp(&transition.from, &transition.to, t)
        };

        if let Err(e) = ctx.push_power(next, settled) {
            tracing::warn!("Power transition aborted: {}", e);
            self.transition = None;
            return;
        }
        if settled {
            tracing::debug!("Power transition complete");
            self.transition = None;
        }
    }

    fn tick_repairs(&mut self, dt: f32, ctx: &mut ShipContext) {
        if self.repairing.is_none() {
            self.repairing = self.repair_queue.pop_front();
        }
        let Some(system) = self.repairing.clone() else {
            return;
        };

        let health = self.health.entry(system.clone()).or_insert(MAX_HEALTH);
        *health = (*health + self.config.repair_rate * dt).min(MAX_HEALTH);
        if *health >= MAX_HEALTH {
            tracing::info!("{} repaired", system);
            ctx.events.push(ShipEvent::SystemRepaired { system });
            self.repairing = None;
        }
    }
}

fn distribution_json(dist: &PowerDistribution) -> Value {
    json!({
        "propulsion": dist.propulsion,
        "shielding": dist.shielding,
        "armament": dist.armament,
        "sensors": dist.sensors,
    })
}

impl Subsystem for Engineering {
    fn department(&self) -> Department {
        Department::Engineering
    }

    fn execute(&mut self, order: &ShipOrder, ctx: &mut ShipContext) -> Result<CommandResult> {
        let ShipOrder::Engineering(order) = order else {
            return Err(BridgeError::UnknownCommand(format!("{:?}", order)));
        };

        match order {
            EngineeringOrder::ApplyPreset(preset) => {
                let target = preset.distribution();
                self.begin_transition(target, ctx);
                Ok(CommandResult::ok(format!("Rerouting power: {} configuration", preset.name()))
                    .with_data(distribution_json(&target))
                    .with_field("preset", preset.name()))
            }
            EngineeringOrder::AdjustPower { channel, delta } => {
                self.adjust_power(*channel, *delta, ctx)
            }
            EngineeringOrder::SetDistribution(dist) => {
                dist.validate()?;
                self.begin_transition(*dist, ctx);
                Ok(CommandResult::ok("Power distribution set").with_data(distribution_json(dist)))
            }
            EngineeringOrder::Damage { system, amount } => {
                let health = self.apply_damage(system, *amount, ctx)?;
                Ok(CommandResult::ok(format!("{} at {:.0}%", system, health))
                    .with_field("system", system.as_str())
                    .with_field("health", health))
            }
            EngineeringOrder::Repair { system } => self.repair(system),
            EngineeringOrder::DamageReport => Ok(self.damage_report()),
            EngineeringOrder::Status => Ok(CommandResult::ok("Engineering status")
                .with_data(Value::Object(self.status(ctx)))),
        }
    }

    fn tick(&mut self, dt: f32, ctx: &mut ShipContext) {
        self.tick_transition(dt, ctx);
        self.tick_repairs(dt, ctx);
    }

    fn status(&self, ctx: &ShipContext) -> StatusMap {
        let mut status = StatusMap::new();
        let health: serde_json::Map<String, Value> = self
            .system_names()
            .into_iter()
            .map(|name| (name.to_string(), json!(self.health(name).unwrap_or(MAX_HEALTH))))
            .collect();
        status.insert("health".into(), Value::Object(health));
        status.insert("power".into(), distribution_json(ctx.distribution()));
        status.insert("power_transitioning".into(), json!(self.transition.is_some()));
        if let Some(t) = &self.transition {
            status.insert("power_target".into(), distribution_json(&t.to));
        }
        status.insert("repairing".into(), json!(self.repairing));
        status.insert(
            "repair_queue".into(),
            json!(self.repair_queue.iter().collect::<Vec<_>>()),
        );
        status
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Presets by name, for operator help text
pub fn preset_names() -> Vec<&'static str> {
    PowerPreset::ALL.iter().map(|p| p.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ShipConfig;
    use crate::ship::StarChart;

    fn setup() -> (Engineering, ShipContext) {
        let config = ShipConfig::default();
        (
            Engineering::new(&config.engineering),
            ShipContext::new(&config, StarChart::new()).unwrap(),
        )
    }

    fn order(o: EngineeringOrder) -> ShipOrder {
        ShipOrder::Engineering(o)
    }

    #[test]
    fn test_power_ramps_over_transition() {
        let (mut eng, mut ctx) = setup();
        eng.execute(&order(EngineeringOrder::ApplyPreset(PowerPreset::Combat)), &mut ctx)
            .unwrap();
        assert_eq!(*ctx.distribution(), PowerDistribution::default());

        eng.tick(0.75, &mut ctx);
        let mid = *ctx.distribution();
        assert!((mid.shielding - 30.0).abs() < 1e-3);
        assert!((mid.sum() - 100.0).abs() < 0.1);

        eng.tick(0.75, &mut ctx);
        assert_eq!(*ctx.distribution(), PowerPreset::Combat.distribution());
        assert!(eng.transition().is_none());
    }

    #[test]
    fn test_adjust_during_ramp_builds_on_pending_target() {
        let (mut eng, mut ctx) = setup();
        let boost = |delta| order(EngineeringOrder::AdjustPower {
            channel: PowerChannel::Propulsion,
            delta,
        });
        eng.execute(&boost(15.0), &mut ctx).unwrap();
        eng.tick(0.5, &mut ctx);
        eng.execute(&boost(15.0), &mut ctx).unwrap();

        let target = eng.target_distribution(&ctx);
        assert!((target.propulsion - 55.0).abs() < 1e-3);
        assert!((target.sensors - 15.0).abs() < 1e-3);

        eng.tick(2.0, &mut ctx);
        assert!((ctx.distribution().propulsion - 55.0).abs() < 1e-3);
    }

    #[test]
    fn test_out_of_bounds_adjust_rejected_without_change() {
        let (mut eng, mut ctx) = setup();
        let err = eng
            .execute(
                &order(EngineeringOrder::AdjustPower {
                    channel: PowerChannel::Armament,
                    delta: 90.0,
                }),
                &mut ctx,
            )
            .unwrap_err();
        assert!(matches!(err, BridgeError::Power(_)));
        assert!(eng.transition().is_none());
    }

    #[test]
    fn test_damage_clamps_and_reports() {
        let (mut eng, mut ctx) = setup();
        assert_eq!(eng.apply_damage("shields", 30.0, &mut ctx).unwrap(), 70.0);
        assert_eq!(eng.apply_damage("shields", 500.0, &mut ctx).unwrap(), 0.0);
        assert!(eng.apply_damage("warp_core_breach", 1.0, &mut ctx).is_err());

        let report = eng.damage_report();
        assert_eq!(report.data["damaged"][0]["system"], "shields");
        assert_eq!(
            ctx.events
                .pending()
                .iter()
                .filter(|e| matches!(e, ShipEvent::SystemDamaged { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_one_repair_at_a_time() {
        let (mut eng, mut ctx) = setup();
        eng.apply_damage("shields", 20.0, &mut ctx).unwrap();
        eng.apply_damage("sensors", 20.0, &mut ctx).unwrap();
        eng.repair("shields").unwrap();
        eng.repair("sensors").unwrap();

        eng.tick(1.0, &mut ctx);
        assert_eq!(eng.repairing(), Some("shields"));
        assert_eq!(eng.health("shields"), Some(90.0));
        assert_eq!(eng.health("sensors"), Some(80.0));

        eng.tick(1.0, &mut ctx);
        assert_eq!(eng.health("shields"), Some(100.0));
        assert_eq!(eng.repairing(), None);

        eng.tick(1.0, &mut ctx);
        assert_eq!(eng.repairing(), Some("sensors"));
        assert_eq!(eng.health("sensors"), Some(90.0));
    }

    #[test]
    fn test_repair_is_idempotent() {
        let (mut eng, mut ctx) = setup();
        eng.apply_damage("weapons", 50.0, &mut ctx).unwrap();
        eng.repair("weapons").unwrap();
        eng.repair("weapons").unwrap();
        assert_eq!(eng.repair_queue().count(), 1);

        eng.tick(0.1, &mut ctx);
        let again = eng.repair("weapons").unwrap();
        assert!(again.message.contains("already under way"));
        assert_eq!(eng.repair_queue().count(), 0);
    }
}

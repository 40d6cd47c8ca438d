//! Tactical: deflector shields, weapons and target acquisition

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};

use crate::command::{CommandResult, ShipOrder, StatusMap, TacticalOrder};
use crate::core::config::{ShieldConfig, ShipConfig, TargetingConfig, WeaponConfig};
use crate::core::error::{BridgeError, Result};
use crate::core::types::{AlertLevel, Department};
use crate::power::{PowerChannel, PowerDistribution};
use crate::ship::{ShipContext, ShipEvent, Subsystem};
use crate::warp::WarpMode;

/// Power multipliers never scale timers by more than 2x
const MIN_TIMER_MULTIPLIER: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Phasers,
    Torpedoes,
}

impl WeaponKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Phasers => "phasers",
            Self::Torpedoes => "torpedoes",
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeaponKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "phaser" | "phasers" => Ok(Self::Phasers),
            "torpedo" | "torpedoes" | "photon_torpedo" | "photon_torpedoes" => Ok(Self::Torpedoes),
            other => Err(format!("unknown weapon '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShieldDirection {
    #[default]
    None,
    Raising,
    Lowering,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShieldState {
    /// Commanded state; flips when a raise/lower starts
    pub raised: bool,
    pub current_strength: f32,
    pub target_strength: f32,
    pub direction: ShieldDirection,
}

impl ShieldState {
    pub fn transitioning(&self) -> bool {
        self.direction != ShieldDirection::None
    }
}

impl Default for ShieldState {
    fn default() -> Self {
        Self {
            raised: false,
            current_strength: 0.0,
            target_strength: 0.0,
            direction: ShieldDirection::None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponState {
    pub phaser_cooldown: f32,
    pub torpedo_cooldown: f32,
    pub torpedoes: u32,
}

impl WeaponState {
    fn cooldown_mut(&mut self, weapon: WeaponKind) -> &mut f32 {
        match weapon {
            WeaponKind::Phasers => &mut self.phaser_cooldown,
            WeaponKind::Torpedoes => &mut self.torpedo_cooldown,
        }
    }

    pub fn cooldown(&self, weapon: WeaponKind) -> f32 {
        match weapon {
            WeaponKind::Phasers => self.phaser_cooldown,
            WeaponKind::Torpedoes => self.torpedo_cooldown,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetLock {
    pub current_target: Option<String>,
    pub locking_target: Option<String>,
    /// 0-100
    pub progress: f32,
}

#[derive(Debug)]
pub struct Tactical {
    shield_config: ShieldConfig,
    weapon_config: WeaponConfig,
    targeting_config: TargetingConfig,
    shields: ShieldState,
    weapons: WeaponState,
    lock: TargetLock,
    alert: AlertLevel,
    shield_multiplier: f32,
    armament_multiplier: f32,
    sensor_multiplier: f32,
}

impl Tactical {
    pub fn new(config: &ShipConfig) -> Self {
        Self {
            shield_config: config.shields.clone(),
            weapon_config: config.weapons.clone(),
            targeting_config: config.targeting.clone(),
            shields: ShieldState::default(),
            weapons: WeaponState {
                phaser_cooldown: 0.0,
                torpedo_cooldown: 0.0,
                torpedoes: config.weapons.torpedo_capacity,
            },
            lock: TargetLock::default(),
            alert: AlertLevel::Green,
            shield_multiplier: 1.0,
            armament_multiplier: 1.0,
            sensor_multiplier: 1.0,
        }
    }

    pub fn shields(&self) -> &ShieldState {
        &self.shields
    }

    pub fn weapons(&self) -> &WeaponState {
        &self.weapons
    }

    pub fn target_lock(&self) -> &TargetLock {
        &self.lock
    }

    fn alert_index(&self) -> usize {
        match self.alert {
            AlertLevel::Green => 0,
            AlertLevel::Yellow => 1,
            AlertLevel::Red => 2,
        }
    }

    /// Full cooldown for `weapon` at current power and alert
    pub fn cooldown_length(&self, weapon: WeaponKind) -> f32 {
        let base = match weapon {
            WeaponKind::Phasers => self.weapon_config.phaser_cooldown,
            WeaponKind::Torpedoes => self.weapon_config.torpedo_cooldown,
        };
        base / self.armament_multiplier.max(MIN_TIMER_MULTIPLIER)
            * self.weapon_config.alert_cooldown_factor[self.alert_index()]
    }

    /// Seconds to acquire a lock at current sensor power
    pub fn lock_time(&self) -> f32 {
        self.targeting_config.base_lock_time / self.sensor_multiplier.max(MIN_TIMER_MULTIPLIER)
    }

    pub fn raise_shields(&mut self, ctx: &ShipContext) -> Result<CommandResult> {
        if ctx.warp.mode() == WarpMode::Charging {
            return Err(BridgeError::Rejected(
                "Cannot raise shields while the warp drive is charging".into(),
            ));
        }
        match self.shields.direction {
            ShieldDirection::Raising => {
                return Ok(self.shield_result("Shields already raising"));
            }
            ShieldDirection::None if self.shields.raised => {
                return Ok(self.shield_result("Shields already raised"));
            }
            _ => {}
        }

        self.shields.raised = true;
        self.shields.target_strength = self.shield_config.max_strength;
        self.shields.direction = ShieldDirection::Raising;
        tracing::info!("Raising shields");
        Ok(self.shield_result("Raising shields"))
    }

    pub fn lower_shields(&mut self, ctx: &ShipContext) -> Result<CommandResult> {
        if ctx.warp.mode() == WarpMode::Charging {
            return Err(BridgeError::Rejected(
                "Cannot lower shields while the warp drive is charging".into(),
            ));
        }
        match self.shields.direction {
            ShieldDirection::Lowering => {
                return Ok(self.shield_result("Shields already lowering"));
            }
            ShieldDirection::None if !self.shields.raised => {
                return Ok(self.shield_result("Shields already down"));
            }
            _ => {}
        }

        self.shields.raised = false;
        self.shields.target_strength = 0.0;
        self.shields.direction = ShieldDirection::Lowering;
        tracing::info!("Lowering shields");
        Ok(self.shield_result("Lowering shields"))
    }

    fn shield_result(&self, message: &str) -> CommandResult {
        CommandResult::ok(message)
            .with_field("strength", self.shields.current_strength)
            .with_field("raised", self.shields.raised)
            .with_field("transitioning", self.shields.transitioning())
    }

    /// Absorb incoming damage; returns the part the shields did not stop
    pub fn apply_shield_damage(&mut self, amount: f32, ctx: &mut ShipContext) -> f32 {
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let absorbed = amount.min(self.shields.current_strength);
        if absorbed <= 0.0 {
            return amount;
        }

        self.shields.current_strength = (self.shields.current_strength - absorbed).max(0.0);
        if self.shields.current_strength <= 0.0 {
            self.shields = ShieldState::default();
            tracing::warn!("Shields collapsed");
            ctx.events.push(ShipEvent::ShieldsCollapsed);
        }
        ctx.events.push(ShipEvent::ShieldStrengthChanged {
            strength: self.shields.current_strength,
            raised: self.shields.raised,
        });
        amount - absorbed
    }

    pub fn lock_target(&mut self, target: &str, ctx: &ShipContext) -> Result<CommandResult> {
        let body = ctx.chart.find(target).ok_or_else(|| {
            BridgeError::Rejected(format!("No contact named '{}' on sensors", target))
        })?;
        let name = body.name.clone();

        if self.lock.current_target.as_deref() == Some(name.as_str()) {
            return Ok(CommandResult::ok(format!("Already locked on {}", name))
                .with_field("target", name));
        }
        if self.lock.locking_target.as_deref() == Some(name.as_str()) {
            return Ok(CommandResult::ok(format!("Already acquiring {}", name))
                .with_field("target", name)
                .with_field("progress", self.lock.progress));
        }

        self.lock = TargetLock {
            current_target: None,
            locking_target: Some(name.clone()),
            progress: 0.0,
        };
        tracing::info!("Acquiring target lock on {}", name);
        Ok(CommandResult::ok(format!("Acquiring target lock on {}", name))
            .with_field("target", name)
            .with_field("lock_time", self.lock_time()))
    }

    pub fn clear_target(&mut self) -> CommandResult {
        self.lock = TargetLock::default();
        CommandResult::ok("Target lock released")
    }

    /// Checks run in order: lock, warp state, cooldown, ammunition
    pub fn fire(&mut self, weapon: WeaponKind, ctx: &mut ShipContext) -> Result<CommandResult> {
        let target = self
            .lock
            .current_target
            .clone()
            .ok_or_else(|| BridgeError::Rejected("Cannot fire: no target locked".into()))?;

        match ctx.warp.mode() {
            WarpMode::Impulse => {}
            mode => {
                return Err(BridgeError::Rejected(format!(
                    "Cannot fire {} while warp drive is {}",
                    weapon,
                    mode.name().replace('_', " ")
                )))
            }
        }

        let remaining = self.weapons.cooldown(weapon);
        if remaining > 0.0 {
            return Err(BridgeError::Rejected(format!(
                "{} recharging ({:.1}s remaining)",
                capitalize(weapon.name()),
                remaining
            )));
        }

        if weapon == WeaponKind::Torpedoes {
            if self.weapons.torpedoes == 0 {
                return Err(BridgeError::Exhausted("No torpedoes remaining".into()));
            }
            self.weapons.torpedoes -= 1;
        }

        let damage = match weapon {
            WeaponKind::Phasers => self.weapon_config.phaser_damage * self.armament_multiplier,
            WeaponKind::Torpedoes => self.weapon_config.torpedo_damage,
        };
        let cooldown = self.cooldown_length(weapon);
        *self.weapons.cooldown_mut(weapon) = cooldown;

        tracing::info!("Firing {} at {} ({:.1} damage)", weapon, target, damage);
        ctx.events.push(ShipEvent::WeaponFired {
            weapon: weapon.name().to_string(),
            target: target.clone(),
            damage,
        });

        Ok(CommandResult::ok(format!("Firing {} at {}", weapon, target))
            .with_field("weapon", weapon.name())
            .with_field("target", target)
            .with_field("damage", damage)
            .with_field("cooldown", cooldown)
            .with_field("torpedoes", self.weapons.torpedoes))
    }

    fn tick_shields(&mut self, dt: f32, ctx: &mut ShipContext) {
        let max = self.shield_config.max_strength;
        let regen = self.shield_config.regen_rate
            * self.shield_multiplier
            * self.shield_config.alert_regen_factor[self.alert_index()];
        let shields = &mut self.shields;
        match shields.direction {
            ShieldDirection::Raising => {
                shields.current_strength = (shields.current_strength
                    + self.shield_config.raise_rate * dt)
                    .min(shields.target_strength);
                if shields.current_strength >= shields.target_strength {
                    shields.direction = ShieldDirection::None;
                    tracing::info!("Shields up");
                    ctx.events.push(ShipEvent::ShieldStrengthChanged {
                        strength: shields.current_strength,
                        raised: true,
                    });
                }
            }
            ShieldDirection::Lowering => {
                shields.current_strength =
                    (shields.current_strength - self.shield_config.lower_rate * dt).max(0.0);
                if shields.current_strength <= 0.0 {
                    shields.direction = ShieldDirection::None;
                    tracing::info!("Shields down");
                    ctx.events.push(ShipEvent::ShieldStrengthChanged {
                        strength: 0.0,
                        raised: false,
                    });
                }
            }
            ShieldDirection::None if shields.raised && shields.current_strength < max => {
                shields.current_strength = (shields.current_strength + regen * dt).min(max);
            }
            ShieldDirection::None => {}
        }
    }

    fn tick_weapons(&mut self, dt: f32) {
        for weapon in [WeaponKind::Phasers, WeaponKind::Torpedoes] {
            let cooldown = self.weapons.cooldown_mut(weapon);
            *cooldown = (*cooldown - dt).max(0.0);
        }
    }

    fn tick_lock(&mut self, dt: f32, ctx: &mut ShipContext) {
        if self.lock.locking_target.is_none() {
            return;
        }
        self.lock.progress = (self.lock.progress + 100.0 * dt / self.lock_time()).min(100.0);
        if self.lock.progress >= 100.0 {
            if let Some(target) = self.lock.locking_target.take() {
                tracing::info!("Target locked: {}", target);
                ctx.events.push(ShipEvent::TargetLocked {
                    target: target.clone(),
                });
                self.lock.current_target = Some(target);
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Subsystem for Tactical {
    fn department(&self) -> Department {
        Department::Tactical
    }

    fn init(&mut self, ctx: &mut ShipContext) {
        let dist = *ctx.distribution();
        self.on_power_changed(&dist, ctx);
        self.alert = ctx.alert();
    }

    fn execute(&mut self, order: &ShipOrder, ctx: &mut ShipContext) -> Result<CommandResult> {
        let ShipOrder::Tactical(order) = order else {
            return Err(BridgeError::UnknownCommand(format!("{:?}", order)));
        };

        match order {
            TacticalOrder::RaiseShields => self.raise_shields(ctx),
            TacticalOrder::LowerShields => self.lower_shields(ctx),
            TacticalOrder::Fire { weapon } => self.fire(*weapon, ctx),
            TacticalOrder::LockTarget { target } => self.lock_target(target, ctx),
            TacticalOrder::ClearTarget => Ok(self.clear_target()),
            TacticalOrder::Status => {
                Ok(CommandResult::ok("Tactical status").with_data(Value::Object(self.status(ctx))))
            }
        }
    }

    fn tick(&mut self, dt: f32, ctx: &mut ShipContext) {
        self.tick_shields(dt, ctx);
        self.tick_weapons(dt);
        self.tick_lock(dt, ctx);
    }

    fn status(&self, _ctx: &ShipContext) -> StatusMap {
        let mut status = StatusMap::new();
        status.insert("shields".into(), json!(self.shields));
        status.insert("shields_transitioning".into(), json!(self.shields.transitioning()));
        status.insert("weapons".into(), json!(self.weapons));
        status.insert("target_lock".into(), json!(self.lock));
        status.insert("lock_time".into(), json!(self.lock_time()));
        status
    }

    fn on_alert_changed(&mut self, level: AlertLevel, ctx: &mut ShipContext) {
        self.alert = level;
        if level == AlertLevel::Red && !self.shields.transitioning() && !self.shields.raised {
            match self.raise_shields(ctx) {
                Ok(_) => tracing::info!("Red alert: shields raising automatically"),
                Err(e) => tracing::warn!("Red alert could not raise shields: {}", e),
            }
        }
    }

    fn on_power_changed(&mut self, distribution: &PowerDistribution, _ctx: &mut ShipContext) {
        self.shield_multiplier = distribution.multiplier(PowerChannel::Shielding);
        self.armament_multiplier = distribution.multiplier(PowerChannel::Armament);
        self.sensor_multiplier = distribution.multiplier(PowerChannel::Sensors);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power::PowerPreset;
    use crate::ship::StarChart;

    fn setup() -> (Tactical, ShipContext) {
        let config = ShipConfig::default();
        let mut ctx = ShipContext::new(&config, StarChart::sol_system()).unwrap();
        let mut tactical = Tactical::new(&config);
        tactical.init(&mut ctx);
        (tactical, ctx)
    }

    fn locked_on(target: &str) -> (Tactical, ShipContext) {
        let (mut t, mut ctx) = setup();
        t.lock_target(target, &ctx).unwrap();
        t.tick(10.0, &mut ctx);
        (t, ctx)
    }

    #[test]
    fn test_raise_is_rate_limited() {
        let (mut t, mut ctx) = setup();
        t.raise_shields(&ctx).unwrap();
        assert_eq!(t.shields().current_strength, 0.0);

        t.tick(1.0, &mut ctx);
        assert!((t.shields().current_strength - 40.0).abs() < 1e-3);
        assert!(t.shields().transitioning());

        t.tick(2.0, &mut ctx);
        assert_eq!(t.shields().current_strength, 100.0);
        assert!(!t.shields().transitioning());
    }

    #[test]
    fn test_second_raise_reports_already_raising() {
        let (mut t, mut ctx) = setup();
        t.raise_shields(&ctx).unwrap();
        t.tick(0.5, &mut ctx);
        let before = t.shields().current_strength;

        let again = t.raise_shields(&ctx).unwrap();
        assert!(again.success);
        assert!(again.message.contains("already raising"));
        assert_eq!(t.shields().current_strength, before);
    }

    #[test]
    fn test_lowering_is_faster() {
        let (mut t, mut ctx) = setup();
        t.raise_shields(&ctx).unwrap();
        t.tick(5.0, &mut ctx);
        t.lower_shields(&ctx).unwrap();
        t.tick(1.0, &mut ctx);
        assert!((t.shields().current_strength - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_shield_damage_returns_remainder() {
        let (mut t, mut ctx) = setup();
        t.raise_shields(&ctx).unwrap();
        t.tick(5.0, &mut ctx);

        assert_eq!(t.apply_shield_damage(30.0, &mut ctx), 0.0);
        assert_eq!(t.shields().current_strength, 70.0);
        assert_eq!(t.apply_shield_damage(100.0, &mut ctx), 30.0);
        assert_eq!(t.shields().current_strength, 0.0);
        assert!(!t.shields().raised);
        assert!(ctx.events.pending().contains(&ShipEvent::ShieldsCollapsed));
    }

    #[test]
    fn test_shields_down_pass_everything() {
        let (mut t, mut ctx) = setup();
        assert_eq!(t.apply_shield_damage(12.0, &mut ctx), 12.0);
    }

    #[test]
    fn test_fire_without_lock_fails_regardless_of_cooldown() {
        let (mut t, mut ctx) = setup();
        let err = t.fire(WeaponKind::Phasers, &mut ctx).unwrap_err();
        assert!(err.to_string().contains("no target locked"));

        t.weapons.phaser_cooldown = 1.5;
        let err = t.fire(WeaponKind::Phasers, &mut ctx).unwrap_err();
        assert!(err.to_string().contains("no target locked"));
    }

    #[test]
    fn test_lock_progress_and_promotion() {
        let (mut t, mut ctx) = setup();
        t.lock_target("mars", &ctx).unwrap();
        t.tick(1.5, &mut ctx);
        assert!((t.target_lock().progress - 50.0).abs() < 1e-3);
        assert!(t.target_lock().current_target.is_none());

        t.tick(1.5, &mut ctx);
        assert_eq!(t.target_lock().current_target.as_deref(), Some("Mars"));
        assert!(t.target_lock().locking_target.is_none());
    }

    #[test]
    fn test_lock_requires_known_contact() {
        let (mut t, ctx) = setup();
        assert!(t.lock_target("Romulus", &ctx).is_err());
    }

    #[test]
    fn test_phaser_cooldown_scales_with_alert() {
        let (mut t, mut ctx) = locked_on("Moon");
        t.fire(WeaponKind::Phasers, &mut ctx).unwrap();
        assert!((t.weapons().phaser_cooldown - 2.0).abs() < 1e-4);
        assert!(t.fire(WeaponKind::Phasers, &mut ctx).is_err());

        t.tick(2.0, &mut ctx);
        t.on_alert_changed(AlertLevel::Yellow, &mut ctx);
        t.fire(WeaponKind::Phasers, &mut ctx).unwrap();
        assert!((t.weapons().phaser_cooldown - 1.7).abs() < 1e-4);
    }

    #[test]
    fn test_regen_scales_with_shield_power_and_alert() {
        let (mut t, mut ctx) = setup();
        t.raise_shields(&ctx).unwrap();
        t.tick(5.0, &mut ctx);
        t.apply_shield_damage(50.0, &mut ctx);
        t.on_power_changed(&PowerPreset::Combat.distribution(), &mut ctx);

        // 2.0/s at 35% shielding: x1.4
        t.tick(1.0, &mut ctx);
        assert!((t.shields().current_strength - 52.8).abs() < 1e-3);

        t.on_alert_changed(AlertLevel::Red, &mut ctx);
        t.tick(1.0, &mut ctx);
        assert!((t.shields().current_strength - 58.4).abs() < 1e-3);

        t.tick(60.0, &mut ctx);
        assert_eq!(t.shields().current_strength, 100.0);
    }

    #[test]
    fn test_cooldown_follows_armament_power() {
        let (mut t, mut ctx) = locked_on("Moon");
        t.on_power_changed(&PowerPreset::Combat.distribution(), &mut ctx);
        assert!((t.cooldown_length(WeaponKind::Phasers) - 2.0 / 1.4).abs() < 1e-4);

        // 5% armament would stretch the timer past the floor
        t.on_power_changed(&PowerPreset::Science.distribution(), &mut ctx);
        t.fire(WeaponKind::Phasers, &mut ctx).unwrap();
        assert!((t.weapons().phaser_cooldown - 4.0).abs() < 1e-4);
        t.on_alert_changed(AlertLevel::Red, &mut ctx);
        assert!((t.cooldown_length(WeaponKind::Phasers) - 2.8).abs() < 1e-4);

        let unarmed = PowerDistribution::new(40.0, 30.0, 0.0, 30.0);
        t.on_power_changed(&unarmed, &mut ctx);
        t.on_alert_changed(AlertLevel::Green, &mut ctx);
        assert!((t.cooldown_length(WeaponKind::Torpedoes) - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_lock_time_follows_sensor_power() {
        let (mut t, mut ctx) = setup();
        t.on_power_changed(&PowerPreset::Science.distribution(), &mut ctx);
        assert!((t.lock_time() - 1.25).abs() < 1e-4);

        // 10% sensors is below the floor: 3.0 / 0.5
        t.on_power_changed(&PowerPreset::Combat.distribution(), &mut ctx);
        assert!((t.lock_time() - 6.0).abs() < 1e-4);

        t.lock_target("Moon", &ctx).unwrap();
        t.tick(5.9, &mut ctx);
        assert!(t.target_lock().current_target.is_none());
        t.tick(0.2, &mut ctx);
        assert_eq!(t.target_lock().current_target.as_deref(), Some("Moon"));
    }

    #[test]
    fn test_torpedoes_run_out() {
        let (mut t, mut ctx) = locked_on("Moon");
        t.weapons.torpedoes = 1;
        t.fire(WeaponKind::Torpedoes, &mut ctx).unwrap();
        t.tick(10.0, &mut ctx);
        let err = t.fire(WeaponKind::Torpedoes, &mut ctx).unwrap_err();
        assert!(matches!(err, BridgeError::Exhausted(_)));
    }

    #[test]
    fn test_red_alert_raises_shields_once() {
        let (mut t, mut ctx) = setup();
        t.on_alert_changed(AlertLevel::Red, &mut ctx);
        assert_eq!(t.shields().direction, ShieldDirection::Raising);
        t.tick(0.5, &mut ctx);
        let strength = t.shields().current_strength;
        t.on_alert_changed(AlertLevel::Red, &mut ctx);
        assert_eq!(t.shields().current_strength, strength);
    }

    #[test]
    fn test_weapon_names() {
        assert_eq!("photon torpedo".parse::<WeaponKind>(), Ok(WeaponKind::Torpedoes));
        assert!("disruptor".parse::<WeaponKind>().is_err());
    }
}

//! Warp drive state machine

use serde::Serialize;

use super::{SafetyOverride, WarpError, WarpSpeedTable};
use crate::core::config::WarpConfig;
use crate::core::types::Seconds;
use crate::ship::body::ShipBody;
use crate::ship::chart::StarChart;
use crate::ship::events::{EventLog, ShipEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WarpMode {
    #[default]
    Impulse,
    Charging,
    AtWarp,
}

impl WarpMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Impulse => "impulse",
            Self::Charging => "charging",
            Self::AtWarp => "at_warp",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WarpState {
    pub mode: WarpMode,
    /// 0 at impulse; moves only toward `target_factor` while at warp
    pub current_factor: f32,
    pub target_factor: f32,
    pub charge_elapsed: f32,
}

impl Default for WarpState {
    fn default() -> Self {
        Self {
            mode: WarpMode::Impulse,
            current_factor: 0.0,
            target_factor: 1.0,
            charge_elapsed: 0.0,
        }
    }
}

/// What a disengage request actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisengageOutcome {
    /// Already at impulse; nothing to do
    NotEngaged,
    /// Charge aborted before reaching warp
    ChargeCancelled,
    /// Dropped out of warp
    Dropped,
}

#[derive(Debug, Clone)]
pub struct WarpDrive {
    config: WarpConfig,
    table: WarpSpeedTable,
    state: WarpState,
    safety: SafetyOverride,
}

impl WarpDrive {
    pub fn new(config: WarpConfig) -> Result<Self, String> {
        let table = WarpSpeedTable::from_entries(&config.speed_table)?;
        let safety = SafetyOverride::new(config.override_presses, config.override_window_seconds);
        Ok(Self {
            config,
            table,
            state: WarpState::default(),
            safety,
        })
    }

    pub fn state(&self) -> &WarpState {
        &self.state
    }

    pub fn mode(&self) -> WarpMode {
        self.state.mode
    }

    pub fn is_charging(&self) -> bool {
        self.state.mode == WarpMode::Charging
    }

    pub fn is_at_warp(&self) -> bool {
        self.state.mode == WarpMode::AtWarp
    }

    pub fn max_factor(&self) -> f32 {
        self.config.max_factor
    }

    pub fn min_safe_distance(&self) -> f32 {
        self.config.min_safe_distance
    }

    pub fn safety(&self) -> &SafetyOverride {
        &self.safety
    }

    pub fn speed_table(&self) -> &WarpSpeedTable {
        &self.table
    }

    /// Current speed in world units per second (0 unless at warp)
    pub fn current_speed(&self) -> f32 {
        if self.is_at_warp() {
            self.table.multiple_of_c(self.state.current_factor) * self.config.light_speed
        } else {
            0.0
        }
    }

    /// Seconds of charge left, if charging
    pub fn charge_remaining(&self) -> Option<f32> {
        self.is_charging()
            .then(|| (self.config.charge_seconds - self.state.charge_elapsed).max(0.0))
    }

    fn check_factor(&self, factor: f32) -> Result<f32, WarpError> {
        if !factor.is_finite() || factor < 1.0 || factor > self.config.max_factor + 1e-4 {
            return Err(WarpError::InvalidFactor {
                factor,
                max: self.config.max_factor,
            });
        }
        Ok(factor.min(self.config.max_factor))
    }

    /// Request warp at `factor`.
    ///
    /// Passes the proximity gate or spends an armed override, then starts
    /// the charge timer. Warp is entered by `tick` once the charge completes.
    pub fn engage(
        &mut self,
        factor: f32,
        ship: &ShipBody,
        chart: &StarChart,
        events: &mut EventLog,
    ) -> Result<(), WarpError> {
        match self.state.mode {
            WarpMode::Charging => return Err(WarpError::AlreadyCharging),
            WarpMode::AtWarp => return Err(WarpError::AlreadyAtWarp),
            WarpMode::Impulse => {}
        }
        let factor = self.check_factor(factor)?;

        if let Some((body, distance)) = chart.nearest(ship.position) {
            if distance < self.config.min_safe_distance {
                let remaining = self.config.min_safe_distance - distance;
                if self.safety.consume() {
                    tracing::warn!(
                        "Safety override used: engaging warp {:.0} units from {}",
                        distance,
                        body.name
                    );
                    events.push(ShipEvent::SafetyOverrideUsed {
                        obstruction: body.name.clone(),
                    });
                } else {
                    tracing::info!(
                        "Warp blocked by {} ({:.0} units, {:.0} short)",
                        body.name,
                        distance,
                        remaining
                    );
                    events.push(ShipEvent::WarpBlocked {
                        reason: "proximity".into(),
                        nearest_body: body.name.clone(),
                        distance_remaining: remaining,
                    });
                    return Err(WarpError::Blocked {
                        body: body.name.clone(),
                        distance,
                        remaining,
                    });
                }
            }
        }

        self.state.mode = WarpMode::Charging;
        self.state.target_factor = factor;
        self.state.charge_elapsed = 0.0;
        tracing::info!("Warp drive charging for warp {:.1}", factor);
        events.push(ShipEvent::WarpChargingStarted {
            factor,
            charge_seconds: self.config.charge_seconds,
        });
        Ok(())
    }

    /// Change the target factor while charging or at warp
    pub fn set_target_factor(&mut self, factor: f32) -> Result<(), WarpError> {
        if self.state.mode == WarpMode::Impulse {
            return Err(WarpError::NotAtWarp);
        }
        self.state.target_factor = self.check_factor(factor)?;
        Ok(())
    }

    /// Abort a charge in progress
    pub fn cancel_charge(&mut self, events: &mut EventLog) -> Result<(), WarpError> {
        if !self.is_charging() {
            return Err(WarpError::NotCharging);
        }
        self.state = WarpState {
            target_factor: self.state.target_factor,
            ..WarpState::default()
        };
        tracing::info!("Warp charge cancelled");
        events.push(ShipEvent::WarpChargeCancelled);
        Ok(())
    }

    /// Drop to impulse from any state; a no-op at impulse.
    ///
    /// `full_stop` also kills throttle; otherwise the ship resumes its
    /// commanded impulse along the current heading.
    pub fn disengage(
        &mut self,
        full_stop: bool,
        ship: &mut ShipBody,
        events: &mut EventLog,
    ) -> DisengageOutcome {
        let outcome = match self.state.mode {
            WarpMode::Impulse => DisengageOutcome::NotEngaged,
            WarpMode::Charging => {
                // Only fails when not charging, which was just ruled out
                let _ = self.cancel_charge(events);
                DisengageOutcome::ChargeCancelled
            }
            WarpMode::AtWarp => {
                self.state = WarpState {
                    target_factor: self.state.target_factor,
                    ..WarpState::default()
                };
                tracing::info!("Dropped out of warp (full stop: {})", full_stop);
                events.push(ShipEvent::WarpDisengaged { full_stop });
                DisengageOutcome::Dropped
            }
        };

        if full_stop {
            ship.all_stop();
        } else if outcome == DisengageOutcome::Dropped {
            ship.velocity = ship.impulse_velocity();
        }
        outcome
    }

    /// Record an override keystroke at simulation time `now`
    pub fn press_override(&mut self, now: Seconds, events: &mut EventLog) -> bool {
        let armed = self.safety.press(now);
        if armed {
            tracing::warn!("Warp safety override armed");
            events.push(ShipEvent::SafetyOverrideArmed);
        }
        armed
    }

    /// Advance charge and factor; sets ship velocity while at warp
    pub fn tick(&mut self, dt: f32, ship: &mut ShipBody, events: &mut EventLog) {
        match self.state.mode {
            WarpMode::Impulse => {}
            WarpMode::Charging => {
                self.state.charge_elapsed += dt;
                if self.state.charge_elapsed >= self.config.charge_seconds {
                    self.state.mode = WarpMode::AtWarp;
                    self.state.current_factor = 1.0;
                    self.state.charge_elapsed = self.config.charge_seconds;
                    tracing::info!(
                        "Warp engaged, accelerating to warp {:.1}",
                        self.state.target_factor
                    );
                    events.push(ShipEvent::WarpEngaged {
                        factor: self.state.target_factor,
                    });
                    ship.velocity = ship.forward() * self.current_speed();
                }
            }
            WarpMode::AtWarp => {
                let step = self.config.factor_rate * dt;
                let delta = self.state.target_factor - self.state.current_factor;
                self.state.current_factor += delta.clamp(-step, step);
                ship.velocity = ship.forward() * self.current_speed();
            }
        }
    }
}

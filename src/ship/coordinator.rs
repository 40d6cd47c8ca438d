//! StarshipCore - owns the departments and routes every command
//!
//! Execution model:
//! 1. A wire command is validated and typed into a `ShipOrder`
//! 2. Coordinator orders (alert, full status, damage report) run here
//! 3. Everything else runs on the owning department
//! 4. Alert and power changes are broadcast to every department before
//!    control returns to the caller

use serde_json::{json, Value};

use crate::command::{
    BridgeCommand, CommandResult, CoreOrder, EngineeringOrder, ShipOrder, StatusMap,
};
use crate::core::config::ShipConfig;
use crate::core::error::{BridgeError, Result};
use crate::core::types::{AlertLevel, Department};
use crate::departments::{Engineering, Helm, Ops, Tactical};
use crate::power::PowerDistribution;
use crate::warp::WarpDrive;

use super::body::ShipBody;
use super::chart::StarChart;
use super::context::ShipContext;
use super::events::ShipEvent;
use super::subsystem::Subsystem;

pub struct StarshipCore {
    config: ShipConfig,
    ctx: ShipContext,
    /// Tick order is registration order
    subsystems: Vec<Box<dyn Subsystem>>,
}

fn find_mut<T: Subsystem>(subsystems: &mut [Box<dyn Subsystem>]) -> Option<&mut T> {
    subsystems
        .iter_mut()
        .find_map(|s| s.as_any_mut().downcast_mut::<T>())
}

fn vec_json(v: glam::Vec3) -> Value {
    json!([v.x, v.y, v.z])
}

impl StarshipCore {
    /// Empty coordinator; departments are added with [`register`](Self::register)
    pub fn new(config: ShipConfig, chart: StarChart) -> Result<Self> {
        config.validate()?;
        let ctx = ShipContext::new(&config, chart)?;
        Ok(Self {
            config,
            ctx,
            subsystems: Vec::new(),
        })
    }

    /// Coordinator with engineering, tactical, ops and helm registered in tick order
    pub fn with_standard_departments(config: ShipConfig, chart: StarChart) -> Result<Self> {
        let mut core = Self::new(config, chart)?;
        let engineering = Engineering::new(&core.config.engineering);
        let tactical = Tactical::new(&core.config);
        let ops = Ops::new(&core.config.sensors);
        let helm = Helm::new(&core.config.helm, &core.config.command);
        core.register(Box::new(engineering))?;
        core.register(Box::new(tactical))?;
        core.register(Box::new(ops))?;
        core.register(Box::new(helm))?;
        Ok(core)
    }

    /// Add a department. The registry is fixed once the simulation starts
    /// ticking; registering the same department twice is a startup error.
    pub fn register(&mut self, mut subsystem: Box<dyn Subsystem>) -> Result<()> {
        let dept = subsystem.department();
        if self.subsystems.iter().any(|s| s.department() == dept) {
            return Err(BridgeError::Configuration(format!(
                "department '{}' registered twice",
                dept
            )));
        }
        subsystem.init(&mut self.ctx);
        tracing::debug!("Registered {} department", dept);
        self.subsystems.push(subsystem);
        self.flush_power();
        Ok(())
    }

    pub fn config(&self) -> &ShipConfig {
        &self.config
    }

    pub fn context(&self) -> &ShipContext {
        &self.ctx
    }

    pub fn alert(&self) -> AlertLevel {
        self.ctx.alert()
    }

    pub fn distribution(&self) -> &PowerDistribution {
        self.ctx.distribution()
    }

    pub fn warp(&self) -> &WarpDrive {
        &self.ctx.warp
    }

    pub fn body(&self) -> &ShipBody {
        &self.ctx.body
    }

    pub fn body_mut(&mut self) -> &mut ShipBody {
        &mut self.ctx.body
    }

    pub fn chart(&self) -> &StarChart {
        &self.ctx.chart
    }

    pub fn chart_mut(&mut self) -> &mut StarChart {
        &mut self.ctx.chart
    }

    /// Simulation time in seconds
    pub fn now(&self) -> f64 {
        self.ctx.now()
    }

    pub fn departments(&self) -> Vec<Department> {
        self.subsystems.iter().map(|s| s.department()).collect()
    }

    pub fn get<T: Subsystem>(&self) -> Option<&T> {
        self.subsystems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: Subsystem>(&mut self) -> Option<&mut T> {
        find_mut::<T>(&mut self.subsystems)
    }

    /// Handle one wire command. Always returns a result, never panics.
    pub fn route_command(&mut self, cmd: &BridgeCommand) -> CommandResult {
        tracing::debug!("Routing {}/{}", cmd.department, cmd.intent);
        let result =
            ShipOrder::parse(cmd, &self.config.command).and_then(|order| self.dispatch(order));
        if let Err(e) = &result {
            tracing::info!("Command {}/{} failed: {}", cmd.department, cmd.intent, e);
        }
        CommandResult::from_result(result)
    }

    /// Handle an already-typed order
    pub fn execute(&mut self, order: ShipOrder) -> CommandResult {
        CommandResult::from_result(self.dispatch(order))
    }

    fn dispatch(&mut self, order: ShipOrder) -> Result<CommandResult> {
        let outcome = match &order {
            ShipOrder::Core(CoreOrder::SetAlert(level)) => self.set_alert(*level),
            ShipOrder::Core(CoreOrder::FullStatus) => Ok(CommandResult::ok("Full ship status")
                .with_data(Value::Object(self.full_status()))),
            ShipOrder::Core(CoreOrder::DamageReport) => self.run_on(
                Department::Engineering,
                &ShipOrder::Engineering(EngineeringOrder::DamageReport),
            ),
            ShipOrder::Helm(_) => self.run_on(Department::Helm, &order),
            ShipOrder::Tactical(_) => self.run_on(Department::Tactical, &order),
            ShipOrder::Engineering(_) => self.run_on(Department::Engineering, &order),
            ShipOrder::Ops(_) => self.run_on(Department::Ops, &order),
        };
        self.flush_power();

        let result = outcome?;
        for subsystem in &mut self.subsystems {
            subsystem.on_command_completed(&order, &result);
        }
        Ok(result)
    }

    fn run_on(&mut self, dept: Department, order: &ShipOrder) -> Result<CommandResult> {
        let subsystem = self
            .subsystems
            .iter_mut()
            .find(|s| s.department() == dept)
            .ok_or_else(|| BridgeError::DepartmentOffline(dept.name().to_string()))?;
        subsystem.execute(order, &mut self.ctx)
    }

    /// Change the ship-wide alert level and notify every department
    pub fn set_alert(&mut self, level: AlertLevel) -> Result<CommandResult> {
        let previous = self.ctx.set_alert(level);
        if previous == level {
            return Ok(CommandResult::ok(format!("Already at {} alert", level))
                .with_field("alert", level.name()));
        }

        tracing::info!("Alert level {} -> {}", previous, level);
        self.ctx.events.push(ShipEvent::AlertChanged {
            from: previous,
            to: level,
        });
        if level == AlertLevel::Red {
            self.ctx.events.push(ShipEvent::RedAlertKlaxon {
                active: true,
                duration: self.config.alert.klaxon_seconds,
            });
        } else if previous == AlertLevel::Red {
            self.ctx.events.push(ShipEvent::RedAlertKlaxon {
                active: false,
                duration: 0.0,
            });
        }

        for subsystem in &mut self.subsystems {
            subsystem.on_alert_changed(level, &mut self.ctx);
        }
        self.flush_power();

        let message = match level {
            AlertLevel::Red => "Red alert! All hands to battle stations",
            AlertLevel::Yellow => "Yellow alert",
            AlertLevel::Green => "Standing down, condition green",
        };
        Ok(CommandResult::ok(message)
            .with_field("alert", level.name())
            .with_field("previous", previous.name()))
    }

    /// Broadcast a pending power write to every department
    fn flush_power(&mut self) {
        if let Some(change) = self.ctx.take_power_change() {
            let distribution = *self.ctx.distribution();
            self.ctx.events.push(ShipEvent::PowerChanged {
                distribution,
                settled: change.settled,
            });
            for subsystem in &mut self.subsystems {
                subsystem.on_power_changed(&distribution, &mut self.ctx);
            }
        }
    }

    /// Advance the whole ship by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            tracing::warn!("Ignoring tick with dt = {}", dt);
            return;
        }

        self.ctx.advance_clock(dt);
        self.ctx.chart.advance(dt);
        self.ctx.body.steer(dt);
        self.ctx.warp.tick(dt, &mut self.ctx.body, &mut self.ctx.events);
        let at_warp = self.ctx.warp.is_at_warp();
        self.ctx.body.integrate(dt, at_warp);

        for i in 0..self.subsystems.len() {
            self.subsystems[i].tick(dt, &mut self.ctx);
            self.flush_power();
        }
    }

    /// Incoming hit: shields absorb first, the remainder damages `system`.
    ///
    /// Returns the damage that got past the shields.
    pub fn take_fire(&mut self, amount: f32, system: &str) -> Result<f32> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(BridgeError::InvalidParameter(format!(
                "damage must be a non-negative number (got {})",
                amount
            )));
        }

        if let Some(engineering) = self.get::<Engineering>() {
            engineering.check_system(system)?;
        }

        let remainder = match find_mut::<Tactical>(&mut self.subsystems) {
            Some(tactical) => tactical.apply_shield_damage(amount, &mut self.ctx),
            None => amount,
        };
        if remainder > 0.0 {
            if let Some(engineering) = find_mut::<Engineering>(&mut self.subsystems) {
                engineering.apply_damage(system, remainder, &mut self.ctx)?;
            }
        }
        Ok(remainder)
    }

    pub fn drain_events(&mut self) -> Vec<ShipEvent> {
        self.ctx.events.drain()
    }

    pub fn pending_events(&self) -> &[ShipEvent] {
        self.ctx.events.pending()
    }

    pub fn department_status(&self, dept: Department) -> Option<StatusMap> {
        self.subsystems
            .iter()
            .find(|s| s.department() == dept)
            .map(|s| s.status(&self.ctx))
    }

    /// Aggregate snapshot: ship-wide state plus one entry per department
    pub fn full_status(&self) -> StatusMap {
        let dist = self.ctx.distribution();
        let warp = self.ctx.warp.state();
        let body = &self.ctx.body;
        let multiple_of_c = if self.ctx.warp.is_at_warp() {
            self.ctx.warp.speed_table().multiple_of_c(warp.current_factor)
        } else {
            0.0
        };

        let mut status = StatusMap::new();
        status.insert("alert".into(), json!(self.ctx.alert().name()));
        status.insert("clock".into(), json!(self.ctx.now()));
        status.insert(
            "power".into(),
            json!({
                "propulsion": dist.propulsion,
                "shielding": dist.shielding,
                "armament": dist.armament,
                "sensors": dist.sensors,
            }),
        );
        status.insert(
            "warp".into(),
            json!({
                "mode": warp.mode.name(),
                "current_factor": warp.current_factor,
                "target_factor": warp.target_factor,
                "speed": self.ctx.warp.current_speed(),
                "multiple_of_c": multiple_of_c,
                "max_factor": self.ctx.warp.max_factor(),
                "min_safe_distance": self.ctx.warp.min_safe_distance(),
                "charge_remaining": self.ctx.warp.charge_remaining(),
                "override_armed": self.ctx.warp.safety().is_armed(),
            }),
        );
        status.insert(
            "ship".into(),
            json!({
                "position": vec_json(body.position),
                "velocity": vec_json(body.velocity),
                "speed": body.speed(),
                "yaw": body.yaw,
                "pitch": body.pitch,
                "impulse_percent": body.impulse_percent(),
            }),
        );
        for subsystem in &self.subsystems {
            status.insert(
                subsystem.department().name().to_string(),
                Value::Object(subsystem.status(&self.ctx)),
            );
        }
        status
    }
}

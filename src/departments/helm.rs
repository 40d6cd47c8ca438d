//! Helm: course, speed and heading
//!
//! Helm owns no propulsion state of its own. Warp goes through the shared
//! `WarpDrive`, impulse and heading through the `ShipBody`; helm adds the
//! autopilot that steers toward a course target and drops out on arrival.

use std::any::Any;

use glam::Vec3;
use serde_json::{json, Value};

use crate::command::{CommandResult, HelmOrder, ShipOrder, StatusMap};
use crate::core::config::{CommandConfig, HelmConfig};
use crate::core::error::{BridgeError, Result};
use crate::core::types::{pitch_towards, yaw_towards, Department};
use crate::power::{PowerChannel, PowerDistribution};
use crate::ship::{ShipContext, ShipEvent, StarChart, Subsystem};
use crate::warp::{DisengageOutcome, WarpMode};

use super::memory::CommandMemory;

/// Autopilot target
#[derive(Debug, Clone, PartialEq)]
pub enum Course {
    /// A charted body, tracked as it drifts
    Body(String),
    Point(Vec3),
}

impl Course {
    pub fn label(&self) -> String {
        match self {
            Self::Body(name) => name.clone(),
            Self::Point(p) => format!("({:.0}, {:.0}, {:.0})", p.x, p.y, p.z),
        }
    }

    /// Aim point and the clearance to subtract from it (body radius)
    fn locate(&self, chart: &StarChart) -> Option<(Vec3, f32)> {
        match self {
            Self::Body(name) => chart.find(name).map(|b| (b.position, b.radius)),
            Self::Point(p) => Some((*p, 0.0)),
        }
    }
}

#[derive(Debug)]
pub struct Helm {
    config: HelmConfig,
    default_warp_factor: f32,
    memory: CommandMemory,
    course: Option<Course>,
}

fn point_ship_at(ctx: &mut ShipContext, aim: Vec3) {
    let from = ctx.body.position;
    ctx.body.set_heading(yaw_towards(from, aim), pitch_towards(from, aim));
}

impl Helm {
    pub fn new(config: &HelmConfig, command: &CommandConfig) -> Self {
        Self {
            config: config.clone(),
            default_warp_factor: command.default_warp_factor,
            memory: CommandMemory::new(),
            course: None,
        }
    }

    pub fn memory(&self) -> &CommandMemory {
        &self.memory
    }

    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    /// Lay in `course`, engaging warp first when a factor is given.
    ///
    /// Nothing is committed unless the engagement succeeds. A refused warp
    /// keeps the previous course and heading and emits no `CourseSet`.
    fn set_course(
        &mut self,
        course: Course,
        warp_factor: Option<f32>,
        ctx: &mut ShipContext,
    ) -> Result<(String, f32)> {
        let (aim, radius) = course.locate(&ctx.chart).ok_or_else(|| {
            BridgeError::Rejected(format!("Unknown destination '{}'", course.label()))
        })?;
        let distance = (aim.distance(ctx.body.position) - radius).max(0.0);

        if let Some(factor) = warp_factor {
            ctx.warp.engage(factor, &ctx.body, &ctx.chart, &mut ctx.events)?;
        }
        point_ship_at(ctx, aim);

        let label = course.label();
        tracing::info!("Course set for {} ({:.0} units)", label, distance);
        ctx.events.push(ShipEvent::CourseSet {
            destination: label.clone(),
        });
        self.course = Some(course);
        Ok((label, distance))
    }

    fn course_laid_in(label: &str, warp_factor: Option<f32>) -> CommandResult {
        match warp_factor {
            Some(factor) => {
                CommandResult::ok(format!("Course laid in for {}, warp {}", label, factor))
                    .with_field("warp_factor", factor)
            }
            None => CommandResult::ok(format!("Course laid in for {}", label)),
        }
    }

    fn navigate(
        &mut self,
        target: Option<&str>,
        warp_factor: Option<f32>,
        ctx: &mut ShipContext,
    ) -> Result<CommandResult> {
        let requested = target
            .or(self.memory.last_destination.as_deref())
            .ok_or_else(|| {
                BridgeError::InvalidParameter("No destination given and no previous course".into())
            })?;
        let name = ctx
            .chart
            .find(requested)
            .map(|b| b.name.clone())
            .ok_or_else(|| BridgeError::Rejected(format!("Unknown destination '{}'", requested)))?;

        let (label, distance) = self.set_course(Course::Body(name), warp_factor, ctx)?;
        Ok(Self::course_laid_in(&label, warp_factor)
            .with_field("destination", label.as_str())
            .with_field("distance", distance))
    }

    fn navigate_coordinates(
        &mut self,
        point: Vec3,
        warp_factor: Option<f32>,
        ctx: &mut ShipContext,
    ) -> Result<CommandResult> {
        let (label, distance) = self.set_course(Course::Point(point), warp_factor, ctx)?;
        Ok(Self::course_laid_in(&label, warp_factor)
            .with_field("coordinates", json!([point.x, point.y, point.z]))
            .with_field("distance", distance))
    }

    /// Engage from impulse. A drive already charging or at warp refuses.
    fn warp(&mut self, warp_factor: Option<f32>, ctx: &mut ShipContext) -> Result<CommandResult> {
        let factor = warp_factor
            .or(self.memory.last_warp_factor)
            .unwrap_or(self.default_warp_factor);
        ctx.warp.engage(factor, &ctx.body, &ctx.chart, &mut ctx.events)?;

        Ok(CommandResult::ok(format!("Warp {}, engage", factor))
            .with_field("warp_factor", factor)
            .with_field("mode", ctx.warp.mode().name()))
    }

    fn set_warp_factor(&mut self, factor: f32, ctx: &mut ShipContext) -> Result<CommandResult> {
        ctx.warp.set_target_factor(factor)?;
        Ok(CommandResult::ok(format!("Adjusting to warp {}", factor))
            .with_field("warp_factor", factor)
            .with_field("mode", ctx.warp.mode().name()))
    }

    fn impulse(&mut self, percent: f32, ctx: &mut ShipContext) -> CommandResult {
        if ctx.warp.mode() != WarpMode::Impulse {
            ctx.warp.disengage(false, &mut ctx.body, &mut ctx.events);
        }
        ctx.body.set_impulse(percent);
        let speed = ctx.body.impulse_speed_limit() * ctx.body.impulse_percent() / 100.0;
        CommandResult::ok(format!("Impulse {:.0}%", ctx.body.impulse_percent()))
            .with_field("impulse_percent", ctx.body.impulse_percent())
            .with_field("speed", speed)
    }

    fn stop(&mut self, ctx: &mut ShipContext) -> CommandResult {
        let outcome = ctx.warp.disengage(true, &mut ctx.body, &mut ctx.events);
        ctx.body.all_stop();
        self.course = None;
        tracing::info!("All stop ({:?})", outcome);
        CommandResult::ok("All stop")
            .with_field("dropped_from_warp", outcome == DisengageOutcome::Dropped)
    }

    fn turn(&mut self, degrees: f32, pitch: Option<f32>, ctx: &mut ShipContext) -> CommandResult {
        // Manual steering overrides the autopilot
        self.course = None;
        if degrees != 0.0 {
            ctx.body.turn_by(degrees);
        }
        if let Some(p) = pitch {
            let (yaw, _) = ctx.body.target_heading();
            ctx.body.set_heading(yaw, p);
        }
        let (yaw, p) = ctx.body.target_heading();
        CommandResult::ok(format!("Coming to heading {:03.0} mark {:.0}", yaw, p))
            .with_field("heading", yaw)
            .with_field("pitch", p)
    }

    fn orbit(&mut self, target: Option<&str>, ctx: &mut ShipContext) -> Result<CommandResult> {
        let (name, distance) = {
            let body = match target.or(self.memory.last_destination.as_deref()) {
                Some(name) => ctx
                    .chart
                    .find(name)
                    .ok_or_else(|| BridgeError::Rejected(format!("Unknown body '{}'", name)))?,
                None => {
                    ctx.chart
                        .nearest(ctx.body.position)
                        .ok_or_else(|| BridgeError::Rejected("Nothing to orbit".into()))?
                        .0
                }
            };
            (body.name.clone(), body.surface_distance(ctx.body.position))
        };

        if distance > self.config.orbit_range {
            return Err(BridgeError::Rejected(format!(
                "{} is {:.0} units away; set a course first",
                name, distance
            )));
        }

        ctx.warp.disengage(true, &mut ctx.body, &mut ctx.events);
        self.course = None;
        tracing::info!("Orbit requested around {}", name);
        ctx.events.push(ShipEvent::OrbitRequested {
            target: name.clone(),
        });
        Ok(CommandResult::ok(format!("Entering standard orbit around {}", name))
            .with_field("destination", name)
            .with_field("distance", distance))
    }

    fn disengage(&mut self, ctx: &mut ShipContext) -> CommandResult {
        let outcome = ctx.warp.disengage(false, &mut ctx.body, &mut ctx.events);
        self.course = None;
        let message = match outcome {
            DisengageOutcome::NotEngaged => "Not at warp",
            DisengageOutcome::ChargeCancelled => "Warp charge cancelled",
            DisengageOutcome::Dropped => "Dropping out of warp",
        };
        CommandResult::ok(message).with_field("mode", ctx.warp.mode().name())
    }

    fn safety_override(&mut self, ctx: &mut ShipContext) -> CommandResult {
        if ctx.warp.safety().is_armed() {
            return CommandResult::ok("Safety override already armed").with_field("armed", true);
        }
        let now = ctx.now();
        if ctx.warp.press_override(now, &mut ctx.events) {
            CommandResult::ok(
                "Safety override armed, proximity interlock bypassed for next engagement",
            )
            .with_field("armed", true)
        } else {
            let remaining = ctx.warp.safety().presses_remaining();
            CommandResult::ok(format!("Override acknowledged, {} more to arm", remaining))
                .with_field("armed", false)
                .with_field("presses_remaining", remaining)
        }
    }

    /// Autopilot: keep pointing at the course target and drop out on arrival
    fn tick_course(&mut self, dt: f32, ctx: &mut ShipContext) {
        let Some(course) = &self.course else {
            return;
        };
        let Some((aim, radius)) = course.locate(&ctx.chart) else {
            tracing::warn!("Course target {} no longer charted", course.label());
            self.course = None;
            return;
        };

        point_ship_at(ctx, aim);
        let distance = (aim.distance(ctx.body.position) - radius).max(0.0);
        let lookahead = ctx.body.speed() * dt;
        let moving = ctx.warp.mode() != WarpMode::Impulse || ctx.body.speed() > 0.0;
        if moving && distance <= self.config.arrival_distance + lookahead {
            let destination = course.label();
            if ctx.warp.mode() != WarpMode::Impulse {
                ctx.warp.disengage(true, &mut ctx.body, &mut ctx.events);
            }
            ctx.body.all_stop();
            tracing::info!("Arrived at {}", destination);
            ctx.events.push(ShipEvent::ArrivedAtDestination { destination });
            self.course = None;
        }
    }
}

impl Subsystem for Helm {
    fn department(&self) -> Department {
        Department::Helm
    }

    fn init(&mut self, ctx: &mut ShipContext) {
        let dist = *ctx.distribution();
        self.on_power_changed(&dist, ctx);
    }

    fn execute(&mut self, order: &ShipOrder, ctx: &mut ShipContext) -> Result<CommandResult> {
        let ShipOrder::Helm(order) = order else {
            return Err(BridgeError::UnknownCommand(format!("{:?}", order)));
        };

        match order {
            HelmOrder::Navigate { target, warp_factor } => {
                self.navigate(target.as_deref(), *warp_factor, ctx)
            }
            HelmOrder::NavigateCoordinates {
                coordinates,
                warp_factor,
            } => self.navigate_coordinates(*coordinates, *warp_factor, ctx),
            HelmOrder::Warp { warp_factor } => self.warp(*warp_factor, ctx),
            HelmOrder::SetWarpFactor { warp_factor } => self.set_warp_factor(*warp_factor, ctx),
            HelmOrder::Impulse { percent } => Ok(self.impulse(*percent, ctx)),
            HelmOrder::Stop => Ok(self.stop(ctx)),
            HelmOrder::Turn { degrees, pitch } => Ok(self.turn(*degrees, *pitch, ctx)),
            HelmOrder::Orbit { target } => self.orbit(target.as_deref(), ctx),
            HelmOrder::Disengage => Ok(self.disengage(ctx)),
            HelmOrder::CancelWarp => {
                ctx.warp.cancel_charge(&mut ctx.events)?;
                Ok(CommandResult::ok("Warp charge cancelled"))
            }
            HelmOrder::SafetyOverride => Ok(self.safety_override(ctx)),
            HelmOrder::Status => {
                Ok(CommandResult::ok("Helm status").with_data(Value::Object(self.status(ctx))))
            }
        }
    }

    fn tick(&mut self, dt: f32, ctx: &mut ShipContext) {
        self.memory.at_warp = ctx.warp.mode() != WarpMode::Impulse;
        self.tick_course(dt, ctx);
    }

    fn status(&self, ctx: &ShipContext) -> StatusMap {
        let body = &ctx.body;
        let (target_yaw, target_pitch) = body.target_heading();
        let mut status = StatusMap::new();
        status.insert("course".into(), json!(self.course.as_ref().map(Course::label)));
        if let Some((aim, radius)) = self.course.as_ref().and_then(|c| c.locate(&ctx.chart)) {
            status.insert(
                "distance_to_destination".into(),
                json!((aim.distance(body.position) - radius).max(0.0)),
            );
        }
        status.insert("heading".into(), json!(body.yaw));
        status.insert("pitch".into(), json!(body.pitch));
        status.insert("target_heading".into(), json!([target_yaw, target_pitch]));
        status.insert("impulse_percent".into(), json!(body.impulse_percent()));
        status.insert("impulse_speed_limit".into(), json!(body.impulse_speed_limit()));
        status.insert("speed".into(), json!(body.speed()));
        status.insert("warp_mode".into(), json!(ctx.warp.mode().name()));
        status.insert("warp_factor".into(), json!(ctx.warp.state().current_factor));
        status.insert("memory".into(), json!(self.memory));
        status.insert("context".into(), json!(self.memory.context_string()));
        status
    }

    fn on_power_changed(&mut self, distribution: &PowerDistribution, ctx: &mut ShipContext) {
        let limit =
            self.config.max_impulse_speed * distribution.multiplier(PowerChannel::Propulsion);
        ctx.body.set_impulse_speed_limit(limit);
    }

    fn on_command_completed(&mut self, order: &ShipOrder, result: &CommandResult) {
        self.memory.update(order, result);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

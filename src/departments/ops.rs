//! Ops: sensor scans and contact reports

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde_json::{json, Value};

use crate::command::{CommandResult, OpsOrder, ShipOrder, StatusMap};
use crate::core::config::SensorConfig;
use crate::core::error::{BridgeError, Result};
use crate::core::types::{angle_delta, pitch_towards, yaw_towards, Department, Seconds};
use crate::power::{PowerChannel, PowerDistribution};
use crate::ship::{CelestialBody, ShipBody, ShipContext, ShipEvent, Subsystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Quick,
    Standard,
    Detailed,
    Deep,
}

impl ScanType {
    pub const ALL: [ScanType; 4] = [Self::Quick, Self::Standard, Self::Detailed, Self::Deep];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Standard => "standard",
            Self::Detailed => "detailed",
            Self::Deep => "deep",
        }
    }

    /// Index into the per-type config arrays
    fn index(&self) -> usize {
        *self as usize
    }

    /// Detailed and deep scans resolve the target's size
    pub fn resolves_structure(&self) -> bool {
        matches!(self, Self::Detailed | Self::Deep)
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" | "fast" | "passive" => Ok(Self::Quick),
            "standard" | "normal" | "active" => Ok(Self::Standard),
            "detailed" | "full" => Ok(Self::Detailed),
            "deep" | "long_range" | "long range" => Ok(Self::Deep),
            other => Err(format!("unknown scan type '{}'", other)),
        }
    }
}

/// Measured properties of one target, fixed when the scan starts
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    pub target: String,
    pub class: &'static str,
    pub scan_type: ScanType,
    /// Distance to the surface
    pub distance: f32,
    /// Degrees off the bow, positive to starboard
    pub bearing: f32,
    pub elevation: f32,
    /// Positive when the gap is shrinking
    pub closing_speed: f32,
    pub radius: Option<f32>,
    /// Relative measurement error applied to distance and speed
    pub uncertainty: f32,
    pub started_at: Seconds,
    pub completed_at: Option<Seconds>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub name: String,
    pub class: &'static str,
    pub distance: f32,
    pub bearing: f32,
}

#[derive(Debug, Clone)]
struct ActiveScan {
    record: ScanRecord,
    elapsed: f32,
    duration: f32,
}

fn bearing_to(ship: &ShipBody, body: &CelestialBody) -> (f32, f32) {
    let yaw = yaw_towards(ship.position, body.position);
    let pitch = pitch_towards(ship.position, body.position);
    (angle_delta(ship.yaw, yaw), pitch - ship.pitch)
}

#[derive(Debug)]
pub struct Ops {
    config: SensorConfig,
    resolution: f32,
    active: Option<ActiveScan>,
    records: AHashMap<String, ScanRecord>,
    contacts: Vec<Contact>,
    rng: ChaCha8Rng,
}

impl Ops {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            config: config.clone(),
            resolution: 1.0,
            active: None,
            records: AHashMap::new(),
            contacts: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.noise_seed),
        }
    }

    /// Sensor resolution multiplier; 1.0 at 25% sensor power
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn range(&self) -> f32 {
        self.config.base_range * self.resolution
    }

    pub fn scan_duration(&self, scan_type: ScanType) -> f32 {
        self.config.scan_durations[scan_type.index()] / self.resolution
    }

    pub fn scan_uncertainty(&self, scan_type: ScanType) -> f32 {
        self.config.scan_uncertainty[scan_type.index()] / self.resolution
    }

    pub fn is_scanning(&self) -> bool {
        self.active.is_some()
    }

    /// Completed scan for `target` (case-insensitive)
    pub fn record(&self, target: &str) -> Option<&ScanRecord> {
        self.records
            .values()
            .find(|r| r.target.eq_ignore_ascii_case(target.trim()))
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    fn noisy(&mut self, value: f32, uncertainty: f32) -> f32 {
        value * (1.0 + uncertainty * self.rng.gen_range(-1.0f32..=1.0))
    }

    pub fn start_scan(
        &mut self,
        target: &str,
        scan_type: ScanType,
        ctx: &ShipContext,
    ) -> Result<CommandResult> {
        if let Some(active) = &self.active {
            return Err(BridgeError::Rejected(format!(
                "Sensors busy: {} scan of {} in progress",
                active.record.scan_type, active.record.target
            )));
        }

        let body = ctx
            .chart
            .find(target)
            .ok_or_else(|| {
                BridgeError::Rejected(format!("No contact named '{}' on sensors", target))
            })?;
        let ship = &ctx.body;
        let distance = body.surface_distance(ship.position);
        let range = self.range();
        if distance > range {
            return Err(BridgeError::Rejected(format!(
                "{} is out of sensor range ({:.0} > {:.0})",
                body.name, distance, range
            )));
        }

        let uncertainty = self.scan_uncertainty(scan_type);
        let (bearing, elevation) = bearing_to(ship, body);
        let line_of_sight = (body.position - ship.position).normalize_or_zero();
        let closing_speed = -(body.velocity - ship.velocity).dot(line_of_sight);

        let record = ScanRecord {
            target: body.name.clone(),
            class: body.class.name(),
            scan_type,
            distance: self.noisy(distance, uncertainty),
            bearing,
            elevation,
            closing_speed: self.noisy(closing_speed, uncertainty),
            radius: scan_type.resolves_structure().then_some(body.radius),
            uncertainty,
            started_at: ctx.now(),
            completed_at: None,
        };
        let duration = self.scan_duration(scan_type);

        tracing::info!("Starting {} scan of {} ({:.1}s)", scan_type, record.target, duration);
        let message = format!("Beginning {} scan of {}", scan_type, record.target);
        let target_name = record.target.clone();
        self.active = Some(ActiveScan {
            record,
            elapsed: 0.0,
            duration,
        });

        Ok(CommandResult::ok(message)
            .with_field("target", target_name)
            .with_field("scan_type", scan_type.name())
            .with_field("duration", duration))
    }

    /// Everything within sensor range, nearest first
    pub fn sweep(&mut self, ctx: &ShipContext) -> CommandResult {
        let ship = &ctx.body;
        let range = self.range();
        self.contacts = ctx
            .chart
            .within(ship.position, range)
            .into_iter()
            .map(|(body, distance)| Contact {
                name: body.name.clone(),
                class: body.class.name(),
                distance,
                bearing: bearing_to(ship, body).0,
            })
            .collect();

        tracing::debug!("Sensor sweep: {} contacts", self.contacts.len());
        CommandResult::ok(format!("{} contact(s) within {:.0} units", self.contacts.len(), range))
            .with_field("range", range)
            .with_field("contacts", json!(self.contacts))
    }

    fn contact_report(&self) -> CommandResult {
        let mut scans: Vec<&ScanRecord> = self.records.values().collect();
        scans.sort_by(|a, b| a.target.cmp(&b.target));
        CommandResult::ok(format!(
            "{} scan record(s), {} contact(s) from last sweep",
            scans.len(),
            self.contacts.len()
        ))
        .with_field("scans", json!(scans))
        .with_field("contacts", json!(self.contacts))
    }
}

impl Subsystem for Ops {
    fn department(&self) -> Department {
        Department::Ops
    }

    fn init(&mut self, ctx: &mut ShipContext) {
        let dist = *ctx.distribution();
        self.on_power_changed(&dist, ctx);
    }

    fn execute(&mut self, order: &ShipOrder, ctx: &mut ShipContext) -> Result<CommandResult> {
        let ShipOrder::Ops(order) = order else {
            return Err(BridgeError::UnknownCommand(format!("{:?}", order)));
        };

        match order {
            OpsOrder::Scan { target, scan_type } => self.start_scan(target, *scan_type, ctx),
            OpsOrder::Sweep => Ok(self.sweep(ctx)),
            OpsOrder::Contacts => Ok(self.contact_report()),
            OpsOrder::Status => {
                Ok(CommandResult::ok("Sensor status").with_data(Value::Object(self.status(ctx))))
            }
        }
    }

    fn tick(&mut self, dt: f32, ctx: &mut ShipContext) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.elapsed += dt;
        if active.elapsed < active.duration {
            return;
        }

        if let Some(mut done) = self.active.take() {
            done.record.completed_at = Some(ctx.now());
            tracing::info!("{} scan of {} complete", done.record.scan_type, done.record.target);
            ctx.events.push(ShipEvent::ScanComplete {
                target: done.record.target.clone(),
                scan_type: done.record.scan_type.name().to_string(),
            });
            self.records.insert(done.record.target.clone(), done.record);
        }
    }

    fn status(&self, _ctx: &ShipContext) -> StatusMap {
        let mut status = StatusMap::new();
        status.insert("resolution".into(), json!(self.resolution));
        status.insert("range".into(), json!(self.range()));
        status.insert(
            "active_scan".into(),
            match &self.active {
                Some(a) => json!({
                    "target": a.record.target,
                    "scan_type": a.record.scan_type.name(),
                    "progress": (a.elapsed / a.duration * 100.0).min(100.0),
                }),
                None => Value::Null,
            },
        );
        status.insert("scan_records".into(), json!(self.records.len()));
        status.insert("contacts".into(), json!(self.contacts.len()));
        status
    }

    fn on_power_changed(&mut self, distribution: &PowerDistribution, _ctx: &mut ShipContext) {
        self.resolution = distribution
            .multiplier(PowerChannel::Sensors)
            .clamp(self.config.min_resolution, self.config.max_resolution);
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
    use crate::core::config::ShipConfig;
    use crate::power::PowerPreset;
    use crate::ship::StarChart;

    fn setup() -> (Ops, ShipContext) {
        let config = ShipConfig::default();
        let mut ctx = ShipContext::new(&config, StarChart::sol_system()).unwrap();
        let mut ops = Ops::new(&config.sensors);
        ops.init(&mut ctx);
        (ops, ctx)
    }

    #[test]
    fn test_resolution_follows_sensor_power() {
        let (mut ops, mut ctx) = setup();
        assert_eq!(ops.resolution(), 1.0);

        ops.on_power_changed(&PowerPreset::Science.distribution(), &mut ctx);
        assert!((ops.resolution() - 2.0).abs() < 1e-6);
        assert!((ops.scan_duration(ScanType::Standard) - 1.5).abs() < 1e-6);

        ops.on_power_changed(&PowerDistribution::new(40.0, 30.0, 30.0, 0.0), &mut ctx);
        assert!((ops.resolution() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_scan_completes_after_duration() {
        let (mut ops, mut ctx) = setup();
        ops.start_scan("earth", ScanType::Quick, &ctx).unwrap();
        assert!(ops.is_scanning());

        ops.tick(0.5, &mut ctx);
        assert!(ops.record("Earth").is_none());
        ops.tick(0.5, &mut ctx);

        let record = ops.record("Earth").unwrap();
        assert_eq!(record.class, "planet");
        assert!(record.radius.is_none());
        assert!((record.distance - 4360.0).abs() <= 4360.0 * 0.1 + 1.0);
        assert!(ctx
            .events
            .pending()
            .iter()
            .any(|e| matches!(e, ShipEvent::ScanComplete { .. })));
    }

    #[test]
    fn test_one_scan_at_a_time() {
        let (mut ops, ctx) = setup();
        ops.start_scan("Earth", ScanType::Deep, &ctx).unwrap();
        let err = ops.start_scan("Moon", ScanType::Quick, &ctx).unwrap_err();
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let (mut ops, ctx) = setup();
        assert!(ops.start_scan("Neptune", ScanType::Standard, &ctx).is_err());
    }

    #[test]
    fn test_sweep_sorted_nearest_first() {
        let (mut ops, ctx) = setup();
        let result = ops.sweep(&ctx);
        assert!(result.success);

        let names: Vec<&str> = ops.contacts().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(&names[..3], &["Earth", "Starbase 1", "Moon"]);
        assert!(ops
            .contacts()
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance));
        assert!(!names.contains(&"Neptune"));
    }

    #[test]
    fn test_detailed_scan_resolves_radius() {
        let (mut ops, mut ctx) = setup();
        ops.start_scan("Moon", ScanType::Detailed, &ctx).unwrap();
        ops.tick(6.0, &mut ctx);
        assert_eq!(ops.record("moon").unwrap().radius, Some(170.0));
    }

    #[test]
    fn test_scan_type_aliases() {
        assert_eq!("Detailed".parse::<ScanType>(), Ok(ScanType::Detailed));
        assert_eq!("long range".parse::<ScanType>(), Ok(ScanType::Deep));
    }
}

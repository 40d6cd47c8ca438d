//! Core type definitions used throughout the codebase

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Seconds of simulated time
pub type Seconds = f64;

/// Ship-wide readiness state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    Green,
    Yellow,
    Red,
}

impl AlertLevel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlertLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "green" | "normal" | "standdown" | "stand_down" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "red" => Ok(Self::Red),
            other => Err(format!("unknown alert level '{}'", other)),
        }
    }
}

/// A functional area of the ship exposed as one subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Helm,
    Tactical,
    Engineering,
    Ops,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Engineering,
        Department::Tactical,
        Department::Ops,
        Department::Helm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Helm => "helm",
            Self::Tactical => "tactical",
            Self::Engineering => "engineering",
            Self::Ops => "ops",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unit vector for a yaw/pitch pair in degrees.
///
/// Yaw 0 faces -Z; positive yaw turns to starboard (towards +X).
pub fn forward_vector(yaw_deg: f32, pitch_deg: f32) -> Vec3 {
    let yaw = yaw_deg.to_radians();
    let pitch = pitch_deg.to_radians();
    Vec3::new(
        yaw.sin() * pitch.cos(),
        pitch.sin(),
        -yaw.cos() * pitch.cos(),
    )
}

/// Absolute yaw (degrees, [0, 360)) that points from `from` towards `to`
pub fn yaw_towards(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    normalize_degrees(d.x.atan2(-d.z).to_degrees())
}

/// Pitch (degrees) that points from `from` towards `to`
pub fn pitch_towards(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    let flat = (d.x * d.x + d.z * d.z).sqrt();
    d.y.atan2(flat).to_degrees()
}

/// Wrap an angle into [0, 360)
pub fn normalize_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed difference `to - from` in degrees, in (-180, 180]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    let mut d = normalize_degrees(to) - normalize_degrees(from);
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

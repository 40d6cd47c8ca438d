//! Ship kinematics
//!
//! No force model: at impulse velocity follows heading and throttle, at warp
//! the warp drive sets velocity directly. Position always integrates
//! `velocity * dt`, and rotation stays steerable in both modes.

use glam::Vec3;
use serde::Serialize;

use crate::core::types::{angle_delta, forward_vector, normalize_degrees};

#[derive(Debug, Clone, Serialize)]
pub struct ShipBody {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Degrees, [0, 360); 0 faces -Z
    pub yaw: f32,
    /// Degrees, [-90, 90]
    pub pitch: f32,
    target_yaw: f32,
    target_pitch: f32,
    /// Degrees per second
    turn_rate: f32,
    /// Throttle, 0-100
    impulse_percent: f32,
    /// World units per second at full impulse
    impulse_speed_limit: f32,
}

impl ShipBody {
    pub fn new(position: Vec3, turn_rate: f32, impulse_speed_limit: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            target_yaw: 0.0,
            target_pitch: 0.0,
            turn_rate,
            impulse_percent: 0.0,
            impulse_speed_limit,
        }
    }

    pub fn forward(&self) -> Vec3 {
        forward_vector(self.yaw, self.pitch)
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn impulse_percent(&self) -> f32 {
        self.impulse_percent
    }

    pub fn set_impulse(&mut self, percent: f32) {
        self.impulse_percent = percent.clamp(0.0, 100.0);
    }

    pub fn impulse_speed_limit(&self) -> f32 {
        self.impulse_speed_limit
    }

    /// Full-impulse speed, rescaled whenever propulsion power changes
    pub fn set_impulse_speed_limit(&mut self, limit: f32) {
        self.impulse_speed_limit = limit.max(0.0);
    }

    pub fn target_heading(&self) -> (f32, f32) {
        (self.target_yaw, self.target_pitch)
    }

    /// Commanded heading; the ship turns toward it at `turn_rate`
    pub fn set_heading(&mut self, yaw: f32, pitch: f32) {
        self.target_yaw = normalize_degrees(yaw);
        self.target_pitch = pitch.clamp(-90.0, 90.0);
    }

    /// Turn relative to the current commanded heading
    pub fn turn_by(&mut self, degrees: f32) {
        self.set_heading(self.target_yaw + degrees, self.target_pitch);
    }

    pub fn is_turning(&self) -> bool {
        angle_delta(self.yaw, self.target_yaw).abs() > 0.01
            || (self.target_pitch - self.pitch).abs() > 0.01
    }

    /// Rotate toward the commanded heading
    pub fn steer(&mut self, dt: f32) {
        let max_step = self.turn_rate * dt;

        let dyaw = angle_delta(self.yaw, self.target_yaw);
        self.yaw = normalize_degrees(self.yaw + dyaw.clamp(-max_step, max_step));

        let dpitch = self.target_pitch - self.pitch;
        self.pitch += dpitch.clamp(-max_step, max_step);
    }

    /// Velocity at the current throttle and heading
    pub fn impulse_velocity(&self) -> Vec3 {
        self.forward() * (self.impulse_percent / 100.0) * self.impulse_speed_limit
    }

    /// Advance position; at impulse the velocity is re-derived from throttle first
    pub fn integrate(&mut self, dt: f32, at_warp: bool) {
        if !at_warp {
            self.velocity = self.impulse_velocity();
        }
        self.position += self.velocity * dt;
    }

    /// Kill throttle and velocity
    pub fn all_stop(&mut self) {
        self.impulse_percent = 0.0;
        self.velocity = Vec3::ZERO;
    }
}

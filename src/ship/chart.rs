//! Known celestial bodies
//!
//! The chart is supplied by the environment layer; the core only reads it
//! for proximity checks, sensor sweeps, targeting and navigation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyClass {
    Star,
    Planet,
    Moon,
    Station,
    Vessel,
    Anomaly,
}

impl BodyClass {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Star => "star",
            Self::Planet => "planet",
            Self::Moon => "moon",
            Self::Station => "station",
            Self::Vessel => "vessel",
            Self::Anomaly => "anomaly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub name: String,
    pub class: BodyClass,
    pub position: Vec3,
    /// Drift per second
    #[serde(default)]
    pub velocity: Vec3,
    pub radius: f32,
}

impl CelestialBody {
    pub fn new(name: impl Into<String>, class: BodyClass, position: Vec3, radius: f32) -> Self {
        Self {
            name: name.into(),
            class,
            position,
            velocity: Vec3::ZERO,
            radius,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Distance from `point` to this body's surface (never negative)
    pub fn surface_distance(&self, point: Vec3) -> f32 {
        (self.position.distance(point) - self.radius).max(0.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StarChart {
    bodies: Vec<CelestialBody>,
}

impl StarChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inner Sol system plus Starbase 1, scaled for the simulation
    pub fn sol_system() -> Self {
        let mut chart = Self::new();
        chart.add(CelestialBody::new("Sun", BodyClass::Star, Vec3::ZERO, 7_000.0));
        chart.add(CelestialBody::new(
            "Mercury",
            BodyClass::Planet,
            Vec3::new(0.0, 0.0, -39_000.0),
            240.0,
        ));
        chart.add(CelestialBody::new(
            "Venus",
            BodyClass::Planet,
            Vec3::new(52_000.0, 0.0, -48_000.0),
            600.0,
        ));
        chart.add(CelestialBody::new(
            "Earth",
            BodyClass::Planet,
            Vec3::new(100_000.0, 0.0, 0.0),
            640.0,
        ));
        chart.add(CelestialBody::new(
            "Moon",
            BodyClass::Moon,
            Vec3::new(103_800.0, 0.0, 0.0),
            170.0,
        ));
        chart.add(CelestialBody::new(
            "Starbase 1",
            BodyClass::Station,
            Vec3::new(101_500.0, 200.0, 0.0),
            50.0,
        ));
        chart.add(CelestialBody::new(
            "Mars",
            BodyClass::Planet,
            Vec3::new(-120_000.0, 0.0, 90_000.0),
            340.0,
        ));
        chart.add(CelestialBody::new(
            "Jupiter",
            BodyClass::Planet,
            Vec3::new(0.0, 0.0, 520_000.0),
            7_000.0,
        ));
        chart.add(CelestialBody::new(
            "Saturn",
            BodyClass::Planet,
            Vec3::new(-950_000.0, 0.0, 0.0),
            5_800.0,
        ));
        chart.add(CelestialBody::new(
            "Uranus",
            BodyClass::Planet,
            Vec3::new(0.0, 0.0, -1_920_000.0),
            2_500.0,
        ));
        chart.add(CelestialBody::new(
            "Neptune",
            BodyClass::Planet,
            Vec3::new(3_000_000.0, 0.0, 0.0),
            2_460.0,
        ));
        chart
    }

    /// Add or replace a body (names are unique, case-insensitive)
    pub fn add(&mut self, body: CelestialBody) {
        if let Some(existing) = self
            .bodies
            .iter_mut()
            .find(|b| b.name.eq_ignore_ascii_case(&body.name))
        {
            *existing = body;
        } else {
            self.bodies.push(body);
        }
    }

    pub fn bodies(&self) -> &[CelestialBody] {
        &self.bodies
    }

    pub fn find(&self, name: &str) -> Option<&CelestialBody> {
        self.bodies
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Nearest body by surface distance
    pub fn nearest(&self, point: Vec3) -> Option<(&CelestialBody, f32)> {
        self.bodies
            .iter()
            .map(|b| (b, b.surface_distance(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Bodies whose surface lies within `range`, nearest first
    pub fn within(&self, point: Vec3, range: f32) -> Vec<(&CelestialBody, f32)> {
        let mut found: Vec<_> = self
            .bodies
            .iter()
            .map(|b| (b, b.surface_distance(point)))
            .filter(|(_, d)| *d <= range)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }

    /// Move drifting bodies (vessels, debris) along their velocity
    pub fn advance(&mut self, dt: f32) {
        for body in &mut self.bodies {
            if body.velocity != Vec3::ZERO {
                body.position += body.velocity * dt;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        let chart = StarChart::sol_system();
        assert!(chart.find("earth").is_some());
        assert!(chart.find(" STARBASE 1 ").is_some());
        assert!(chart.find("Vulcan").is_none());
    }

    #[test]
    fn test_nearest_uses_surface_distance() {
        let mut chart = StarChart::new();
        chart.add(CelestialBody::new("Giant", BodyClass::Planet, Vec3::new(1000.0, 0.0, 0.0), 900.0));
        chart.add(CelestialBody::new("Pebble", BodyClass::Moon, Vec3::new(-500.0, 0.0, 0.0), 1.0));

        let (body, distance) = chart.nearest(Vec3::ZERO).unwrap();
        assert_eq!(body.name, "Giant");
        assert!((distance - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_within_sorted_nearest_first() {
        let chart = StarChart::sol_system();
        let near_earth = Vec3::new(101_000.0, 0.0, 0.0);
        let found = chart.within(near_earth, 5_000.0);
        let names: Vec<_> = found.iter().map(|(b, _)| b.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"Earth"));
        assert!(names.contains(&"Starbase 1"));
        assert!(names.contains(&"Moon"));
        assert!(found.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut chart = StarChart::new();
        chart.add(CelestialBody::new("Bird of Prey", BodyClass::Vessel, Vec3::ZERO, 20.0));
        chart.add(CelestialBody::new("bird of prey", BodyClass::Vessel, Vec3::X, 20.0));
        assert_eq!(chart.bodies().len(), 1);
        assert_eq!(chart.bodies()[0].position, Vec3::X);
    }

    #[test]
    fn test_advance_moves_drifting_bodies() {
        let mut chart = StarChart::new();
        chart.add(
            CelestialBody::new("Freighter", BodyClass::Vessel, Vec3::ZERO, 10.0)
                .with_velocity(Vec3::new(5.0, 0.0, 0.0)),
        );
        chart.advance(2.0);
        assert_eq!(chart.find("Freighter").unwrap().position, Vec3::new(10.0, 0.0, 0.0));
    }
}

//! Crossover - a deterministic 2D arena simulation
//!
//! Core modules:
//! - `sim`: Fixed-timestep simulation (pools, geometry, entities, world)
//! - `config`: Initialization-time arena parameters

pub mod config;
pub mod sim;

pub use config::{ArenaConfig, ConfigError};

use glam::Vec2;

/// Arena configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const WORLD_TIMESTEP: f32 = 1.0 / 60.0;

    /// Pool capacities
    pub const MAX_N_DUDES: usize = 16;
    pub const MAX_N_BULLETS: usize = 256;
    pub const MAX_N_OBSTACLES: usize = 64;

    /// Dude defaults
    pub const DUDE_RADIUS: f32 = 1.0;
    pub const DUDE_MAX_HEALTH: f32 = 100.0;
    pub const DUDE_MOVE_SPEED: f32 = 3.0;
    /// Shots per second
    pub const DUDE_FIRE_RATE: f32 = 4.0;

    /// Vision defaults
    pub const DUDE_N_VIEW_RAYS: usize = 16;
    pub const DUDE_VIEW_ANGLE: f32 = 70.0 * std::f32::consts::PI / 180.0;
    pub const DUDE_VIEW_DISTANCE: f32 = 5.0;

    /// Dummy AI drifts at this fraction of its move speed
    pub const DUMMY_SPEED_FRACTION: f32 = 0.1;

    /// Bullet defaults
    pub const BULLET_TTL: f32 = 5.0;
    pub const BULLET_SPEED: f32 = 20.0;
    pub const BULLET_DAMAGE: f32 = 10.0;

    /// Upper bound on rays in a single fan
    pub const MAX_RAYS_IN_FAN: usize = 64;

    /// Camera zoom (pixels per world unit)
    pub const CAMERA_ZOOM: f32 = 25.0;
    pub const SCREEN_WIDTH: f32 = 1024.0;
    pub const SCREEN_HEIGHT: f32 = 768.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

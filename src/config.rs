//! Arena parameters
//!
//! Fixed for the lifetime of a world: chosen once at construction, either the
//! compiled-in defaults or a JSON document.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed arena config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid arena config: {0}")]
    Invalid(&'static str),
}

/// Dude body, movement and vision defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DudeParams {
    pub radius: f32,
    pub max_health: f32,
    pub move_speed: f32,
    /// Shots per second
    pub fire_rate: f32,
    pub n_view_rays: usize,
    /// Total vision cone width (radians)
    pub view_angle: f32,
    pub view_distance: f32,
}

impl Default for DudeParams {
    fn default() -> Self {
        Self {
            radius: DUDE_RADIUS,
            max_health: DUDE_MAX_HEALTH,
            move_speed: DUDE_MOVE_SPEED,
            fire_rate: DUDE_FIRE_RATE,
            n_view_rays: DUDE_N_VIEW_RAYS,
            view_angle: DUDE_VIEW_ANGLE,
            view_distance: DUDE_VIEW_DISTANCE,
        }
    }
}

/// Projectile defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletParams {
    pub speed: f32,
    /// Lifetime in seconds
    pub ttl: f32,
    pub damage: f32,
}

impl Default for BulletParams {
    fn default() -> Self {
        Self {
            speed: BULLET_SPEED,
            ttl: BULLET_TTL,
            damage: BULLET_DAMAGE,
        }
    }
}

/// Complete world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Seconds per tick
    pub timestep: f32,

    // === Capacities ===
    pub max_dudes: usize,
    pub max_bullets: usize,
    pub max_obstacles: usize,

    // === Entities ===
    pub dude: DudeParams,
    pub bullet: BulletParams,

    // === View ===
    pub screen_width: f32,
    pub screen_height: f32,
    pub camera_zoom: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            timestep: WORLD_TIMESTEP,

            max_dudes: MAX_N_DUDES,
            max_bullets: MAX_N_BULLETS,
            max_obstacles: MAX_N_OBSTACLES,

            dude: DudeParams::default(),
            bullet: BulletParams::default(),

            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            camera_zoom: CAMERA_ZOOM,
        }
    }
}

impl ArenaConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        log::info!("Loaded arena config");
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timestep > 0.0) {
            return Err(ConfigError::Invalid("timestep must be positive"));
        }
        if self.max_dudes == 0 || self.max_bullets == 0 || self.max_obstacles == 0 {
            return Err(ConfigError::Invalid("pool capacities must be non-zero"));
        }
        if !(self.dude.radius > 0.0) {
            return Err(ConfigError::Invalid("dude radius must be positive"));
        }
        if !(self.dude.max_health > 0.0) {
            return Err(ConfigError::Invalid("dude max health must be positive"));
        }
        if self.dude.move_speed < 0.0 {
            return Err(ConfigError::Invalid("dude move speed must not be negative"));
        }
        if !(self.dude.fire_rate > 0.0) {
            return Err(ConfigError::Invalid("dude fire rate must be positive"));
        }
        if self.dude.n_view_rays > MAX_RAYS_IN_FAN {
            return Err(ConfigError::Invalid("too many view rays"));
        }
        if !(self.bullet.ttl > 0.0) {
            return Err(ConfigError::Invalid("bullet ttl must be positive"));
        }
        if !(self.camera_zoom > 0.0) {
            return Err(ConfigError::Invalid("camera zoom must be positive"));
        }
        Ok(())
    }
}

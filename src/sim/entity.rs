//! Arena entities: dudes, bullets and obstacles
//!
//! Entities are plain values stored by copy in the world's pools. Cross
//! references (a bullet's owner) are pool handles, never pointers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::pool::{Handle, Pool};
use crate::config::{BulletParams, DudeParams};

/// Per-dude decision policy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AiKind {
    /// Stands still, never fires
    #[default]
    None,
    /// Driven by polled input
    Manual,
    /// Drifts along a fixed direction at a fraction of its move speed
    Dummy { direction: Vec2, speed_fraction: f32 },
}

impl AiKind {
    /// Dummy drifting left at the default fraction of move speed
    pub fn dummy() -> Self {
        AiKind::Dummy {
            direction: Vec2::NEG_X,
            speed_fraction: crate::consts::DUMMY_SPEED_FRACTION,
        }
    }
}

/// What a vision ray ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitKind {
    #[default]
    None,
    Dude,
    Obstacle,
}

/// Result of one vision ray for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RayHit {
    pub origin: Vec2,
    /// Hit point, or the ray's far end when nothing was hit
    pub end_point: Vec2,
    pub hit_kind: HitKind,
    pub distance: f32,
}

/// A mobile agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dude {
    pub position: Vec2,
    /// Facing angle in radians
    pub orientation: f32,
    pub health: f32,
    pub max_health: f32,
    pub body_radius: f32,
    pub move_speed: f32,
    /// Shots per second
    pub fire_rate: f32,
    pub ai: AiKind,
    pub last_shot_time: f32,

    // eyes
    /// Vision cone width (radians)
    pub view_angle: f32,
    pub view_distance: f32,
    rays: Vec<RayHit>,
}

impl Dude {
    pub fn new(position: Vec2, ai: AiKind, params: &DudeParams) -> Self {
        Self {
            position,
            orientation: 0.0,
            health: params.max_health,
            max_health: params.max_health,
            body_radius: params.radius,
            move_speed: params.move_speed,
            fire_rate: params.fire_rate,
            ai,
            // Ready to fire on the first tick
            last_shot_time: -1.0 / params.fire_rate,
            view_angle: params.view_angle,
            view_distance: params.view_distance,
            rays: vec![
                RayHit {
                    origin: position,
                    end_point: position,
                    ..Default::default()
                };
                params.n_view_rays
            ],
        }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Number of vision rays, fixed at spawn
    #[inline]
    pub fn n_view_rays(&self) -> usize {
        self.rays.len()
    }

    /// Vision results from the most recent update
    #[inline]
    pub fn rays(&self) -> &[RayHit] {
        &self.rays
    }

    pub(crate) fn rays_mut(&mut self) -> &mut [RayHit] {
        &mut self.rays
    }

    /// Whether enough time has passed since the last shot at `time`
    #[inline]
    pub fn can_fire(&self, time: f32) -> bool {
        time - self.last_shot_time >= 1.0 / self.fire_rate
    }

    pub fn apply_damage(&mut self, damage: f32) {
        self.health -= damage;
    }
}

/// A projectile, tested as a swept segment each tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bullet {
    pub prev_position: Vec2,
    pub curr_position: Vec2,
    pub velocity: Vec2,
    /// Seconds left before expiring
    pub ttl: f32,
    pub damage: f32,
    /// Firing dude; exempt from this bullet's damage while it is alive
    pub owner: Option<Handle>,
}

impl Bullet {
    pub fn new(position: Vec2, velocity: Vec2, owner: Option<Handle>, params: &BulletParams) -> Self {
        Self {
            prev_position: position,
            curr_position: position,
            velocity,
            ttl: params.ttl,
            damage: params.damage,
            owner,
        }
    }

    /// Advance one step, keeping the pre-step location for the swept test
    pub fn advance(&mut self, dt: f32) {
        self.prev_position = self.curr_position;
        self.curr_position += self.velocity * dt;
        self.ttl -= dt;
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.ttl <= 0.0
    }

    /// Owner handle if it still names a live dude; stale handles mean no owner
    pub fn live_owner(&self, dudes: &Pool<Dude>) -> Option<Handle> {
        self.owner.filter(|h| dudes.contains(*h))
    }
}

/// A static axis-aligned wall
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rect,
}

impl Obstacle {
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (arena generation, never inside a tick)
//! - Stable iteration order (ascending pool slot)
//! - No rendering or platform dependencies

pub mod ai;
pub mod camera;
pub mod entity;
pub mod geometry;
pub mod layout;
pub mod pool;
pub mod tick;
pub mod world;

pub use ai::{Controls, DecisionContext, Intent, decide};
pub use camera::Camera;
pub use entity::{AiKind, Bullet, Dude, HitKind, Obstacle, RayHit};
pub use geometry::{
    CircleHits, RaysFan, Rect, circle_circle_mtv, circle_polygon_mtv, circle_rect_mtv, rays_fan,
    segment_circle_intersections, segment_circle_nearest, segment_polygon_nearest,
    segment_rect_nearest, segment_segment_intersection,
};
pub use layout::{ArenaLayout, Populated};
pub use pool::{Handle, Pool, PoolError};
pub use tick::{FrameClock, TickInput};
pub use world::{World, WorldError, WorldEvent};

//! The arena world
//!
//! Owns one pool per entity kind and advances them one fixed tick at a time.
//! Within a tick, dudes update before bullets, each pass in ascending slot
//! order. Entities that end during a pass are marked and only freed once the
//! pass is over.

use glam::Vec2;
use thiserror::Error;

use super::ai::{self, Controls, DecisionContext};
use super::camera::Camera;
use super::entity::{AiKind, Bullet, Dude, HitKind, Obstacle, RayHit};
use super::geometry::{
    Rect, circle_circle_mtv, circle_rect_mtv, orientation_vec, rays_fan, segment_circle_nearest,
    segment_rect_nearest, segment_touches_circle, segment_touches_rect,
};
use super::pool::{Handle, Pool, PoolError};
use super::tick::{FrameClock, TickInput};
use crate::config::{ArenaConfig, ConfigError};
use crate::normalize_angle;

/// Unrecoverable world errors
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("can't spawn more dudes (capacity {capacity})")]
    DudeCapacity { capacity: usize },
    #[error("can't spawn more obstacles (capacity {capacity})")]
    ObstacleCapacity { capacity: usize },
    #[error("pool consistency violation: {0}")]
    Pool(#[from] PoolError),
}

/// Things that happened during a tick, in order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEvent {
    DudeSpawned { dude: Handle },
    DudeDied { dude: Handle },
    ShotFired { dude: Handle, bullet: Handle },
    BulletHitDude { bullet: Handle, dude: Handle, damage: f32 },
    BulletHitObstacle { bullet: Handle, obstacle: Handle },
    BulletExpired { bullet: Handle },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    config: ArenaConfig,
    pub camera: Camera,
    dudes: Pool<Dude>,
    bullets: Pool<Bullet>,
    obstacles: Pool<Obstacle>,
    /// Ticks executed so far
    ticks: u64,
    events: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::from_valid_config(ArenaConfig::default())
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: ArenaConfig) -> Self {
        log::info!(
            "World created: {} dudes, {} bullets, {} obstacles, dt={}",
            config.max_dudes,
            config.max_bullets,
            config.max_obstacles,
            config.timestep
        );
        Self {
            camera: Camera::new(config.screen_width, config.screen_height, config.camera_zoom),
            dudes: Pool::with_capacity(config.max_dudes),
            bullets: Pool::with_capacity(config.max_bullets),
            obstacles: Pool::with_capacity(config.max_obstacles),
            ticks: 0,
            events: Vec::new(),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    #[inline]
    pub fn timestep(&self) -> f32 {
        self.config.timestep
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated seconds; always a whole number of timesteps
    #[inline]
    pub fn time(&self) -> f32 {
        self.ticks as f32 * self.config.timestep
    }

    #[inline]
    pub fn dudes(&self) -> &Pool<Dude> {
        &self.dudes
    }

    #[inline]
    pub fn bullets(&self) -> &Pool<Bullet> {
        &self.bullets
    }

    #[inline]
    pub fn obstacles(&self) -> &Pool<Obstacle> {
        &self.obstacles
    }

    pub fn dude(&self, handle: Handle) -> Option<&Dude> {
        self.dudes.get(handle)
    }

    pub fn dude_mut(&mut self, handle: Handle) -> Option<&mut Dude> {
        self.dudes.get_mut(handle)
    }

    pub fn bullet(&self, handle: Handle) -> Option<&Bullet> {
        self.bullets.get(handle)
    }

    /// Events recorded since the last drain
    #[inline]
    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // spawning

    /// Spawn a dude with the configured defaults. Running out of room is fatal.
    pub fn spawn_dude(&mut self, position: Vec2, ai: AiKind) -> Result<Handle, WorldError> {
        let dude = Dude::new(position, ai, &self.config.dude);
        self.insert_dude(dude)
    }

    /// Spawn a fully specified dude
    pub fn insert_dude(&mut self, dude: Dude) -> Result<Handle, WorldError> {
        let position = dude.position;
        let handle = self.dudes.insert(dude).ok_or(WorldError::DudeCapacity {
            capacity: self.dudes.capacity(),
        })?;
        log::debug!("Spawned dude {:?} at {}", handle, position);
        self.events.push(WorldEvent::DudeSpawned { dude: handle });
        Ok(handle)
    }

    /// Spawn a bullet. A full pool drops the bullet with a warning.
    pub fn spawn_bullet(&mut self, position: Vec2, velocity: Vec2, owner: Option<Handle>) -> Option<Handle> {
        let bullet = Bullet::new(position, velocity, owner, &self.config.bullet);
        let handle = self.bullets.insert(bullet);
        if handle.is_none() {
            log::warn!("Can't spawn more bullets (capacity {})", self.bullets.capacity());
        }
        handle
    }

    /// Place a static obstacle. Running out of room is fatal.
    pub fn spawn_obstacle(&mut self, rect: Rect) -> Result<Handle, WorldError> {
        self.obstacles
            .insert(Obstacle::new(rect))
            .ok_or(WorldError::ObstacleCapacity {
                capacity: self.obstacles.capacity(),
            })
    }

    pub fn remove_obstacle(&mut self, handle: Handle) -> Result<Obstacle, WorldError> {
        Ok(self.obstacles.remove(handle)?)
    }

    // -----------------------------------------------------------------------
    // ticking

    /// Run as many ticks as `frame_dt` pays for. Returns the tick count.
    pub fn advance(&mut self, frame_dt: f32, clock: &mut FrameClock, input: &TickInput) -> Result<u32, WorldError> {
        let ticks = clock.advance(frame_dt);
        for _ in 0..ticks {
            self.update(input)?;
        }
        Ok(ticks)
    }

    /// Advance the world by exactly one timestep
    pub fn update(&mut self, input: &TickInput) -> Result<(), WorldError> {
        self.ticks += 1;
        let ctx = DecisionContext {
            time: self.time(),
            timestep: self.timestep(),
            controls: self.controls(input),
        };

        let mut cursor = 0;
        while let Some(handle) = self.dudes.next_live(cursor) {
            cursor = handle.index() + 1;
            self.update_dude(handle, &ctx)?;
        }
        self.dudes.flush_removed();

        let mut cursor = 0;
        while let Some(handle) = self.bullets.next_live(cursor) {
            cursor = handle.index() + 1;
            self.update_bullet(handle)?;
        }
        self.bullets.flush_removed();

        log::trace!(
            "tick {}: {} dudes, {} bullets",
            self.ticks,
            self.dudes.len(),
            self.bullets.len()
        );
        Ok(())
    }

    fn controls(&self, input: &TickInput) -> Controls {
        Controls {
            up: input.up,
            down: input.down,
            left: input.left,
            right: input.right,
            pointer: input.pointer.map(|p| self.camera.screen_to_world(p)),
            trigger: input.trigger,
        }
    }

    fn update_dude(&mut self, handle: Handle, ctx: &DecisionContext) -> Result<(), WorldError> {
        let Some(mut dude) = self.dudes.get(handle).cloned() else {
            return Ok(());
        };

        if dude.is_dead() {
            self.dudes.mark_removed(handle)?;
            log::debug!("Dude {:?} died", handle);
            self.events.push(WorldEvent::DudeDied { dude: handle });
            return Ok(());
        }

        let intent = ai::decide(&dude, ctx);
        dude.position += intent.displacement;
        if let Some(orientation) = intent.orientation {
            dude.orientation = normalize_angle(orientation);
        }

        self.resolve_overlaps(handle, &mut dude);
        self.sense(handle, &mut dude);

        if intent.fire {
            let velocity = orientation_vec(dude.orientation) * self.config.bullet.speed;
            if let Some(bullet) = self.spawn_bullet(dude.position, velocity, Some(handle)) {
                self.events.push(WorldEvent::ShotFired { dude: handle, bullet });
            }
            dude.last_shot_time = ctx.time;
        }

        let slot = self
            .dudes
            .get_mut(handle)
            .ok_or(PoolError::not_present(handle))?;
        *slot = dude;
        Ok(())
    }

    /// Push the dude out of obstacles, then out of other dudes. Each
    /// correction applies before the next overlap test.
    fn resolve_overlaps(&self, handle: Handle, dude: &mut Dude) {
        for obstacle in self.obstacles.values() {
            dude.position += circle_rect_mtv(dude.position, dude.body_radius, obstacle.rect);
        }
        for (other_handle, other) in self.dudes.iter() {
            if other_handle == handle {
                continue;
            }
            dude.position += circle_circle_mtv(dude.position, dude.body_radius, other.position, other.body_radius);
        }
    }

    /// Cast the vision fan and keep the nearest hit per ray
    fn sense(&self, handle: Handle, dude: &mut Dude) {
        let fan = rays_fan(
            dude.position,
            dude.n_view_rays(),
            dude.view_distance,
            dude.view_angle,
            dude.orientation,
        );
        let origin = fan.start;
        let view_distance = dude.view_distance;

        for (ray, &end) in dude.rays_mut().iter_mut().zip(fan.ends()) {
            let mut nearest: Option<(f32, Vec2, HitKind)> = None;
            let mut consider = |point: Vec2, kind: HitKind| {
                let distance = origin.distance(point);
                if nearest.is_none_or(|(best, _, _)| distance < best) {
                    nearest = Some((distance, point, kind));
                }
            };

            for obstacle in self.obstacles.values() {
                if let Some(point) = segment_rect_nearest(origin, end, obstacle.rect) {
                    consider(point, HitKind::Obstacle);
                }
            }
            for (other_handle, other) in self.dudes.iter() {
                if other_handle == handle {
                    continue;
                }
                if let Some(point) = segment_circle_nearest(origin, end, other.position, other.body_radius) {
                    consider(point, HitKind::Dude);
                }
            }

            *ray = match nearest {
                Some((distance, end_point, hit_kind)) => RayHit {
                    origin,
                    end_point,
                    hit_kind,
                    distance,
                },
                None => RayHit {
                    origin,
                    end_point: end,
                    hit_kind: HitKind::None,
                    distance: view_distance,
                },
            };
        }
    }

    fn update_bullet(&mut self, handle: Handle) -> Result<(), WorldError> {
        let dt = self.timestep();
        let Some(bullet) = self.bullets.get_mut(handle) else {
            return Ok(());
        };
        bullet.advance(dt);
        let bullet = *bullet;

        if bullet.is_expired() {
            self.bullets.mark_removed(handle)?;
            self.events.push(WorldEvent::BulletExpired { bullet: handle });
            return Ok(());
        }

        let (start, end) = (bullet.prev_position, bullet.curr_position);

        let hit_obstacle = self
            .obstacles
            .iter()
            .find(|(_, o)| segment_touches_rect(start, end, o.rect))
            .map(|(h, _)| h);
        if let Some(obstacle) = hit_obstacle {
            self.bullets.mark_removed(handle)?;
            self.events.push(WorldEvent::BulletHitObstacle {
                bullet: handle,
                obstacle,
            });
            return Ok(());
        }

        let owner = bullet.live_owner(&self.dudes);
        let hit_dude = self
            .dudes
            .iter()
            .filter(|(h, _)| Some(*h) != owner)
            .find(|(_, d)| segment_touches_circle(start, end, d.position, d.body_radius))
            .map(|(h, _)| h);
        if let Some(dude) = hit_dude {
            if let Some(target) = self.dudes.get_mut(dude) {
                target.apply_damage(bullet.damage);
            }
            self.bullets.mark_removed(handle)?;
            self.events.push(WorldEvent::BulletHitDude {
                bullet: handle,
                dude,
                damage: bullet.damage,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    fn small_config() -> ArenaConfig {
        ArenaConfig {
            max_dudes: 2,
            max_bullets: 3,
            max_obstacles: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_time_advances_in_whole_ticks() {
        let mut world = World::new();
        for _ in 0..3 {
            world.update(&TickInput::default()).unwrap();
        }
        assert_eq!(world.ticks(), 3);
        assert!((world.time() - 3.0 * WORLD_TIMESTEP).abs() < 1e-6);
    }

    #[test]
    fn test_dude_capacity_is_fatal() {
        let mut world = World::with_config(small_config()).unwrap();
        world.spawn_dude(Vec2::ZERO, AiKind::None).unwrap();
        world.spawn_dude(Vec2::new(5.0, 0.0), AiKind::None).unwrap();
        assert!(matches!(
            world.spawn_dude(Vec2::new(10.0, 0.0), AiKind::None),
            Err(WorldError::DudeCapacity { capacity: 2 })
        ));
        assert_eq!(world.dudes().len(), 2);
    }

    #[test]
    fn test_obstacle_capacity_is_fatal() {
        let mut world = World::with_config(small_config()).unwrap();
        world.spawn_obstacle(Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(matches!(
            world.spawn_obstacle(Rect::new(5.0, 0.0, 1.0, 1.0)),
            Err(WorldError::ObstacleCapacity { capacity: 1 })
        ));
    }

    #[test]
    fn test_bullet_capacity_is_silent() {
        let mut world = World::with_config(small_config()).unwrap();
        for i in 0..3 {
            assert!(world.spawn_bullet(Vec2::new(i as f32, 0.0), Vec2::X, None).is_some());
        }
        assert_eq!(world.spawn_bullet(Vec2::ZERO, Vec2::X, None), None);
        assert_eq!(world.bullets().len(), 3);
    }

    #[test]
    fn test_remove_absent_obstacle_is_fatal() {
        let mut world = World::new();
        let wall = world.spawn_obstacle(Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(world.remove_obstacle(wall).is_ok());
        assert!(matches!(world.remove_obstacle(wall), Err(WorldError::Pool(_))));
    }

    #[test]
    fn test_dude_pushed_out_of_obstacle() {
        let mut world = World::new();
        world.spawn_obstacle(Rect::new(1.0, -2.0, 2.0, 4.0)).unwrap();
        let dude = world.spawn_dude(Vec2::new(0.5, 0.0), AiKind::None).unwrap();
        world.update(&TickInput::default()).unwrap();
        let pos = world.dude(dude).unwrap().position;
        assert!(pos.x.abs() < 1e-5);
        assert!(pos.y.abs() < 1e-5);
    }

    #[test]
    fn test_overlapping_dudes_separate() {
        let mut world = World::new();
        let a = world.spawn_dude(Vec2::ZERO, AiKind::None).unwrap();
        let b = world.spawn_dude(Vec2::new(1.0, 0.0), AiKind::None).unwrap();
        world.update(&TickInput::default()).unwrap();
        let pa = world.dude(a).unwrap().position;
        let pb = world.dude(b).unwrap().position;
        // `a` moves first and ends up touching; `b` then sees no overlap
        assert!((pa.distance(pb) - 2.0 * DUDE_RADIUS).abs() < 1e-5);
        assert_eq!(pb, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_sensing_tags_nearest_hit() {
        let mut world = World::new();
        world.spawn_obstacle(Rect::new(3.0, -10.0, 1.0, 20.0)).unwrap();
        let watcher = world.spawn_dude(Vec2::ZERO, AiKind::None).unwrap();
        let mut target = Dude::new(Vec2::new(2.0, 0.0), AiKind::None, &world.config().dude);
        target.body_radius = 0.5;
        world.insert_dude(target).unwrap();

        world.update(&TickInput::default()).unwrap();
        let rays = world.dude(watcher).unwrap().rays();
        assert_eq!(rays.len(), DUDE_N_VIEW_RAYS);

        // Outermost ray passes beside the target and stops at the wall
        let edge = rays[0];
        assert_eq!(edge.hit_kind, HitKind::Obstacle);
        assert!((edge.end_point.x - 3.0).abs() < 1e-4);
        assert!((edge.distance - 3.0 / (DUDE_VIEW_ANGLE / 2.0).cos()).abs() < 1e-3);

        // Central rays stop at the target, in front of the wall
        let center = rays[DUDE_N_VIEW_RAYS / 2];
        assert_eq!(center.hit_kind, HitKind::Dude);
        assert!(center.distance < 1.6);
    }

    #[test]
    fn test_unobstructed_rays_reach_full_distance() {
        let mut world = World::new();
        let dude = world.spawn_dude(Vec2::ZERO, AiKind::None).unwrap();
        world.update(&TickInput::default()).unwrap();
        for ray in world.dude(dude).unwrap().rays() {
            assert_eq!(ray.hit_kind, HitKind::None);
            assert_eq!(ray.distance, DUDE_VIEW_DISTANCE);
            assert!((ray.origin.distance(ray.end_point) - DUDE_VIEW_DISTANCE).abs() < 1e-4);
        }
    }

    #[test]
    fn test_bullet_stopped_by_obstacle() {
        let mut world = World::new();
        let wall = world.spawn_obstacle(Rect::new(0.5, -1.0, 1.0, 2.0)).unwrap();
        let bullet = world.spawn_bullet(Vec2::ZERO, Vec2::new(60.0, 0.0), None).unwrap();
        world.update(&TickInput::default()).unwrap();
        assert!(world.bullet(bullet).is_none());
        assert!(world.events().contains(&WorldEvent::BulletHitObstacle { bullet, obstacle: wall }));
    }

    #[test]
    fn test_bullet_expires() {
        let config = ArenaConfig {
            bullet: crate::config::BulletParams {
                ttl: 2.5 * WORLD_TIMESTEP,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut world = World::with_config(config).unwrap();
        let bullet = world.spawn_bullet(Vec2::ZERO, Vec2::X, None).unwrap();
        world.update(&TickInput::default()).unwrap();
        world.update(&TickInput::default()).unwrap();
        assert!(world.bullet(bullet).is_some());
        world.update(&TickInput::default()).unwrap();
        assert!(world.bullet(bullet).is_none());
        assert!(world.events().contains(&WorldEvent::BulletExpired { bullet }));
    }

    #[test]
    fn test_shooter_not_hit_by_own_bullet() {
        let mut world = World::new();
        let shooter = world.spawn_dude(Vec2::ZERO, AiKind::Manual).unwrap();
        // Pointer four units to the right in world space
        let pointer = world.camera.world_to_screen(Vec2::new(4.0, 0.0));
        let input = TickInput {
            pointer: Some(pointer),
            trigger: true,
            ..Default::default()
        };
        world.update(&input).unwrap();

        assert_eq!(world.bullets().len(), 1);
        let (_, bullet) = world.bullets().iter().next().unwrap();
        assert_eq!(bullet.owner, Some(shooter));
        assert!(bullet.velocity.x > 0.0);
        assert_eq!(world.dude(shooter).unwrap().health, DUDE_MAX_HEALTH);
    }
}

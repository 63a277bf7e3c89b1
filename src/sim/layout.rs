//! Seeded arena generation
//!
//! Builds a walled arena with scattered interior blocks and a cast of dudes.
//! The same seed always yields the same arena.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::AiKind;
use super::geometry::{Rect, circle_rect_mtv};
use super::pool::Handle;
use super::world::{World, WorldError};

/// Wall thickness around the arena edge
const WALL_THICKNESS: f32 = 1.0;
/// Attempts per placement before giving up on that block or dude
const MAX_PLACEMENT_TRIES: u32 = 32;

/// Arena generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaLayout {
    pub seed: u64,
    /// Half extents of the playable area
    pub half_size: Vec2,
    /// Interior blocks to scatter (some may be skipped if no room is found)
    pub n_blocks: usize,
    pub min_block_size: f32,
    pub max_block_size: f32,
    /// Dummy dudes to place
    pub n_dummies: usize,
    /// Keep this radius around the origin clear for the player
    pub spawn_clearance: f32,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self {
            seed: 0,
            half_size: Vec2::new(18.0, 13.0),
            n_blocks: 6,
            min_block_size: 1.0,
            max_block_size: 4.0,
            n_dummies: 4,
            spawn_clearance: 4.0,
        }
    }
}

/// What `populate` placed
#[derive(Debug, Clone, Default)]
pub struct Populated {
    pub player: Option<Handle>,
    pub dummies: Vec<Handle>,
    pub obstacles: Vec<Handle>,
}

impl ArenaLayout {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Four boundary walls enclosing the playable area
    pub fn walls(&self) -> [Rect; 4] {
        let h = self.half_size;
        let t = WALL_THICKNESS;
        [
            Rect::new(-h.x - t, -h.y - t, 2.0 * (h.x + t), t),
            Rect::new(-h.x - t, h.y, 2.0 * (h.x + t), t),
            Rect::new(-h.x - t, -h.y, t, 2.0 * h.y),
            Rect::new(h.x, -h.y, t, 2.0 * h.y),
        ]
    }

    /// Fill `world` with walls, blocks, a manual player at the origin and
    /// dummies. Capacity errors from walls, blocks or dudes propagate.
    pub fn populate(&self, world: &mut World) -> Result<Populated, WorldError> {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut placed = Populated::default();
        let mut rects: Vec<Rect> = Vec::new();

        for wall in self.walls() {
            placed.obstacles.push(world.spawn_obstacle(wall)?);
            rects.push(wall);
        }

        for _ in 0..self.n_blocks {
            if let Some(rect) = self.place_block(&mut rng, &rects) {
                placed.obstacles.push(world.spawn_obstacle(rect)?);
                rects.push(rect);
            }
        }

        placed.player = Some(world.spawn_dude(Vec2::ZERO, AiKind::Manual)?);

        let radius = world.config().dude.radius;
        let mut taken = vec![Vec2::ZERO];
        for _ in 0..self.n_dummies {
            if let Some(position) = self.place_dude(&mut rng, radius, &rects, &taken) {
                placed.dummies.push(world.spawn_dude(position, AiKind::dummy())?);
                taken.push(position);
            }
        }

        log::info!(
            "Arena generated (seed {}): {} obstacles, {} dummies",
            self.seed,
            placed.obstacles.len(),
            placed.dummies.len()
        );
        Ok(placed)
    }

    fn random_point(&self, rng: &mut Pcg32, margin: f32) -> Vec2 {
        let h = self.half_size - Vec2::splat(margin);
        Vec2::new(rng.random_range(-h.x..=h.x), rng.random_range(-h.y..=h.y))
    }

    fn place_block(&self, rng: &mut Pcg32, existing: &[Rect]) -> Option<Rect> {
        for _ in 0..MAX_PLACEMENT_TRIES {
            let size = Vec2::new(
                rng.random_range(self.min_block_size..=self.max_block_size),
                rng.random_range(self.min_block_size..=self.max_block_size),
            );
            let center = self.random_point(rng, 0.5 * self.max_block_size);
            let rect = Rect::from_center(center, size);

            let clear_of_spawn = circle_rect_mtv(Vec2::ZERO, self.spawn_clearance, rect) == Vec2::ZERO;
            if clear_of_spawn && !existing.iter().any(|r| r.overlaps(&rect)) {
                return Some(rect);
            }
        }
        log::debug!("No room for another block");
        None
    }

    fn place_dude(&self, rng: &mut Pcg32, radius: f32, rects: &[Rect], taken: &[Vec2]) -> Option<Vec2> {
        for _ in 0..MAX_PLACEMENT_TRIES {
            let position = self.random_point(rng, radius);
            let hits_wall = rects
                .iter()
                .any(|r| circle_rect_mtv(position, radius, *r) != Vec2::ZERO);
            let crowded = taken
                .iter()
                .any(|p| p.distance(position) < self.spawn_clearance.max(2.0 * radius));
            if !hits_wall && !crowded {
                return Some(position);
            }
        }
        log::debug!("No room for another dude");
        None
    }
}

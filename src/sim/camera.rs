//! World/screen view transform

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 2D camera: `target` in world space appears at `offset` in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub offset: Vec2,
    pub target: Vec2,
    /// Pixels per world unit
    pub zoom: f32,
}

impl Camera {
    /// Camera centered on the world origin
    pub fn new(screen_width: f32, screen_height: f32, zoom: f32) -> Self {
        Self {
            offset: Vec2::new(0.5 * screen_width, 0.5 * screen_height),
            target: Vec2::ZERO,
            zoom,
        }
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) / self.zoom + self.target
    }

    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.target) * self.zoom + self.offset
    }
}

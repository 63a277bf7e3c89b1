//! Per-dude decision policy
//!
//! `decide` turns a dude's state and the tick's input into an [`Intent`]. It
//! does no collision work; the world applies the intent and resolves overlap
//! afterwards.

use glam::Vec2;

use super::entity::{AiKind, Dude};
use super::geometry::vec_orientation;

/// Polled input relevant to decisions, pointer already in world space
#[derive(Debug, Clone, Copy, Default)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub pointer: Option<Vec2>,
    pub trigger: bool,
}

/// Everything `decide` may read besides the dude itself
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext {
    pub time: f32,
    pub timestep: f32,
    pub controls: Controls,
}

/// What a dude wants to do this tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Intent {
    /// Position change before collision resolution
    pub displacement: Vec2,
    /// New facing, if any
    pub orientation: Option<f32>,
    pub fire: bool,
}

pub fn decide(dude: &Dude, ctx: &DecisionContext) -> Intent {
    match dude.ai {
        AiKind::None => Intent::default(),
        AiKind::Manual => manual(dude, ctx),
        AiKind::Dummy {
            direction,
            speed_fraction,
        } => Intent {
            displacement: direction * dude.move_speed * speed_fraction * ctx.timestep,
            ..Default::default()
        },
    }
}

fn manual(dude: &Dude, ctx: &DecisionContext) -> Intent {
    let c = &ctx.controls;
    let mut dir = Vec2::ZERO;
    if c.up {
        dir.y -= 1.0;
    }
    if c.down {
        dir.y += 1.0;
    }
    if c.left {
        dir.x -= 1.0;
    }
    if c.right {
        dir.x += 1.0;
    }

    let orientation = c
        .pointer
        .map(|p| p - dude.position)
        .filter(|to_pointer| to_pointer.length_squared() > f32::EPSILON)
        .map(vec_orientation);

    Intent {
        displacement: dir.normalize_or_zero() * dude.move_speed * ctx.timestep,
        orientation,
        fire: c.trigger && dude.can_fire(ctx.time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DudeParams;
    use std::f32::consts::FRAC_PI_2;

    fn ctx(controls: Controls) -> DecisionContext {
        DecisionContext {
            time: 1.0,
            timestep: 0.5,
            controls,
        }
    }

    #[test]
    fn test_none_does_nothing() {
        let dude = Dude::new(Vec2::ZERO, AiKind::None, &DudeParams::default());
        let controls = Controls {
            up: true,
            trigger: true,
            ..Default::default()
        };
        assert_eq!(decide(&dude, &ctx(controls)), Intent::default());
    }

    #[test]
    fn test_manual_diagonal_is_normalized() {
        let dude = Dude::new(Vec2::ZERO, AiKind::Manual, &DudeParams::default());
        let intent = decide(
            &dude,
            &ctx(Controls {
                up: true,
                right: true,
                ..Default::default()
            }),
        );
        let expected_len = dude.move_speed * 0.5;
        assert!((intent.displacement.length() - expected_len).abs() < 1e-5);
        assert!(intent.displacement.x > 0.0 && intent.displacement.y < 0.0);
    }

    #[test]
    fn test_manual_opposite_keys_cancel() {
        let dude = Dude::new(Vec2::ZERO, AiKind::Manual, &DudeParams::default());
        let intent = decide(
            &dude,
            &ctx(Controls {
                left: true,
                right: true,
                ..Default::default()
            }),
        );
        assert_eq!(intent.displacement, Vec2::ZERO);
    }

    #[test]
    fn test_manual_faces_pointer_and_fires() {
        let dude = Dude::new(Vec2::new(1.0, 1.0), AiKind::Manual, &DudeParams::default());
        let intent = decide(
            &dude,
            &ctx(Controls {
                pointer: Some(Vec2::new(1.0, 4.0)),
                trigger: true,
                ..Default::default()
            }),
        );
        assert!((intent.orientation.unwrap() - FRAC_PI_2).abs() < 1e-5);
        assert!(intent.fire);

        // Pointer on top of the dude leaves facing unchanged
        let intent = decide(
            &dude,
            &ctx(Controls {
                pointer: Some(dude.position),
                ..Default::default()
            }),
        );
        assert_eq!(intent.orientation, None);
    }

    #[test]
    fn test_manual_fire_respects_cooldown() {
        let mut dude = Dude::new(Vec2::ZERO, AiKind::Manual, &DudeParams::default());
        dude.last_shot_time = 1.0;
        let intent = decide(
            &dude,
            &ctx(Controls {
                trigger: true,
                ..Default::default()
            }),
        );
        assert!(!intent.fire);
    }

    #[test]
    fn test_dummy_drifts_without_firing() {
        let dude = Dude::new(Vec2::ZERO, AiKind::dummy(), &DudeParams::default());
        let intent = decide(
            &dude,
            &ctx(Controls {
                trigger: true,
                ..Default::default()
            }),
        );
        let expected = -dude.move_speed * crate::consts::DUMMY_SPEED_FRACTION * 0.5;
        assert!((intent.displacement.x - expected).abs() < 1e-6);
        assert_eq!(intent.displacement.y, 0.0);
        assert!(!intent.fire);
    }
}

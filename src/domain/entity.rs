/// Entities: Player, TerrainSegment, Collectible, GoalMarker.
///
/// Every placed object carries a `Body` (position, dimension, origin and a
/// bounds rectangle relative to the position). Behaviour lives on the
/// variant that owns it: only the player has a jump state machine, only
/// collectibles have a collected flag.

use crate::config::PhysicsConfig;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }
}

/// Axis-aligned rectangle, `(x, y)` is the bottom-left corner.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    pub fn top(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }
}

/// Spatial attributes shared by every placed object.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Body {
    pub position: Vec2,
    pub dimension: Vec2,
    /// Pivot used by the renderer; does not affect collision.
    pub origin: Vec2,
    /// Collision box, offset relative to `position`.
    pub bounds: Rect,
}

impl Body {
    /// Body whose bounds cover exactly its dimension.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Body {
            position: Vec2::new(x, y),
            dimension: Vec2::new(w, h),
            origin: Vec2::ZERO,
            bounds: Rect::new(0.0, 0.0, w, h),
        }
    }

    /// Collision box in world coordinates.
    #[inline]
    pub fn world_bounds(&self) -> Rect {
        Rect::new(
            self.position.x + self.bounds.x,
            self.position.y + self.bounds.y,
            self.bounds.w,
            self.bounds.h,
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Horizontal movement intent for one tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
}

/// Frame input: abstracted intents, already polled by the front end.
/// `jump` is level-triggered (held), not edge-triggered.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<MoveDir>,
    pub jump: bool,
}

/// Player vertical motion state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpState {
    Grounded,
    /// Jump impulse active.
    JumpRising,
    /// Jump released or timed out; the minimum hop still applies.
    JumpFalling,
    /// Descending with no jump impulse (walked off an edge, or past the apex).
    Falling,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub body: Body,
    pub velocity: Vec2,
    pub terminal_velocity: Vec2,
    pub jump_state: JumpState,
    /// Seconds since the current jump started.
    pub time_jumping: f32,
    pub facing: Facing,
    pub has_feather_powerup: bool,
    pub feather_time_left: f32,
    /// Grounded when the current tick started. Re-landing from this
    /// state is not reported as a new landing.
    pub was_grounded: bool,
}

impl Player {
    pub const WIDTH: f32 = 1.0;
    pub const HEIGHT: f32 = 1.0;

    pub fn new(x: f32, y: f32, physics: &PhysicsConfig) -> Self {
        let mut body = Body::new(x, y, Self::WIDTH, Self::HEIGHT);
        body.origin = Vec2::new(Self::WIDTH / 2.0, Self::HEIGHT / 2.0);
        Player {
            body,
            velocity: Vec2::ZERO,
            terminal_velocity: Vec2::new(physics.terminal_velocity_x, physics.terminal_velocity_y),
            jump_state: JumpState::Falling,
            time_jumping: 0.0,
            facing: Facing::Right,
            has_feather_powerup: false,
            feather_time_left: 0.0,
            was_grounded: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }
}

/// Run-length merged block of terrain. Grows while the decoder scans
/// consecutive terrain cells; never shrinks.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSegment {
    pub body: Body,
    length: u32,
}

impl TerrainSegment {
    pub const BLOCK_WIDTH: f32 = 1.0;
    pub const BLOCK_HEIGHT: f32 = 1.5;

    pub fn new(x: f32, y: f32) -> Self {
        TerrainSegment {
            body: Body::new(x, y, Self::BLOCK_WIDTH, Self::BLOCK_HEIGHT),
            length: 1,
        }
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn increase_length(&mut self, amount: u32) {
        self.length += amount;
        self.body.bounds.w = Self::BLOCK_WIDTH * self.length as f32;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CollectibleKind {
    Coin,
    Feather,
}

/// Coin or feather. `collected` only ever goes false → true; collected
/// items stay in their collection but are skipped by collision and drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct Collectible {
    pub body: Body,
    pub kind: CollectibleKind,
    pub collected: bool,
    score: u32,
}

impl Collectible {
    pub const SIZE: f32 = 0.5;

    pub fn new(kind: CollectibleKind, x: f32, y: f32, score: u32) -> Self {
        Collectible {
            body: Body::new(x, y, Self::SIZE, Self::SIZE),
            kind,
            collected: false,
            score,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Mark as collected. Returns false if it already was.
    pub fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        true
    }
}

/// End-of-level flag pole. The hit box is a tall column so the player
/// cannot jump over it.
#[derive(Clone, Debug, PartialEq)]
pub struct GoalMarker {
    pub body: Body,
}

impl GoalMarker {
    pub fn new(x: f32, y: f32) -> Self {
        let mut body = Body::new(x, y, 3.0, 3.0);
        body.origin = Vec2::new(1.5, 0.0);
        body.bounds = Rect::new(1.0, 0.0, 10.0, 50.0);
        GoalMarker { body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_touching_rects_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let below = Rect::new(0.0, -1.5, 1.0, 1.5);
        let beside = Rect::new(1.0, 0.0, 1.0, 1.0);
        assert!(!a.overlaps(&below));
        assert!(!a.overlaps(&beside));
        assert!(a.overlaps(&Rect::new(0.5, 0.5, 1.0, 1.0)));
    }

    #[test]
    fn segment_bounds_track_length() {
        let mut seg = TerrainSegment::new(4.0, 1.0);
        assert_eq!(seg.length(), 1);
        assert_eq!(seg.body.bounds.w, 1.0);
        seg.increase_length(2);
        assert_eq!(seg.length(), 3);
        assert_eq!(seg.body.world_bounds(), Rect::new(4.0, 1.0, 3.0, 1.5));
    }

    #[test]
    fn collect_is_one_way() {
        let mut coin = Collectible::new(CollectibleKind::Coin, 0.0, 0.0, 100);
        assert!(coin.collect());
        assert!(!coin.collect());
        assert!(coin.collected);
    }

    #[test]
    fn goal_bounds_are_offset_from_position() {
        let goal = GoalMarker::new(10.0, -2.0);
        assert_eq!(goal.body.world_bounds(), Rect::new(11.0, -2.0, 10.0, 50.0));
    }

    #[test]
    fn new_player_starts_airborne() {
        let p = Player::new(2.0, 5.0, &PhysicsConfig::default());
        assert_eq!(p.jump_state, JumpState::Falling);
        assert_eq!(p.terminal_velocity, Vec2::new(3.0, 4.0));
        assert_eq!(p.body.world_bounds(), Rect::new(2.0, 5.0, 1.0, 1.0));
    }
}

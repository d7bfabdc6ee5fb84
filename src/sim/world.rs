/// WorldState: everything the simulation loop owns.
///
/// ## Ownership
///
///   - `level`   — entities decoded from `source`. Replaced wholesale on
///                 respawn or reset, never patched in place. After decode
///                 only collected flags and player dynamics change.
///   - `session` — lives and score. Survives level rebuilds; reset only by
///                 `restart()`.
///   - `source`  — the level image, kept so respawn can re-decode it.
///
/// Render and audio collaborators read these between ticks and never
/// mutate them.

use crate::config::GameConfig;
use crate::domain::decoration::Decorations;
use crate::domain::entity::{Collectible, GoalMarker, Player, TerrainSegment};
use crate::domain::physics;
use super::level::{self, LevelError, LevelImage, UnknownCell};

/// Populated level: the output of the decoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub width: usize,
    pub height: usize,
    pub player: Player,
    pub terrain: Vec<TerrainSegment>,
    pub coins: Vec<Collectible>,
    pub feathers: Vec<Collectible>,
    pub goal: Option<GoalMarker>,
    pub decorations: Decorations,
    /// Off-palette cells skipped during decode.
    pub warnings: Vec<UnknownCell>,
    pub discarded_spawns: usize,
    pub discarded_goals: usize,
}

impl Level {
    /// Advance time-based state: player motion and decorations.
    pub fn update(&mut self, dt: f32, config: &GameConfig) {
        physics::update_player(&mut self.player, dt, &config.physics);
        self.decorations.update(dt, self.player.body.position.x);
    }

    /// Collectibles still in play, for drawing.
    pub fn visible_collectibles(&self) -> impl Iterator<Item = &Collectible> {
        self.coins.iter().chain(self.feathers.iter()).filter(|c| !c.collected)
    }
}

/// Lives and score for one play attempt.
///
/// Created at session start, reset only by an explicit restart. The
/// `*_shown` fields are the HUD values that ease toward the real ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub lives: i32,
    pub score: u32,
    pub lives_shown: f32,
    pub score_shown: f32,
}

impl Session {
    pub fn new(lives_start: i32) -> Self {
        Session {
            lives: lives_start,
            score: 0,
            lives_shown: lives_start as f32,
            score_shown: 0.0,
        }
    }

    pub fn is_over(&self) -> bool {
        self.lives < 0
    }

    /// Ease the HUD counters toward the true values.
    /// Lives fall at `lives_rate`/s, score climbs at `score_rate`/s.
    pub fn smooth_display(&mut self, dt: f32, lives_rate: f32, score_rate: f32) {
        let lives = self.lives as f32;
        if self.lives_shown > lives {
            self.lives_shown = lives.max(self.lives_shown - lives_rate * dt);
        }
        let score = self.score as f32;
        if self.score_shown < score {
            self.score_shown = score.min(self.score_shown + score_rate * dt);
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Phase {
    Playing,
    /// Lives ran out; waiting before returning to the menu.
    GameOver { delay_left: f32 },
    /// Goal reached; waiting before returning to the menu.
    LevelComplete { delay_left: f32 },
    /// Menu signal sent. Ticks are no-ops until restart.
    Finished,
}

pub struct WorldState {
    pub config: GameConfig,
    pub source: LevelImage,
    pub level: Level,
    pub session: Session,
    pub phase: Phase,
    pub tick: u64,
}

impl WorldState {
    /// Decode `source` and start a new session.
    pub fn new(config: GameConfig, source: LevelImage) -> Result<Self, LevelError> {
        let level = level::decode(&source, &config)?;
        let session = Session::new(config.session.lives_start);
        Ok(WorldState {
            config,
            source,
            level,
            session,
            phase: Phase::Playing,
            tick: 0,
        })
    }

    /// Throw away the current level and decode a fresh one.
    /// The session is untouched.
    pub fn rebuild_level(&mut self) -> Result<(), LevelError> {
        self.level = level::decode(&self.source, &self.config)?;
        Ok(())
    }

    /// World reset: new session, fresh level.
    pub fn restart(&mut self) -> Result<(), LevelError> {
        self.rebuild_level()?;
        self.session = Session::new(self.config.session.lives_start);
        self.phase = Phase::Playing;
        self.tick = 0;
        Ok(())
    }

    pub fn is_over(&self) -> bool {
        self.session.is_over()
    }
}

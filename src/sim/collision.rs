/// Collision resolution: player against terrain, coins, feathers and goal.
///
/// Runs once per tick, after position integration. The player's box is
/// taken once at the start of the pass.
///
///   1. Terrain — every overlapping segment is resolved (no early exit);
///      each can push the player sideways or land it on top.
///   2. Coins — at most one per tick.
///   3. Feathers — at most one per tick; also grants the power-up.
///
/// Collected items stay in their vectors with `collected = true` and are
/// skipped from then on, so repeating the pass never double-scores.
/// Resolution is total: it never fails.

use tracing::debug;

use crate::config::PhysicsConfig;
use crate::domain::entity::{JumpState, Player, Rect, TerrainSegment};
use crate::domain::physics;
use super::event::GameEvent;
use super::world::{Level, Session};

/// Vertical distance beyond which an overlap counts as a side hit.
pub const EDGE_TOLERANCE: f32 = 0.25;

pub fn resolve(
    level: &mut Level,
    session: &mut Session,
    physics: &PhysicsConfig,
    events: &mut Vec<GameEvent>,
) {
    let player_box = level.player.body.world_bounds();

    for seg in &level.terrain {
        if !player_box.overlaps(&seg.body.world_bounds()) { continue; }
        resolve_terrain(&mut level.player, seg, events);
    }

    resolve_coins(level, &player_box, session, events);
    resolve_feathers(level, &player_box, session, physics, events);
}

/// Does the player touch the goal?
pub fn reached_goal(level: &Level) -> bool {
    let player_box = level.player.body.world_bounds();
    level.goal.as_ref()
        .is_some_and(|g| player_box.overlaps(&g.body.world_bounds()))
}

// ══════════════════════════════════════════════════════════════
// Terrain
// ══════════════════════════════════════════════════════════════

fn resolve_terrain(player: &mut Player, seg: &TerrainSegment, events: &mut Vec<GameEvent>) {
    let seg_box = seg.body.world_bounds();
    let height_difference = (player.body.position.y - seg_box.top()).abs();

    if height_difference > EDGE_TOLERANCE {
        // Side hit: push out to the nearest edge, no vertical change
        let hit_right_edge = player.body.world_bounds().center_x() > seg_box.center_x();
        player.body.position.x = if hit_right_edge {
            seg_box.x + seg_box.w - player.body.bounds.x
        } else {
            seg_box.x - player.body.bounds.w - player.body.bounds.x
        };
        return;
    }

    let resting_y = seg_box.top() - player.body.bounds.y;
    match player.jump_state {
        JumpState::Grounded => {}
        JumpState::Falling | JumpState::JumpFalling => {
            player.body.position.y = resting_y;
            player.velocity.y = 0.0;
            player.jump_state = JumpState::Grounded;
            if !player.was_grounded {
                events.push(GameEvent::Landed);
            }
        }
        // Still ascending: snapped up but keeps rising
        JumpState::JumpRising => {
            player.body.position.y = resting_y;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Collectibles
// ══════════════════════════════════════════════════════════════

fn resolve_coins(level: &mut Level, player_box: &Rect, session: &mut Session, events: &mut Vec<GameEvent>) {
    for (index, coin) in level.coins.iter_mut().enumerate() {
        if coin.collected { continue; }
        if !player_box.overlaps(&coin.body.world_bounds()) { continue; }
        coin.collect();
        session.score += coin.score();
        debug!(index, score = session.score, "gold coin collected");
        events.push(GameEvent::CoinCollected { index, score: coin.score() });
        break;
    }
}

fn resolve_feathers(
    level: &mut Level,
    player_box: &Rect,
    session: &mut Session,
    physics: &PhysicsConfig,
    events: &mut Vec<GameEvent>,
) {
    for (index, feather) in level.feathers.iter_mut().enumerate() {
        if feather.collected { continue; }
        if !player_box.overlaps(&feather.body.world_bounds()) { continue; }
        feather.collect();
        session.score += feather.score();
        physics::set_feather_powerup(&mut level.player, true, physics);
        debug!(index, score = session.score, "feather collected");
        events.push(GameEvent::FeatherCollected { index, score: feather.score() });
        break;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

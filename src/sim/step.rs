/// The step function: advances the world by one frame of `dt` seconds.
///
/// Processing order (Playing):
///   1. Input intents → horizontal velocity, jump request
///   2. Integration (player motion, decorations)
///   3. Collision resolution (terrain, coins, feathers)
///   4. Level exit: goal reached, or player in the water
///   5. HUD counter smoothing
///
/// GameOver / LevelComplete only count down their delay (and smooth the
/// HUD), then emit a single `ReturnToMenu`. Finished ignores ticks.
/// Called synchronously once per rendered frame through `advance`, which
/// splits long frames; nothing here blocks.

use tracing::{error, info};

use crate::domain::entity::FrameInput;
use crate::domain::physics;
use super::collision;
use super::event::GameEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Longest slice of time one `step` may integrate. At terminal fall speed
/// a slice moves the player well under `collision::EDGE_TOLERANCE`, so a
/// landing is never mistaken for a side hit.
pub const MAX_SUBSTEP: f32 = 1.0 / 60.0;

/// Advance by a whole frame, in equal slices of at most `MAX_SUBSTEP`.
pub fn advance(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    let slices = (dt / MAX_SUBSTEP).ceil().max(1.0);
    let slice_dt = dt / slices;
    let mut events = Vec::new();
    for _ in 0..slices as u32 {
        events.extend(step(world, input, slice_dt));
    }
    events
}

pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    match world.phase {
        Phase::Finished => return events,
        Phase::GameOver { .. } | Phase::LevelComplete { .. } => {
            resolve_delay(world, dt, &mut events);
            smooth_display(world, dt);
            return events;
        }
        Phase::Playing => {}
    }

    world.tick += 1;

    resolve_input(world, input, &mut events);
    world.level.update(dt, &world.config);
    collision::resolve(&mut world.level, &mut world.session, &world.config.physics, &mut events);
    if !resolve_goal(world, &mut events) {
        resolve_hazard(world, &mut events);
    }
    smooth_display(world, dt);

    events
}

// ══════════════════════════════════════════════════════════════
// Stages
// ══════════════════════════════════════════════════════════════

fn resolve_input(world: &mut WorldState, input: FrameInput, events: &mut Vec<GameEvent>) {
    let player = &mut world.level.player;
    physics::apply_movement(player, input.movement);
    if physics::set_jumping(player, input.jump, &world.config.physics) {
        events.push(GameEvent::Jumped);
    }
}

fn resolve_goal(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if !collision::reached_goal(&world.level) { return false; }
    info!(score = world.session.score, tick = world.tick, "goal reached");
    world.phase = Phase::LevelComplete { delay_left: world.config.session.goal_delay };
    events.push(GameEvent::GoalReached);
    true
}

/// Player below the water line: lose a life, then either game over or a
/// full rebuild of the level. Normal control flow, not an error.
fn resolve_hazard(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.level.player.body.position.y >= world.config.session.water_level { return; }

    world.session.lives -= 1;
    let lives_left = world.session.lives;
    info!(lives_left, "player fell into the water");
    events.push(GameEvent::LifeLost { lives_left });

    if world.session.is_over() {
        world.phase = Phase::GameOver { delay_left: world.config.session.game_over_delay };
        events.push(GameEvent::GameOver);
        return;
    }

    match world.rebuild_level() {
        Ok(()) => events.push(GameEvent::LevelRebuilt),
        Err(e) => {
            error!(error = %e, "could not rebuild level after life loss");
            world.phase = Phase::Finished;
            events.push(GameEvent::ReturnToMenu);
        }
    }
}

fn resolve_delay(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let delay_left = match &mut world.phase {
        Phase::GameOver { delay_left } | Phase::LevelComplete { delay_left } => {
            *delay_left -= dt;
            *delay_left
        }
        _ => return,
    };
    if delay_left < 0.0 {
        info!("returning to menu");
        world.phase = Phase::Finished;
        events.push(GameEvent::ReturnToMenu);
    }
}

fn smooth_display(world: &mut WorldState, dt: f32) {
    let sc = &world.config.session;
    world.session.smooth_display(dt, sc.lives_display_rate, sc.score_display_rate);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{JumpState, MoveDir, Vec2};
    use crate::sim::level::LevelImage;

    const DT: f32 = 1.0 / 60.0;

    fn world_from(rows: &[&str]) -> WorldState {
        let img = LevelImage::from_ascii("test", &rows.join("\n"));
        WorldState::new(GameConfig::default(), img).unwrap()
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn right() -> FrameInput {
        FrameInput { movement: Some(MoveDir::Right), jump: false }
    }

    fn run(world: &mut WorldState, input: FrameInput, ticks: usize) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..ticks {
            all.extend(step(world, input, DT));
        }
        all
    }

    // ── Landing / standing ──

    #[test]
    fn spawned_player_falls_and_stands_on_ground() {
        // spawn y = 0, ground top = 1 * 0.375 - 2.5 + 1.5 = -0.625
        let mut w = world_from(&["P..", "...", "###"]);
        let events = run(&mut w, idle(), 60);
        assert!(events.contains(&GameEvent::Landed));
        assert_eq!(w.level.player.jump_state, JumpState::Grounded);
        assert_eq!(w.level.player.body.position.y, -0.625);
        assert_eq!(w.session.lives, 3);
    }

    #[test]
    fn standing_still_lands_only_once() {
        let mut w = world_from(&["P..", "...", "###"]);
        let events = run(&mut w, idle(), 120);
        let landings = events.iter().filter(|e| **e == GameEvent::Landed).count();
        assert_eq!(landings, 1);
    }

    #[test]
    fn jump_from_ground_rises() {
        let mut w = world_from(&["P..", "...", "###"]);
        run(&mut w, idle(), 60);
        let events = step(&mut w, FrameInput { movement: None, jump: true }, DT);
        assert_eq!(events, vec![GameEvent::Jumped]);
        assert_eq!(w.level.player.jump_state, JumpState::JumpRising);
        assert!(w.level.player.body.position.y > -0.625);
    }

    #[test]
    fn long_frame_at_terminal_speed_still_lands() {
        let mut w = world_from(&["P.........", "..........", "##########"]);
        let p = &mut w.level.player;
        p.body.position.x = 4.0;
        p.body.position.y = -0.6;
        p.velocity.y = -4.0;

        let events = advance(&mut w, idle(), 0.1);

        assert!(events.contains(&GameEvent::Landed));
        assert_eq!(w.level.player.jump_state, JumpState::Grounded);
        assert_eq!(w.level.player.body.position, Vec2::new(4.0, -0.625));
        assert_eq!(w.session.lives, 3);
    }

    #[test]
    fn frames_split_into_fixed_slices() {
        let mut w = world_from(&["P..", "...", "###"]);
        advance(&mut w, idle(), DT);
        assert_eq!(w.tick, 1);
        advance(&mut w, idle(), 0.04);
        assert_eq!(w.tick, 4);
    }

    // ── Collectibles ──

    #[test]
    fn walking_into_coin_scores() {
        let mut w = world_from(&["P$.", "...", "###"]);
        let events = step(&mut w, right(), DT);
        assert_eq!(events, vec![GameEvent::CoinCollected { index: 0, score: 100 }]);
        assert_eq!(w.session.score, 100);
        assert!(w.session.score_shown > 0.0 && w.session.score_shown < 100.0);
    }

    // ── Hazard ──

    #[test]
    fn falling_into_water_costs_a_life_and_rebuilds() {
        let mut w = world_from(&["P$.", "...", "..."]);
        w.level.coins[0].collected = true;
        w.session.score = 100;
        w.level.player.body.position.y = -5.5;

        let events = step(&mut w, idle(), DT);

        assert_eq!(events, vec![GameEvent::LifeLost { lives_left: 2 }, GameEvent::LevelRebuilt]);
        assert_eq!(w.session.lives, 2);
        assert_eq!(w.session.score, 100);
        assert!(!w.level.coins[0].collected);
        assert_eq!(w.level.player.body.position.y, 0.0);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn last_life_lost_freezes_world_until_menu() {
        let mut w = world_from(&["P$.", "...", "..."]);
        w.session.lives = 0;
        w.session.score = 40;
        w.level.player.body.position.y = -5.5;

        let events = step(&mut w, idle(), DT);
        assert_eq!(events, vec![GameEvent::LifeLost { lives_left: -1 }, GameEvent::GameOver]);
        assert_eq!(w.session.lives, -1);
        assert!(w.is_over());

        // Nothing gameplay-relevant moves during the delay
        let player_before = w.level.player.clone();
        let coins_before = w.level.coins.clone();
        let mut menu = vec![];
        for _ in 0..3 {
            menu.extend(step(&mut w, right(), 1.0));
            assert_eq!(w.session.lives, -1);
            assert_eq!(w.session.score, 40);
            assert_eq!(w.level.coins, coins_before);
            assert_eq!(w.level.player, player_before);
        }
        assert!(menu.is_empty());

        assert_eq!(step(&mut w, idle(), 0.5), vec![GameEvent::ReturnToMenu]);
        assert_eq!(w.phase, Phase::Finished);
        assert!(step(&mut w, idle(), 10.0).is_empty());
    }

    #[test]
    fn lives_display_eases_down_after_loss() {
        let mut w = world_from(&["P..", "...", "..."]);
        w.level.player.body.position.y = -6.0;
        step(&mut w, idle(), 0.25);
        assert_eq!(w.session.lives, 2);
        assert!((w.session.lives_shown - 2.75).abs() < 1e-5);
    }

    // ── Goal ──

    #[test]
    fn reaching_goal_completes_level() {
        // goal box starts at x = 3
        let mut w = world_from(&["P.G", "...", "###"]);
        let events = run(&mut w, right(), 90);
        assert!(events.contains(&GameEvent::GoalReached));
        assert!(matches!(w.phase, Phase::LevelComplete { .. }));

        let x = w.level.player.body.position.x;
        let events = run(&mut w, right(), 60 * 7);
        assert_eq!(events, vec![GameEvent::ReturnToMenu]);
        assert_eq!(w.level.player.body.position.x, x);
    }

    // ── Restart ──

    #[test]
    fn restart_after_game_over_plays_again() {
        let mut w = world_from(&["P..", "...", "###"]);
        w.session.lives = 0;
        w.level.player.body.position.y = -6.0;
        step(&mut w, idle(), DT);
        assert!(w.is_over());
        w.restart().unwrap();
        assert_eq!(w.session.lives, 3);
        assert!(!step(&mut w, idle(), DT).contains(&GameEvent::ReturnToMenu));
        assert_eq!(w.tick, 1);
    }
}

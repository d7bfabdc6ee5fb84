/// Player motion: horizontal intent, the jump state machine, gravity.
///
/// ## Jump state transitions
///
/// ┌──────────────┬───────────────────────────────┬──────────────┐
/// │ From          │ Trigger                        │ To           │
/// ├──────────────┼───────────────────────────────┼──────────────┤
/// │ Grounded      │ jump held                      │ JumpRising   │
/// │ Grounded      │ tick starts (contact re-check) │ Falling      │
/// │ JumpRising    │ jump released                  │ JumpFalling  │
/// │ JumpRising    │ time_jumping > jump_time_max   │ JumpFalling  │
/// │ JumpFalling   │ vertical velocity <= 0         │ Falling      │
/// │ Falling/JumpF │ jump held + feather power-up   │ JumpRising   │
/// │ any airborne  │ lands on terrain (collision)   │ Grounded     │
/// └──────────────┴───────────────────────────────┴──────────────┘
///
/// Horizontal velocity has no ramp: it is set straight from the intent.

use crate::config::PhysicsConfig;
use super::entity::{Facing, JumpState, MoveDir, Player};

/// Set horizontal velocity from the movement intent.
pub fn apply_movement(player: &mut Player, movement: Option<MoveDir>) {
    player.velocity.x = match movement {
        Some(MoveDir::Left) => -player.terminal_velocity.x,
        Some(MoveDir::Right) => player.terminal_velocity.x,
        None => 0.0,
    };
}

/// Feed the jump button state into the state machine.
/// Returns true when a jump (or feather flap) starts this tick.
pub fn set_jumping(player: &mut Player, held: bool, physics: &PhysicsConfig) -> bool {
    match player.jump_state {
        JumpState::Grounded => {
            if held {
                player.time_jumping = 0.0;
                player.jump_state = JumpState::JumpRising;
                return true;
            }
        }
        JumpState::JumpRising => {
            if !held {
                player.jump_state = JumpState::JumpFalling;
            }
        }
        JumpState::Falling | JumpState::JumpFalling => {
            if held && player.has_feather_powerup {
                player.time_jumping = physics.jump_time_max - physics.jump_time_offset_flying;
                player.jump_state = JumpState::JumpRising;
                return true;
            }
        }
    }
    false
}

/// Grant or revoke the feather power-up. Granting refreshes the timer.
pub fn set_feather_powerup(player: &mut Player, picked_up: bool, physics: &PhysicsConfig) {
    player.has_feather_powerup = picked_up;
    player.feather_time_left = if picked_up { physics.feather_duration } else { 0.0 };
}

/// Advance the player by `dt` seconds: power-up timer, vertical state,
/// gravity, then position integration.
pub fn update_player(player: &mut Player, dt: f32, physics: &PhysicsConfig) {
    if player.velocity.x < 0.0 {
        player.facing = Facing::Left;
    } else if player.velocity.x > 0.0 {
        player.facing = Facing::Right;
    }

    if player.feather_time_left > 0.0 {
        player.feather_time_left -= dt;
        if player.feather_time_left <= 0.0 {
            set_feather_powerup(player, false, physics);
        }
    }

    update_motion_y(player, dt, physics);

    player.body.position.x += player.velocity.x * dt;
    player.body.position.y += player.velocity.y * dt;
}

fn update_motion_y(player: &mut Player, dt: f32, physics: &PhysicsConfig) {
    player.was_grounded = player.jump_state == JumpState::Grounded;
    match player.jump_state {
        // Ground contact is re-established by the collision pass each tick
        JumpState::Grounded => player.jump_state = JumpState::Falling,
        JumpState::JumpRising => {
            player.time_jumping += dt;
            if player.time_jumping <= physics.jump_time_max {
                player.velocity.y = player.terminal_velocity.y;
            } else {
                player.jump_state = JumpState::JumpFalling;
            }
        }
        JumpState::JumpFalling => {
            player.time_jumping += dt;
            if player.time_jumping > 0.0 && player.time_jumping <= physics.jump_time_min {
                player.velocity.y = player.terminal_velocity.y;
            }
        }
        JumpState::Falling => {}
    }

    apply_gravity(player, dt, physics);

    if player.jump_state == JumpState::JumpFalling && player.velocity.y <= 0.0 {
        player.jump_state = JumpState::Falling;
    }
}

fn apply_gravity(player: &mut Player, dt: f32, physics: &PhysicsConfig) {
    let max = player.terminal_velocity.y;
    player.velocity.y = (player.velocity.y - physics.gravity * dt).clamp(-max, max);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn grounded_player() -> (Player, PhysicsConfig) {
        let physics = PhysicsConfig::default();
        let mut p = Player::new(0.0, 0.0, &physics);
        p.jump_state = JumpState::Grounded;
        (p, physics)
    }

    // ── Horizontal ──

    #[test]
    fn movement_sets_velocity_directly() {
        let (mut p, _) = grounded_player();
        apply_movement(&mut p, Some(MoveDir::Left));
        assert_eq!(p.velocity.x, -3.0);
        apply_movement(&mut p, Some(MoveDir::Right));
        assert_eq!(p.velocity.x, 3.0);
        apply_movement(&mut p, None);
        assert_eq!(p.velocity.x, 0.0);
    }

    #[test]
    fn facing_follows_last_nonzero_velocity() {
        let (mut p, physics) = grounded_player();
        apply_movement(&mut p, Some(MoveDir::Left));
        update_player(&mut p, DT, &physics);
        apply_movement(&mut p, None);
        update_player(&mut p, DT, &physics);
        assert_eq!(p.facing, Facing::Left);
    }

    // ── Jump state machine ──

    #[test]
    fn grounded_jump_starts_rising() {
        let (mut p, physics) = grounded_player();
        assert!(set_jumping(&mut p, true, &physics));
        assert_eq!(p.jump_state, JumpState::JumpRising);
        update_player(&mut p, DT, &physics);
        assert!(p.velocity.y > 0.0);
        assert!(p.body.position.y > 0.0);
    }

    #[test]
    fn grounded_without_jump_becomes_falling() {
        let (mut p, physics) = grounded_player();
        assert!(!set_jumping(&mut p, false, &physics));
        update_player(&mut p, DT, &physics);
        assert_eq!(p.jump_state, JumpState::Falling);
        assert!(p.was_grounded);
        assert!(p.velocity.y < 0.0);
    }

    #[test]
    fn release_while_rising_becomes_jump_falling() {
        let (mut p, physics) = grounded_player();
        set_jumping(&mut p, true, &physics);
        update_player(&mut p, DT, &physics);
        set_jumping(&mut p, false, &physics);
        assert_eq!(p.jump_state, JumpState::JumpFalling);
        // minimum hop: still pushed up until jump_time_min
        update_player(&mut p, DT, &physics);
        assert_eq!(p.jump_state, JumpState::JumpFalling);
        assert!(p.velocity.y > 0.0);
    }

    #[test]
    fn rising_times_out_into_jump_falling() {
        let (mut p, physics) = grounded_player();
        set_jumping(&mut p, true, &physics);
        let mut ticks = 0;
        while p.jump_state == JumpState::JumpRising {
            set_jumping(&mut p, true, &physics);
            update_player(&mut p, DT, &physics);
            ticks += 1;
            assert!(ticks < 100, "jump never timed out");
        }
        assert_eq!(p.jump_state, JumpState::JumpFalling);
        assert!(p.time_jumping > physics.jump_time_max);
    }

    #[test]
    fn jump_falling_turns_into_falling_at_apex() {
        let (mut p, physics) = grounded_player();
        set_jumping(&mut p, true, &physics);
        set_jumping(&mut p, false, &physics);
        for _ in 0..120 {
            update_player(&mut p, DT, &physics);
            if p.jump_state == JumpState::Falling { break; }
        }
        assert_eq!(p.jump_state, JumpState::Falling);
        assert!(p.velocity.y <= 0.0);
    }

    #[test]
    fn holding_jump_in_air_without_feather_does_nothing() {
        let physics = PhysicsConfig::default();
        let mut p = Player::new(0.0, 5.0, &physics);
        assert!(!set_jumping(&mut p, true, &physics));
        assert_eq!(p.jump_state, JumpState::Falling);
    }

    #[test]
    fn feather_allows_flap_in_air() {
        let physics = PhysicsConfig::default();
        let mut p = Player::new(0.0, 5.0, &physics);
        set_feather_powerup(&mut p, true, &physics);
        assert!(set_jumping(&mut p, true, &physics));
        assert_eq!(p.jump_state, JumpState::JumpRising);
        assert!((p.time_jumping - (0.3 - 0.018)).abs() < 1e-6);
    }

    #[test]
    fn feather_expires() {
        let (mut p, physics) = grounded_player();
        set_feather_powerup(&mut p, true, &physics);
        assert_eq!(p.feather_time_left, 9.0);
        update_player(&mut p, 8.0, &physics);
        assert!(p.has_feather_powerup);
        update_player(&mut p, 1.5, &physics);
        assert!(!p.has_feather_powerup);
        assert_eq!(p.feather_time_left, 0.0);
    }

    // ── Gravity ──

    #[test]
    fn fall_speed_is_clamped_to_terminal_velocity() {
        let physics = PhysicsConfig::default();
        let mut p = Player::new(0.0, 50.0, &physics);
        for _ in 0..120 {
            update_player(&mut p, DT, &physics);
        }
        assert_eq!(p.velocity.y, -4.0);
    }
}

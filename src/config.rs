/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

// ── Public Config Struct ──

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub level: LevelConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Level image (`.png`/`.bmp`) or ASCII level (`.txt`). None = built-in level.
    #[serde(default)]
    pub level: Option<PathBuf>,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

/// Player motion tuning, in world units and seconds.
#[derive(Clone, Debug, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_terminal_x")]
    pub terminal_velocity_x: f32,
    #[serde(default = "default_terminal_y")]
    pub terminal_velocity_y: f32,
    #[serde(default = "default_jump_time_max")]
    pub jump_time_max: f32,
    #[serde(default = "default_jump_time_min")]
    pub jump_time_min: f32,
    #[serde(default = "default_jump_time_offset_flying")]
    pub jump_time_offset_flying: f32,
    #[serde(default = "default_feather_duration")]
    pub feather_duration: f32,
}

/// Per-entity height offsets applied by the level decoder.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_terrain_height_factor")]
    pub terrain_height_factor: f32,
    #[serde(default = "default_terrain_offset")]
    pub terrain_offset: f32,
    #[serde(default = "default_spawn_offset")]
    pub spawn_offset: f32,
    #[serde(default = "default_item_offset")]
    pub item_offset: f32,
    #[serde(default = "default_goal_offset")]
    pub goal_offset: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_lives_start")]
    pub lives_start: i32,
    #[serde(default = "default_game_over_delay")]
    pub game_over_delay: f32,
    #[serde(default = "default_goal_delay")]
    pub goal_delay: f32,
    #[serde(default = "default_water_level")]
    pub water_level: f32,
    #[serde(default = "default_lives_display_rate")]
    pub lives_display_rate: f32,
    #[serde(default = "default_score_display_rate")]
    pub score_display_rate: f32,
    #[serde(default = "default_coin_score")]
    pub coin_score: u32,
    #[serde(default = "default_feather_score")]
    pub feather_score: u32,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_log_file() -> PathBuf { PathBuf::from("canyonrun.log") }

fn default_gravity() -> f32 { 25.0 }
fn default_terminal_x() -> f32 { 3.0 }
fn default_terminal_y() -> f32 { 4.0 }
fn default_jump_time_max() -> f32 { 0.3 }
fn default_jump_time_min() -> f32 { 0.1 }
fn default_jump_time_offset_flying() -> f32 { 0.018 }
fn default_feather_duration() -> f32 { 9.0 }

fn default_terrain_height_factor() -> f32 { 0.25 }
fn default_terrain_offset() -> f32 { -2.5 }
fn default_spawn_offset() -> f32 { -3.0 }
fn default_item_offset() -> f32 { -1.5 }
fn default_goal_offset() -> f32 { -7.0 }

fn default_lives_start() -> i32 { 3 }
fn default_game_over_delay() -> f32 { 3.0 }
fn default_goal_delay() -> f32 { 6.0 }
fn default_water_level() -> f32 { -5.0 }
fn default_lives_display_rate() -> f32 { 1.0 }
fn default_score_display_rate() -> f32 { 250.0 }
fn default_coin_score() -> u32 { 100 }
fn default_feather_score() -> u32 { 250 }

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            tick_rate_ms: default_tick_rate(),
            level: None,
            log_file: default_log_file(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gravity: default_gravity(),
            terminal_velocity_x: default_terminal_x(),
            terminal_velocity_y: default_terminal_y(),
            jump_time_max: default_jump_time_max(),
            jump_time_min: default_jump_time_min(),
            jump_time_offset_flying: default_jump_time_offset_flying(),
            feather_duration: default_feather_duration(),
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            terrain_height_factor: default_terrain_height_factor(),
            terrain_offset: default_terrain_offset(),
            spawn_offset: default_spawn_offset(),
            item_offset: default_item_offset(),
            goal_offset: default_goal_offset(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            lives_start: default_lives_start(),
            game_over_delay: default_game_over_delay(),
            goal_delay: default_goal_delay(),
            water_level: default_water_level(),
            lives_display_rate: default_lives_display_rate(),
            score_display_rate: default_score_display_rate(),
            coin_score: default_coin_score(),
            feather_score: default_feather_score(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut cfg = load_toml(&search_dirs);

        // Relative level paths resolve against the first dir that has them
        if let Some(level) = cfg.general.level.take() {
            cfg.general.level = Some(resolve_path(&search_dirs, &level));
        }
        cfg
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn resolve_path(search_dirs: &[PathBuf], path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|p| p.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> GameConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            return load_file(&path);
        }
    }
    GameConfig::default()
}

/// Read one config file; any failure falls back to defaults with a warning.
pub fn load_file(path: &Path) -> GameConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => match GameConfig::from_toml_str(&text) {
            Ok(cfg) => {
                info!(path = %path.display(), "config loaded");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config parse error, using defaults");
                GameConfig::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read config, using defaults");
            GameConfig::default()
        }
    }
}

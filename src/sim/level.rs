/// Level loader and decoder.
///
/// ## Sources (priority order):
///   1. `general.level` from config: an image (`.png`, `.bmp`) or an ASCII
///      level (`.txt`)
///   2. Built-in embedded level
///
/// ## Image format:
///   One pixel per cell. Each pixel's RGBA32 value must match a palette
///   entry exactly (see `domain::palette`). Anything else is logged and
///   skipped.
///
/// ## ASCII format (`.txt`):
///   One row per line, top row first. Short lines are padded with empty.
///
/// ## Cell legend (ASCII → palette):
///   ' ' / '.' = Empty       '#' = Terrain
///   'P' = Player spawn      'F' = Feather
///   '$' = Coin              'G' = Goal
///   anything else = off-palette grey (reported as unknown)
///
/// ## Scan order:
///   Rows top → bottom, columns left → right. The previously scanned
///   colour is carried across row ends, so a terrain run that ends one row
///   and a run that starts the next are merged into one segment.
///   Placement height grows from bottom to top: `base = height - row`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::domain::decoration::Decorations;
use crate::domain::entity::{Collectible, CollectibleKind, GoalMarker, Player, TerrainSegment};
use crate::domain::palette::{self, CellKind};
use crate::sim::world::Level;

/// Colour used for ASCII characters outside the legend.
const UNKNOWN_ASCII: u32 = palette::pack_rgb(0x80, 0x80, 0x80);

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode level image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("level image has no cells")]
    EmptyImage,
    #[error("level has no player spawn cell")]
    MissingSpawn,
}

/// Recoverable decode warning: a cell whose colour is not in the palette.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UnknownCell {
    pub x: usize,
    pub y: usize,
    pub rgba: u32,
}

/// Level source: a grid of packed RGBA32 cells, row-major, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelImage {
    pub name: String,
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

// ══════════════════════════════════════════════════════════════
// Level sources
// ══════════════════════════════════════════════════════════════

impl LevelImage {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Parse the ASCII level format.
    pub fn from_ascii(name: &str, text: &str) -> Self {
        let mut rows: Vec<&str> = text.lines().collect();
        // Blank lines at the end are dropped; rows of spaces are empty cells
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }

        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut pixels = vec![CellKind::Empty.color(); width * height];

        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                pixels[y * width + x] = match ch {
                    ' ' | '.' => CellKind::Empty.color(),
                    '#' => CellKind::Terrain.color(),
                    'P' => CellKind::Spawn.color(),
                    'F' => CellKind::Feather.color(),
                    '$' => CellKind::Coin.color(),
                    'G' => CellKind::Goal.color(),
                    _ => UNKNOWN_ASCII,
                };
            }
        }

        LevelImage { name: name.to_string(), width, height, pixels }
    }

    /// Load a level file. `.txt` is read as ASCII, anything else goes
    /// through the image decoder.
    pub fn from_file(path: &Path) -> Result<Self, LevelError> {
        let name = path.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        if path.extension().is_some_and(|e| e == "txt") {
            let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            return Ok(Self::from_ascii(&name, &text));
        }

        let img = image::open(path)?.to_rgba8();
        let (width, height) = (img.width() as usize, img.height() as usize);
        let pixels = img.pixels()
            .map(|p| palette::pack_rgba(p[0], p[1], p[2], p[3]))
            .collect();
        Ok(LevelImage { name, width, height, pixels })
    }

    pub fn embedded() -> Self {
        Self::from_ascii("Canyon 1", EMBEDDED_LEVEL)
    }
}

/// Resolve the configured level source.
pub fn load_source(config: &GameConfig) -> Result<LevelImage, LevelError> {
    match &config.general.level {
        Some(path) => LevelImage::from_file(path),
        None => Ok(LevelImage::embedded()),
    }
}

// ══════════════════════════════════════════════════════════════
// Decoder
// ══════════════════════════════════════════════════════════════

/// Decode a level image into a fresh `Level`.
///
/// Pure given identical input: decoding the same image twice yields equal
/// levels. Multiple spawn or goal cells resolve to the last one scanned.
pub fn decode(image: &LevelImage, config: &GameConfig) -> Result<Level, LevelError> {
    if image.width == 0 || image.height == 0 {
        return Err(LevelError::EmptyImage);
    }

    let lc = &config.level;
    let sc = &config.session;

    let mut player: Option<Player> = None;
    let mut goal: Option<GoalMarker> = None;
    let mut terrain: Vec<TerrainSegment> = vec![];
    let mut coins: Vec<Collectible> = vec![];
    let mut feathers: Vec<Collectible> = vec![];
    let mut warnings: Vec<UnknownCell> = vec![];
    let mut discarded_spawns = 0;
    let mut discarded_goals = 0;

    // Not reset per row
    let mut last_pixel: Option<u32> = None;

    for y in 0..image.height {
        for x in 0..image.width {
            let pixel = image.pixel(x, y);
            let base_height = (image.height - y) as f32;
            let col = x as f32;

            match CellKind::from_rgba(pixel) {
                Some(CellKind::Empty) => {}
                Some(CellKind::Terrain) => match terrain.last_mut() {
                    Some(seg) if last_pixel == Some(pixel) => seg.increase_length(1),
                    _ => {
                        let h = base_height * TerrainSegment::BLOCK_HEIGHT * lc.terrain_height_factor
                            + lc.terrain_offset;
                        terrain.push(TerrainSegment::new(col, h));
                    }
                },
                Some(CellKind::Spawn) => {
                    if player.is_some() {
                        discarded_spawns += 1;
                        warn!(x, y, "extra player spawn, keeping the last one");
                    }
                    let h = base_height * Player::HEIGHT + lc.spawn_offset;
                    player = Some(Player::new(col, h, &config.physics));
                }
                Some(CellKind::Feather) => {
                    let h = base_height * Collectible::SIZE + lc.item_offset;
                    feathers.push(Collectible::new(CollectibleKind::Feather, col, h, sc.feather_score));
                }
                Some(CellKind::Coin) => {
                    let h = base_height * Collectible::SIZE + lc.item_offset;
                    coins.push(Collectible::new(CollectibleKind::Coin, col, h, sc.coin_score));
                }
                Some(CellKind::Goal) => {
                    if goal.is_some() {
                        discarded_goals += 1;
                        warn!(x, y, "extra goal, keeping the last one");
                    }
                    goal = Some(GoalMarker::new(col, base_height + lc.goal_offset));
                }
                None => warnings.push(UnknownCell { x, y, rgba: pixel }),
            }

            last_pixel = Some(pixel);
        }
    }

    for cell in &warnings {
        let [r, g, b, a] = palette::channels(cell.rgba);
        warn!(x = cell.x, y = cell.y, r, g, b, a, "unknown object in level");
    }

    let player = player.ok_or(LevelError::MissingSpawn)?;

    debug!(
        terrain = terrain.len(),
        blocks = terrain.iter().map(TerrainSegment::length).sum::<u32>(),
        coins = coins.len(),
        feathers = feathers.len(),
        unknown = warnings.len(),
        "level decoded"
    );
    info!(level = %image.name, width = image.width, height = image.height, "level loaded");

    Ok(Level {
        width: image.width,
        height: image.height,
        player,
        terrain,
        coins,
        feathers,
        goal,
        decorations: Decorations::new(image.width),
        warnings,
        discarded_spawns,
        discarded_goals,
    })
}

// ══════════════════════════════════════════════════════════════
// Embedded level
// ══════════════════════════════════════════════════════════════

const EMBEDDED_LEVEL: &str = "\
..............................................................
..............................................................
..............................................................
..............................................................
..............................................................
..............................................................
..............................................................
..............................................................
..............................................................
.........................................$$$..................
..P.........................F...........######................
....................$$$.......................................
..................#######.....#####.............$$$...........
......$$$....$$...........................#######.............
##############.######...........####..............###########G.
..............................................................
";

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

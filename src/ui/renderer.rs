/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads the world. World units map to
/// `Camera::cells_per_unit` terminal cells on both axes; the camera follows
/// the player horizontally (plus a debug pan offset) and keeps the water
/// line near the bottom.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{CollectibleKind, Facing, Rect};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const SKY: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::SKY };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    const fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width + x]
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set((x + i) as i32, y as i32, Cell::new(ch, fg, Cell::SKY));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg);
    }
}

// ── Camera ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// Debug camera controls layered over player following.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Camera {
    /// Horizontal offset from the player, in world units.
    pub pan_x: f32,
    pub cells_per_unit: f32,
}

impl Camera {
    const PAN_STEP: f32 = 2.0;
    const ZOOM_MIN: f32 = 1.0;
    const ZOOM_MAX: f32 = 4.0;

    pub fn pan(&mut self, steps: f32) {
        self.pan_x += steps * Self::PAN_STEP;
    }

    pub fn zoom(&mut self, steps: f32) {
        self.cells_per_unit = (self.cells_per_unit + steps).clamp(Self::ZOOM_MIN, Self::ZOOM_MAX);
    }

    pub fn reset(&mut self) {
        *self = Camera::default();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Camera { pan_x: 0.0, cells_per_unit: 2.0 }
    }
}

/// World → screen mapping for one frame.
struct View {
    left: f32,
    bottom: f32,
    scale: f32,
    rows: usize,
}

impl View {
    fn follow(world: &WorldState, camera: &Camera, cols: usize, rows: usize) -> Self {
        let scale = camera.cells_per_unit;
        let units_w = cols as f32 / scale;
        let level_w = world.level.width as f32;
        let mut left = world.level.player.position().x + camera.pan_x - units_w / 2.0;
        left = left.min(level_w - units_w).max(-1.0);
        View { left, bottom: world.config.session.water_level - 1.0, scale, rows }
    }

    fn col(&self, wx: f32) -> i32 {
        ((wx - self.left) * self.scale).floor() as i32
    }

    fn row(&self, wy: f32) -> i32 {
        let r = ((wy - self.bottom) * self.scale).floor() as i32;
        MAP_ROW as i32 + self.rows as i32 - 1 - r
    }
}

// ── Renderer ──

/// Which collaborator screen is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Menu,
    Game,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    enhanced_keys: bool,
    pub camera: Camera,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            enhanced_keys: false,
            camera: Camera::default(),
        }
    }

    /// Enter raw mode and the alternate screen. Returns true when the
    /// terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::SKY),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        self.resize_to_terminal();
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize_to_terminal(&mut self) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize == self.term_w && th as usize == self.term_h {
            return false;
        }
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
        true
    }

    pub fn render(&mut self, world: &WorldState, screen: Screen) -> io::Result<()> {
        if self.resize_to_terminal() {
            queue!(self.writer, SetBackgroundColor(Cell::SKY), Clear(ClearType::All))?;
        }

        self.front.clear();
        match screen {
            Screen::Menu => self.compose_menu(world),
            Screen::Game => self.compose_game(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Composition ──

    fn compose_menu(&mut self, world: &WorldState) {
        let mid = self.front.height / 2;
        self.front.put_centered(mid.saturating_sub(3), "C A N Y O N   R U N", Color::Yellow);
        let level = format!("{}  ({}x{})", world.source.name, world.level.width, world.level.height);
        self.front.put_centered(mid.saturating_sub(1), &level, Color::Grey);
        let last = format!("Last score: {}", world.session.score);
        self.front.put_centered(mid + 1, &last, Color::White);
        self.front.put_centered(mid + 3, "[Enter] Play    [Q] Quit", Color::Cyan);
    }

    fn compose_game(&mut self, world: &WorldState) {
        let rows = self.front.height.saturating_sub(MAP_ROW + 1);
        let view = View::follow(world, &self.camera, self.front.width, rows);
        let level = &world.level;

        // Mountains: one silhouette row per parallax layer
        let mountains = &level.decorations.mountains;
        for layer in 0..3 {
            let wy = mountains.position.y + 2.5 - layer as f32;
            let shift = mountains.layer_offset(layer);
            let row = view.row(wy);
            for col in 0..self.front.width as i32 {
                let wx = view.left + col as f32 / view.scale;
                if wx > mountains.position.x + mountains.length + 1.0 { break; }
                let wx = wx - shift;
                if (wx.rem_euclid(6.0) - 3.0).abs() < 1.0 + layer as f32 * 0.5 {
                    self.front.set(col, row, Cell::new('^', Color::DarkGrey, Cell::SKY));
                }
            }
        }

        let clouds = &level.decorations.clouds;
        for cloud in &clouds.clouds {
            let mut r = cloud.body.world_bounds();
            r.x += clouds.position.x;
            r.y += clouds.position.y;
            self.fill(&view, &r, Cell::new('░', Color::Grey, Cell::SKY));
        }

        if let Some(goal) = &level.goal {
            let b = goal.body;
            let pole = Rect::new(b.position.x + b.origin.x, b.position.y, 0.5, 12.0);
            self.fill(&view, &pole, Cell::new('|', Color::Red, Cell::SKY));
        }

        for seg in &level.terrain {
            self.fill(&view, &seg.body.world_bounds(), Cell::new('▓', Color::DarkYellow, Color::Rgb { r: 60, g: 45, b: 30 }));
        }

        for item in level.visible_collectibles() {
            let cell = match item.kind {
                CollectibleKind::Coin => Cell::new('$', Color::Yellow, Cell::SKY),
                CollectibleKind::Feather => Cell::new('f', Color::Magenta, Cell::SKY),
            };
            self.fill(&view, &item.body.world_bounds(), cell);
        }

        let player = &level.player;
        let glyph = match player.facing {
            Facing::Left => '<',
            Facing::Right => '>',
        };
        let fg = if player.has_feather_powerup { Color::Magenta } else { Color::White };
        self.fill(&view, &player.body.world_bounds(), Cell::new(glyph, fg, Cell::SKY));

        let water = &level.decorations.water;
        let water_row = view.row(water.position.y);
        let c0 = view.col(water.position.x - 1.0).max(0);
        let c1 = view.col(water.position.x + water.length + 1.0);
        for row in water_row..(MAP_ROW + rows) as i32 {
            for col in c0..=c1 {
                self.front.set(col, row, Cell::new('~', Color::Cyan, Color::DarkBlue));
            }
        }

        self.compose_hud(world);
    }

    fn compose_hud(&mut self, world: &WorldState) {
        let s = &world.session;
        let mut hud = format!(
            "LIVES {:>2}   SCORE {:>6}",
            s.lives_shown.ceil().max(0.0) as i32,
            s.score_shown as u32,
        );
        let player = &world.level.player;
        if player.has_feather_powerup {
            hud.push_str(&format!("   FEATHER {:.1}s", player.feather_time_left));
        }
        self.front.put_str(1, HUD_ROW, &hud, Color::White);

        let banner = match world.phase {
            Phase::GameOver { .. } => Some(("GAME OVER", Color::Red)),
            Phase::LevelComplete { .. } => Some(("LEVEL COMPLETE", Color::Green)),
            Phase::Playing | Phase::Finished => None,
        };
        if let Some((text, fg)) = banner {
            let y = self.front.height / 2;
            self.front.put_centered(y, text, fg);
        }

        let help = "[←/→] Move  [Space] Jump  [J/L] Pan  [+/-/0] Zoom  [R] Reset  [Esc] Menu  [Q] Quit";
        let y = self.front.height.saturating_sub(1);
        self.front.put_str(1, y, help, Color::DarkGrey);
    }

    /// Fill every screen cell whose area overlaps the world rectangle.
    fn fill(&mut self, view: &View, r: &Rect, cell: Cell) {
        let c0 = view.col(r.x);
        let c1 = view.col(r.x + r.w - 0.001);
        let r0 = view.row(r.y + r.h - 0.001);
        let r1 = view.row(r.y);
        let max_row = (MAP_ROW + view.rows) as i32;
        for row in r0.max(MAP_ROW as i32)..=r1.min(max_row - 1) {
            for col in c0.max(0)..=c1 {
                self.front.set(col, row, cell);
            }
        }
    }

    // ── Diff and emit ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::SKY;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

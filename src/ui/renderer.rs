/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads the session. Mode, accent, backdrop and effect
/// flags decide what gets drawn.

use std::io::{self, BufWriter, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::{ProfileConfig, Rgb, ThemeConfig};
use crate::domain::effect::EffectKind;
use crate::domain::symbol::TARGET_SEQUENCE;
use crate::sim::mode::{Accent, Backdrop, Mode};
use crate::sim::session::Session;
use crate::sim::shell::Shell;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 5, g: 5, b: 5 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
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

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell { ch: ' ', fg: Color::White, bg });
        }
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a glyph, keeping the background already at (x, y).
    fn put_char(&mut self, x: usize, y: usize, ch: char, fg: Color) {
        let bg = self.get(x, y).bg;
        self.set(x, y, Cell { ch, fg, bg });
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.put_char(x + i, y, ch, fg);
        }
    }

    /// Signed variant for drifting text; clips on the left edge.
    fn put_str_at(&mut self, x: i32, y: i32, s: &str, fg: Color) {
        if y < 0 { return; }
        for (i, ch) in s.chars().enumerate() {
            let cx = x + i as i32;
            if cx >= 0 {
                self.put_char(cx as usize, y as usize, ch, fg);
            }
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg);
    }
}

// ── FPS counter ──

/// Frames per second, sampled over one-second windows.
pub struct FpsCounter {
    frames: u32,
    window_start: Instant,
    fps: u32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        FpsCounter { frames: 0, window_start: now, fps: 0 }
    }

    /// Count one frame. Returns the last completed sample.
    pub fn frame(&mut self, now: Instant) -> u32 {
        self.frames += 1;
        if now.duration_since(self.window_start) >= Duration::from_secs(1) {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start = now;
        }
        self.fps
    }
}

// ── Frame inputs ──

/// Everything one frame needs, borrowed read-only.
pub struct View<'a> {
    pub session: &'a Session,
    pub shell: &'a Shell,
    pub profile: &'a ProfileConfig,
    pub theme: &'a ThemeConfig,
    pub fps: u32,
    pub tick: u64,
}

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

fn dim(c: Rgb, factor: f32) -> Color {
    let scale = |v: u8| (v as f32 * factor) as u8;
    Color::Rgb { r: scale(c.r), g: scale(c.g), b: scale(c.b) }
}

const TEXT: Color = Color::Rgb { r: 200, g: 200, b: 200 };
const MUTED: Color = Color::Rgb { r: 90, g: 90, b: 90 };
const FAINT: Color = Color::Rgb { r: 45, g: 45, b: 45 };
const FLASH_BG: Color = Color::Rgb { r: 235, g: 235, b: 235 };
const SCANLINE_BG: Color = Color::Rgb { r: 14, g: 10, b: 18 };
const MATRIX_FG: Color = Color::Rgb { r: 0, g: 160, b: 70 };

const MATRIX_GLYPHS: &[char] = &['0', '1', 'ｱ', 'ｶ', 'ｻ', 'ﾀ', 'ﾅ', 'ﾊ', 'ﾏ', 'ﾔ', 'ﾗ', 'ﾜ'];

const SHELL_MAX_ROWS: usize = 10;

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_mode: Option<Mode>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_mode: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, view: &View) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Mode change → full repaint for a clean transition
        let mode = view.session.mode();
        if self.last_mode != Some(mode) {
            self.back.cells.fill(Cell::INVALID);
            self.last_mode = Some(mode);
        }

        compose(&mut self.front, view);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
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
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

fn compose(buf: &mut FrameBuffer, view: &View) {
    let s = view.session;
    let accent_rgb = match s.accent() {
        Accent::Normal => view.theme.normal_accent,
        Accent::ZeroGravity => view.theme.zero_gravity_accent,
    };
    let accent = rgb(accent_rgb);

    compose_backdrop(buf, s.backdrop(), accent_rgb);
    if s.has_effect(EffectKind::Matrix) {
        compose_matrix(buf, view.tick);
    }

    let shell_rows = SHELL_MAX_ROWS.min(buf.height / 2);
    let shell_top = buf.height.saturating_sub(shell_rows);

    compose_header(buf, s.mode(), accent);
    compose_hero(buf, view, accent);
    compose_progress(buf, s, accent, shell_top.saturating_sub(2));
    compose_shell(buf, view, accent, shell_top, shell_rows);

    if s.has_effect(EffectKind::GlitchLine) {
        compose_glitch_line(buf, accent, view.tick);
    }
    if s.mode() == Mode::ZeroGravity {
        compose_zero_gravity_hud(buf, view, accent);
    }
    if s.has_effect(EffectKind::Flash) {
        invert(buf);
    }
}

fn compose_backdrop(buf: &mut FrameBuffer, backdrop: Backdrop, accent: Rgb) {
    for y in 0..buf.height {
        let bg = match backdrop {
            Backdrop::Plain => Cell::BASE_BG,
            Backdrop::Blast => dim(accent, 0.25),
            Backdrop::Scanline if y % 2 == 1 => SCANLINE_BG,
            Backdrop::Scanline => Cell::BASE_BG,
        };
        buf.fill_row(y, bg);
    }
}

fn compose_header(buf: &mut FrameBuffer, mode: Mode, accent: Color) {
    buf.put_str(2, 0, "ZENITH_SYS.", accent);
    let nav = match mode {
        Mode::ZeroGravity => "[ESC] RESTORE GRAVITY",
        _ => "WORK  ENGINEERING  CONTACT",
    };
    let x = buf.width.saturating_sub(nav.len() + 2);
    buf.put_str(x, 0, nav, MUTED);
}

fn compose_hero(buf: &mut FrameBuffer, view: &View, accent: Color) {
    let title: String = view
        .profile
        .name
        .to_uppercase()
        .chars()
        .flat_map(|c| [c, ' '])
        .collect();
    let lines = [
        (title.trim_end().to_string(), accent),
        (String::new(), TEXT),
        (view.profile.tagline.clone(), TEXT),
        (String::from("scroll-free portfolio // type to explore"), FAINT),
    ];

    let top = (buf.height / 4).max(2) as i32;
    let floating = view.session.mode() == Mode::ZeroGravity;
    for (i, (line, fg)) in lines.iter().enumerate() {
        let len = line.chars().count() as i32;
        let mut x = (buf.width as i32 - len) / 2;
        let mut y = top + i as i32;
        if floating {
            let t = view.tick as f32 * 0.05 + i as f32 * 1.3;
            x += (t.sin() * 4.0).round() as i32;
            y += ((t * 0.7).cos() * 1.5).round() as i32;
        }
        buf.put_str_at(x, y, line, *fg);
    }
}

fn compose_progress(buf: &mut FrameBuffer, s: &Session, accent: Color, y: usize) {
    let x0 = 2;
    for (i, sym) in TARGET_SEQUENCE.iter().enumerate() {
        let fg = if i < s.progress() { accent } else { FAINT };
        buf.put_char(x0 + i * 2, y, sym.as_char(), fg);
    }
    if s.has_effect(EffectKind::Trail) {
        let x = x0 + TARGET_SEQUENCE.len() * 2;
        buf.put_str(x, y, "∙•●", accent);
    }
}

fn compose_shell(buf: &mut FrameBuffer, view: &View, accent: Color, top: usize, rows: usize) {
    if rows < 4 || buf.width < 10 {
        return;
    }
    let locked = view.session.accent() == Accent::ZeroGravity;
    let right = buf.width - 1;
    let bottom = top + rows - 1;

    for x in 0..=right {
        buf.put_char(x, top, '─', FAINT);
        buf.put_char(x, bottom, '─', FAINT);
    }
    let title = format!(
        " bash — {}x{} — {} ",
        buf.width,
        buf.height,
        if locked { "ERR" } else { "ROOT" }
    );
    buf.put_str(2, top, &title, MUTED);

    let body_rows = rows - 3;
    let history = view.shell.history();
    let skip = history.len().saturating_sub(body_rows);
    for (i, line) in view.shell.history().skip(skip).enumerate() {
        let fg = if line.starts_with('>') { accent } else { MUTED };
        buf.put_str(2, top + 1 + i, line, fg);
    }

    let prompt_y = bottom - 1;
    buf.put_char(2, prompt_y, '❯', accent);
    if locked {
        buf.put_str(4, prompt_y, "TERMINAL_LOCKED", FAINT);
    } else {
        buf.put_str(4, prompt_y, view.shell.input(), TEXT);
        let caret_x = 4 + view.shell.input().chars().count();
        if (view.tick / 30) % 2 == 0 {
            buf.put_char(caret_x, prompt_y, '▌', accent);
        }
    }
}

fn compose_matrix(buf: &mut FrameBuffer, tick: u64) {
    for x in (0..buf.width).step_by(3) {
        let speed = 1 + (x as u64 * 7) % 3;
        let head = ((tick * speed / 2 + x as u64 * 13) % (buf.height as u64 + 8)) as usize;
        for len in 0..6 {
            if let Some(y) = head.checked_sub(len) {
                let glyph = MATRIX_GLYPHS[(x + y + tick as usize) % MATRIX_GLYPHS.len()];
                buf.put_char(x, y, glyph, MATRIX_FG);
            }
        }
    }
}

fn compose_glitch_line(buf: &mut FrameBuffer, accent: Color, tick: u64) {
    let y = buf.height / 3 + (tick % 3) as usize;
    let offset = (tick * 5) as usize % 7;
    for x in 0..buf.width {
        let ch = if (x + offset) % 11 == 0 { '▚' } else { '━' };
        buf.put_char(x, y, ch, accent);
    }
}

fn compose_zero_gravity_hud(buf: &mut FrameBuffer, view: &View, accent: Color) {
    if (view.tick / 20) % 3 != 0 {
        buf.put_str(2, 2, "SYSTEM_STATUS: ZENITH_ACTIVE", accent);
    }
    buf.put_str(2, 3, "KERNEL: 0x55F2A_QUANTUM", accent);

    // Sweeping bar
    let bar_w = 16;
    let pos = (view.tick as usize / 2) % (bar_w * 2);
    for i in 0..bar_w {
        let lit = i + bar_w >= pos && i + bar_w < pos + 4;
        buf.put_char(2 + i, 4, if lit { '█' } else { '░' }, if lit { accent } else { FAINT });
    }

    let fps = format!("FPS: {}", view.fps);
    let clock = format!("CLOCK: {}", chrono::Local::now().format("%H:%M:%S"));
    for (row, text) in [(2, fps), (3, clock)] {
        let x = buf.width.saturating_sub(text.len() + 2);
        buf.put_str(x, row, &text, accent);
    }

    let mid = buf.height / 2;
    buf.put_centered(mid.saturating_sub(1), "(   ◜◝   )", accent);
    buf.put_centered(mid, "ZENITH_CORE", accent);
    buf.put_centered(mid + 1, "(   ◟◞   )", accent);
}

fn invert(buf: &mut FrameBuffer) {
    for cell in buf.cells.iter_mut() {
        cell.fg = Color::Black;
        cell.bg = FLASH_BG;
    }
}

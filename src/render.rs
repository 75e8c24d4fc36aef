//! Half-block terminal renderer for a [`Game`].

use crate::config::Tunables;
use crate::effects::Scorecard;
use crate::game::{Game, GameState};
use crate::geometry::Vec2;
use crate::obstacles::ObstaclePair;
use crate::player::PLAYER_SIZE;
use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};
use std::io::{self, Write};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    fn mix(a: Rgb, b: Rgb, alpha: f64) -> Rgb {
        Rgb::lerp(a, b, (alpha.clamp(0.0, 1.0) * 256.0) as u16)
    }
}

const LETTERBOX: Rgb = Rgb(18, 18, 24);
const SKY_TOP: Rgb = Rgb(70, 180, 200);
const SKY_BOT: Rgb = Rgb(190, 232, 245);
const GRASS: Rgb = Rgb(84, 168, 55);
const GRASS_LIGHT: Rgb = Rgb(110, 200, 70);
const DIRT: Rgb = Rgb(210, 185, 110);
const DIRT_DARK: Rgb = Rgb(185, 160, 90);
const CACTUS_L: Rgb = Rgb(74, 122, 26);
const CACTUS_M: Rgb = Rgb(100, 170, 40);
const CACTUS_R: Rgb = Rgb(115, 191, 46);
const CACTUS_HI: Rgb = Rgb(145, 215, 62);
const CAP_DARK: Rgb = Rgb(60, 100, 20);
const BIRD_Y: Rgb = Rgb(245, 200, 66);
const BIRD_HI: Rgb = Rgb(255, 225, 100);
const BIRD_WING: Rgb = Rgb(215, 165, 35);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(20, 20, 20);
const BIRD_BEAK: Rgb = Rgb(225, 75, 35);
const BIRD_BEAK_HI: Rgb = Rgb(240, 110, 50);
const HILL_FAR: Rgb = Rgb(120, 195, 75);
const HILL_NEAR: Rgb = Rgb(95, 175, 55);
const CARD: Rgb = Rgb(220, 195, 120);
const INK: Rgb = Rgb(101, 71, 73);
const BUTTON: Rgb = Rgb(225, 110, 40);
const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(0, 0, 0);
const SHADOW: Rgb = Rgb(30, 30, 30);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![LETTERBOX; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, LETTERBOX);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    /// Paints `c` over the current pixel with opacity `alpha`.
    fn blend(&mut self, x: i32, y: i32, c: Rgb, alpha: f64) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            let under = self.get(x as usize, y as usize);
            self.set(x, y, Rgb::mix(under, c, alpha));
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    fn blend_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb, alpha: f64) {
        for dy in 0..h {
            for dx in 0..w {
                self.blend(x + dx, y + dy, c, alpha);
            }
        }
    }

    fn fill(&mut self, c: Rgb) {
        self.px.fill(c);
    }

    /// Blends every pixel toward `c`.
    fn wash(&mut self, c: Rgb, alpha: f64) {
        for p in &mut self.px {
            *p = Rgb::mix(*p, c, alpha);
        }
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = Rgb(0, 0, 0);
        let mut prev_bg = Rgb(0, 0, 0);
        let mut need_fg = true;
        let mut need_bg = true;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if need_bg || prev_bg != top {
                        queue!(out, style::SetBackgroundColor(term_color(top)))?;
                        prev_bg = top;
                        need_bg = false;
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if need_fg || prev_fg != top {
                        queue!(out, style::SetForegroundColor(term_color(top)))?;
                        prev_fg = top;
                        need_fg = false;
                    }
                    if need_bg || prev_bg != bot {
                        queue!(out, style::SetBackgroundColor(term_color(bot)))?;
                        prev_bg = bot;
                        need_bg = false;
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                need_fg = true;
                need_bg = true;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

fn term_color(c: Rgb) -> CColor {
    CColor::Rgb {
        r: c.0,
        g: c.1,
        b: c.2,
    }
}

// ── World to pixels ─────────────────────────────────────────────────────────

/// Uniform scale from world units to pixels, letterboxed and centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub scale: f64,
    left: f64,
    /// Pixel row of world y = 0.
    bottom: f64,
    world: Vec2,
}

impl View {
    pub fn fit(pw: usize, ph: usize, t: &Tunables) -> Self {
        let scale = (pw as f64 / t.world_width).min(ph as f64 / t.world_height);
        let left = (pw as f64 - t.world_width * scale) / 2.0;
        let top = (ph as f64 - t.world_height * scale) / 2.0;
        Self {
            scale,
            left,
            bottom: top + t.world_height * scale,
            world: Vec2::new(t.world_width, t.world_height),
        }
    }

    fn shifted(&self, world_dy: f64) -> Self {
        Self {
            bottom: self.bottom - world_dy * self.scale,
            ..*self
        }
    }

    fn x(&self, wx: f64) -> i32 {
        (self.left + wx * self.scale).round() as i32
    }

    fn y(&self, wy: f64) -> i32 {
        (self.bottom - wy * self.scale).round() as i32
    }

    fn len(&self, w: f64) -> i32 {
        ((w * self.scale).round() as i32).max(1)
    }

    /// Maps a pixel back to world space, e.g. for mouse taps.
    pub fn to_world(&self, px: f64, py: f64) -> Vec2 {
        Vec2::new(
            (px - self.left) / self.scale,
            (self.bottom - py) / self.scale,
        )
    }

    /// Integer glyph size that keeps text readable at this scale.
    fn glyph_px(&self) -> i32 {
        ((self.world.y * self.scale / 60.0) as i32).max(1)
    }
}

// ── 3x5 bitmap glyphs ──────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

#[rustfmt::skip]
fn letter(ch: char) -> Option<[u8; 15]> {
    Some(match ch {
        'A' => [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1],
        'B' => [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,1,0],
        'E' => [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1],
        'F' => [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,0,0],
        'G' => [0,1,1, 1,0,0, 1,0,1, 1,0,1, 0,1,1],
        'H' => [1,0,1, 1,0,1, 1,1,1, 1,0,1, 1,0,1],
        'I' => [1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1],
        'K' => [1,0,1, 1,0,1, 1,1,0, 1,0,1, 1,0,1],
        'L' => [1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1],
        'M' => [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1],
        'O' => [0,1,0, 1,0,1, 1,0,1, 1,0,1, 0,1,0],
        'P' => [1,1,0, 1,0,1, 1,1,0, 1,0,0, 1,0,0],
        'R' => [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1],
        'S' => [0,1,1, 1,0,0, 0,1,0, 0,0,1, 1,1,0],
        'T' => [1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0],
        'V' => [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0],
        'Y' => [1,0,1, 1,0,1, 0,1,0, 0,1,0, 0,1,0],
        d @ '0'..='9' => DIGITS[d as usize - '0' as usize],
        _ => return None,
    })
}

struct TextStyle {
    fg: Rgb,
    /// Pixel size of one glyph cell.
    k: i32,
    shadow: bool,
    alpha: f64,
}

fn draw_glyph(buf: &mut PixelBuf, x: i32, y: i32, glyph: &[u8; 15], st: &TextStyle) {
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as i32 * st.k;
                let py = y + row as i32 * st.k;
                if st.shadow {
                    buf.blend_rect(px + st.k, py + st.k, st.k, st.k, SHADOW, st.alpha);
                }
                buf.blend_rect(px, py, st.k, st.k, st.fg, st.alpha);
            }
        }
    }
}

/// Draws `text` centred on `cx`, top edge at `y`. Unknown characters leave a
/// blank cell.
fn draw_text(buf: &mut PixelBuf, cx: i32, y: i32, text: &str, st: &TextStyle) {
    let advance = 4 * st.k; // 3 cells per glyph + 1 spacing
    let total_w = text.chars().count() as i32 * advance - st.k;
    let start_x = cx - total_w / 2;
    for (i, ch) in text.chars().enumerate() {
        if let Some(glyph) = letter(ch) {
            draw_glyph(buf, start_x + i as i32 * advance, y, &glyph, st);
        }
    }
}

fn text_height(k: i32) -> i32 {
    5 * k
}

// ── Scene ───────────────────────────────────────────────────────────────────

pub fn draw(game: &Game, buf: &mut PixelBuf) {
    let t = game.tunables();
    let base = View::fit(buf.width(), buf.height(), t);
    let view = base.shifted(game.effects().shake_offset());

    buf.fill(LETTERBOX);
    draw_sky(buf, &view, t);
    draw_hills(buf, &view, t, game.ground_offset());
    for pair in game.obstacles().pairs() {
        draw_obstacle_pair(buf, &view, pair);
    }
    draw_ground(buf, &view, t, game.ground_offset());
    draw_bird(buf, &view, game);
    // Obstacles enter and leave beyond the world's edges
    draw_letterbox(buf, &base, t);

    match game.state() {
        GameState::MainMenu => draw_title(buf, &view),
        _ => draw_score(buf, &view, game.score()),
    }
    if let Some(card) = game.effects().scorecard() {
        draw_scorecard(buf, &base, card);
    }

    if game.effects().is_flashing() {
        buf.fill(WHITE);
    }
    let fade = game.effects().fade_level();
    if fade > 0.0 {
        buf.wash(BLACK, fade);
    }
}

/// Repaints everything outside the world rectangle.
fn draw_letterbox(buf: &mut PixelBuf, view: &View, t: &Tunables) {
    let (left, right) = (view.x(0.0), view.x(t.world_width));
    let (top, bottom) = (view.y(t.world_height), view.y(0.0));
    for y in 0..buf.height() as i32 {
        for x in 0..buf.width() as i32 {
            if x < left || x >= right || y < top || y >= bottom {
                buf.set(x, y, LETTERBOX);
            }
        }
    }
}

fn draw_sky(buf: &mut PixelBuf, view: &View, t: &Tunables) {
    let top = view.y(t.world_height);
    let bottom = view.y(t.playable_start());
    let span = (bottom - top).max(1);
    let left = view.x(0.0);
    let right = view.x(t.world_width);
    for y in top..bottom {
        let c = Rgb::lerp(SKY_TOP, SKY_BOT, ((y - top) * 256 / span) as u16);
        for x in left..right {
            buf.set(x, y, c);
        }
    }
}

fn draw_hills(buf: &mut PixelBuf, view: &View, t: &Tunables, scroll: f64) {
    let base = view.y(t.playable_start());
    let s = view.scale * 10.0;
    let left = view.x(0.0);
    let right = view.x(t.world_width);
    // Far hills
    for x in left..right {
        let fx = (x as f64 + scroll * 0.02 * s) * 0.04;
        let h = (fx.sin() * 6.0 + (fx * 1.7).sin() * 3.0) * s;
        let top = base - h as i32 - (4.0 * s) as i32;
        for y in top..base {
            buf.set(x, y, HILL_FAR);
        }
    }
    // Near hills
    for x in left..right {
        let fx = (x as f64 + scroll * 0.04 * s) * 0.06;
        let h = (fx.sin() * 4.0 + (fx * 2.3).sin() * 2.0) * s;
        let top = base - h as i32 - (2.0 * s) as i32;
        for y in top..base {
            buf.set(x, y, HILL_NEAR);
        }
    }
}

fn draw_ground(buf: &mut PixelBuf, view: &View, t: &Tunables, scroll: f64) {
    let gy = view.y(t.playable_start());
    let floor = view.y(0.0);
    let left = view.x(0.0);
    let right = view.x(t.world_width);
    let shift = (scroll * view.scale) as i32;
    // Grass strip
    for x in left..right {
        let alt = ((x + shift) / 3) % 2 == 0;
        buf.set(x, gy, if alt { GRASS } else { GRASS_LIGHT });
        buf.set(x, gy + 1, GRASS);
    }
    // Dirt
    for y in (gy + 2)..floor {
        for x in left..right {
            let stripe = (x + shift + (y - gy) * 2).rem_euclid(12) < 6;
            buf.set(x, y, if stripe { DIRT } else { DIRT_DARK });
        }
    }
}

fn cactus_shade(x: i32, total_w: i32) -> Rgb {
    if total_w <= 1 {
        return CACTUS_M;
    }
    let t = (x as f64 / (total_w - 1) as f64 * 256.0) as u16;
    if t < 64 {
        Rgb::lerp(CACTUS_L, CACTUS_M, (t * 4).min(256))
    } else if t < 100 {
        Rgb::lerp(CACTUS_M, CACTUS_HI, ((t - 64) * 7).min(256))
    } else if t < 160 {
        Rgb::lerp(CACTUS_HI, CACTUS_R, ((t - 100) * 4).min(256))
    } else {
        Rgb::lerp(CACTUS_R, CACTUS_L, ((t - 160) * 3).min(256))
    }
}

/// Draws one sprite of a pair as a shaded column with a cap on the edge that
/// faces the gap.
fn draw_cactus(buf: &mut PixelBuf, view: &View, center: Vec2, size: Vec2, cap_at_top: bool) {
    let w = view.len(size.x);
    let x0 = view.x(center.x - size.x / 2.0);
    let y_top = view.y(center.y + size.y / 2.0);
    let y_bot = view.y(center.y - size.y / 2.0);
    let cap_h = view.len(size.x * 0.3).max(2);
    let cap_extra = (w / 6).max(1);

    for x in 0..w {
        let c = cactus_shade(x, w);
        for y in y_top..y_bot {
            buf.set(x0 + x, y, c);
        }
    }

    let (cap_y0, cap_y1) = if cap_at_top {
        (y_top, y_top + cap_h)
    } else {
        (y_bot - cap_h, y_bot)
    };
    for x in -cap_extra..(w + cap_extra) {
        let c = cactus_shade(x + cap_extra, w + cap_extra * 2);
        for y in cap_y0..cap_y1 {
            buf.set(x0 + x, y, c);
        }
        // Cap edge darkening
        buf.set(x0 + x, cap_y0, CAP_DARK);
        buf.set(x0 + x, cap_y1 - 1, CAP_DARK);
    }
}

fn draw_obstacle_pair(buf: &mut PixelBuf, view: &View, pair: &ObstaclePair) {
    draw_cactus(buf, view, pair.bottom_center(), pair.size, true);
    draw_cactus(buf, view, pair.top_center(), pair.size, false);
}

fn draw_bird(buf: &mut PixelBuf, view: &View, game: &Game) {
    let player = game.player();
    let body = &player.body;
    let cx = view.x(body.position.x);
    let cy = view.y(body.position.y);
    let s = (PLAYER_SIZE.x * view.scale / 10.0).max(0.5);

    // Lying on its back after hitting the ground
    if body.rotation < -1.0 {
        let bw = (2.0 * s).max(2.0) as i32;
        let bh = (3.0 * s).max(2.0) as i32;
        buf.fill_rect(cx - bw, cy - bh, bw * 2, bh * 2 + 1, BIRD_Y);
        let beak_h = (2.5 * s).max(2.0) as i32;
        buf.fill_rect(cx - 1, cy + bh, 2, beak_h, BIRD_BEAK);
        buf.set(cx + bw - 2, cy + bh - 2, BIRD_PUPIL);
        return;
    }

    // Determine tilt for visual (shift pixels up/down)
    let tilt = (-body.velocity.y / 200.0).clamp(-1.0, 1.0) as i32;

    // Body core
    let bw = (3.0 * s).max(2.0) as i32;
    let bh = (2.0 * s).max(2.0) as i32;
    buf.fill_rect(cx - bw, cy - bh, bw * 2 + 1, bh * 2, BIRD_Y);

    // Highlight (top of body)
    buf.fill_rect(cx - bw + 1, cy - bh, bw * 2 - 2, ((s * 0.8) as i32).max(1), BIRD_HI);

    // Wing, one position per flight frame
    let wing_y_off = [-1, 0, 1, 0][player.flight_frame() % 4];
    let wing_h = (1.5 * s).max(1.0) as i32;
    let wing_w = (2.0 * s).max(1.0) as i32;
    buf.fill_rect(cx - bw + 1, cy + wing_y_off + tilt, wing_w, wing_h, BIRD_WING);

    // Eye
    let ex = cx + bw - (1.5 * s) as i32;
    let ey = cy - bh + (1.0 * s).max(1.0) as i32;
    let eye_r = (0.8 * s).max(1.0) as i32;
    buf.fill_rect(ex, ey, eye_r + 1, eye_r + 1, BIRD_EYE);
    buf.set(ex + eye_r, ey + eye_r, BIRD_PUPIL);
    if s >= 1.5 {
        buf.set(ex + eye_r - 1, ey + eye_r, BIRD_PUPIL);
    }

    // Beak
    let beak_x = cx + bw;
    let beak_y = cy - (0.5 * s) as i32 + tilt;
    let beak_w = (2.5 * s).max(2.0) as i32;
    let beak_h = (1.5 * s).max(1.0) as i32;
    buf.fill_rect(beak_x, beak_y, beak_w, beak_h / 2 + 1, BIRD_BEAK_HI);
    buf.fill_rect(beak_x, beak_y + beak_h / 2 + 1, beak_w, beak_h / 2, BIRD_BEAK);

    // Tail
    let tail_w = (1.5 * s).max(1.0) as i32;
    buf.fill_rect(cx - bw - tail_w, cy - 1 + tilt, tail_w, 2, BIRD_WING);
}

fn draw_score(buf: &mut PixelBuf, view: &View, score: u32) {
    let k = view.glyph_px();
    let st = TextStyle {
        fg: WHITE,
        k,
        shadow: true,
        alpha: 1.0,
    };
    let margin = 20.0;
    let (cx, y) = (view.x(view.world.x / 2.0), view.y(view.world.y - margin));
    draw_text(buf, cx, y, &score.to_string(), &st);
}

fn draw_title(buf: &mut PixelBuf, view: &View) {
    let k = view.glyph_px();
    let cx = view.x(view.world.x / 2.0);
    let cy = view.y(view.world.y * 0.78);
    let title = TextStyle {
        fg: BIRD_Y,
        k: k * 2,
        shadow: true,
        alpha: 1.0,
    };
    draw_text(buf, cx, cy, "FLAPPY", &title);
    draw_text(buf, cx, cy + text_height(k * 2) + k * 2, "FELIPE", &title);

    let sub = TextStyle {
        fg: WHITE,
        k,
        shadow: true,
        alpha: 1.0,
    };
    draw_text(buf, cx, view.y(view.world.y * 0.3), "TAP TO FLAP", &sub);
}

fn draw_scorecard(buf: &mut PixelBuf, view: &View, card: &Scorecard) {
    let k = view.glyph_px();
    let cx = view.x(view.world.x / 2.0);
    let cy = view.y(view.world.y / 2.0);
    let panel_w = view.len(view.world.x * 0.7);
    let panel_h = view.len(view.world.y * 0.22);
    let gap = view.len(20.0);

    // Banner scales and fades in above the card's resting place
    let banner = card.banner.progress();
    if banner > 0.0 {
        let bk = ((k * 2) as f64 * banner).round().max(1.0) as i32;
        let st = TextStyle {
            fg: BIRD_BEAK_HI,
            k: bk,
            shadow: true,
            alpha: banner,
        };
        let by = cy - panel_h / 2 - gap - text_height(k * 2) / 2 - text_height(bk) / 2;
        draw_text(buf, cx, by, "GAME OVER", &st);
    }

    // Card slides up from below the screen
    let start_y = view.y(0.0) + panel_h / 2;
    let card_cy = start_y + ((cy - start_y) as f64 * card.card.progress()).round() as i32;
    let px = cx - panel_w / 2;
    let py = card_cy - panel_h / 2;
    buf.fill_rect(px - 1, py - 1, panel_w + 2, panel_h + 2, SHADOW);
    buf.fill_rect(px, py, panel_w, panel_h, DIRT);
    buf.fill_rect(px + 1, py + 1, panel_w - 2, panel_h - 2, CARD);

    let label = TextStyle {
        fg: INK,
        k,
        shadow: false,
        alpha: 1.0,
    };
    let value = TextStyle {
        fg: WHITE,
        k: k * 2,
        shadow: true,
        alpha: 1.0,
    };
    let left_x = cx - panel_w / 4;
    let right_x = cx + panel_w / 4;
    let label_y = py + k * 2;
    let value_y = label_y + text_height(k) + k * 2;
    draw_text(buf, left_x, label_y, "SCORE", &label);
    draw_text(buf, right_x, label_y, "BEST", &label);
    draw_text(buf, left_x, value_y, &card.score.to_string(), &value);
    draw_text(buf, right_x, value_y, &card.best.to_string(), &value);

    // Buttons fade in below the card
    let alpha = card.buttons.progress();
    if alpha > 0.0 {
        let bw = panel_w * 2 / 5;
        let bh = text_height(k) + k * 4;
        let by = cy + panel_h / 2 + gap;
        let text = TextStyle {
            fg: WHITE,
            k,
            shadow: false,
            alpha,
        };
        for (bx, caption) in [(cx - panel_w / 4, "OK"), (cx + panel_w / 4, "SHARE")] {
            buf.blend_rect(bx - bw / 2 - 1, by - 1, bw + 2, bh + 2, SHADOW, alpha);
            buf.blend_rect(bx - bw / 2, by, bw, bh, BUTTON, alpha);
            draw_text(buf, bx, by + k * 2, caption, &text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Category, Contact};
    use crate::score::MemoryStore;

    #[test]
    fn test_view_round_trips_world_points() {
        let t = Tunables::default();
        let view = View::fit(160, 96, &t);
        let p = Vec2::new(64.0, 240.0);
        let back = view.to_world(view.x(p.x) as f64, view.y(p.y) as f64);
        assert!((back.x - p.x).abs() <= 1.0 / view.scale);
        assert!((back.y - p.y).abs() <= 1.0 / view.scale);
    }

    #[test]
    fn test_view_is_letterboxed_and_centred() {
        let t = Tunables::default();
        let view = View::fit(200, 48, &t);
        assert_eq!(view.scale, 0.1);
        assert_eq!(view.x(0.0), 84);
        assert_eq!(view.x(t.world_width), 116);
        assert_eq!(view.y(0.0), 48);
        assert_eq!(view.y(t.world_height), 0);
    }

    #[test]
    fn test_flash_whites_out_the_frame() {
        let mut game = Game::with_seed(Tunables::default(), Box::new(MemoryStore::new()), 1);
        game.tap(Vec2::new(10.0, 10.0));
        game.contact(Contact::new(Category::Player, Category::Obstacle));
        game.update(1.0 / 30.0);
        assert!(game.effects().is_flashing());

        let mut buf = PixelBuf::new(40, 60);
        draw(&game, &mut buf);
        assert_eq!(buf.get(0, 0), WHITE);
        assert_eq!(buf.get(39, 59), WHITE);
    }

    #[test]
    fn test_draw_survives_tiny_and_odd_buffers() {
        let mut game = Game::with_seed(Tunables::default(), Box::new(MemoryStore::new()), 1);
        for (w, h) in [(1, 2), (3, 7), (80, 48), (0, 0)] {
            let mut buf = PixelBuf::new(w, h);
            draw(&game, &mut buf);
            game.update(0.1);
        }
    }

    #[test]
    fn test_render_emits_one_line_per_two_pixel_rows() {
        let buf = PixelBuf::new(4, 6);
        let mut out = Vec::new();
        buf.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\r\n").count(), 2);
    }
}

//! Rasterizes short text (contact initials) onto a fixed-size square.
//!
//! Glyphs come from the `font8x8` bitmap fonts and are scaled with
//! nearest-neighbour sampling to the requested font size. Characters the
//! fonts do not cover are replaced with their ASCII transliteration.

use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};
use rand::Rng;
use unicode_script::{Script, UnicodeScript};

use crate::translit;

const GLYPH_CELL: u32 = 8;
/// Largest surface we are willing to allocate (in pixels).
const MAX_SURFACE_PIXELS: u64 = 8192 * 8192;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    /// Glyph height in logical units.
    pub size: f32,
    pub bold: bool,
}

impl FontSpec {
    pub const fn bold(size: f32) -> Self {
        Self { size, bold: true }
    }

    pub const fn regular(size: f32) -> Self {
        Self { size, bold: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    /// A fresh opaque color drawn from the random source on every render.
    #[default]
    Random,
    Solid(Rgba<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarStyle {
    pub font: FontSpec,
    pub text_color: Rgba<u8>,
    pub background: Background,
    pub frame: Frame,
    /// Pixels per logical unit.
    pub scale: u32,
}

impl Default for AvatarStyle {
    fn default() -> Self {
        Self {
            font: FontSpec::bold(30.0),
            text_color: WHITE,
            background: Background::Random,
            frame: Frame::square(100),
            scale: 1,
        }
    }
}

/// Uniformly random opaque RGB color.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Rgba<u8> {
    Rgba([rng.gen(), rng.gen(), rng.gen(), 255])
}

/// Render `text` centered on a `style.frame` sized surface, using the
/// thread-local random source for the background.
pub fn render(text: &str, style: &AvatarStyle) -> Option<RgbaImage> {
    render_with_rng(text, style, &mut rand::thread_rng())
}

/// Render `text` centered on a `style.frame` sized surface.
///
/// Returns `None` when no surface can be allocated for the frame (zero
/// sized, or too large).
pub fn render_with_rng<R: Rng + ?Sized>(
    text: &str,
    style: &AvatarStyle,
    rng: &mut R,
) -> Option<RgbaImage> {
    let width = style.frame.width.checked_mul(style.scale)?;
    let height = style.frame.height.checked_mul(style.scale)?;
    if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_SURFACE_PIXELS {
        return None;
    }

    let background = match style.background {
        Background::Random => random_color(rng),
        Background::Solid(color) => color,
    };
    let mut canvas = RgbaImage::from_pixel(width, height, background);

    let glyphs: Vec<[u8; 8]> = text.chars().filter_map(glyph_for).collect();
    if glyphs.is_empty() {
        return Some(canvas);
    }

    let glyph_px = ((style.font.size * style.scale as f32).round() as u32).max(1);
    let bold_extra = if style.font.bold {
        (glyph_px / 16).max(1)
    } else {
        0
    };
    let text_width = u64::from(glyph_px)
        .saturating_mul(glyphs.len() as u64)
        .saturating_add(u64::from(bold_extra));
    let text_width = i64::try_from(text_width).unwrap_or(i64::MAX);
    let glyph_px = u64::from(glyph_px);
    let origin_x = (i64::from(width) - text_width) / 2;
    let origin_y = (i64::from(height) - glyph_px as i64) / 2;

    // Only rows that land on the canvas are visited.
    let first_row = origin_y.max(0);
    let last_row = (origin_y + glyph_px as i64).min(i64::from(height));
    for y in first_row..last_row {
        let py = (y - origin_y) as u64;
        let row_index = (py * u64::from(GLYPH_CELL) / glyph_px) as usize;
        for (index, glyph) in glyphs.iter().enumerate() {
            let cell_x = origin_x.saturating_add((glyph_px as i64).saturating_mul(index as i64));
            if cell_x >= i64::from(width) {
                break;
            }
            let row = glyph[row_index];
            for col in 0..u64::from(GLYPH_CELL) {
                if row & (1 << col) == 0 {
                    continue;
                }
                // Pixels whose source column is `col`, widened by the bold smear.
                let start = cell_x + column_edge(col, glyph_px);
                let end = cell_x + column_edge(col + 1, glyph_px) + i64::from(bold_extra);
                for x in clip_span(start, end, width) {
                    canvas.put_pixel(x, y as u32, style.text_color);
                }
            }
        }
    }

    Some(canvas)
}

/// First pixel of a scaled glyph cell that samples source column `col`.
fn column_edge(col: u64, glyph_px: u64) -> i64 {
    ((col * glyph_px + u64::from(GLYPH_CELL) - 1) / u64::from(GLYPH_CELL)) as i64
}

fn clip_span(start: i64, end: i64, width: u32) -> std::ops::Range<u32> {
    let start = start.clamp(0, i64::from(width)) as u32;
    let end = end.clamp(0, i64::from(width)) as u32;
    start..end.max(start)
}

fn lookup_glyph(c: char) -> Option<[u8; 8]> {
    let glyph = match c.script() {
        Script::Greek => GREEK_FONTS.get(c),
        Script::Hiragana => HIRAGANA_FONTS.get(c),
        Script::Latin if !c.is_ascii() => LATIN_FONTS.get(c),
        _ => None,
    };
    glyph.or_else(|| BASIC_FONTS.get(c))
}

/// Glyph for a character, falling back to the first drawable character of
/// its transliteration.
fn glyph_for(c: char) -> Option<[u8; 8]> {
    if let Some(glyph) = lookup_glyph(c) {
        return Some(glyph);
    }
    if c.is_ascii() {
        return None;
    }
    translit::ascii_fallback(c)?.chars().find_map(lookup_glyph)
}

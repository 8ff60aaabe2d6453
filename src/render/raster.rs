//! Raster composition of cards and print sheets.
//!
//! Turns resolved cards into RGBA images: background fill, bordered photo
//! slots, anti-aliased text runs, and QR identifiers. Sheets are A4
//! landscape at 96 dpi with a 5x2 card grid, filled left-to-right then
//! top-to-bottom so card order stays record order.

use ab_glyph::{Font, FontArc, ScaleFont};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage, imageops};
use std::path::Path;

use super::resolve::ResolvedImages;
use super::{Identifier, PlacedContent, RenderedCard, Sheet};
use crate::error::CardstockError;

/// A4 landscape at 96 dpi.
pub const SHEET_WIDTH: u32 = 1123;
pub const SHEET_HEIGHT: u32 = 794;
pub const SHEET_COLS: u32 = 5;
pub const SHEET_ROWS: u32 = 2;

/// Square edge of the QR identifier region, and its inset from the card
/// corner.
const IDENTIFIER_SIZE: u32 = 64;
const IDENTIFIER_MARGIN: u32 = 8;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const EMPTY_SLOT: Rgba<u8> = Rgba([230, 230, 230, 255]);

/// Composites cards and sheets using a runtime-loaded TTF font.
pub struct Rasterizer {
    font: FontArc,
}

impl Rasterizer {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Load the card face font from a TTF/OTF file.
    pub fn from_font_file(path: &Path) -> Result<Self, CardstockError> {
        let data = std::fs::read(path)?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| CardstockError::Render(format!("failed to load font: {e}")))?;
        Ok(Self::new(font))
    }

    /// Composite one card onto its own canvas.
    pub fn rasterize_card(&self, card: &RenderedCard, images: &ResolvedImages) -> RgbaImage {
        let width = card.width.round().max(1.0) as u32;
        let height = card.height.round().max(1.0) as u32;

        let background = card
            .page_style
            .background_color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(WHITE);
        let mut canvas = RgbaImage::from_pixel(width, height, background);

        if let Some(src) = &card.page_style.background_image
            && let Some(image) = images.get(src)
        {
            let scaled = image.resize_exact(width, height, FilterType::Lanczos3);
            imageops::overlay(&mut canvas, &scaled.to_rgba8(), 0, 0);
        }

        for element in &card.elements {
            let x = element.left.round() as i64;
            let y = element.top.round() as i64;
            match &element.content {
                PlacedContent::Text(text) => {
                    let color = parse_color(&text.color).unwrap_or(BLACK);
                    self.draw_text(
                        &mut canvas,
                        &text.value,
                        x,
                        y,
                        text.font_size as f32,
                        weight_is_bold(&text.weight),
                        color,
                    );
                }
                PlacedContent::Image(slot) => {
                    let w = slot.width.round().max(1.0) as u32;
                    let h = slot.height.round().max(1.0) as u32;
                    match slot.source.as_deref().and_then(|s| images.get(s)) {
                        Some(image) => {
                            let scaled = image.resize_exact(w, h, FilterType::Lanczos3);
                            imageops::overlay(&mut canvas, &scaled.to_rgba8(), x, y);
                        }
                        None => fill_rect(&mut canvas, x, y, w, h, EMPTY_SLOT),
                    }
                    let border = slot.border_width.round() as u32;
                    if border > 0 {
                        let color = parse_color(&slot.border_color).unwrap_or(BLACK);
                        draw_rect_border(&mut canvas, x, y, w, h, border, color);
                    }
                }
            }
        }

        if let Some(identifier) = &card.identifier {
            self.draw_identifier(&mut canvas, identifier);
        }

        canvas
    }

    /// Lay a sheet's cards out on the 5x2 grid, each centered in its
    /// cell. Cards larger than a cell are clipped by the overlay.
    pub fn rasterize_sheet(&self, sheet: &Sheet, images: &ResolvedImages) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(SHEET_WIDTH, SHEET_HEIGHT, WHITE);
        let capacity = (SHEET_COLS * SHEET_ROWS) as usize;
        if sheet.cards.len() > capacity {
            log::warn!(
                "sheet holds {} cards but received {}; extras are dropped",
                capacity,
                sheet.cards.len()
            );
        }

        for (index, card) in sheet.cards.iter().take(capacity).enumerate() {
            let rendered = self.rasterize_card(card, images);
            let (cell_x, cell_y) = cell_origin(index as u32);
            let cell_w = SHEET_WIDTH / SHEET_COLS;
            let cell_h = SHEET_HEIGHT / SHEET_ROWS;
            let x = cell_x + cell_w.saturating_sub(rendered.width()) / 2;
            let y = cell_y + cell_h.saturating_sub(rendered.height()) / 2;
            imageops::overlay(&mut canvas, &rendered, x as i64, y as i64);
        }
        canvas
    }

    /// Draw anti-aliased text runs, one per `\n`-separated line.
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i64,
        y: i64,
        pixel_height: f32,
        bold: bool,
        color: Rgba<u8>,
    ) {
        let scaled = self.font.as_scaled(pixel_height.max(1.0));
        let line_height = scaled.ascent() - scaled.descent() + scaled.line_gap();

        for (line_index, line) in text.split('\n').enumerate() {
            let baseline = y as f32 + scaled.ascent() + line_index as f32 * line_height;
            let mut caret = x as f32;
            for ch in line.chars() {
                let glyph_id = self.font.glyph_id(ch);
                let advance = scaled.h_advance(glyph_id);
                // Faux bold: redraw shifted one pixel right.
                let passes: &[f32] = if bold { &[0.0, 1.0] } else { &[0.0] };
                for &offset in passes {
                    let glyph = glyph_id.with_scale_and_position(
                        pixel_height.max(1.0),
                        ab_glyph::point(caret + offset, baseline),
                    );
                    if let Some(outlined) = self.font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|px, py, coverage| {
                            let cx = bounds.min.x as i64 + px as i64;
                            let cy = bounds.min.y as i64 + py as i64;
                            blend_pixel(canvas, cx, cy, color, coverage);
                        });
                    }
                }
                caret += advance;
            }
        }
    }

    /// Draw the scannable identifier in the bottom-right corner: QR
    /// modules for a code, a crossed gray box for the placeholder marker.
    fn draw_identifier(&self, canvas: &mut RgbaImage, identifier: &Identifier) {
        let x0 = canvas.width().saturating_sub(IDENTIFIER_SIZE + IDENTIFIER_MARGIN) as i64;
        let y0 = canvas.height().saturating_sub(IDENTIFIER_SIZE + IDENTIFIER_MARGIN) as i64;

        match identifier {
            Identifier::Code(data) => {
                use qrcode::{EcLevel, QrCode};
                let code = match QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M) {
                    Ok(code) => code,
                    Err(e) => {
                        log::warn!("QR generation failed, drawing placeholder: {e}");
                        self.draw_placeholder_marker(canvas, x0, y0);
                        return;
                    }
                };
                let modules = code.width() as u32;
                let cell = (IDENTIFIER_SIZE / modules).max(1);
                fill_rect(
                    canvas,
                    x0,
                    y0,
                    modules * cell,
                    modules * cell,
                    WHITE,
                );
                for qy in 0..modules {
                    for qx in 0..modules {
                        if code[(qx as usize, qy as usize)] == qrcode::Color::Dark {
                            fill_rect(
                                canvas,
                                x0 + (qx * cell) as i64,
                                y0 + (qy * cell) as i64,
                                cell,
                                cell,
                                BLACK,
                            );
                        }
                    }
                }
            }
            Identifier::Placeholder => self.draw_placeholder_marker(canvas, x0, y0),
        }
    }

    fn draw_placeholder_marker(&self, canvas: &mut RgbaImage, x0: i64, y0: i64) {
        fill_rect(canvas, x0, y0, IDENTIFIER_SIZE, IDENTIFIER_SIZE, EMPTY_SLOT);
        draw_rect_border(canvas, x0, y0, IDENTIFIER_SIZE, IDENTIFIER_SIZE, 1, BLACK);
        for i in 0..IDENTIFIER_SIZE as i64 {
            blend_pixel(canvas, x0 + i, y0 + i, BLACK, 1.0);
            blend_pixel(canvas, x0 + IDENTIFIER_SIZE as i64 - 1 - i, y0 + i, BLACK, 1.0);
        }
    }
}

/// Encode an RGBA canvas as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CardstockError> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image.clone())
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .map_err(|e| CardstockError::Render(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

/// Grid cell origin for a card index on the sheet.
pub(crate) fn cell_origin(index: u32) -> (u32, u32) {
    let col = index % SHEET_COLS;
    let row = index / SHEET_COLS;
    (
        col * (SHEET_WIDTH / SHEET_COLS),
        row * (SHEET_HEIGHT / SHEET_ROWS),
    )
}

/// Whether a CSS font weight reads as bold.
pub(crate) fn weight_is_bold(weight: &str) -> bool {
    match weight.trim().to_lowercase().as_str() {
        "bold" | "bolder" => true,
        other => other.parse::<u32>().is_ok_and(|w| w >= 600),
    }
}

/// Parse a CSS color: `#rrggbb`, `#rgb`, or a handful of named colors.
pub(crate) fn parse_color(s: &str) -> Option<Rgba<u8>> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Rgba([r, g, b, 255]))
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Rgba([r * 17, g * 17, b * 17, 255]))
            }
            _ => None,
        };
    }
    match s.to_lowercase().as_str() {
        "black" => Some(BLACK),
        "white" => Some(WHITE),
        "red" => Some(Rgba([255, 0, 0, 255])),
        "green" => Some(Rgba([0, 128, 0, 255])),
        "blue" => Some(Rgba([0, 0, 255, 255])),
        "gray" | "grey" => Some(Rgba([128, 128, 128, 255])),
        "yellow" => Some(Rgba([255, 255, 0, 255])),
        _ => None,
    }
}

/// Alpha-blend one pixel; out-of-bounds coordinates are ignored.
fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for channel in 0..3 {
        let base = pixel[channel] as f32;
        let target = color[channel] as f32;
        pixel[channel] = (base + (target - base) * coverage).round() as u8;
    }
    pixel[3] = 255;
}

fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    for dy in 0..h as i64 {
        for dx in 0..w as i64 {
            blend_pixel(canvas, x + dx, y + dy, color, 1.0);
        }
    }
}

/// Stroke a rectangle outline of the given thickness, drawn inward.
fn draw_rect_border(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    w: u32,
    h: u32,
    thickness: u32,
    color: Rgba<u8>,
) {
    let t = thickness.min(w / 2).min(h / 2).max(1);
    fill_rect(canvas, x, y, w, t, color);
    fill_rect(canvas, x, y + (h - t) as i64, w, t, color);
    fill_rect(canvas, x, y, t, h, color);
    fill_rect(canvas, x + (w - t) as i64, y, t, h, color);
}

//! Raster encoding – a fixed-size PNG card.
//!
//! Text is drawn with the 8×8 glyphs from `font8x8` (Basic Latin, Latin-1
//! and Greek). Any other character is drawn as `?`, and the text runs record
//! that substitution so the parity check sees what was painted.

use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, LATIN_FONTS};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

use crate::asset::{self, MimeType};
use crate::config::Config;
use crate::error::{RenderError, RenderStage};
use crate::fonts::{wrap_text, TextMetrics};

use super::{CardRenderer, RenderModel, PHOTO_PLACEHOLDER};

const GLYPH: u32 = 8;
const LINE_STEP: u32 = GLYPH + 4;
const MARGIN: u32 = 10;
const LOGO_SIZE: u32 = 32;
const MIN_CANVAS: u32 = 100;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([51, 51, 51]);
const ACCENT: Rgb<u8> = Rgb([0, 123, 255]);
const PANEL: Rgb<u8> = Rgb([248, 249, 250]);
const MUTED: Rgb<u8> = Rgb([136, 136, 136]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunRole {
    Title,
    /// The organisation name shown when no logo is attached.
    OrganizationName,
    Field,
    Placeholder,
}

/// One line of glyphs at a pixel position. `text` is what is painted, after
/// glyph substitution. Lines wrapped from the same source text share a
/// `block`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub role: RunRole,
    pub block: usize,
    pub x: u32,
    pub y: u32,
    pub text: String,
}

/// Where everything goes on the canvas.
#[derive(Debug, Clone)]
pub struct RasterLayout {
    pub width: u32,
    pub height: u32,
    pub logo: Option<Rect>,
    /// The fixed photo box; filled by the photo or the placeholder.
    pub photo_box: Rect,
    pub photo_drawn: bool,
    pub runs: Vec<TextRun>,
}

impl RasterLayout {
    /// Wrapped lines of each block with `role`, rejoined.
    pub fn blocks(&self, role: RunRole) -> Vec<String> {
        let mut blocks: Vec<(usize, Vec<&str>)> = Vec::new();
        for run in self.runs.iter().filter(|r| r.role == role) {
            match blocks.last_mut() {
                Some((block, lines)) if *block == run.block => lines.push(run.text.as_str()),
                _ => blocks.push((run.block, vec![run.text.as_str()])),
            }
        }
        blocks.into_iter().map(|(_, lines)| lines.join(" ")).collect()
    }
}

/// PNG bytes plus the layout they were painted from.
#[derive(Debug, Clone)]
pub struct RasterCard {
    pub png: Vec<u8>,
    pub layout: RasterLayout,
}

#[derive(Debug, Clone)]
pub struct RasterRenderer {
    width: u32,
    height: u32,
    photo_size: u32,
}

impl RasterRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            width: config.raster_width.max(MIN_CANVAS),
            height: config.raster_height.max(MIN_CANVAS),
            photo_size: config.raster_photo_size,
        }
    }

    /// Position every element without painting.
    pub fn layout(&self, model: &RenderModel) -> RasterLayout {
        let mono = TextMetrics::Monospace {
            advance: GLYPH as f32,
        };
        let inner = self.width - 2 * MARGIN;
        let mut runs = Vec::new();
        let mut block = 0;

        // Header: logo (or organisation name) then title.
        let mut y = MARGIN;
        let logo = model.logo.as_ref().map(|_| Rect {
            x: MARGIN,
            y: MARGIN,
            width: LOGO_SIZE,
            height: LOGO_SIZE,
        });
        let text_x = if logo.is_some() {
            MARGIN + LOGO_SIZE + 8
        } else {
            MARGIN
        };
        let text_w = (self.width - text_x - MARGIN) as f32;
        if logo.is_none() {
            push_block(&mut runs, RunRole::OrganizationName, block, text_x, &mut y, &model.organization_name, text_w, mono);
            block += 1;
        }
        push_block(&mut runs, RunRole::Title, block, text_x, &mut y, &model.title, text_w, mono);
        block += 1;
        if let Some(logo) = logo {
            y = y.max(logo.y + logo.height + 4);
        }

        // Photo box, centred.
        let size = self.photo_size.min(inner);
        let photo_box = Rect {
            x: (self.width - size) / 2,
            y: y + 6,
            width: size,
            height: size,
        };
        if model.photo.is_none() {
            let mut py = (photo_box.y + photo_box.height / 2).saturating_sub(LINE_STEP);
            push_block(
                &mut runs,
                RunRole::Placeholder,
                block,
                photo_box.x + 6,
                &mut py,
                PHOTO_PLACEHOLDER,
                photo_box.width.saturating_sub(12) as f32,
                mono,
            );
            block += 1;
        }

        // Fields below the photo.
        y = photo_box.y + photo_box.height + 14;
        for line in &model.lines {
            push_block(&mut runs, RunRole::Field, block, MARGIN, &mut y, &line.text(), inner as f32, mono);
            block += 1;
            y += 4;
        }

        RasterLayout {
            width: self.width,
            height: self.height,
            logo,
            photo_box,
            photo_drawn: model.photo.is_some(),
            runs,
        }
    }

    /// Paint `layout` onto a fresh canvas.
    pub fn paint(&self, model: &RenderModel, layout: &RasterLayout) -> Result<RgbImage, RenderError> {
        let mut canvas = RgbImage::from_pixel(layout.width, layout.height, PANEL);
        stroke_rect(
            &mut canvas,
            Rect {
                x: 0,
                y: 0,
                width: layout.width,
                height: layout.height,
            },
            ACCENT,
        );

        if let (Some(rect), Some(logo)) = (layout.logo, &model.logo) {
            blit_fit(&mut canvas, &logo.image, rect, RenderStage::RasterLogo)?;
        }

        let pb = layout.photo_box;
        match &model.photo {
            Some(photo) => blit_fit(&mut canvas, &photo.image, pb, RenderStage::RasterPhoto)?,
            None => {
                fill_rect(&mut canvas, pb, WHITE);
                stroke_rect(&mut canvas, pb, MUTED);
            }
        }

        for run in &layout.runs {
            let color = match run.role {
                RunRole::Title => ACCENT,
                RunRole::OrganizationName | RunRole::Field => INK,
                RunRole::Placeholder => MUTED,
            };
            draw_text(&mut canvas, run.x, run.y, &run.text, color);
        }
        Ok(canvas)
    }
}

impl CardRenderer for RasterRenderer {
    type Output = RasterCard;

    fn render(&self, model: &RenderModel) -> Result<RasterCard, RenderError> {
        let layout = self.layout(model);
        let canvas = self.paint(model, &layout)?;
        let png = asset::encode(&DynamicImage::ImageRgb8(canvas), MimeType::Png)
            .map_err(|e| RenderError::new(RenderStage::RasterEncode, e))?;
        log::debug!("Raster card {}: {} bytes", model.unique_id, png.len());
        Ok(RasterCard { png, layout })
    }
}

#[allow(clippy::too_many_arguments)]
fn push_block(
    runs: &mut Vec<TextRun>,
    role: RunRole,
    block: usize,
    x: u32,
    y: &mut u32,
    text: &str,
    max_width: f32,
    metrics: TextMetrics,
) {
    for line in wrap_text(text, max_width, metrics) {
        runs.push(TextRun {
            role,
            block,
            x,
            y: *y,
            text: drawable(&line),
        });
        *y += LINE_STEP;
    }
}

/// Scale `img` to fit inside `rect` keeping its aspect ratio, centred.
fn blit_fit(
    canvas: &mut RgbImage,
    img: &DynamicImage,
    rect: Rect,
    stage: RenderStage,
) -> Result<(), RenderError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(RenderError::new(stage, "image has no pixels"));
    }
    let scaled = img.resize(rect.width, rect.height, FilterType::Triangle).to_rgb8();
    let x = rect.x + (rect.width - scaled.width().min(rect.width)) / 2;
    let y = rect.y + (rect.height - scaled.height().min(rect.height)) / 2;
    imageops::replace(canvas, &scaled, x as i64, y as i64);
    Ok(())
}

fn fill_rect(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        if rect.contains(x, y) {
            *px = color;
        }
    }
}

fn stroke_rect(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let (right, bottom) = (rect.x + rect.width - 1, rect.y + rect.height - 1);
    for x in rect.x..=right {
        put(canvas, x, rect.y, color);
        put(canvas, x, bottom, color);
    }
    for y in rect.y..=bottom {
        put(canvas, rect.x, y, color);
        put(canvas, right, y, color);
    }
}

fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
}

/// `text` with every character that has no glyph replaced by `?`.
fn drawable(text: &str) -> String {
    text.chars()
        .map(|ch| if glyph(ch).is_some() { ch } else { '?' })
        .collect()
}

fn draw_text(canvas: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    for (i, ch) in text.chars().enumerate() {
        let bitmap = glyph(ch).or_else(|| glyph('?')).unwrap_or([0; 8]);
        let gx = x + i as u32 * GLYPH;
        for (row, bits) in bitmap.iter().enumerate() {
            for col in 0..GLYPH {
                // Bit 0 is the leftmost pixel.
                if bits & (1 << col) != 0 {
                    put(canvas, gx + col, y + row as u32, color);
                }
            }
        }
    }
}

/// Set a pixel, clipping to the canvas.
fn put(canvas: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::render::{CardField, CardImage, CardLine};

    fn model(photo: Option<DynamicImage>) -> RenderModel {
        let values = ["GWGM001", "Jane Doe", "Female", "Uyo", "Member"];
        RenderModel {
            organization_name: "GraciousWord Global Mission".into(),
            title: "GraciousWord Global Mission ID Card".into(),
            unique_id: "GWGM001".into(),
            lines: CardField::ORDER
                .into_iter()
                .zip(values)
                .map(|(field, v)| CardLine {
                    field,
                    value: v.into(),
                })
                .collect(),
            photo: photo.map(|image| CardImage {
                asset: Asset::new(asset::encode(&image, MimeType::Png).unwrap(), MimeType::Png),
                image,
            }),
            logo: None,
            document_filename: "GWGM001_id_card.pdf".into(),
        }
    }

    fn red_photo() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(60, 80, Rgb([200, 0, 0])))
    }

    #[test]
    fn canvas_has_configured_size() {
        let card = RasterRenderer::new(&Config::default())
            .render(&model(Some(red_photo())))
            .unwrap();
        let decoded = asset::decode(&card.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 400));
    }

    #[test]
    fn field_blocks_in_order() {
        let layout = RasterRenderer::new(&Config::default()).layout(&model(Some(red_photo())));
        assert_eq!(
            layout.blocks(RunRole::Field),
            vec![
                "Unique ID: GWGM001",
                "Name: Jane Doe",
                "Gender: Female",
                "Branch: Uyo",
                "Position: Member"
            ]
        );
        let ys: Vec<u32> = layout.runs.iter().filter(|r| r.role == RunRole::Field).map(|r| r.y).collect();
        assert!(ys.windows(2).all(|w| w[0] < w[1]));
        assert!(layout.runs.iter().all(|r| r.y + GLYPH <= layout.height));
    }

    #[test]
    fn photo_is_scaled_into_box() {
        let renderer = RasterRenderer::new(&Config::default());
        let m = model(Some(red_photo()));
        let layout = renderer.layout(&m);
        let canvas = renderer.paint(&m, &layout).unwrap();
        let pb = layout.photo_box;
        let centre = canvas.get_pixel(pb.x + pb.width / 2, pb.y + pb.height / 2);
        assert!(centre[0] > 190 && centre[1] < 10 && centre[2] < 10, "{centre:?}");
        // Outside the box the photo never bleeds.
        assert_ne!(*canvas.get_pixel(pb.x - 2, pb.y + pb.height / 2), Rgb([200, 0, 0]));
    }

    #[test]
    fn placeholder_when_no_photo() {
        let renderer = RasterRenderer::new(&Config::default());
        let m = model(None);
        let layout = renderer.layout(&m);
        assert!(!layout.photo_drawn);
        assert_eq!(layout.blocks(RunRole::Placeholder), vec![PHOTO_PLACEHOLDER]);
        let canvas = renderer.paint(&m, &layout).unwrap();
        let pb = layout.photo_box;
        assert_eq!(*canvas.get_pixel(pb.x, pb.y), MUTED);
    }

    #[test]
    fn long_name_wraps_inside_canvas() {
        let mut m = model(None);
        m.lines[1].value = "Abcdefghij ".repeat(9).trim_end().to_string();
        let layout = RasterRenderer::new(&Config::default()).layout(&m);
        let name_block = layout.runs.iter().find(|r| r.text.starts_with("Name:")).unwrap().block;
        let name_runs: Vec<_> = layout.runs.iter().filter(|r| r.block == name_block).collect();
        assert!(name_runs.len() > 1);
        assert!(name_runs.iter().all(|r| r.x + r.text.chars().count() as u32 * GLYPH <= 300 - MARGIN));
    }

    #[test]
    fn accented_names_keep_their_glyphs() {
        let mut m = model(None);
        m.lines[1].value = "José Ñúñez".into();
        let layout = RasterRenderer::new(&Config::default()).layout(&m);
        assert!(layout.blocks(RunRole::Field).contains(&"Name: José Ñúñez".to_string()));

        let mut accented = RgbImage::from_pixel(8, 8, WHITE);
        let mut fallback = RgbImage::from_pixel(8, 8, WHITE);
        draw_text(&mut accented, 0, 0, "é", INK);
        draw_text(&mut fallback, 0, 0, "?", INK);
        assert_ne!(accented, fallback);
    }

    #[test]
    fn runs_record_substituted_characters() {
        let mut m = model(None);
        m.lines[1].value = "Łukasz 王".into();
        let layout = RasterRenderer::new(&Config::default()).layout(&m);
        assert!(layout.blocks(RunRole::Field).contains(&"Name: ?ukasz ?".to_string()));
    }

    #[test]
    fn glyphs_are_drawn() {
        let mut canvas = RgbImage::from_pixel(16, 8, WHITE);
        draw_text(&mut canvas, 0, 0, "A", INK);
        assert!(canvas.pixels().any(|p| *p == INK));
    }
}

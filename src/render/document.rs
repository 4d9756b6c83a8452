//! Document encoding – a card-sized PDF.
//!
//! Geometry is fixed in points: title cell at the top, passport photo
//! centred below it at a fixed width (height follows the photo's aspect
//! ratio), then one text cell per field. A photo too tall for the space left
//! above the bottom margin is scaled down, keeping its aspect ratio. Cells
//! that would cross the bottom margin continue on a new card-sized page.

use std::collections::HashMap;

use crate::config::Config;
use crate::error::RenderError;
use crate::fonts::{wrap_text, TextMetrics};
use crate::layout_config::*;
use crate::pdf::{render_pdf, EmbeddedImage};

use super::{CardImage, CardRenderer, RenderModel, PHOTO_PLACEHOLDER};

const MARGIN: f32 = 14.0;
const FRAME_INSET: f32 = 6.0;
const LOGO_PT: f32 = 28.0;
const TITLE_SIZE: f32 = 11.0;
const FIELD_SIZE: f32 = 10.0;
const PLACEHOLDER_SIZE: f32 = 8.0;
const CELL_GAP: f32 = 4.0;

const INK: [f32; 3] = [0.2, 0.2, 0.2];
const ACCENT: [f32; 3] = [0.0, 0.48, 1.0];
const MUTED: [f32; 3] = [0.53, 0.53, 0.53];

/// PDF bytes, the layout they were written from, and the download name.
#[derive(Debug, Clone)]
pub struct DocumentCard {
    pub pdf: Vec<u8>,
    pub layout: DocumentLayout,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    page_width: f32,
    page_height: f32,
    photo_width: f32,
}

impl DocumentRenderer {
    pub fn new(config: &Config) -> Self {
        let page_width = config.page_width_pt();
        Self {
            page_width,
            page_height: config.page_height_pt(),
            photo_width: config.document_photo_width_pt().min(page_width - 2.0 * MARGIN),
        }
    }

    /// Compute the page geometry without writing a PDF.
    pub fn layout(&self, model: &RenderModel) -> DocumentLayout {
        let content_w = self.page_width - 2.0 * MARGIN;
        let mut pages = vec![PageLayout {
            page_index: 0,
            boxes: vec![self.frame()],
        }];

        // Header
        let mut title_x = MARGIN;
        if let Some(logo) = &model.logo {
            let mut lbox = LayoutBox::new(
                BoxRole::Logo,
                MARGIN,
                MARGIN,
                LOGO_PT,
                aspect_height(LOGO_PT, logo),
            );
            lbox.image = Some(ImageContent {
                slot: ImageSlot::Logo,
                width: lbox.width,
                height: lbox.height,
            });
            pages[0].boxes.push(lbox);
            title_x += LOGO_PT + 8.0;
        }
        let title = text_box(
            BoxRole::Title,
            title_x,
            MARGIN,
            self.page_width - MARGIN - title_x,
            &model.title,
            TITLE_SIZE,
            true,
            ACCENT,
        );
        let header_bottom = match &model.logo {
            Some(logo) => title.bottom().max(MARGIN + aspect_height(LOGO_PT, logo)),
            None => title.bottom(),
        };
        pages[0].boxes.push(title);

        // Photo (or placeholder), centred.
        let bottom_limit = self.page_height - MARGIN;
        let photo_x = (self.page_width - self.photo_width) / 2.0;
        let photo_y = header_bottom + 10.0;
        let photo_box = match &model.photo {
            Some(photo) => {
                let (width, height) = fit_photo(self.photo_width, bottom_limit - photo_y, photo);
                let mut lbox = LayoutBox::new(
                    BoxRole::Photo,
                    (self.page_width - width) / 2.0,
                    photo_y,
                    width,
                    height,
                );
                lbox.image = Some(ImageContent {
                    slot: ImageSlot::Passport,
                    width: lbox.width,
                    height: lbox.height,
                });
                lbox
            }
            None => {
                let mut lbox = text_box(
                    BoxRole::PhotoPlaceholder,
                    photo_x,
                    photo_y,
                    self.photo_width,
                    PHOTO_PLACEHOLDER,
                    PLACEHOLDER_SIZE,
                    false,
                    MUTED,
                );
                // Passport proportions, text vertically centred.
                lbox.height = self.photo_width * 4.0 / 3.0;
                if let Some(text) = &mut lbox.text {
                    let block_h = text.lines.len() as f32 * text.line_height;
                    let top = (lbox.height - block_h) / 2.0;
                    for line in &mut text.lines {
                        line.y_offset += top;
                    }
                }
                lbox.border = Some(BorderStyle {
                    width: 0.75,
                    color: MUTED,
                });
                lbox
            }
        };
        let mut y = photo_box.bottom() + 12.0;
        pages[0].boxes.push(photo_box);

        // Field cells, paginated.
        for line in &model.lines {
            let mut cell = text_box(
                BoxRole::Field,
                MARGIN,
                y,
                content_w,
                &line.text(),
                FIELD_SIZE,
                false,
                INK,
            );
            if cell.bottom() > bottom_limit && y > MARGIN {
                let page_index = pages.len();
                log::debug!("Card {} continues on page {}", model.unique_id, page_index + 1);
                pages.push(PageLayout {
                    page_index,
                    boxes: vec![self.frame()],
                });
                cell.y = MARGIN;
            }
            y = cell.bottom() + CELL_GAP;
            if let Some(page) = pages.last_mut() {
                page.boxes.push(cell);
            }
        }

        DocumentLayout {
            title: format!("{} - {}", model.title, model.unique_id),
            page_width_pt: self.page_width,
            page_height_pt: self.page_height,
            pages,
        }
    }

    fn frame(&self) -> LayoutBox {
        let mut frame = LayoutBox::new(
            BoxRole::Frame,
            FRAME_INSET,
            FRAME_INSET,
            self.page_width - 2.0 * FRAME_INSET,
            self.page_height - 2.0 * FRAME_INSET,
        );
        frame.background_color = Some([0.97, 0.98, 0.98]);
        frame.border = Some(BorderStyle {
            width: 1.5,
            color: ACCENT,
        });
        frame
    }
}

impl CardRenderer for DocumentRenderer {
    type Output = DocumentCard;

    fn render(&self, model: &RenderModel) -> Result<DocumentCard, RenderError> {
        let layout = self.layout(model);

        let mut images = HashMap::new();
        if let Some(photo) = &model.photo {
            images.insert(ImageSlot::Passport, embedded(photo));
        }
        if let Some(logo) = &model.logo {
            images.insert(ImageSlot::Logo, embedded(logo));
        }

        let pdf = render_pdf(&layout, &images)?;
        log::debug!(
            "Document card {}: {} bytes, {} page(s)",
            model.unique_id,
            pdf.len(),
            layout.pages.len()
        );
        Ok(DocumentCard {
            pdf,
            layout,
            filename: model.document_filename.clone(),
        })
    }
}

fn embedded(img: &CardImage) -> EmbeddedImage<'_> {
    EmbeddedImage {
        bytes: img.asset.bytes(),
        px_width: img.width(),
        px_height: img.height(),
    }
}

/// `width × original_height / original_width`.
fn aspect_height(width: f32, img: &CardImage) -> f32 {
    if img.width() == 0 {
        return width;
    }
    width * img.height() as f32 / img.width() as f32
}

/// Photo size at `width`, shrunk to `max_height` when taller.
fn fit_photo(width: f32, max_height: f32, img: &CardImage) -> (f32, f32) {
    let height = aspect_height(width, img);
    if height <= max_height || max_height <= 0.0 {
        return (width, height);
    }
    (width * max_height / height, max_height)
}

#[allow(clippy::too_many_arguments)]
fn text_box(
    role: BoxRole,
    x: f32,
    y: f32,
    width: f32,
    text: &str,
    font_size: f32,
    bold: bool,
    color: [f32; 3],
) -> LayoutBox {
    let line_height = font_size * 1.3;
    let metrics = TextMetrics::Helvetica { font_size, bold };
    let lines: Vec<TextLine> = wrap_text(text, width, metrics)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let x_offset = match role {
                BoxRole::PhotoPlaceholder => ((width - metrics.measure(&line)) / 2.0).max(0.0),
                _ => 0.0,
            };
            TextLine {
                text: line,
                x_offset,
                y_offset: i as f32 * line_height,
            }
        })
        .collect();
    let mut lbox = LayoutBox::new(role, x, y, width, lines.len() as f32 * line_height);
    lbox.text = Some(TextContent {
        lines,
        font_size,
        bold,
        color,
        line_height,
    });
    lbox
}

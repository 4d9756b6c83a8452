//! PDF writer – takes a [`DocumentLayout`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Images are handed over as in-memory byte buffers; nothing touches disk.

use std::collections::HashMap;

use printpdf::*;

use crate::error::{RenderError, RenderStage};
use crate::layout_config::*;

/// Encoded image bytes plus their pixel size.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedImage<'a> {
    pub bytes: &'a [u8],
    pub px_width: u32,
    pub px_height: u32,
}

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Write `layout` as a PDF.
///
/// Every image slot the layout draws must be present in `images` and must
/// decode; otherwise the whole document fails with
/// [`RenderStage::DocumentImage`] and no bytes are returned.
pub fn render_pdf(
    layout: &DocumentLayout,
    images: &HashMap<ImageSlot, EmbeddedImage<'_>>,
) -> Result<Vec<u8>, RenderError> {
    let page_w = Mm(layout.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(layout.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&layout.title);

    // ── Register the images the layout uses ───────────────────────────────
    let mut resources: HashMap<ImageSlot, ImageResource> = HashMap::new();
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();

    for lbox in layout.boxes() {
        let Some(img) = &lbox.image else { continue };
        if resources.contains_key(&img.slot) {
            continue;
        }
        let source = images.get(&img.slot).ok_or_else(|| {
            RenderError::new(
                RenderStage::DocumentImage,
                format!("no {:?} image supplied", img.slot),
            )
        })?;
        let raw = RawImage::decode_from_bytes(source.bytes, &mut warnings).map_err(|e| {
            RenderError::new(RenderStage::DocumentImage, format!("{:?}: {e}", img.slot))
        })?;
        let xobj_id = doc.add_image(&raw);
        resources.insert(
            img.slot,
            ImageResource {
                xobj_id,
                px_width: source.px_width,
                px_height: source.px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();
    for page_layout in &layout.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, layout.page_height_pt, &resources);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    for w in &warnings {
        log::debug!("printpdf: {w:?}");
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err(RenderError::new(
            RenderStage::DocumentEncode,
            "writer produced no PDF header",
        ));
    }
    Ok(bytes)
}

fn rgb(c: [f32; 3]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

/// Corners of a box in PDF space (origin bottom-left), clockwise from
/// top-left.
fn corners(lbox: &LayoutBox, page_height: f32) -> Vec<LinePoint> {
    let top = page_height - lbox.y;
    let bottom = top - lbox.height;
    let (left, right) = (lbox.x, lbox.x + lbox.width);
    [(left, top), (right, top), (right, bottom), (left, bottom)]
        .into_iter()
        .map(|(x, y)| LinePoint {
            p: Point { x: Pt(x), y: Pt(y) },
            bezier: false,
        })
        .collect()
}

fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<ImageSlot, ImageResource>,
) {
    // PDF coordinate system: origin at bottom-left; layout origin is top-left.
    let pdf_top = page_height - lbox.y;

    if let Some(bg) = lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: corners(lbox, page_height),
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: corners(lbox, page_height),
                is_closed: true,
            },
        });
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.slot) {
            let img_bottom_y = pdf_top - img.height;
            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                img.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height / res.px_height as f32
            } else {
                1.0
            };
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    if let Some(text) = &lbox.text {
        let font = if text.bold {
            BuiltinFont::HelveticaBold
        } else {
            BuiltinFont::Helvetica
        };
        for tline in text.lines.iter().filter(|l| !l.text.is_empty()) {
            // Baseline ≈ top of line + ascender (approx 0.75 × font_size)
            let text_y = pdf_top - tline.y_offset - text.font_size * 0.75;
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(lbox.x + tline.x_offset),
                    y: Pt(text_y),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font,
            });
            ops.push(Op::SetLineHeight {
                lh: Pt(text.line_height),
            });
            ops.push(Op::SetFillColor {
                col: rgb(text.color),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(tline.text.clone())],
                font,
            });
            ops.push(Op::EndTextSection);
        }
    }
}

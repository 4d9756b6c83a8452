//! Document layout – the intermediate representation between card layout
//! and PDF writing. This is the "frozen" structure that encodes exactly what
//! goes on each card page.

use serde::{Deserialize, Serialize};

/// A complete card document ready for writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages; the first page is the card face.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// What a box stands for on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxRole {
    Frame,
    Logo,
    Title,
    Photo,
    PhotoPlaceholder,
    Field,
}

/// Which attached image an [`ImageContent`] draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Passport,
    Logo,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    pub role: BoxRole,
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 3]>,
    pub border: Option<BorderStyle>,

    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub bold: bool,
    pub color: [f32; 3],
    pub line_height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (for alignment)
    pub x_offset: f32,
    /// Y offset from the top of the box
    pub y_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub slot: ImageSlot,
    /// Drawn size in points.
    pub width: f32,
    pub height: f32,
}

impl DocumentLayout {
    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// All boxes on all pages, in page order.
    pub fn boxes(&self) -> impl Iterator<Item = &LayoutBox> {
        self.pages.iter().flat_map(|p| p.boxes.iter())
    }
}

impl LayoutBox {
    pub fn new(role: BoxRole, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            role,
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// The box's text with wrapped lines rejoined.
    pub fn joined_text(&self) -> Option<String> {
        self.text.as_ref().map(|t| {
            t.lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip_keeps_roles() {
        let mut lbox = LayoutBox::new(BoxRole::Photo, 10.0, 20.0, 85.0, 113.0);
        lbox.image = Some(ImageContent {
            slot: ImageSlot::Passport,
            width: 85.0,
            height: 113.0,
        });
        let layout = DocumentLayout {
            title: "GWGM001".into(),
            page_width_pt: 283.46,
            page_height_pt: 425.2,
            pages: vec![PageLayout {
                page_index: 0,
                boxes: vec![lbox],
            }],
        };
        let parsed = DocumentLayout::from_json(&layout.to_json().unwrap()).unwrap();
        let b = parsed.boxes().next().unwrap();
        assert_eq!(b.role, BoxRole::Photo);
        assert_eq!(b.image.as_ref().unwrap().slot, ImageSlot::Passport);
        assert!((b.bottom() - 133.0).abs() < 0.01);
    }
}

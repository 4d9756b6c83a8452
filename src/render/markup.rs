//! Markup encoding – a self-contained HTML fragment with its own `<style>`.
//!
//! The photo column and the text column always stay side by side. Narrow
//! viewports shrink the photo column (150px → 110px → 72px) and the type
//! size; the flex row never wraps or turns into a column.

use std::fmt::Write as _;

use crate::dom::{self, DomNode, ElementNode, Tag};
use crate::error::{RenderError, RenderStage};

use super::{CardField, CardRenderer, RenderModel, PHOTO_PLACEHOLDER};

const STYLE: &str = r#"<style>
.id-card { border: 2px solid #007BFF; border-radius: 10px; padding: 15px; background-color: #F8F9FA; box-shadow: 0 4px 8px rgba(0, 0, 0, 0.1); max-width: 640px; margin: 0 auto; width: 92%; box-sizing: border-box; }
.id-card .header { display: flex; align-items: center; gap: 12px; margin-bottom: 10px; }
.id-card .header img.logo { width: 80px; height: auto; border-radius: 8px; object-fit: contain; background: white; padding: 4px; }
.id-card .header .org-name { font-weight: bold; color: #555; }
.id-card h3 { color: #007BFF; margin: 0; font-size: 22px; }
.id-card .layout { display: flex; flex-direction: row; flex-wrap: nowrap; gap: 15px; align-items: flex-start; }
.id-card .photo { flex: 0 1 150px; min-width: 72px; }
.id-card img.passport { display: block; width: 100%; height: auto; border: 1px solid #ccc; border-radius: 8px; }
.id-card .no-photo { display: flex; align-items: center; justify-content: center; aspect-ratio: 3 / 4; margin: 0; border: 1px dashed #aaa; border-radius: 8px; text-align: center; color: #888; font-size: 13px; }
.id-card .text { flex: 1 1 0; min-width: 0; font-size: 16px; line-height: 1.5; color: #333; overflow-wrap: anywhere; }
.id-card .text p { margin: 5px 0; border-bottom: 1px solid #eee; padding-bottom: 5px; }
.id-card .text p:last-child { border-bottom: none; }
@media (max-width: 600px) {
  .id-card { padding: 10px; }
  .id-card .layout { gap: 10px; }
  .id-card .photo { flex-basis: 110px; }
  .id-card .text { font-size: 14px; }
  .id-card h3 { font-size: 18px; }
}
@media (max-width: 360px) {
  .id-card .photo { flex-basis: 72px; }
  .id-card .text { font-size: 12px; }
  .id-card h3 { font-size: 15px; }
}
</style>"#;

/// Renders the HTML preview fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupRenderer;

impl CardRenderer for MarkupRenderer {
    type Output = String;

    fn render(&self, model: &RenderModel) -> Result<String, RenderError> {
        let mut html = String::with_capacity(4096);
        write_card(&mut html, model)
            .map_err(|e| RenderError::new(RenderStage::Markup, e))?;
        Ok(html)
    }
}

fn write_card(html: &mut String, model: &RenderModel) -> std::fmt::Result {
    html.push_str(STYLE);
    html.push_str("\n<div class=\"id-card\">\n  <div class=\"header\">\n");
    match &model.logo {
        Some(logo) => writeln!(
            html,
            "    <img class=\"logo\" src=\"{}\" alt=\"Organization Logo\">",
            logo.asset.data_uri()
        )?,
        None => writeln!(
            html,
            "    <span class=\"org-name\">{}</span>",
            dom::escape_html(&model.organization_name)
        )?,
    }
    writeln!(html, "    <h3>{}</h3>", dom::escape_html(&model.title))?;
    html.push_str("  </div>\n  <div class=\"layout\">\n    <div class=\"photo\">\n");
    match &model.photo {
        Some(photo) => writeln!(
            html,
            "      <img class=\"passport\" src=\"{}\" alt=\"Passport Photo\">",
            photo.asset.data_uri()
        )?,
        None => writeln!(html, "      <p class=\"no-photo\">{PHOTO_PLACEHOLDER}</p>")?,
    }
    html.push_str("    </div>\n    <div class=\"text\">\n");
    for line in &model.lines {
        writeln!(
            html,
            "      <p><strong>{}:</strong> {}</p>",
            line.field.label(),
            dom::escape_html(&line.value)
        )?;
    }
    html.push_str("    </div>\n  </div>\n</div>\n");
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading a fragment back
// ---------------------------------------------------------------------------

/// What a rendered preview shows, read back from its markup.
#[derive(Debug, Clone, Default)]
pub struct MarkupSummary {
    /// Labeled lines in document order.
    pub lines: Vec<(CardField, String)>,
    /// `src` of the passport `<img>`, if any.
    pub photo_src: Option<String>,
    pub has_placeholder: bool,
    pub logo_src: Option<String>,
}

/// Parse a preview fragment produced by [`MarkupRenderer`].
pub fn inspect(html: &str) -> MarkupSummary {
    let nodes = dom::parse_html(html);
    let mut summary = MarkupSummary::default();

    if let Some(photo) = dom::find_class(&nodes, "photo") {
        for child in photo.elements() {
            if child.tag == Tag::Img && child.has_class("passport") {
                summary.photo_src = child.src().map(str::to_string);
            } else if child.has_class("no-photo") {
                summary.has_placeholder = true;
            }
        }
    }
    summary.logo_src = dom::find_class(&nodes, "logo").and_then(|e| e.src().map(str::to_string));

    if let Some(text) = dom::find_class(&nodes, "text") {
        summary.lines = text
            .elements()
            .filter(|e| e.tag == Tag::P)
            .filter_map(labeled_line)
            .collect();
    }
    summary
}

fn labeled_line(p: &ElementNode) -> Option<(CardField, String)> {
    let label = p.children.iter().find_map(|c| match c {
        DomNode::Element(e) if e.tag == Tag::Strong => Some(e.text_content()),
        _ => None,
    })?;
    let field = CardField::ORDER
        .into_iter()
        .find(|f| label.trim().trim_end_matches(':') == f.label())?;
    let text = p.text_content();
    let value = text.strip_prefix(label.as_str()).unwrap_or(&text).trim();
    Some((field, value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{self, Asset, MimeType};
    use crate::render::{CardImage, CardLine};
    use image::{DynamicImage, RgbImage};

    fn model(photo: bool, logo: bool) -> RenderModel {
        let img = DynamicImage::ImageRgb8(RgbImage::new(3, 4));
        let card_image = || CardImage {
            asset: Asset::new(asset::encode(&img, MimeType::Png).unwrap(), MimeType::Png),
            image: img.clone(),
        };
        let values = ["GWGM001", "Ada <Lovelace> & Co", "Female", "Uyo", "Unit Head"];
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
            photo: photo.then(card_image),
            logo: logo.then(card_image),
            document_filename: "GWGM001_id_card.pdf".into(),
        }
    }

    #[test]
    fn fields_in_fixed_order() {
        let html = MarkupRenderer.render(&model(true, false)).unwrap();
        let positions: Vec<usize> = ["Unique ID:", "Name:", "Gender:", "Branch:", "Position:"]
            .iter()
            .map(|l| html.find(l).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn values_are_escaped() {
        let html = MarkupRenderer.render(&model(true, false)).unwrap();
        assert!(html.contains("Ada &lt;Lovelace&gt; &amp; Co"));
        assert!(!html.contains("<Lovelace>"));
    }

    #[test]
    fn layout_never_stacks() {
        let html = MarkupRenderer.render(&model(true, false)).unwrap();
        assert!(html.contains("flex-wrap: nowrap"));
        assert!(!html.contains("flex-direction: column"));
        assert!(html.contains("@media (max-width: 360px)"));
    }

    #[test]
    fn logo_or_name_fallback() {
        let with_logo = MarkupRenderer.render(&model(true, true)).unwrap();
        assert!(with_logo.contains("class=\"logo\" src=\"data:image/png;base64,"));
        assert!(!with_logo.contains("org-name\">"));

        let without = MarkupRenderer.render(&model(true, false)).unwrap();
        assert!(without.contains("<span class=\"org-name\">GraciousWord Global Mission</span>"));
    }

    #[test]
    fn placeholder_without_photo() {
        let html = MarkupRenderer.render(&model(false, false)).unwrap();
        let summary = inspect(&html);
        assert!(summary.has_placeholder);
        assert!(summary.photo_src.is_none());
        assert!(html.contains(PHOTO_PLACEHOLDER));
    }

    #[test]
    fn inspect_reads_back_lines() {
        let m = model(true, true);
        let summary = inspect(&MarkupRenderer.render(&m).unwrap());
        let expected: Vec<(CardField, String)> =
            m.lines.iter().map(|l| (l.field, l.value.clone())).collect();
        assert_eq!(summary.lines, expected);
        assert!(summary.photo_src.unwrap().starts_with("data:image/png;base64,"));
        assert!(summary.logo_src.is_some());
        assert!(!summary.has_placeholder);
    }
}

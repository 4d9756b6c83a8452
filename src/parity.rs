//! Cross-encoding check: every encoding must show the same labeled values,
//! in the same order, and agree on whether a photo is present.
//!
//! Each encoding is read back from what it actually produced (the parsed
//! markup, the raster text runs, the document text cells) rather than from
//! the model. Wrapping may split a value anywhere, so values are compared
//! with whitespace removed.

use crate::error::{RenderError, RenderStage};
use crate::layout_config::BoxRole;
use crate::render::markup;
use crate::render::raster::RunRole;
use crate::render::{CardField, RenderModel, RenderedCard};

/// What one encoding shows.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Shown {
    lines: Vec<(CardField, String)>,
    photo: bool,
}

/// Verify that the markup, raster and document encodings agree with the model.
pub fn check(model: &RenderModel, card: &RenderedCard) -> Result<(), RenderError> {
    let expected = Shown {
        lines: model
            .lines
            .iter()
            .map(|l| (l.field, squash(&l.value)))
            .collect(),
        photo: model.photo.is_some(),
    };

    for (name, shown) in [
        ("markup", from_markup(&card.markup)),
        ("raster", from_raster(card)),
        ("document", from_document(card)),
    ] {
        if shown != expected {
            log::warn!("Card {} {name} encoding disagrees: {shown:?}", model.unique_id);
            return Err(RenderError::new(
                RenderStage::Parity,
                format!("{name} encoding does not match the record"),
            ));
        }
    }
    Ok(())
}

fn from_markup(html: &str) -> Shown {
    let summary = markup::inspect(html);
    Shown {
        lines: summary
            .lines
            .into_iter()
            .map(|(field, value)| (field, squash(&value)))
            .collect(),
        photo: summary.photo_src.is_some() && !summary.has_placeholder,
    }
}

fn from_raster(card: &RenderedCard) -> Shown {
    let layout = &card.raster.layout;
    Shown {
        lines: parse_lines(layout.blocks(RunRole::Field).iter().map(String::as_str)),
        photo: layout.photo_drawn && layout.blocks(RunRole::Placeholder).is_empty(),
    }
}

fn from_document(card: &RenderedCard) -> Shown {
    let layout = &card.document.layout;
    let texts: Vec<String> = layout
        .boxes()
        .filter(|b| b.role == BoxRole::Field)
        .filter_map(|b| b.joined_text())
        .collect();
    let has = |role: BoxRole| layout.boxes().any(|b| b.role == role);
    Shown {
        lines: parse_lines(texts.iter().map(String::as_str)),
        photo: has(BoxRole::Photo) && !has(BoxRole::PhotoPlaceholder),
    }
}

fn parse_lines<'a>(texts: impl Iterator<Item = &'a str>) -> Vec<(CardField, String)> {
    texts
        .filter_map(CardField::parse_line)
        .map(|(field, value)| (field, squash(value)))
        .collect()
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{self, Asset, MimeType};
    use crate::config::Config;
    use crate::render::{render_all, CardImage, CardLine};
    use image::{DynamicImage, RgbImage};

    fn model(photo: bool) -> RenderModel {
        let values = ["GWGM007", "Jane Doe", "Female", "Eket", "Unit Head"];
        let image = DynamicImage::ImageRgb8(RgbImage::new(30, 40));
        RenderModel {
            organization_name: "GraciousWord Global Mission".into(),
            title: "GraciousWord Global Mission ID Card".into(),
            unique_id: "GWGM007".into(),
            lines: CardField::ORDER
                .into_iter()
                .zip(values)
                .map(|(field, v)| CardLine {
                    field,
                    value: v.into(),
                })
                .collect(),
            photo: photo.then(|| CardImage {
                asset: Asset::new(asset::encode(&image, MimeType::Png).unwrap(), MimeType::Png),
                image: image.clone(),
            }),
            logo: None,
            document_filename: "GWGM007_id_card.pdf".into(),
        }
    }

    #[test]
    fn all_encodings_agree() {
        let config = Config::default();
        for photo in [true, false] {
            let m = model(photo);
            let card = render_all(&m, &config).unwrap();
            assert!(check(&m, &card).is_ok());
        }
    }

    #[test]
    fn long_value_wrapped_still_agrees() {
        let mut m = model(true);
        m.lines[1].value = "Chukwuemekaolisaebuka Nwachukwu-Okonkwo Adebayo".into();
        let card = render_all(&m, &Config::default()).unwrap();
        assert!(check(&m, &card).is_ok());
    }

    #[test]
    fn accented_name_agrees() {
        let mut m = model(true);
        m.lines[1].value = "José Doe".into();
        let card = render_all(&m, &Config::default()).unwrap();
        assert!(card
            .raster
            .layout
            .blocks(RunRole::Field)
            .contains(&"Name: José Doe".to_string()));
    }

    #[test]
    fn name_without_raster_glyphs_is_caught() {
        let mut m = model(true);
        m.lines[1].value = "Łukasz Doe".into();
        let err = render_all(&m, &Config::default()).unwrap_err();
        assert_eq!(err.stage, RenderStage::Parity);
        assert!(err.reason.contains("raster"));
    }

    #[test]
    fn tampered_markup_is_caught() {
        let m = model(true);
        let mut card = render_all(&m, &Config::default()).unwrap();
        card.markup = card.markup.replace("Jane Doe", "John Doe");
        let err = check(&m, &card).unwrap_err();
        assert_eq!(err.stage, RenderStage::Parity);
        assert!(err.reason.contains("markup"));
    }

    #[test]
    fn dropped_raster_line_is_caught() {
        let m = model(false);
        let mut card = render_all(&m, &Config::default()).unwrap();
        card.raster
            .layout
            .runs
            .retain(|r| !r.text.starts_with("Branch"));
        let err = check(&m, &card).unwrap_err();
        assert!(err.reason.contains("raster"));
    }

    #[test]
    fn photo_disagreement_is_caught() {
        let with_photo = model(true);
        let card = render_all(&with_photo, &Config::default()).unwrap();
        let without = model(false);
        assert!(check(&without, &card).is_err());
    }
}

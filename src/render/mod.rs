//! Multi-format card renderer.
//!
//! A finalized record is projected once into a [`RenderModel`]; the three
//! encodings read the same ordered field list from it:
//!
//! 1. **Markup** – self-contained HTML fragment for on-screen preview ([`markup`])
//! 2. **Raster** – fixed-canvas PNG ([`raster`])
//! 3. **Document** – card-sized PDF ([`document`])
//!
//! [`render_all`] runs all three and then checks that they agree
//! ([`crate::parity`]).

pub mod document;
pub mod markup;
pub mod raster;

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::asset::Asset;
use crate::config::Config;
use crate::error::{RenderError, RenderStage, Result};
use crate::parity;
use crate::record::MembershipRecord;

pub use document::{DocumentCard, DocumentRenderer};
pub use markup::MarkupRenderer;
pub use raster::{RasterCard, RasterRenderer};

/// Shown in place of the photo by every encoding when none is attached.
pub const PHOTO_PLACEHOLDER: &str = "No passport photo uploaded";

/// The fields every encoding shows, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardField {
    UniqueId,
    Name,
    Gender,
    Branch,
    Position,
}

impl CardField {
    pub const ORDER: [CardField; 5] = [
        CardField::UniqueId,
        CardField::Name,
        CardField::Gender,
        CardField::Branch,
        CardField::Position,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CardField::UniqueId => "Unique ID",
            CardField::Name => "Name",
            CardField::Gender => "Gender",
            CardField::Branch => "Branch",
            CardField::Position => "Position",
        }
    }

    /// Split `"Label: value"` into its field and value.
    pub fn parse_line(line: &str) -> Option<(CardField, &str)> {
        let (label, value) = line.split_once(':')?;
        let field = Self::ORDER
            .into_iter()
            .find(|f| f.label() == label.trim())?;
        Some((field, value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLine {
    pub field: CardField,
    pub value: String,
}

impl CardLine {
    /// `"Label: value"`, as drawn by the raster and document encodings.
    pub fn text(&self) -> String {
        format!("{}: {}", self.field.label(), self.value)
    }
}

/// An attached image, decoded once for all encodings.
#[derive(Debug, Clone)]
pub struct CardImage {
    pub asset: Asset,
    pub image: DynamicImage,
}

impl CardImage {
    fn decode(asset: &Asset) -> Result<Self, RenderError> {
        let image = asset
            .decode()
            .map_err(|e| RenderError::new(RenderStage::Model, e))?;
        Ok(Self {
            asset: asset.clone(),
            image,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Everything the encodings draw, derived once from a record.
#[derive(Debug, Clone)]
pub struct RenderModel {
    pub organization_name: String,
    pub title: String,
    pub unique_id: String,
    /// Always in [`CardField::ORDER`].
    pub lines: Vec<CardLine>,
    pub photo: Option<CardImage>,
    pub logo: Option<CardImage>,
    pub document_filename: String,
}

impl RenderModel {
    pub fn from_record(
        record: &MembershipRecord,
        logo: Option<&Asset>,
        config: &Config,
    ) -> Result<Self, RenderError> {
        let lines = CardField::ORDER
            .into_iter()
            .map(|field| {
                let value = match field {
                    CardField::UniqueId => record.unique_id().to_string(),
                    CardField::Name => record.name().to_string(),
                    CardField::Gender => record.gender().to_string(),
                    CardField::Branch => record.branch().to_string(),
                    CardField::Position => record.position().to_string(),
                };
                CardLine { field, value }
            })
            .collect();

        Ok(Self {
            organization_name: config.organization_name.clone(),
            title: config.card_title.clone(),
            unique_id: record.unique_id().to_string(),
            lines,
            photo: record.passport().map(CardImage::decode).transpose()?,
            logo: logo.map(CardImage::decode).transpose()?,
            document_filename: record.document_filename(),
        })
    }
}

/// One output encoding of a card.
pub trait CardRenderer {
    type Output;

    fn render(&self, model: &RenderModel) -> Result<Self::Output, RenderError>;
}

/// All three encodings of one card.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub markup: String,
    pub raster: RasterCard,
    pub document: DocumentCard,
}

impl RenderedCard {
    /// Write `{id}_id_card.pdf`, `.png` and `.html` into `dir`.
    ///
    /// Each file is first written under a hidden `.part` name; the final
    /// names appear only after all three are on disk. A failed write removes
    /// the staged files and leaves `dir` as it was.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let stem = self
            .document
            .filename
            .strip_suffix(".pdf")
            .unwrap_or(&self.document.filename);
        let files = [
            (self.document.filename.clone(), self.document.pdf.as_slice()),
            (format!("{stem}.png"), self.raster.png.as_slice()),
            (format!("{stem}.html"), self.markup.as_bytes()),
        ];

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
        for (name, bytes) in &files {
            let part = dir.join(format!(".{name}.part"));
            if let Err(e) = fs::write(&part, bytes) {
                log::warn!("Writing '{}' failed; discarding staged files", part.display());
                for path in staged.iter().map(|(p, _)| p).chain([&part]) {
                    let _ = fs::remove_file(path);
                }
                return Err(e.into());
            }
            staged.push((part, dir.join(name)));
        }
        for (part, target) in &staged {
            fs::rename(part, target)?;
        }
        Ok(staged.into_iter().map(|(_, target)| target).collect())
    }
}

/// Render every encoding, then verify they agree.
pub fn render_all(model: &RenderModel, config: &Config) -> Result<RenderedCard, RenderError> {
    log::debug!("Rendering card {}", model.unique_id);
    let card = RenderedCard {
        markup: MarkupRenderer.render(model)?,
        raster: RasterRenderer::new(config).render(model)?,
        document: DocumentRenderer::new(config).render(model)?,
    };
    parity::check(model, &card)?;
    Ok(card)
}

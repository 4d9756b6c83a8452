//! Pipeline – ties validation, identity allocation, the record store and the
//! renderers together behind one intake surface.
//!
//! ```text
//! form ─► Validator ─(pass)─► RecordStore::finalize ─► MembershipRecord
//!                                  │ (IdentityAllocator)
//!                                  ▼
//!                         RenderModel ─► markup / raster / document
//! ```
//!
//! Validation failures come back as [`Submission::Rejected`] data; only asset,
//! store and render problems are [`Error`]s.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::allocator::IdentityAllocator;
use crate::asset::Asset;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::{MembershipRecord, RegistrationForm};
use crate::render::{render_all, RenderModel, RenderedCard};
use crate::store::RecordStore;
use crate::validation::{Field, FieldFailure, Mode, Validator};

/// Outcome of [`Pipeline::submit`].
#[derive(Debug, Clone)]
pub enum Submission {
    Accepted(Arc<MembershipRecord>),
    /// The first failing rule; nothing was stored and no id was drawn.
    Rejected(FieldFailure),
}

impl Submission {
    pub fn record(&self) -> Option<&Arc<MembershipRecord>> {
        match self {
            Submission::Accepted(record) => Some(record),
            Submission::Rejected(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FieldFailure> {
        match self {
            Submission::Accepted(_) => None,
            Submission::Rejected(failure) => Some(failure),
        }
    }
}

pub struct Pipeline {
    config: Config,
    store: RecordStore,
    logo: Option<Asset>,
    today: Option<NaiveDate>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let allocator = Arc::new(IdentityAllocator::new(config.id_prefix.clone(), config.id_width));
        Self::with_allocator(config, allocator)
    }

    /// Share an allocator between pipelines so they draw from one sequence.
    pub fn with_allocator(config: Config, allocator: Arc<IdentityAllocator>) -> Self {
        Self {
            config,
            store: RecordStore::new(allocator),
            logo: None,
            today: None,
        }
    }

    /// Pin "today" for date-of-birth checks instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Organisation logo for the card header; `None` falls back to the name.
    pub fn set_logo(&mut self, logo: Option<Asset>) {
        self.logo = logo;
    }

    /// Every current failure of `field`, recomputed from the whole form.
    pub fn feedback(&self, form: &RegistrationForm, field: Field) -> Vec<FieldFailure> {
        self.validator().feedback(form, field)
    }

    /// Every current failure, in rule order.
    pub fn review(&self, form: &RegistrationForm) -> Vec<FieldFailure> {
        self.validator()
            .validate(form, Mode::Accumulate)
            .failures()
            .to_vec()
    }

    /// Validate `form` and, when it passes, finalize it under a fresh id,
    /// replacing any record already held.
    pub fn submit(&self, form: &RegistrationForm) -> Result<Submission> {
        let report = self.validator().validate(form, Mode::ShortCircuit);
        if let Some(failure) = report.first() {
            log::debug!("Submission rejected on {}: {}", failure.field, failure.message);
            return Ok(Submission::Rejected(failure.clone()));
        }
        let record = self.store.finalize(form, &report)?;
        Ok(Submission::Accepted(record))
    }

    pub fn current(&self) -> Option<Arc<MembershipRecord>> {
        self.store.current()
    }

    /// Render all three encodings of the held record.
    pub fn render(&self) -> Result<RenderedCard> {
        let record = self.store.current().ok_or(Error::NoRecord)?;
        let model = RenderModel::from_record(&record, self.logo.as_ref(), &self.config)?;
        let card = render_all(&model, &self.config).inspect_err(|e| {
            log::error!("Card {} failed to render: {e}", record.unique_id());
        })?;
        Ok(card)
    }

    /// Discard the held record; the id counter keeps counting.
    pub fn start_over(&self) {
        self.store.clear();
    }

    /// Restart numbering at 1. The held record, if any, is kept.
    pub fn reset_counter(&self) {
        self.store.allocator().reset();
    }

    fn validator(&self) -> Validator {
        let validator = Validator::new(&self.config);
        match self.today {
            Some(today) => validator.with_today(today),
            None => validator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{self, MimeType};
    use crate::record::Upload;
    use crate::validation::FieldErrorKind;
    use image::{DynamicImage, RgbImage};

    fn form() -> RegistrationForm {
        let png = asset::encode(&DynamicImage::ImageRgb8(RgbImage::new(30, 40)), MimeType::Png).unwrap();
        RegistrationForm {
            passport: Some(Upload::new(png, "image/png")),
            name: "Grace Etim".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17),
            phone: "0803 555 0101".into(),
            address: "4 Church Rd, Uyo".into(),
            occupation: "Nurse".into(),
            branch: "Uyo".into(),
            position: "Worker".into(),
            motivation: "Service".into(),
            ..Default::default()
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Config::default())
    }

    #[test]
    fn rejected_submission_draws_no_id() {
        let p = pipeline();
        let mut f = form();
        f.name = "   ".into();
        let outcome = p.submit(&f).unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.field, Field::Name);
        assert_eq!(failure.kind, FieldErrorKind::MissingRequiredField);
        assert!(p.current().is_none());
        assert_eq!(p.store.allocator().issued(), 0);
    }

    #[test]
    fn render_without_record_is_no_record() {
        assert!(matches!(pipeline().render(), Err(Error::NoRecord)));
    }

    #[test]
    fn submit_then_render() {
        let p = pipeline();
        let record = p.submit(&form()).unwrap().record().cloned().unwrap();
        assert_eq!(record.unique_id(), "GWGM001");
        let card = p.render().unwrap();
        assert!(card.markup.contains("Grace Etim"));
        assert_eq!(card.document.filename, "GWGM001_id_card.pdf");
    }

    #[test]
    fn start_over_keeps_counter() {
        let p = pipeline();
        p.submit(&form()).unwrap();
        p.start_over();
        assert!(p.current().is_none());
        let second = p.submit(&form()).unwrap();
        assert_eq!(second.record().unwrap().unique_id(), "GWGM002");
    }

    #[test]
    fn reset_counter_restarts_numbering() {
        let p = pipeline();
        p.submit(&form()).unwrap();
        p.submit(&form()).unwrap();
        p.reset_counter();
        assert_eq!(p.current().unwrap().unique_id(), "GWGM002");
        let next = p.submit(&form()).unwrap();
        assert_eq!(next.record().unwrap().unique_id(), "GWGM001");
    }

    #[test]
    fn feedback_is_per_field() {
        let p = pipeline();
        let mut f = form();
        f.phone.clear();
        f.address = "x".repeat(201);
        assert_eq!(p.feedback(&f, Field::Phone).len(), 1);
        let address = p.feedback(&f, Field::Address);
        assert_eq!(address[0].kind, FieldErrorKind::FieldTooLong { max: 200 });
        assert!(p.feedback(&f, Field::Name).is_empty());
        assert_eq!(p.review(&f).len(), 2);
    }

    #[test]
    fn logo_reaches_every_encoding() {
        let mut p = pipeline();
        let logo = asset::encode(&DynamicImage::ImageRgb8(RgbImage::new(16, 16)), MimeType::Png).unwrap();
        p.set_logo(Some(Asset::new(logo, MimeType::Png)));
        p.submit(&form()).unwrap();
        let card = p.render().unwrap();
        assert!(card.markup.contains("class=\"logo\""));
        assert!(card.raster.layout.logo.is_some());
        assert!(card
            .document
            .layout
            .boxes()
            .any(|b| b.role == crate::layout_config::BoxRole::Logo));
    }
}

//! Record store – holds at most one finalized record.
//!
//! `finalize` and `clear` take the same lock, and the identifier is drawn
//! while it is held, so a finalize never interleaves with a clear.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};

use crate::allocator::IdentityAllocator;
use crate::error::{Error, Result};
use crate::record::{MembershipRecord, RegistrationForm};
use crate::validation::{self, ValidationReport};

pub struct RecordStore {
    allocator: Arc<IdentityAllocator>,
    slot: Mutex<Option<Arc<MembershipRecord>>>,
}

impl RecordStore {
    pub fn new(allocator: Arc<IdentityAllocator>) -> Self {
        Self {
            allocator,
            slot: Mutex::new(None),
        }
    }

    pub fn allocator(&self) -> &Arc<IdentityAllocator> {
        &self.allocator
    }

    /// Freeze `form` into a record with a fresh identifier, replacing any
    /// record already held.
    ///
    /// `report` must be a passing report produced for this exact form;
    /// anything else is [`Error::PreconditionFailed`] and leaves both the
    /// store and the counter untouched.
    pub fn finalize(
        &self,
        form: &RegistrationForm,
        report: &ValidationReport,
    ) -> Result<Arc<MembershipRecord>> {
        self.finalize_on(form, report, Local::now().date_naive())
    }

    pub(crate) fn finalize_on(
        &self,
        form: &RegistrationForm,
        report: &ValidationReport,
        issued_on: NaiveDate,
    ) -> Result<Arc<MembershipRecord>> {
        if !report.covers(form) {
            return Err(Error::PreconditionFailed(
                "form was not validated (or changed after validation)".to_string(),
            ));
        }
        if let Some(failure) = report.first() {
            return Err(Error::PreconditionFailed(format!(
                "validation failed on {}: {}",
                failure.field, failure.message
            )));
        }
        let fields = validation::accept(form).ok_or_else(|| {
            Error::PreconditionFailed("form does not satisfy the validation rules".to_string())
        })?;

        let mut slot = self.lock();
        let record = Arc::new(MembershipRecord::freeze(self.allocator.next(), fields, issued_on));
        if let Some(previous) = slot.replace(Arc::clone(&record)) {
            log::debug!("Replacing record {}", previous.unique_id());
        }
        log::info!("Finalized record {}", record.unique_id());
        Ok(record)
    }

    pub fn current(&self) -> Option<Arc<MembershipRecord>> {
        self.lock().clone()
    }

    /// Discard the held record. The counter is not touched.
    pub fn clear(&self) {
        if let Some(previous) = self.lock().take() {
            log::info!("Cleared record {}", previous.unique_id());
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<MembershipRecord>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{self, MimeType};
    use crate::config::Config;
    use crate::record::{Gender, Upload};
    use crate::validation::{Mode, Validator};
    use image::{DynamicImage, RgbImage};

    fn form(name: &str) -> RegistrationForm {
        let png = asset::encode(&DynamicImage::ImageRgb8(RgbImage::new(3, 4)), MimeType::Png).unwrap();
        RegistrationForm {
            passport: Some(Upload::new(png, "image/png")),
            name: name.into(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 1, 2),
            gender: Gender::Male,
            phone: "555-0000".into(),
            address: "1 Main Rd".into(),
            occupation: "Farmer".into(),
            branch: "Eket".into(),
            position: "Deacon".into(),
            motivation: "Fellowship".into(),
        }
    }

    fn store() -> RecordStore {
        RecordStore::new(Arc::new(IdentityAllocator::default()))
    }

    #[test]
    fn finalize_assigns_id_once() {
        let store = store();
        let v = Validator::new(&Config::default());
        let f = form("John");
        let report = v.validate(&f, Mode::ShortCircuit);
        let record = store.finalize(&f, &report).unwrap();
        assert_eq!(record.unique_id(), "GWGM001");
        assert_eq!(store.current().unwrap().unique_id(), "GWGM001");
    }

    #[test]
    fn failed_report_is_rejected() {
        let store = store();
        let v = Validator::new(&Config::default());
        let f = form("  ");
        let report = v.validate(&f, Mode::ShortCircuit);
        assert!(matches!(
            store.finalize(&f, &report),
            Err(Error::PreconditionFailed(_))
        ));
        assert!(store.current().is_none());
        assert_eq!(store.allocator().issued(), 0);
    }

    #[test]
    fn report_for_other_form_is_rejected() {
        let store = store();
        let v = Validator::new(&Config::default());
        let report = v.validate(&form("John"), Mode::ShortCircuit);
        assert!(matches!(
            store.finalize(&form("Mary"), &report),
            Err(Error::PreconditionFailed(_))
        ));
    }

    #[test]
    fn second_finalize_replaces_first() {
        let store = store();
        let v = Validator::new(&Config::default());
        let (a, b) = (form("John"), form("Mary"));
        let first = store.finalize(&a, &v.validate(&a, Mode::ShortCircuit)).unwrap();
        store.finalize(&b, &v.validate(&b, Mode::ShortCircuit)).unwrap();
        let held = store.current().unwrap();
        assert_eq!(held.name(), "Mary");
        assert_eq!(held.unique_id(), "GWGM002");
        assert_eq!(first.unique_id(), "GWGM001");
    }

    #[test]
    fn clear_keeps_counter() {
        let store = store();
        let v = Validator::new(&Config::default());
        let f = form("John");
        store.finalize(&f, &v.validate(&f, Mode::ShortCircuit)).unwrap();
        store.clear();
        assert!(store.current().is_none());
        let again = store.finalize(&f, &v.validate(&f, Mode::ShortCircuit)).unwrap();
        assert_eq!(again.unique_id(), "GWGM002");
    }
}

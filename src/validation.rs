//! Validation engine – decides whether a [`RegistrationForm`] may be
//! finalized.
//!
//! Rules run in a fixed priority order. [`Mode::ShortCircuit`] stops at the
//! first failure (submission); [`Mode::Accumulate`] reports every failure
//! (live per-field feedback). Both are recomputed from the form on each call;
//! nothing is remembered between calls.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::asset::{self, Asset, MimeType};
use crate::config::Config;
use crate::record::{Branch, Position, RecordFields, RegistrationForm};

/// Form fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Passport,
    Name,
    DateOfBirth,
    Phone,
    Address,
    Occupation,
    Branch,
    Position,
    Motivation,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Passport => "passport",
            Field::Name => "name",
            Field::DateOfBirth => "date_of_birth",
            Field::Phone => "phone",
            Field::Address => "address",
            Field::Occupation => "occupation",
            Field::Branch => "branch",
            Field::Position => "position",
            Field::Motivation => "motivation",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    MissingRequiredField,
    FieldTooLong { max: usize },
    AssetTooLarge { max: usize, actual: usize },
    AssetWrongType,
    AssetNotDecodable,
    InvalidChoice,
    DateOutOfRange,
    InvalidFormat,
}

/// One failed rule, attributed to a field, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field: Field,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldFailure {
    fn new(field: Field, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ShortCircuit,
    Accumulate,
}

/// The outcome of one validation pass over one form.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    failures: Vec<FieldFailure>,
    digest: u64,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    pub fn first(&self) -> Option<&FieldFailure> {
        self.failures.first()
    }

    pub fn failures_for(&self, field: Field) -> impl Iterator<Item = &FieldFailure> {
        self.failures.iter().filter(move |f| f.field == field)
    }

    /// True when this report was produced for exactly `form`.
    pub fn covers(&self, form: &RegistrationForm) -> bool {
        self.digest == form_digest(form)
    }
}

fn form_digest(form: &RegistrationForm) -> u64 {
    let mut hasher = DefaultHasher::new();
    form.hash(&mut hasher);
    hasher.finish()
}

pub struct Validator {
    config: Config,
    today: NaiveDate,
}

impl Validator {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            today: Local::now().date_naive(),
        }
    }

    /// Pin "today" (upper bound for the date of birth).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn validate(&self, form: &RegistrationForm, mode: Mode) -> ValidationReport {
        let mut failures = Vec::new();
        for rule in self.rules() {
            if let Some(failure) = rule(self, form) {
                failures.push(failure);
                if mode == Mode::ShortCircuit {
                    break;
                }
            }
        }
        ValidationReport {
            failures,
            digest: form_digest(form),
        }
    }

    /// Live feedback for a single field; recomputed from scratch.
    pub fn feedback(&self, form: &RegistrationForm, field: Field) -> Vec<FieldFailure> {
        self.validate(form, Mode::Accumulate)
            .failures_for(field)
            .cloned()
            .collect()
    }

    /// Priority order. The image decode is last because it is the only
    /// expensive rule.
    fn rules(&self) -> [Rule; 14] {
        [
            Self::passport_present,
            Self::passport_size,
            Self::passport_type,
            Self::name,
            Self::phone,
            Self::phone_format,
            Self::address,
            Self::occupation,
            Self::branch,
            Self::position,
            Self::motivation,
            Self::date_of_birth,
            Self::lengths,
            Self::passport_decodes,
        ]
    }

    // ── Rules ──────────────────────────────────────────────────────────────

    fn passport_present(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        (self.config.require_passport && form.passport.is_none()).then(|| {
            FieldFailure::new(
                Field::Passport,
                FieldErrorKind::MissingRequiredField,
                "Please upload a passport photo.",
            )
        })
    }

    fn passport_size(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        let upload = form.passport.as_ref()?;
        let max = self.config.max_asset_bytes;
        (upload.bytes.len() > max).then(|| {
            FieldFailure::new(
                Field::Passport,
                FieldErrorKind::AssetTooLarge {
                    max,
                    actual: upload.bytes.len(),
                },
                format!("Passport photo size must not exceed {}KB.", max / 1024),
            )
        })
    }

    fn passport_type(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        let upload = form.passport.as_ref()?;
        let accepted = |m: MimeType| self.config.accepted_mime_types.contains(&m);
        let declared_ok = upload.mime_type.parse::<MimeType>().is_ok_and(accepted);
        // Content that sniffs as nothing is left to the decode rule.
        let content_ok = MimeType::sniff(&upload.bytes).map_or(true, accepted);
        (!(declared_ok && content_ok)).then(|| {
            FieldFailure::new(
                Field::Passport,
                FieldErrorKind::AssetWrongType,
                "Only JPG/PNG images are allowed.",
            )
        })
    }

    fn name(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        required(Field::Name, &form.name, "Please enter your name.")
    }

    fn phone(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        required(
            Field::Phone,
            &form.phone,
            "Please enter your phone/WhatsApp number.",
        )
    }

    fn phone_format(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        let digits = self.config.phone_digits?;
        let phone = form.phone.trim();
        if phone.is_empty() {
            return None;
        }
        let ok = phone.len() == digits && phone.chars().all(|c| c.is_ascii_digit());
        (!ok).then(|| {
            FieldFailure::new(
                Field::Phone,
                FieldErrorKind::InvalidFormat,
                format!("Please enter a valid {digits}-digit phone number."),
            )
        })
    }

    fn address(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        required(
            Field::Address,
            &form.address,
            "Please enter your residential address.",
        )
    }

    fn occupation(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        required(Field::Occupation, &form.occupation, "Please enter your occupation.")
    }

    fn branch(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        form.branch.parse::<Branch>().err().map(|_| {
            FieldFailure::new(
                Field::Branch,
                FieldErrorKind::InvalidChoice,
                "Please select a branch.",
            )
        })
    }

    fn position(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        form.position.parse::<Position>().err().map(|_| {
            FieldFailure::new(
                Field::Position,
                FieldErrorKind::InvalidChoice,
                "Please select the position you hold.",
            )
        })
    }

    fn motivation(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        if !self.config.require_motivation {
            return None;
        }
        required(
            Field::Motivation,
            &form.motivation,
            "Please tell us what has drawn you to join.",
        )
    }

    fn date_of_birth(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        match form.date_of_birth {
            None if self.config.require_date_of_birth => Some(FieldFailure::new(
                Field::DateOfBirth,
                FieldErrorKind::MissingRequiredField,
                "Please enter your date of birth.",
            )),
            None => None,
            Some(dob) => (dob < self.config.earliest_birth_date || dob > self.today).then(|| {
                FieldFailure::new(
                    Field::DateOfBirth,
                    FieldErrorKind::DateOutOfRange,
                    format!(
                        "Date of birth must be between {} and {}.",
                        self.config.earliest_birth_date, self.today
                    ),
                )
            }),
        }
    }

    fn lengths(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        let limits = &self.config.limits;
        [
            (Field::Name, &form.name, limits.name),
            (Field::Phone, &form.phone, limits.phone),
            (Field::Address, &form.address, limits.address),
            (Field::Occupation, &form.occupation, limits.occupation),
            (Field::Motivation, &form.motivation, limits.motivation),
        ]
        .into_iter()
        .find(|(_, value, max)| value.trim().chars().count() > *max)
        .map(|(field, _, max)| {
            FieldFailure::new(
                field,
                FieldErrorKind::FieldTooLong { max },
                format!("The {} must be at most {max} characters.", field.as_str().replace('_', " ")),
            )
        })
    }

    fn passport_decodes(&self, form: &RegistrationForm) -> Option<FieldFailure> {
        let upload = form.passport.as_ref()?;
        asset::decode(&upload.bytes).err().map(|e| {
            log::debug!("Passport rejected: {e}");
            FieldFailure::new(
                Field::Passport,
                FieldErrorKind::AssetNotDecodable,
                "Uploaded passport is not a valid image file.",
            )
        })
    }
}

type Rule = fn(&Validator, &RegistrationForm) -> Option<FieldFailure>;

fn required(field: Field, value: &str, message: &str) -> Option<FieldFailure> {
    value
        .trim()
        .is_empty()
        .then(|| FieldFailure::new(field, FieldErrorKind::MissingRequiredField, message))
}

/// Convert a passing form into frozen, trimmed record fields. `None` if a
/// rule would fail; callers check the report first.
pub(crate) fn accept(form: &RegistrationForm) -> Option<RecordFields> {
    let passport = match &form.passport {
        Some(upload) => {
            let declared = upload.mime_type.parse::<MimeType>().ok()?;
            let mime = match MimeType::sniff(&upload.bytes) {
                Some(sniffed) if sniffed != declared => {
                    log::warn!("Passport declared as {declared} but content is {sniffed}");
                    sniffed
                }
                Some(sniffed) => sniffed,
                None => declared,
            };
            Some(Asset::new(upload.bytes.clone(), mime))
        }
        None => None,
    };
    Some(RecordFields {
        name: form.name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        address: form.address.trim().to_string(),
        occupation: form.occupation.trim().to_string(),
        motivation: form.motivation.trim().to_string(),
        date_of_birth: form.date_of_birth,
        gender: form.gender,
        branch: form.branch.parse().ok()?,
        position: form.position.parse().ok()?,
        passport,
    })
}

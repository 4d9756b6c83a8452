//! Membership data model – the in-progress registration form and the
//! finalized, immutable record it becomes.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::asset::Asset;

// ---------------------------------------------------------------------------
// Closed vocabularies
// ---------------------------------------------------------------------------

/// Implements `ALL`, `as_str`, `Display` and `FromStr` for a closed choice set.
macro_rules! choice_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| format!("`{s}` is not a valid {}", stringify!($name).to_lowercase()))
            }
        }
    };
}

choice_enum!(Gender {
    Male => "Male",
    Female => "Female",
});

choice_enum!(Branch {
    Uyo => "Uyo",
    Aksu => "Aksu",
    Eket => "Eket",
});

choice_enum!(Position {
    Pastor => "Pastor",
    Evangelist => "Evangelist",
    Deacon => "Deacon",
    Deaconess => "Deaconess",
    UnitHead => "Unit Head",
    Worker => "Worker",
    Member => "Member",
});

// ---------------------------------------------------------------------------
// In-progress form
// ---------------------------------------------------------------------------

/// An uploaded file as the form collaborator hands it over: raw bytes and the
/// MIME type the client declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Field values as collected, before validation. Branch and position arrive
/// as the raw selected labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationForm {
    pub passport: Option<Upload>,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub phone: String,
    pub address: String,
    pub occupation: String,
    pub branch: String,
    pub position: String,
    pub motivation: String,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            passport: None,
            name: String::new(),
            date_of_birth: None,
            gender: Gender::Male,
            phone: String::new(),
            address: String::new(),
            occupation: String::new(),
            branch: Branch::Uyo.to_string(),
            position: Position::Member.to_string(),
            motivation: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Finalized record
// ---------------------------------------------------------------------------

/// A finalized membership record. Only the record store constructs one, after
/// a passing validation; fields are read-only from then on.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipRecord {
    unique_id: String,
    name: String,
    phone: String,
    address: String,
    occupation: String,
    motivation: String,
    date_of_birth: Option<NaiveDate>,
    gender: Gender,
    branch: Branch,
    position: Position,
    issued_on: NaiveDate,
    #[serde(skip)]
    passport: Option<Asset>,
}

/// Validated, trimmed values ready to be frozen.
#[derive(Debug, Clone)]
pub(crate) struct RecordFields {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub occupation: String,
    pub motivation: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub branch: Branch,
    pub position: Position,
    pub passport: Option<Asset>,
}

impl MembershipRecord {
    pub(crate) fn freeze(unique_id: String, fields: RecordFields, issued_on: NaiveDate) -> Self {
        Self {
            unique_id,
            name: fields.name,
            phone: fields.phone,
            address: fields.address,
            occupation: fields.occupation,
            motivation: fields.motivation,
            date_of_birth: fields.date_of_birth,
            gender: fields.gender,
            branch: fields.branch,
            position: fields.position,
            issued_on,
            passport: fields.passport,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn occupation(&self) -> &str {
        &self.occupation
    }

    pub fn motivation(&self) -> &str {
        &self.motivation
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn issued_on(&self) -> NaiveDate {
        self.issued_on
    }

    pub fn passport(&self) -> Option<&Asset> {
        self.passport.as_ref()
    }

    /// Suggested download name for the PDF card.
    pub fn document_filename(&self) -> String {
        format!("{}_id_card.pdf", self.unique_id)
    }

    /// Text fields and id as JSON; image bytes are not included.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_parse_case_insensitively() {
        assert_eq!("uyo".parse::<Branch>().unwrap(), Branch::Uyo);
        assert_eq!("unit head".parse::<Position>().unwrap(), Position::UnitHead);
        assert_eq!(" Female ".parse::<Gender>().unwrap(), Gender::Female);
        assert!("Lagos".parse::<Branch>().is_err());
    }

    #[test]
    fn position_labels_keep_spaces() {
        assert_eq!(Position::UnitHead.to_string(), "Unit Head");
        assert_eq!(Position::ALL.len(), 7);
    }

    #[test]
    fn json_export_omits_image() {
        let record = MembershipRecord::freeze(
            "GWGM007".to_string(),
            RecordFields {
                name: "Jane Doe".into(),
                phone: "555-1234".into(),
                address: "12 Palm St".into(),
                occupation: "Teacher".into(),
                motivation: "Faith growth".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17),
                gender: Gender::Female,
                branch: Branch::Uyo,
                position: Position::UnitHead,
                passport: Some(Asset::new(vec![1, 2, 3], crate::asset::MimeType::Png)),
            },
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        );
        let json = record.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["gender"], "Female");
        assert!(json.contains("\"unique_id\": \"GWGM007\""));
        assert!(json.contains("\"position\": \"Unit Head\""));
        assert!(json.contains("\"issued_on\": \"2026-10-19\""));
        assert!(!json.contains("passport"));
        assert_eq!(record.document_filename(), "GWGM007_id_card.pdf");
    }
}

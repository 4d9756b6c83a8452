//! # idcard-forge – membership registration intake and ID card renderer
//!
//! A registration form is validated, frozen into a [`MembershipRecord`]
//! under a sequential identifier, and rendered as an ID card in three
//! encodings that always show the same data:
//!
//! 1. **Validate** – ordered rules with field-attributed messages ([`validation`])
//! 2. **Allocate** – `PREFIX` + zero-padded sequence numbers ([`allocator`])
//! 3. **Store** – the single finalized record ([`store`])
//! 4. **Render** – HTML preview, PNG and PDF from one model ([`render`]),
//!    cross-checked by [`parity`]
//!
//! [`pipeline::Pipeline`] wires the stages together.

pub mod allocator;
pub mod asset;
pub mod config;
pub mod dom;
pub mod error;
pub mod fonts;
pub mod layout_config;
pub mod parity;
pub mod pdf;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod store;
pub mod validation;

// Re-exports for convenience
pub use asset::{Asset, MimeType};
pub use config::Config;
pub use error::{AssetError, Error, RenderError, RenderStage, Result};
pub use pipeline::{Pipeline, Submission};
pub use record::{Branch, Gender, MembershipRecord, Position, RegistrationForm, Upload};
pub use render::{render_all, RenderModel, RenderedCard};
pub use validation::{Field, FieldErrorKind, FieldFailure, Mode, ValidationReport, Validator};

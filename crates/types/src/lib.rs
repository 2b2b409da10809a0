//! # AYUSH Types
//!
//! Shared wire and domain types for the AYUSH terminology client:
//! validated search text, classification systems, terms, paginated result sets,
//! cross-system mappings, and the doctor/patient documents shown on the dashboard.

mod mapping;
mod records;
mod system;
mod term;
mod text;

pub use mapping::{
    CombinedResult, Mapping, MappingRecord, MappingStats, RelatedSet, RelatedTerm, SystemMatch,
};
pub use records::{CurrentUser, Doctor, Patient};
pub use system::{SourceKind, TerminologySystem, UnknownSystem};
pub use term::{Page, Term};
pub use text::{SearchText, TextError, MIN_SUGGESTION_CHARS};

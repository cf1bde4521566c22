//! Domain model and pure logic for Fantasy Record clients: payload normalization, derived
//! views, and submission checks. No I/O happens in this crate.

pub mod analytics;
pub mod mood;
pub mod normalize;
pub mod query;
pub mod record;
pub mod snippet;
pub mod time_serde;
pub mod validate;

pub use analytics::{MentalStateAnalysis, MoodTrend, RecordsSummary, TagCount, ThemeWord};
pub use mood::Mood;
pub use query::{FilterState, SortKey, TagFilter};
pub use record::{
	Attachment, CategoryRef, Pagination, Record, RecordDraft, RecordPage, RecordPatch, User,
};
pub use validate::{FieldError, FileRejection};

//! Collaborators the orchestration layer talks to: reference storage, vocal
//! isolation and narrative feedback. Each is a trait so callers can inject
//! real backends or deterministic fakes.

pub mod feedback;
pub mod isolation;
pub mod store;

pub use feedback::{render_report, FeedbackGenerator, ScoreBandFeedback};
pub use isolation::{PassthroughIsolator, VocalIsolator};
pub use store::{FeatureStore, JsonFeatureStore, MemoryFeatureStore, ReferenceFeatures};

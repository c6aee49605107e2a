//! Skill-match scoring: a fixed vocabulary, substring extraction over job text,
//! and a partition of the job's skills into matched / missing.

pub mod estimator;
pub mod extractor;
pub mod handlers;
pub mod scorer;
pub mod vocabulary;

//! Auto-fill: maps a candidate profile onto an unknown application form by
//! fuzzy field-name matching. A general heuristic, not a per-site adapter.

pub mod cover_letter;
pub mod field_mapper;
pub mod handlers;

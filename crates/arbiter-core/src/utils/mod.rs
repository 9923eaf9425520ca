//! # Arbiter Core Utilities
//!
//! Small helpers shared across subsystems. The [`text`] submodule holds the
//! string metrics used by both the namespace allocator and the conflict
//! resolver, so the two always agree on what counts as a "similar" name.
pub mod text;

pub use text::{levenshtein_distance, name_similarity, sanitize_identifier};

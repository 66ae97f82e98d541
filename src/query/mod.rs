//! Read-only map queries.

mod line_keys;

pub use line_keys::LineKeysQuery;

//! Built-in source drivers.

pub mod static_source;

pub use static_source::{StaticDocument, StaticSource, STATIC_SOURCE_TYPE};

//! Lenient deserialization helpers for inventory API payloads.

use serde::{Deserialize, Deserializer};

/// Deserialize a value that the API may send as `null`, falling back to
/// `T::default()`.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

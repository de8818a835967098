//! Persisted JSON documents.
//!
//! Both documents keep their on-disk key order and carry any keys they do not
//! understand through untouched.

mod authors;
mod mods;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

pub use authors::{AuthorStatusDocument, LabelEntry, Tooltip, DEFAULT_LABELS};
pub use mods::{ExistingMod, ModDescriptor, ModStatusDocument, DEFAULT_GAMES};

/// A document the [`crate::store::DocumentStore`] can load and save.
pub trait StatusDocument: Serialize + DeserializeOwned + Default {
    /// Short human-readable name used in logs and messages.
    const KIND: &'static str;
}

impl StatusDocument for ModStatusDocument {
    const KIND: &'static str = "mod status";
}

impl StatusDocument for AuthorStatusDocument {
    const KIND: &'static str = "author status";
}

/// Deserialize a field that is present in the input, keeping an explicit `null`
/// distinct from a missing key (`Some(None)` versus `None`).
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

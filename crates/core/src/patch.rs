//! Field-presence wrapper for partial-merge updates

use serde::{Deserialize, Deserializer};

/// One field of an update request.
///
/// Distinguishes a field the client left out (`Absent`) from one it
/// explicitly set to `null` (`Null`), so "clear this field" and
/// "leave it alone" never collapse into each other. Fields must carry
/// `#[serde(default)]` for `Absent` to be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Merge into an optional slot: `Absent` keeps it, `Null` clears it,
    /// `Value` overwrites it.
    pub fn merge_into(self, slot: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *slot = None,
            Patch::Value(value) => *slot = Some(value),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

//! Three-valued attribute values.
//!
//! Every attribute handled by an adapter is in one of three states: `Known`
//! with a concrete value, `Null` (the user omitted it), or `Unknown` (a
//! computed value that cannot be predicted before apply). A native `Option`
//! only covers two of those states, so model structs use [`Tv`] instead.
//!
//! On the JSON wire, `Known(v)` is the plain value, `Null` is JSON null and
//! `Unknown` is an absent key. Model fields therefore carry
//! `#[serde(default, skip_serializing_if = "Tv::is_unknown")]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A three-valued attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tv<T> {
    /// A concrete value.
    Known(T),
    /// Explicitly unset by the user.
    Null,
    /// Not determinable until apply; only valid in plan values for
    /// computed attributes.
    Unknown,
}

impl<T> Default for Tv<T> {
    fn default() -> Self {
        Tv::Unknown
    }
}

impl<T> Tv<T> {
    /// Wrap a concrete value.
    pub fn known(value: T) -> Self {
        Tv::Known(value)
    }

    /// True if the value is known.
    pub fn is_known(&self) -> bool {
        matches!(self, Tv::Known(_))
    }

    /// True if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Tv::Null)
    }

    /// True if the value is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Tv::Unknown)
    }

    /// The known value, if any.
    pub fn as_known(&self) -> Option<&T> {
        match self {
            Tv::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Convert a nullable backend field: `None` becomes `Null`.
    ///
    /// Use this for optional identifiers and other fields where the backend
    /// distinguishes "absent" from a concrete value.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Tv::Known(v),
            None => Tv::Null,
        }
    }
}

impl<T: Clone> Tv<T> {
    /// The known value cloned into an `Option`, for pointer-or-absent
    /// request fields.
    pub fn to_option(&self) -> Option<T> {
        match self {
            Tv::Known(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl<T: Clone + Default> Tv<T> {
    /// Collapse to a concrete value: the carried value when known, the
    /// type's zero value (`""`, `0`, `false`, empty container) on null or
    /// unknown. Total by construction.
    pub fn decoded(&self) -> T {
        match self {
            Tv::Known(v) => v.clone(),
            _ => T::default(),
        }
    }
}

impl<T> Tv<Vec<T>> {
    /// Encode a collection coming back from the backend. Absent and empty
    /// collections both become a known empty container, never `Null`, so
    /// computed collections do not regress between reads.
    pub fn known_or_empty(value: Option<Vec<T>>) -> Self {
        Tv::Known(value.unwrap_or_default())
    }
}

impl Tv<String> {
    /// Encode a string the backend may omit, defaulting to `""`.
    pub fn known_or_blank(value: Option<String>) -> Self {
        Tv::Known(value.unwrap_or_default())
    }
}

impl<T> From<T> for Tv<T> {
    fn from(value: T) -> Self {
        Tv::Known(value)
    }
}

impl<T: Serialize> Serialize for Tv<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tv::Known(v) => v.serialize(serializer),
            // Unknown never reaches serialization in stored state; plan
            // values keep it out of the wire via skip_serializing_if.
            Tv::Null | Tv::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Tv<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Tv::Known(v),
            None => Tv::Null,
        })
    }
}

/// Decode a state or plan object into a model struct.
///
/// Missing keys come out `Unknown`, explicit nulls come out `Null`. The
/// only failure mode is a type mismatch between the stored state and the
/// model, which is a programming error surfaced as a diagnostic upstream.
pub fn decode_model<M: DeserializeOwned>(state: &serde_json::Value) -> Result<M, serde_json::Error> {
    serde_json::from_value(state.clone())
}

/// Encode a model struct back into the wire state representation.
pub fn encode_model<M: Serialize>(model: &M) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(model)
}

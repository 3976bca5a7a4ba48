use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Collections that can tell "given but empty" apart from "has members".
pub trait Collection: Default {
    /// `true` when the collection holds no elements.
    fn is_empty(&self) -> bool;
}

/// Tri-state field value: not provided, provided empty, provided with members.
///
/// Use with `#[serde(default, skip_serializing_if = "Presence::is_unset")]`
/// so a missing key stays `Unset` across a serialize/deserialize cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence<T> {
    /// The key was not present at all.
    Unset,
    /// The key was present with an empty value (or `null`).
    Empty,
    /// The key was present with at least one element.
    Value(T),
}

impl<T> Default for Presence<T> {
    fn default() -> Self {
        Presence::Unset
    }
}

impl<T> Presence<T> {
    /// `true` when the field was never provided.
    pub fn is_unset(&self) -> bool {
        matches!(self, Presence::Unset)
    }

    /// `true` when the field was provided, empty or not.
    pub fn is_provided(&self) -> bool {
        !self.is_unset()
    }

    /// The members, only when the field holds at least one.
    pub fn members(&self) -> Option<&T> {
        match self {
            Presence::Value(v) => Some(v),
            Presence::Unset | Presence::Empty => None,
        }
    }
}

impl<T: Collection> Presence<T> {
    /// Classify a provided value: empty collections become `Empty`.
    pub fn provided(value: T) -> Self {
        if value.is_empty() {
            Presence::Empty
        } else {
            Presence::Value(value)
        }
    }
}

impl<T: Collection> From<Option<T>> for Presence<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Presence::provided(v),
            None => Presence::Empty,
        }
    }
}

impl<T: Collection + Serialize> Serialize for Presence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Presence::Unset => serializer.serialize_none(),
            Presence::Empty => T::default().serialize(serializer),
            Presence::Value(v) => v.serialize(serializer),
        }
    }
}

// A missing key never reaches this impl; `#[serde(default)]` yields `Unset`.
impl<'de, T: Collection + Deserialize<'de>> Deserialize<'de> for Presence<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

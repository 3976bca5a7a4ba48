use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::job::{DayName, MonthlyOccurrence};
use crate::presence::Collection;

/// Element of an [`IdSet`]: provides the key two elements are "the same" under.
pub trait SetElement {
    /// Stable identity key. Must not depend on process state.
    fn identity(&self) -> u64;
}

impl SetElement for i32 {
    fn identity(&self) -> u64 {
        // Sign-extended so negative month days get distinct keys.
        i64::from(*self) as u64
    }
}

impl SetElement for DayName {
    fn identity(&self) -> u64 {
        // the service hands back lowercase names, the config uses title case
        fnv1a(self.as_str().to_lowercase().as_bytes())
    }
}

impl SetElement for MonthlyOccurrence {
    fn identity(&self) -> u64 {
        let key = format!("{}-{}-", self.day.as_str().to_lowercase(), self.occurrence);
        fnv1a(key.as_bytes())
    }
}

/// 64-bit FNV-1a over raw bytes.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

/// Order-independent collection keyed by [`SetElement::identity`].
///
/// Equality compares identities only, so `"Monday"` and `"monday"` are the
/// same member. When two inputs share an identity the first one is kept.
#[derive(Clone)]
pub struct IdSet<T> {
    members: BTreeMap<u64, T>,
}

impl<T> Default for IdSet<T> {
    fn default() -> Self {
        Self { members: BTreeMap::new() }
    }
}

impl<T: SetElement> IdSet<T> {
    /// Add `item` unless an element with the same identity is present.
    /// Returns `true` if it was inserted.
    pub fn insert(&mut self, item: T) -> bool {
        let mut inserted = false;
        self.members.entry(item.identity()).or_insert_with(|| {
            inserted = true;
            item
        });
        inserted
    }
}

impl<T> IdSet<T> {
    /// Number of distinct members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// `true` when the set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in identity-key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.members.values()
    }
}

impl<T: Clone> IdSet<T> {
    /// Plain sequence for the remote side, in identity-key order.
    pub fn to_vec(&self) -> Vec<T> {
        self.members.values().cloned().collect()
    }
}

impl<T: SetElement> FromIterator<T> for IdSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = IdSet::default();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<T> PartialEq for IdSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.members.keys().eq(other.members.keys())
    }
}

impl<T> Eq for IdSet<T> {}

impl<T: fmt::Debug> fmt::Debug for IdSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.members.values()).finish()
    }
}

impl<T> Collection for IdSet<T> {
    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: Serialize> Serialize for IdSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.members.values())
    }
}

impl<'de, T: SetElement + Deserialize<'de>> Deserialize<'de> for IdSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

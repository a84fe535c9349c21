//! Ordered, bucket-indexed tag storage.
//!
//! [`TagMap`] is the storage primitive behind messages and repeating-group
//! occurrences. Entries live in a flat slot arena that preserves the order
//! in which tags were first set, so wire encoding can reproduce the
//! caller's field order. A fixed bucket array over the slots gives O(1)
//! average lookup by tag number; the bucket count never changes.

use crate::error::MessageError;
use crate::value::TagValue;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Number of hash buckets per map. Tags index buckets by direct modulus.
pub const TAG_BUCKETS: usize = 16;

/// An ordered map from tag number to [`TagValue`].
///
/// `set` on a fresh tag appends to the insertion order; `set` on an
/// existing tag replaces the value in place and leaves the order alone.
/// Deleted slots are tombstoned rather than compacted, keeping bucket
/// indices stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMap {
    /// Slot arena in first-insertion order. `None` marks a deleted entry.
    slots: Vec<Option<(u32, TagValue)>>,
    /// `tag % TAG_BUCKETS` -> indices into `slots`.
    buckets: Box<[SmallVec<[u32; 4]>]>,
    /// Number of live entries.
    len: usize,
}

impl TagMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            buckets: (0..TAG_BUCKETS).map(|_| SmallVec::new()).collect(),
            len: 0,
        }
    }

    #[inline]
    const fn bucket_of(tag: u32) -> usize {
        tag as usize % TAG_BUCKETS
    }

    fn slot_index(&self, tag: u32) -> Option<u32> {
        self.buckets[Self::bucket_of(tag)]
            .iter()
            .copied()
            .find(|&i| matches!(&self.slots[i as usize], Some((t, _)) if *t == tag))
    }

    /// Returns the number of live entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no entry is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sets `tag` to `value`.
    ///
    /// A fresh tag is appended to the insertion order; an existing tag has
    /// its value replaced in place.
    pub fn set(&mut self, tag: u32, value: TagValue) {
        if let Some(idx) = self.slot_index(tag) {
            self.slots[idx as usize] = Some((tag, value));
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Some((tag, value)));
            self.buckets[Self::bucket_of(tag)].push(idx);
            self.len += 1;
        }
    }

    /// Returns the value stored at `tag`, if any.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&TagValue> {
        self.slot_index(tag)
            .and_then(|i| self.slots[i as usize].as_ref())
            .map(|(_, v)| v)
    }

    /// Returns the value stored at `tag` mutably, if any.
    #[must_use]
    pub fn get_mut(&mut self, tag: u32) -> Option<&mut TagValue> {
        let idx = self.slot_index(tag)?;
        self.slots[idx as usize].as_mut().map(|(_, v)| v)
    }

    /// Removes `tag` and returns its value, or `None` if it was not set.
    pub fn remove(&mut self, tag: u32) -> Option<TagValue> {
        let idx = self.slot_index(tag)?;
        let bucket = &mut self.buckets[Self::bucket_of(tag)];
        bucket.retain(|&mut i| i != idx);
        self.len -= 1;
        self.slots[idx as usize].take().map(|(_, v)| v)
    }

    /// Appends a fresh occurrence to the repeating group at `tag` and
    /// returns it.
    ///
    /// The entry is created as an empty group if absent.
    ///
    /// # Errors
    /// [`MessageError::InvalidArgument`] if `tag` holds a non-group value.
    pub fn add_occurrence(&mut self, tag: u32) -> Result<&mut TagMap, MessageError> {
        if self.get(tag).is_none() {
            self.set(tag, TagValue::Group(Vec::new()));
        }
        // Entry exists at this point; reject scalar reuse.
        let occurrences = self
            .get_mut(tag)
            .and_then(TagValue::as_group_mut)
            .ok_or_else(|| {
                MessageError::InvalidArgument(format!("tag {tag} holds a non-group value"))
            })?;
        occurrences.push(TagMap::new());
        Ok(occurrences.last_mut().unwrap())
    }

    /// Returns the group occurrence at `tag` with zero-based `index`.
    #[must_use]
    pub fn occurrence(&self, tag: u32, index: usize) -> Option<&TagMap> {
        self.get(tag)?.as_group()?.get(index)
    }

    /// Returns the group occurrence at `tag` mutably.
    #[must_use]
    pub fn occurrence_mut(&mut self, tag: u32, index: usize) -> Option<&mut TagMap> {
        self.get_mut(tag)?.as_group_mut()?.get_mut(index)
    }

    /// Returns the number of occurrences stored at `tag`, zero when the
    /// tag is absent or holds a scalar.
    #[must_use]
    pub fn occurrence_count(&self, tag: u32) -> usize {
        self.get(tag)
            .and_then(TagValue::as_group)
            .map_or(0, <[TagMap]>::len)
    }

    /// Removes the occurrence at zero-based `index` from the group at
    /// `tag`. Removing the last occurrence removes the entry entirely.
    ///
    /// Returns whether an occurrence was removed.
    pub fn remove_occurrence(&mut self, tag: u32, index: usize) -> bool {
        let Some(occurrences) = self.get_mut(tag).and_then(TagValue::as_group_mut) else {
            return false;
        };
        if index >= occurrences.len() {
            return false;
        }
        occurrences.remove(index);
        if occurrences.is_empty() {
            self.remove(tag);
        }
        true
    }

    /// Iterates live entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &TagValue)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(t, v)| (*t, v)))
    }
}

impl Default for TagMap {
    fn default() -> Self {
        Self::new()
    }
}

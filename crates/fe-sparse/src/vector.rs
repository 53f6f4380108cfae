//! Sparse vector with index-sorted storage.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// One stored entry of a sparse vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseVectorItem<T> {
    pub index: usize,
    pub value: T,
}

impl<T> SparseVectorItem<T> {
    pub fn new(index: usize, value: T) -> Self {
        Self { index, value }
    }
}

/// Sparse vector whose items are kept strictly ascending by index.
///
/// Two kinds of addressing exist and must not be confused:
/// - *position*: slot in the sorted storage (`get_value`, `get_index`)
/// - *index*: logical coordinate (`add_value`, `value_at`, `find_position`)
///
/// `T::default()` is taken as the additive zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Vec<SparseVectorItem<T>>",
    into = "Vec<SparseVectorItem<T>>",
    bound(
        serialize = "T: Serialize + Copy",
        deserialize = "T: Deserialize<'de> + Copy + Default + AddAssign"
    )
)]
pub struct SparseVector<T> {
    items: Vec<SparseVectorItem<T>>,
}

impl<T> Default for SparseVector<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Copy + Default + AddAssign> SparseVector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Accumulate `value` at logical `index`.
    ///
    /// An existing item with the same index is incremented; otherwise a new
    /// item is inserted at its sorted position.
    pub fn add_value(&mut self, index: usize, value: T) {
        match self.items.binary_search_by_key(&index, |item| item.index) {
            Ok(position) => self.items[position].value += value,
            Err(position) => self
                .items
                .insert(position, SparseVectorItem::new(index, value)),
        }
    }

    /// Value stored at storage `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.len()`.
    pub fn get_value(&self, position: usize) -> T {
        self.item(position).value
    }

    /// Logical index stored at storage `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.len()`.
    pub fn get_index(&self, position: usize) -> usize {
        self.item(position).index
    }

    /// Storage position holding logical `index`, if present.
    pub fn find_position(&self, index: usize) -> Option<usize> {
        self.items
            .binary_search_by_key(&index, |item| item.index)
            .ok()
    }

    /// Value at logical `index`, zero when nothing is stored there.
    pub fn value_at(&self, index: usize) -> T {
        self.find_position(index)
            .map(|position| self.items[position].value)
            .unwrap_or_default()
    }

    /// Stored logical indexes in ascending order.
    pub fn get_indexes(&self) -> Vec<usize> {
        self.items.iter().map(|item| item.index).collect()
    }

    /// Dense materialization with at least `min_size` slots.
    ///
    /// The result grows to hold the largest stored index; every slot
    /// without a stored item is zero.
    pub fn get_values(&self, min_size: usize) -> Vec<T> {
        let size = self
            .items
            .last()
            .map_or(min_size, |item| min_size.max(item.index + 1));
        let mut values = vec![T::default(); size];
        for item in &self.items {
            values[item.index] = item.value;
        }
        values
    }

    /// Accumulate every item of `other` into `self`.
    pub fn add_vector(&mut self, other: &SparseVector<T>) {
        for item in &other.items {
            self.add_value(item.index, item.value);
        }
    }

    /// Largest stored index.
    pub fn max_index(&self) -> Option<usize> {
        self.items.last().map(|item| item.index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SparseVectorItem<T>> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn item(&self, position: usize) -> &SparseVectorItem<T> {
        assert!(
            position < self.items.len(),
            "sparse vector position {} out of bounds (len={})",
            position,
            self.items.len()
        );
        &self.items[position]
    }
}

impl<T: Copy + Default + AddAssign> From<Vec<SparseVectorItem<T>>> for SparseVector<T> {
    /// Unsorted or duplicated items are merged the same way `add_value` does.
    fn from(items: Vec<SparseVectorItem<T>>) -> Self {
        let mut vector = Self::with_capacity(items.len());
        for item in items {
            vector.add_value(item.index, item.value);
        }
        vector
    }
}

impl<T> From<SparseVector<T>> for Vec<SparseVectorItem<T>> {
    fn from(vector: SparseVector<T>) -> Self {
        vector.items
    }
}

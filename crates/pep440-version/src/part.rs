//! Ordering primitives for building composite comparison keys.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A value that may be replaced by a sentinel sorting below or above every concrete value.
///
/// The derived ordering follows declaration order, so
/// `NegativeInfinity < Value(_) < Infinity` holds for any `T`, and two `Value`s compare by
/// their payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Part<T> {
    /// Sorts before every concrete value.
    NegativeInfinity,
    /// A concrete value.
    Value(T),
    /// Sorts after every concrete value.
    Infinity,
}

/// A sequence compared element-wise, with missing trailing elements read as `T::default()`.
///
/// `[1, 2]` and `[1, 2, 0]` are equal, `[1, 2]` is less than `[1, 2, 1]`.
#[derive(Debug, Clone)]
pub(crate) struct Parts<T>(Vec<T>);

impl<T: Default + PartialEq> Parts<T> {
    /// Drop trailing default elements, which never influence the ordering.
    pub(crate) fn normalized(mut items: Vec<T>) -> Self {
        let zero = T::default();
        while items.last().is_some_and(|last| *last == zero) {
            items.pop();
        }
        Self(items)
    }
}

impl<T: Ord + Default> Ord for Parts<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        let zero = T::default();
        let len = self.0.len().max(other.0.len());
        for idx in 0..len {
            let this = self.0.get(idx).unwrap_or(&zero);
            let that = other.0.get(idx).unwrap_or(&zero);
            match this.cmp(that) {
                Ordering::Equal => {}
                ordering => return ordering,
            }
        }
        Ordering::Equal
    }
}

impl<T: Ord + Default> PartialOrd for Parts<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord + Default> PartialEq for Parts<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord + Default> Eq for Parts<T> {}

impl<T: Hash + Default + PartialEq> Hash for Parts<T> {
    /// Skips trailing defaults to stay consistent with the padded `Eq`.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let zero = T::default();
        let end = self
            .0
            .iter()
            .rposition(|item| *item != zero)
            .map_or(0, |idx| idx + 1);
        for item in &self.0[..end] {
            item.hash(state);
        }
    }
}

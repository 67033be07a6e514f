// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A map keyed by dense integer ids, backed by a vector of optional slots.
//!
//! Ids are expected to be small and mostly contiguous, which is the case for every
//! arena id in the compiler. Iteration always visits entries in ascending id order.


use std::{fmt::Debug, iter::Enumerate, marker::PhantomData, slice};

#[derive(Clone, PartialEq, Eq)]
pub struct IndexMap<K, V> {
    _keys: PhantomData<K>,
    values: Vec<Option<V>>,
}

impl<K, V> IndexMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _keys: PhantomData,
            values: Vec::new(),
        }
    }

    /// Number of occupied entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.values.iter().filter_map(Option::as_ref)
    }
}

impl<K: Into<usize>, V> IndexMap<K, V> {
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let index = key.into();
        if index >= self.values.len() {
            self.values.resize_with(index + 1, || None);
        }
        self.values[index].replace(value)
    }

    #[must_use]
    pub fn get(&self, key: K) -> Option<&V> {
        self.values.get(key.into()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.values.get_mut(key.into()).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn contains_key(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        self.values.get_mut(key.into()).and_then(Option::take)
    }
}

impl<K: From<usize>, V> IndexMap<K, V> {
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            _keys: PhantomData,
            base: self.values.iter().enumerate(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn retain(&mut self, mut f: impl FnMut(K, &mut V) -> bool) {
        for (index, slot) in self.values.iter_mut().enumerate() {
            if let Some(value) = slot
                && !f(K::from(index), value)
            {
                *slot = None;
            }
        }
    }
}

impl<K, V> Default for IndexMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: From<usize> + Debug, V: Debug> Debug for IndexMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<usize>, V> FromIterator<(K, V)> for IndexMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<'a, K: From<usize>, V> IntoIterator for &'a IndexMap<K, V> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, K, V> {
    _keys: PhantomData<K>,
    base: Enumerate<slice::Iter<'a, Option<V>>>,
}

impl<'a, K: From<usize>, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.base
            .by_ref()
            .find_map(|(index, value)| Some((K::from(index), value.as_ref()?)))
    }
}

impl<K: From<usize>, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some((index, value)) = self.base.next_back() {
            if let Some(value) = value {
                return Some((K::from(index), value));
            }
        }
        None
    }
}

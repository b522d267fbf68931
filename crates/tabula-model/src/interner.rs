use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Assigns 1-based ids to values in first-seen order; equal values share one id.
#[derive(Clone, Debug)]
pub struct Interner<T> {
    values: Vec<T>,
    ids: HashMap<T, u32>,
}

impl<T> Default for Interner<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            ids: HashMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> Interner<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, value: T) -> u32 {
        if let Some(id) = self.ids.get(&value) {
            return *id;
        }
        self.values.push(value.clone());
        let id = self.values.len() as u32;
        self.ids.insert(value, id);
        id
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        id.checked_sub(1).and_then(|i| self.values.get(i as usize))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<u32, T> {
        self.values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as u32 + 1, v))
            .collect()
    }
}

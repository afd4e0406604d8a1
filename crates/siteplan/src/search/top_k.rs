//! Bounded best-K collection keyed by layout code.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use crate::generator::LayoutCode;

/// Order in which candidates were found: seed index, then position within
/// the seed. Ties in fitness go to the earlier discovery.
pub type Discovery = (usize, u64);

#[derive(Debug, Clone, Copy)]
struct RankKey {
    fitness: f32,
    discovery: Discovery,
}

impl Ord for RankKey {
    /// Best first: higher fitness, then earlier discovery.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fitness
            .total_cmp(&self.fitness)
            .then_with(|| self.discovery.cmp(&other.discovery))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey {}

/// The `capacity` best items, at most one per layout code.
///
/// Insertion is `O(log K)`. Offering a code that is already present keeps the
/// better of the two; on equal fitness the earlier discovery stays.
///
/// # Examples
///
/// ```
/// use siteplan::search::TopK;
///
/// let mut top = TopK::new(2);
/// top.offer("AO".into(), 10.0, (0, 0), "first");
/// top.offer("AR".into(), 30.0, (0, 1), "second");
/// top.offer("AO".into(), 20.0, (0, 2), "better first");
/// top.offer("BO".into(), 5.0, (0, 3), "too weak");
///
/// let items: Vec<&str> = top.iter().map(|(_, _, item)| *item).collect();
/// assert_eq!(items, vec!["second", "better first"]);
/// ```
#[derive(Debug, Clone)]
pub struct TopK<T> {
    capacity: usize,
    ranked: BTreeMap<RankKey, (LayoutCode, T)>,
    by_code: HashMap<LayoutCode, RankKey>,
}

impl<T> TopK<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ranked: BTreeMap::new(),
            by_code: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Offers an item. Returns true if it was retained.
    pub fn offer(&mut self, code: LayoutCode, fitness: f32, discovery: Discovery, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let key = RankKey { fitness, discovery };

        if let Some(&existing) = self.by_code.get(&code) {
            if key >= existing {
                return false;
            }
            self.ranked.remove(&existing);
        } else if self.ranked.len() >= self.capacity {
            let Some((&worst, _)) = self.ranked.last_key_value() else {
                return false;
            };
            if key >= worst {
                return false;
            }
            if let Some((_, (evicted, _))) = self.ranked.pop_last() {
                self.by_code.remove(&evicted);
            }
        }

        self.by_code.insert(code.clone(), key);
        self.ranked.insert(key, (code, item));
        true
    }

    /// Offers every entry of `other`, preserving its discovery keys.
    pub fn merge(&mut self, other: TopK<T>) {
        for (key, (code, item)) in other.ranked {
            self.offer(code, key.fitness, key.discovery, item);
        }
    }

    pub fn best_fitness(&self) -> Option<f32> {
        self.ranked.first_key_value().map(|(key, _)| key.fitness)
    }

    /// Fitness an item must beat to enter a full collection.
    pub fn threshold(&self) -> Option<f32> {
        if self.ranked.len() < self.capacity {
            return None;
        }
        self.ranked.last_key_value().map(|(key, _)| key.fitness)
    }

    /// Entries best first.
    pub fn iter(&self) -> impl Iterator<Item = (&LayoutCode, f32, &T)> {
        self.ranked
            .iter()
            .map(|(key, (code, item))| (code, key.fitness, item))
    }

    /// Items best first.
    pub fn into_sorted_vec(self) -> Vec<T> {
        self.ranked.into_values().map(|(_, item)| item).collect()
    }
}

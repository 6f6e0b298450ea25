//! Keyed list diffing
//!
//! Two snapshots of a list are compared by item key ("same item") and by full
//! equality ("same content"). The result is the smallest set of row changes that
//! turns the old snapshot into the new one: rows kept in place form a longest
//! common subsequence of keys, every other row is removed, inserted or moved.

use std::collections::HashMap;
use std::hash::Hash;

use crate::contacts_db::{Contact, Message};

/// Items with a stable identity across snapshots.
pub trait Keyed {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
}

impl Keyed for Contact {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Message {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

/// A single row change.
///
/// `Removed::index` and `Moved::from` are positions in the old snapshot;
/// `Inserted::index`, `Moved::to` and `Updated::index` are positions in the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    Removed { index: usize },
    Inserted { index: usize },
    Moved { from: usize, to: usize },
    Updated { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDiff {
    pub changes: Vec<ListChange>,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn removed(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.iter().filter_map(|c| match c {
            ListChange::Removed { index } => Some(*index),
            _ => None,
        })
    }

    pub fn inserted(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.iter().filter_map(|c| match c {
            ListChange::Inserted { index } => Some(*index),
            _ => None,
        })
    }

    pub fn updated(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.iter().filter_map(|c| match c {
            ListChange::Updated { index } => Some(*index),
            _ => None,
        })
    }

    pub fn moved(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.changes.iter().filter_map(|c| match c {
            ListChange::Moved { from, to } => Some((*from, *to)),
            _ => None,
        })
    }
}

/// Compute the row changes between two snapshots. Keys are assumed unique
/// within each snapshot.
pub fn diff<T: Keyed + PartialEq>(old: &[T], new: &[T]) -> ListDiff {
    let mut matched: Vec<(usize, usize)> = Vec::new();

    let mut prefix = 0;
    while prefix < old.len() && prefix < new.len() && old[prefix].key() == new[prefix].key() {
        matched.push((prefix, prefix));
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < old.len() - prefix
        && suffix < new.len() - prefix
        && old[old.len() - 1 - suffix].key() == new[new.len() - 1 - suffix].key()
    {
        suffix += 1;
    }

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    for (i, j) in common_subsequence(old_mid, new_mid) {
        matched.push((prefix + i, prefix + j));
    }
    for k in 0..suffix {
        matched.push((old.len() - suffix + k, new.len() - suffix + k));
    }

    let mut old_kept = vec![false; old.len()];
    let mut new_kept = vec![false; new.len()];
    let mut updated = Vec::new();
    for &(i, j) in &matched {
        old_kept[i] = true;
        new_kept[j] = true;
        if old[i] != new[j] {
            updated.push(j);
        }
    }

    let new_positions: HashMap<T::Key, usize> = new
        .iter()
        .enumerate()
        .filter(|(j, _)| !new_kept[*j])
        .map(|(j, item)| (item.key(), j))
        .collect();

    let mut changes = Vec::new();
    let mut moved_to = vec![false; new.len()];
    for (i, item) in old.iter().enumerate() {
        if old_kept[i] {
            continue;
        }
        match new_positions.get(&item.key()) {
            Some(&j) => {
                moved_to[j] = true;
                changes.push(ListChange::Moved { from: i, to: j });
                if *item != new[j] {
                    updated.push(j);
                }
            }
            None => changes.push(ListChange::Removed { index: i }),
        }
    }
    for j in 0..new.len() {
        if !new_kept[j] && !moved_to[j] {
            changes.push(ListChange::Inserted { index: j });
        }
    }
    updated.sort_unstable();
    changes.extend(updated.into_iter().map(|index| ListChange::Updated { index }));

    ListDiff { changes }
}

// Longest common subsequence of keys, as (old, new) index pairs in order.
fn common_subsequence<T: Keyed>(old: &[T], new: &[T]) -> Vec<(usize, usize)> {
    if old.is_empty() || new.is_empty() {
        return Vec::new();
    }
    let old_keys: Vec<T::Key> = old.iter().map(Keyed::key).collect();
    let new_keys: Vec<T::Key> = new.iter().map(Keyed::key).collect();
    let (n, m) = (old_keys.len(), new_keys.len());

    // lengths[i][j] = LCS of old[i..] and new[j..]
    let mut lengths = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if old_keys[i] == new_keys[j] {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(lengths[0][0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old_keys[i] == new_keys[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

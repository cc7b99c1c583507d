//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Candidate tree used as the frontier of the SPF algorithm.
//!
//! This is a binary min-heap of lightweight handles. The heap doesn't store the
//! keys themselves: every operation receives a key function that reads the
//! current tentative distance of a handle from its owner (the node arena). A
//! member whose key was lowered must be reported through
//! [`CandidateTree::decrease_key`] so that the heap property is restored.
//!
//! Ties are broken arbitrarily.

use std::collections::HashMap;
use std::hash::Hash;

// Capacity floor below which the backing store is never shrunk.
pub const CANDIDATE_TREE_MIN_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct CandidateTree<H> {
    heap: Vec<H>,
    positions: HashMap<H, usize>,
    capacity: usize,
}

// ===== impl CandidateTree =====

impl<H> CandidateTree<H>
where
    H: Copy + Eq + Hash + std::fmt::Debug,
{
    pub fn new() -> Self {
        CandidateTree {
            heap: Vec::with_capacity(CANDIDATE_TREE_MIN_CAPACITY),
            positions: HashMap::with_capacity(CANDIDATE_TREE_MIN_CAPACITY),
            capacity: CANDIDATE_TREE_MIN_CAPACITY,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    // Returns the current size of the backing store.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, handle: H) -> bool {
        self.positions.contains_key(&handle)
    }

    // Inserts a new member.
    //
    // Panics if the handle is already present.
    pub fn push<K, F>(&mut self, handle: H, key: F)
    where
        K: Ord,
        F: Fn(H) -> K,
    {
        assert!(
            !self.contains(handle),
            "{handle:?} is already in the candidate tree"
        );

        // Double the backing store when full.
        if self.heap.len() == self.capacity {
            self.capacity *= 2;
            self.heap.reserve_exact(self.capacity - self.heap.len());
        }

        let pos = self.heap.len();
        self.heap.push(handle);
        self.positions.insert(handle, pos);
        self.sift_up(pos, &key);
    }

    // Returns the member with the lowest key without removing it.
    pub fn peek_min(&self) -> Option<H> {
        self.heap.first().copied()
    }

    // Removes and returns the member with the lowest key.
    pub fn pop_min<K, F>(&mut self, key: F) -> Option<H>
    where
        K: Ord,
        F: Fn(H) -> K,
    {
        if self.heap.is_empty() {
            return None;
        }

        let last = self.heap.len() - 1;
        self.swap(0, last);
        let handle = self.heap.pop()?;
        self.positions.remove(&handle);
        if !self.heap.is_empty() {
            self.sift_down(0, &key);
        }

        // Halve the backing store when occupancy falls below one quarter.
        if self.heap.len() < self.capacity / 4
            && self.capacity > CANDIDATE_TREE_MIN_CAPACITY
        {
            self.capacity /= 2;
            self.heap.shrink_to(self.capacity);
        }

        Some(handle)
    }

    // Restores the heap property after the key of a member was lowered.
    //
    // Panics if the handle isn't a member of the tree.
    pub fn decrease_key<K, F>(&mut self, handle: H, key: F)
    where
        K: Ord,
        F: Fn(H) -> K,
    {
        let pos = match self.positions.get(&handle) {
            Some(pos) => *pos,
            None => panic!("{handle:?} is missing from the candidate tree"),
        };
        self.sift_up(pos, &key);
    }

    // Removes all members while keeping the backing store allocated.
    pub fn reinitialize(&mut self) {
        self.heap.clear();
        self.positions.clear();
    }

    fn sift_up<K, F>(&mut self, mut pos: usize, key: &F)
    where
        K: Ord,
        F: Fn(H) -> K,
    {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if key(self.heap[pos]) >= key(self.heap[parent]) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down<K, F>(&mut self, mut pos: usize, key: &F)
    where
        K: Ord,
        F: Fn(H) -> K,
    {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && key(self.heap[left]) < key(self.heap[smallest]) {
                smallest = left;
            }
            if right < len && key(self.heap[right]) < key(self.heap[smallest])
            {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions.insert(self.heap[a], a);
        self.positions.insert(self.heap[b], b);
    }
}

impl<H> Default for CandidateTree<H>
where
    H: Copy + Eq + Hash + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

// ===== unit tests =====

//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use generational_arena::Index;

use crate::edge::{Edge, EdgeEnd, EdgeType};
use crate::error::Error;
use crate::level::{LevelFlags, LevelType, Levels};
use crate::node::{Node, NodeType};
use crate::num::Metric;

pub type NodeIndex = Index;
pub type EdgeIndex = Index;

#[derive(Debug)]
pub struct Arena<T>(generational_arena::Arena<T>);

#[derive(Debug, Default)]
pub struct Nodes {
    arena: Arena<Node>,
    name_tree: BTreeMap<String, NodeIndex>,
}

#[derive(Debug, Default)]
pub struct Edges {
    arena: Arena<Edge>,
}

// ===== impl Arena =====

impl<T> Arena<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: Index) -> bool {
        self.0.contains(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Index, &mut T)> {
        self.0.iter_mut()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena(Default::default())
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        &mut self.0[index]
    }
}

// ===== impl Nodes =====

impl Nodes {
    pub(crate) fn insert(
        &mut self,
        name: &str,
        node_type: NodeType,
        level_type: LevelType,
    ) -> Result<&mut Node, Error> {
        if self.name_tree.contains_key(name) {
            return Err(Error::DuplicateNode(name.to_owned()));
        }

        // Create and insert node into the arena.
        let node_idx = self.arena.0.insert_with(|index| {
            Node::new(index, name.to_owned(), node_type, level_type)
        });

        // Link node to different collections.
        let node = &mut self.arena[node_idx];
        self.name_tree.insert(node.name.clone(), node_idx);

        Ok(node)
    }

    // Returns the index of the node corresponding to the given name.
    pub fn get_by_name(&self, name: &str) -> Option<NodeIndex> {
        self.name_tree.get(name).copied()
    }

    // Returns the index of the node corresponding to the given name, or an
    // error if it doesn't exist.
    pub fn lookup(&self, name: &str) -> Result<NodeIndex, Error> {
        self.get_by_name(name)
            .ok_or_else(|| Error::NodeNotFound(name.to_owned()))
    }

    pub fn get(&self, node_idx: NodeIndex) -> Option<&Node> {
        self.arena.0.get(node_idx)
    }

    // Returns an iterator visiting all nodes, ordered by their names.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.name_tree
            .values()
            .map(|node_idx| &self.arena[*node_idx])
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.arena.iter_mut().map(|(_, node)| node)
    }

    pub fn indexes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.name_tree.values().copied()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl std::ops::Index<NodeIndex> for Nodes {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<NodeIndex> for Nodes {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.arena[index]
    }
}

// ===== impl Edges =====

impl Edges {
    pub(crate) fn insert(
        &mut self,
        from: EdgeEnd,
        to: EdgeEnd,
        metric: Levels<Metric>,
        levels: LevelFlags,
        edge_type: EdgeType,
    ) -> EdgeIndex {
        self.arena.0.insert_with(|index| {
            Edge::new(index, from, to, metric, levels, edge_type)
        })
    }

    pub fn get(&self, edge_idx: EdgeIndex) -> Option<&Edge> {
        self.arena.0.get(edge_idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.arena.iter().map(|(_, edge)| edge)
    }

    pub fn indexes(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.arena.iter().map(|(edge_idx, _)| edge_idx)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl std::ops::Index<EdgeIndex> for Edges {
    type Output = Edge;

    fn index(&self, index: EdgeIndex) -> &Self::Output {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<EdgeIndex> for Edges {
    fn index_mut(&mut self, index: EdgeIndex) -> &mut Self::Output {
        &mut self.arena[index]
    }
}

// This file is part of chring-rs.
//
// Copyright 2021 Christos Katsakioris
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::{Display, Formatter};

use log::trace;

use crate::{
    node::Node,
    types::{Adjacency, HashRingError, Host, Result},
};

/// A snapshot of the ring's membership.
///
/// `nodes` is always sorted by `(hash, host_id)` and holds no two nodes of the same host.
#[derive(Debug)]
pub(crate) struct HashRingState<N>
where
    N: Host + ?Sized,
{
    // `crate::iter::Iter` requires access to this field, hence the `pub(crate)`.
    pub(crate) nodes: Vec<Node<N>>,
}

impl<N> Clone for HashRingState<N>
where
    N: Host + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
        }
    }
}

impl<N> HashRingState<N>
where
    N: Host + ?Sized,
{
    #[inline]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn search(&self, hash: u32, id: &[u8]) -> std::result::Result<usize, usize> {
        self.nodes.binary_search_by(|n| n.cmp_position(hash, id))
    }

    /// Splices `node` in at its sorted position. Returns `false`, leaving the state untouched,
    /// if its host is already present.
    pub(crate) fn insert(&mut self, node: Node<N>) -> bool {
        let index = self.search(node.hash, &node.host.host_id());
        match index {
            Ok(_) => {
                trace!("node '{}' is already in the ring", node);
                false
            }
            Err(index) => {
                trace!("inserting node '{}' at index {}", node, index);
                self.nodes.insert(index, node);
                true
            }
        }
    }

    /// Removes the node of the host identified by `id`, which the ring's hasher places at `hash`.
    pub(crate) fn remove(&mut self, hash: u32, id: &[u8]) -> Result<Node<N>> {
        match self.search(hash, id) {
            Ok(index) => {
                let node = self.nodes.remove(index);
                trace!("removed node '{}' from index {}", node, index);
                Ok(node)
            }
            Err(_) => {
                let id = String::from_utf8_lossy(id).into_owned();
                trace!("node {:?} is not in the ring", id);
                Err(HashRingError::NodeNotFound(id))
            }
        }
    }

    #[inline]
    pub(crate) fn contains(&self, hash: u32, id: &[u8]) -> bool {
        self.search(hash, id).is_ok()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Index of the first node whose hash is not less than `hash`, wrapping around to `0` past the
    /// last one.
    fn position(&self, hash: u32) -> Result<usize> {
        if self.nodes.is_empty() {
            return Err(HashRingError::EmptyRing);
        }
        Ok(self.nodes.partition_point(|n| n.hash < hash) % self.nodes.len())
    }

    pub(crate) fn node_for_hash(&self, hash: u32) -> Result<&Node<N>> {
        let index = self.position(hash)?;
        Ok(&self.nodes[index])
    }

    pub(crate) fn adjacent(&self, adjacency: Adjacency, hash: u32) -> Result<&Node<N>> {
        let index = self.position(hash)?;
        let len = self.nodes.len();
        let index = match adjacency {
            Adjacency::Predecessor => (index + len - 1) % len,
            Adjacency::Successor => (index + 1) % len,
        };
        Ok(&self.nodes[index])
    }
}

impl<N> Display for HashRingState<N>
where
    N: Host + ?Sized,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "HashRingState ({} nodes) {{", self.nodes.len())?;
        for (i, n) in self.nodes.iter().enumerate() {
            writeln!(f, "\t- ({:0>6})  {}", i, n)?
        }
        writeln!(f, "}}")
    }
}

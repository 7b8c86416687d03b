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

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher as StdHasher};
use std::sync::Arc;

use crate::types::{Hasher, Host};

/// Node represents a single host placed on the ring at its hash value.
///
/// A `Node` is immutable; its hash is a pure function of its host's [`Host::host_id`].
#[derive(Debug)]
pub struct Node<N>
where
    N: Host + ?Sized,
{
    pub(crate) host: Arc<N>,
    pub(crate) hash: u32,
}

impl<N> Node<N>
where
    N: Host + ?Sized,
{
    /// Create a new `Node` for the given host, placing it on the ring through the given
    /// [`Hasher`].
    pub fn new<H: Hasher>(hasher: &H, host: Arc<N>) -> Self {
        let hash = hasher.digest(&host.host_id());
        Node { host, hash }
    }

    /// Returns a reference to the host this `Node` stands for.
    #[inline]
    pub fn host(&self) -> &Arc<N> {
        &self.host
    }

    /// Returns the position of this `Node` on the ring.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Compares this `Node`'s ring position to the given one. Nodes sharing a hash value are
    /// ordered by their host identifiers.
    #[inline]
    pub(crate) fn cmp_position(&self, hash: u32, id: &[u8]) -> Ordering {
        self.hash
            .cmp(&hash)
            .then_with(|| (*self.host.host_id()).cmp(id))
    }

    #[inline]
    pub(crate) fn is_host(&self, id: &[u8]) -> bool {
        *self.host.host_id() == *id
    }
}

impl<N> Clone for Node<N>
where
    N: Host + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            hash: self.hash,
        }
    }
}

impl<N> PartialEq for Node<N>
where
    N: Host + ?Sized,
{
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && other.is_host(&self.host.host_id())
    }
}

impl<N> Eq for Node<N> where N: Host + ?Sized {}

impl<N> PartialOrd for Node<N>
where
    N: Host + ?Sized,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for Node<N>
where
    N: Host + ?Sized,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_position(other.hash, &other.host.host_id())
    }
}

// Consistent with `Eq`: the hash is derived from the host id, so hashing the id alone suffices.
impl<N> Hash for Node<N>
where
    N: Host + ?Sized,
{
    fn hash<S: StdHasher>(&self, state: &mut S) {
        self.host.host_id().hash(state);
    }
}

impl<N> Display for Node<N>
where
    N: Host + ?Sized,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = self.host.host_id();
        write!(f, "{:08x} ({})", self.hash, String::from_utf8_lossy(&id))
    }
}

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

use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned};
use log::trace;

use crate::{
    iter::Iter,
    node::Node,
    state::HashRingState,
    types::{Adjacency, Crc32Hasher, Hasher, Host, Result},
};

/// The consistent hashing ring data structure.
///
/// Users will probably interact with this crate mostly through this type, as it is central to its
/// API.
///
/// Lookups never block: they read an immutable snapshot of the ring's membership, which writers
/// replace atomically after modifying a private copy of it. Writers are serialized among
/// themselves.
///
/// In multi-threaded contexts, it needs to be wrapped in [`Arc`].
///
/// To find out more general information regarding its use, refer to the crate-level documentation.
#[derive(Debug)]
pub struct HashRing<N, H = Crc32Hasher>
where
    N: Host + ?Sized,
    H: Hasher,
{
    hasher: H,
    writer: Mutex<()>,
    inner: Atomic<HashRingState<N>>,
}

impl<N> HashRing<N, Crc32Hasher>
where
    N: Host + ?Sized,
{
    /// Create a new, empty [`HashRing<N, H>`] that employs the built-in [`Crc32Hasher`].
    #[inline]
    pub fn new() -> Self {
        Self::with_hasher(Crc32Hasher)
    }

    /// Create a new [`HashRing<N, H>`] that employs the built-in [`Crc32Hasher`], initially
    /// populated by the given hosts.
    ///
    /// Hosts that appear more than once in `nodes` are only inserted once.
    #[inline]
    pub fn with_nodes(nodes: &[Arc<N>]) -> Self {
        Self::with_hasher_and_nodes(Crc32Hasher, nodes)
    }
}

impl<N, H> HashRing<N, H>
where
    N: Host + ?Sized,
    H: Hasher,
{
    /// Create a new [`HashRing<N, H>`] that employs the provided [`Hasher`] for placing hosts and
    /// keys on the ring, initially populated by the given hosts.
    ///
    /// Hosts that appear more than once in `nodes` are only inserted once.
    pub fn with_hasher_and_nodes(hasher: H, nodes: &[Arc<N>]) -> Self {
        let mut inner = HashRingState::with_capacity(nodes.len());
        for host in nodes {
            inner.insert(Node::new(&hasher, Arc::clone(host)));
        }
        Self {
            hasher,
            writer: Mutex::new(()),
            inner: Atomic::new(inner),
        }
    }

    /// Create a new, empty [`HashRing<N, H>`] that employs the provided [`Hasher`] for placing
    /// hosts and keys on the ring.
    #[inline]
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_hasher_and_nodes(hasher, &[])
    }

    /// Returns a reference to the [`Hasher`] of the ring.
    #[inline]
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    #[inline]
    fn state<'g>(&'g self, guard: &'g Guard) -> &'g HashRingState<N> {
        let inner = self.inner.load(Ordering::Acquire, guard);
        // SAFETY: `self.inner` is initialized to a valid state on construction, and every update
        // replaces it with another valid one, never with null. Replaced states are only destroyed
        // once no thread pinned by a `Guard` (like the one borrowed here) may still read them.
        unsafe { inner.deref() }
    }

    /// Returns the number of hosts that currently populate the consistent hashing ring.
    pub fn len(&self) -> usize {
        let guard = epoch::pin();
        self.state(&guard).len()
    }

    /// Returns `true` if no hosts currently populate the consistent hashing ring.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `op` on a private copy of the current state and, if it reports a modification,
    /// publishes the copy as the new state (RCU).
    fn update<E, F>(&self, op: F) -> std::result::Result<(), E>
    where
        F: FnOnce(&mut HashRingState<N>) -> std::result::Result<bool, E>,
    {
        // The lock guards no data; a writer that panicked has left the published state intact.
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let guard = epoch::pin();

        // READ & COPY
        let curr_inner_ptr = self.inner.load(Ordering::Acquire, &guard);
        // SAFETY: Never null (see `HashRing::state`); also, no other writer can replace it while
        // the writer lock is held.
        let mut new_inner = unsafe { curr_inner_ptr.deref() }.clone();
        if !op(&mut new_inner)? {
            trace!("ring left unmodified");
            return Ok(());
        }

        // UPDATE
        // `AcqRel` makes the fully built copy visible to every reader that later loads it.
        let old_inner_ptr = self
            .inner
            .swap(Owned::new(new_inner), Ordering::AcqRel, &guard);
        // SAFETY: The old state is unreachable through `self.inner` from now on, and readers that
        // loaded it before the swap are pinned, so it is only destroyed after they unpin.
        unsafe {
            guard.defer_destroy(old_inner_ptr);
        }
        guard.flush();
        Ok(())
    }

    /// Insert the given host in the consistent hashing ring.
    ///
    /// If the host is already in the ring, this is a no-op.
    #[inline]
    pub fn add_node<A>(&self, host: A)
    where
        A: Into<Arc<N>>,
    {
        self.insert(&[host.into()])
    }

    /// Insert the given hosts in the consistent hashing ring, as a single update.
    ///
    /// Hosts already in the ring, or appearing more than once in `hosts`, are only inserted once.
    pub fn insert(&self, hosts: &[Arc<N>]) {
        let hasher = &self.hasher;
        self.update::<Infallible, _>(|state| {
            let mut modified = false;
            for host in hosts {
                modified |= state.insert(Node::new(hasher, Arc::clone(host)));
            }
            Ok(modified)
        })
        .unwrap_or_else(|never| match never {})
    }

    /// Remove the given host from the consistent hashing ring.
    ///
    /// # Errors
    ///
    /// Returns [`HashRingError::NodeNotFound`] if the host does not currently exist in the
    /// consistent hashing ring, which is then left unchanged.
    ///
    ///  [`HashRingError::NodeNotFound`]: enum.HashRingError.html#variant.NodeNotFound
    #[inline]
    pub fn remove_node(&self, host: &N) -> Result<()> {
        self.remove(&[host])
    }

    /// Remove the given hosts from the consistent hashing ring, as a single update.
    ///
    /// # Errors
    ///
    /// Returns [`HashRingError::NodeNotFound`] if any of the hosts does not currently exist in the
    /// consistent hashing ring (including a host that appears twice in `hosts`). In that case,
    /// none of them is removed.
    ///
    ///  [`HashRingError::NodeNotFound`]: enum.HashRingError.html#variant.NodeNotFound
    pub fn remove(&self, hosts: &[&N]) -> Result<()> {
        let hasher = &self.hasher;
        self.update(|state| {
            for host in hosts {
                let id = host.host_id();
                state.remove(hasher.digest(&id), &id)?;
            }
            Ok(!hosts.is_empty())
        })
    }

    /// Returns `true` if the given host currently populates the consistent hashing ring.
    pub fn contains(&self, host: &N) -> bool {
        let id = host.host_id();
        let hash = self.hasher.digest(&id);
        let guard = epoch::pin();
        self.state(&guard).contains(hash, &id)
    }

    /// Look up in the consistent hashing ring and return the host that the given `key` should be
    /// assigned to.
    ///
    /// That is the first host clockwise from the key's hash, i.e., the one with the smallest hash
    /// not less than it; keys that hash past every host wrap around to the host with the smallest
    /// hash.
    ///
    /// # Errors
    ///
    /// Returns [`HashRingError::EmptyRing`] if the consistent hashing ring is currently empty of
    /// hosts and therefore the given `key` cannot be assigned to any of them.
    ///
    ///  [`HashRingError::EmptyRing`]: enum.HashRingError.html#variant.EmptyRing
    pub fn get<K>(&self, key: &K) -> Result<Arc<N>>
    where
        K: AsRef<[u8]> + ?Sized,
    {
        let hash = self.hasher.digest(key.as_ref());
        let guard = epoch::pin();
        let node = self.state(&guard).node_for_hash(hash)?;
        Ok(Arc::clone(&node.host))
    }

    /// Look up in the consistent hashing ring and return a **clone** of the [`Node`] that the
    /// given `key` should be assigned to.
    ///
    /// # Errors
    ///
    /// Returns [`HashRingError::EmptyRing`] if the consistent hashing ring is currently empty.
    ///
    ///  [`HashRingError::EmptyRing`]: enum.HashRingError.html#variant.EmptyRing
    pub fn node_for_key<K>(&self, key: &K) -> Result<Node<N>>
    where
        K: AsRef<[u8]> + ?Sized,
    {
        let hash = self.hasher.digest(key.as_ref());
        let guard = epoch::pin();
        self.state(&guard).node_for_hash(hash).map(Node::clone)
    }

    fn adjacent<K>(&self, adjacency: Adjacency, key: &K) -> Result<Node<N>>
    where
        K: AsRef<[u8]> + ?Sized,
    {
        let hash = self.hasher.digest(key.as_ref());
        let guard = epoch::pin();
        self.state(&guard).adjacent(adjacency, hash).map(Node::clone)
    }

    /// Look up in the consistent hashing ring and return the [`Node`] which is the predecessor of
    /// the one that the given `key` should be assigned to.
    ///
    /// In a ring of a single host, that is the host itself.
    ///
    /// # Errors
    ///
    /// Returns [`HashRingError::EmptyRing`] if the consistent hashing ring is currently empty.
    ///
    ///  [`HashRingError::EmptyRing`]: enum.HashRingError.html#variant.EmptyRing
    #[inline]
    pub fn predecessor<K>(&self, key: &K) -> Result<Node<N>>
    where
        K: AsRef<[u8]> + ?Sized,
    {
        self.adjacent(Adjacency::Predecessor, key)
    }

    /// Look up in the consistent hashing ring and return the [`Node`] which is the successor of
    /// the one that the given `key` should be assigned to.
    ///
    /// In a ring of a single host, that is the host itself.
    ///
    /// # Errors
    ///
    /// Returns [`HashRingError::EmptyRing`] if the consistent hashing ring is currently empty.
    ///
    ///  [`HashRingError::EmptyRing`]: enum.HashRingError.html#variant.EmptyRing
    #[inline]
    pub fn successor<K>(&self, key: &K) -> Result<Node<N>>
    where
        K: AsRef<[u8]> + ?Sized,
    {
        self.adjacent(Adjacency::Successor, key)
    }

    /// Returns an [`Iter`], i.e., an iterator to loop through all [`Node`]s that populate the
    /// consistent hashing ring, in ascending hash order.
    ///
    /// See the documentation of [`Iter`] for more information regarding its use.
    #[inline]
    pub fn iter<'a>(&'a self, guard: &'a Guard) -> Iter<'a, N> {
        Iter::new(self.state(guard))
    }
}

impl<N, H> Default for HashRing<N, H>
where
    N: Host + ?Sized,
    H: Hasher + Default,
{
    #[inline]
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<N, H> Clone for HashRing<N, H>
where
    N: Host + ?Sized,
    H: Hasher + Clone,
{
    /// Returns an independent ring, populated by the hosts of the current snapshot of this one.
    fn clone(&self) -> Self {
        let guard = epoch::pin();
        Self {
            hasher: self.hasher.clone(),
            writer: Mutex::new(()),
            inner: Atomic::new(self.state(&guard).clone()),
        }
    }
}

impl<N, H> Extend<Arc<N>> for HashRing<N, H>
where
    N: Host + ?Sized,
    H: Hasher,
{
    /// Extend the [`HashRing<N, H>`] by the hosts provided through the given [`IntoIterator`]
    /// over `Arc<N>`.
    ///
    /// Due to the signature of [`Extend::extend`], a `&mut HashRing` is required; the preferred
    /// way to extend a shared ring is [`HashRing::insert`], which behaves identically.
    fn extend<I: IntoIterator<Item = Arc<N>>>(&mut self, iter: I) {
        let hosts: Vec<_> = iter.into_iter().collect();
        self.insert(&hosts);
    }
}

impl<N, H> Drop for HashRing<N, H>
where
    N: Host + ?Sized,
    H: Hasher,
{
    fn drop(&mut self) {
        // SAFETY: `&mut self` guarantees that no other thread may access the current state, and
        // the states replaced earlier have already been handed over to the epoch collector.
        unsafe {
            let inner = self.inner.load(Ordering::Relaxed, epoch::unprotected());
            if !inner.is_null() {
                drop(inner.into_owned());
            }
        }
    }
}

impl<N, H> Display for HashRing<N, H>
where
    N: Host + ?Sized,
    H: Hasher,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let guard = epoch::pin();
        write!(f, "{}", self.state(&guard))
    }
}

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

//! A concurrent consistent hashing ring, mapping arbitrary keys to one of a dynamic set of hosts.
//!
//! Adding a host to (or removing one from) a [`HashRing<N, H>`] only remaps the keys that fall
//! between that host and its predecessor on the ring, which makes it a fit routing primitive for
//! sharding work or data over a changing pool of backends (cache shards, partitioned storage,
//! worker pools).
//!
//! Both hosts and keys are placed on a 32-bit hash space by the same [`Hasher`]; by default, the
//! [`Crc32Hasher`]. A key is assigned to the first host found clockwise from its hash, wrapping
//! around to the host with the smallest hash.
//!
//! # Concurrency
//!
//! Lookups are lock-free: each one reads an immutable snapshot of the ring's membership. Updates
//! are serialized; each one modifies a private copy of the current snapshot and then swaps it in
//! atomically, while the memory of the replaced snapshot is reclaimed via [crossbeam_epoch].
//!
//! In multi-threaded contexts, [`HashRing<N, H>`] should be explicitly wrapped in `Arc`. This is
//! deliberate, to expose the hidden cost of atomic reference counting and also give a chance to
//! single-threaded contexts to opt out of it.
//!
//! # Examples
//!
//! ```rust
//! use chring::{HashRing, HashRingError, Result};
//!
//! # fn main() -> Result<()> {
//! let ring: HashRing<str> = HashRing::new();
//! assert!(matches!(ring.get("user:42"), Err(HashRingError::EmptyRing)));
//!
//! ring.add_node("cache-1");
//! ring.add_node("cache-2");
//! ring.add_node("cache-3");
//! ring.add_node("cache-3"); // no-op
//! assert_eq!(ring.len(), 3);
//!
//! let host = ring.get("user:42")?;
//! assert!(ring.contains(&host));
//!
//! ring.remove_node("cache-2")?;
//! assert!(matches!(
//!     ring.remove_node("cache-2"),
//!     Err(HashRingError::NodeNotFound(_))
//! ));
//! # Ok(())
//! # }
//! ```
//!
//!  [crossbeam_epoch]: https://docs.rs/crossbeam-epoch/0.9/crossbeam_epoch/

#![doc(html_root_url = "https://docs.rs/chring/0.1.0")]

mod iter;
mod node;
mod ring;
mod state;
mod types;

pub use crossbeam_epoch::{pin, Guard};

pub use crate::iter::Iter;
pub use crate::node::Node;
pub use crate::ring::HashRing;
#[cfg(any(feature = "blake2b-hash", doc))]
pub use crate::types::Blake2bHasher;
#[cfg(any(feature = "blake3-hash", doc))]
pub use crate::types::Blake3Hasher;
pub use crate::types::{Crc32Hasher, DefaultStdHasher, HashRingError, Hasher, Host, Result};

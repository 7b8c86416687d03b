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

use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher as StdHasher;

use crc::{Crc, CRC_32_ISO_HDLC};
use thiserror::Error;

pub(crate) enum Adjacency {
    Predecessor,
    Successor,
}

/// A custom `Result` type for this crate, combining a return value with a [`HashRingError`].
pub type Result<T> = std::result::Result<T, HashRingError>;

/// A trait to be implemented by any type that needs to act as a host in the consistent hashing
/// ring.
pub trait Host {
    /// Returns a byte slice that uniquely identifies the particular [`Host`] from the rest of its
    /// kind.
    ///
    /// It is hashed to place the host on the ring, and compared to tell hosts apart.
    fn host_id(&self) -> Cow<'_, [u8]>;
}

impl Host for String {
    #[inline]
    fn host_id(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl Host for str {
    #[inline]
    fn host_id(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl Host for Vec<u8> {
    #[inline]
    fn host_id(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl Host for [u8] {
    #[inline]
    fn host_id(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

/// An error type returned by calls to the API exposed by this crate.
#[derive(Debug, Error)]
pub enum HashRingError {
    /// The host requested for removal does not currently exist in the consistent hashing ring.
    ///
    /// The error contains the (lossily UTF-8 decoded) identifier of the missing host.
    #[error("Node {0:?} does not exist in the ring")]
    NodeNotFound(String),

    /// The consistent hashing ring is currently empty.
    #[error("HashRing is empty")]
    EmptyRing,
}

/// A trait to be implemented by any type that needs to act as the hash function of the ring.
///
/// The same function places hosts on the ring and positions the keys being looked up, so both
/// live in the same 32-bit hash space. It must be deterministic; it need not be cryptographically
/// secure.
pub trait Hasher {
    /// Given a byte slice, returns its 32-bit hash digest.
    fn digest(&self, bytes: &[u8]) -> u32;
}

const IEEE: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// The default [`Hasher`], based on the "IEEE" CRC-32 (CRC-32/ISO-HDLC) checksum, as implemented
/// in the [crc][crc] crate.
///
///  [crc]: https://docs.rs/crc/3/crc/
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32Hasher;

impl Hasher for Crc32Hasher {
    #[inline]
    fn digest(&self, bytes: &[u8]) -> u32 {
        IEEE.checksum(bytes)
    }
}

/// A [`Hasher`] implementation for standard library's [`DefaultHasher`].
///
/// The 64-bit output is folded into 32 bits. Note that the algorithm behind [`DefaultHasher`] is
/// not guaranteed to stay the same across Rust releases.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStdHasher;

impl Hasher for DefaultStdHasher {
    fn digest(&self, bytes: &[u8]) -> u32 {
        let mut h = DefaultHasher::default();
        h.write(bytes);
        let h = h.finish();
        (h ^ (h >> 32)) as u32
    }
}

#[cfg(any(feature = "blake3-hash", feature = "blake2b-hash"))]
#[inline]
fn leading_u32(digest: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&digest[..4]);
    u32::from_be_bytes(buf)
}

/// A [`Hasher`] implementation based on the [BLAKE3][BLAKE3.io] cryptographic hash function, as
/// implemented in the [blake3][blake3] crate.
///
/// The first four bytes of the digest are used, in big-endian order.
/// To use this `Hasher` implementation in `chring-rs`, the `blake3-hash` crate feature must be
/// enabled.
///
/// # Examples
///
/// ```rust
/// use chring::{Blake3Hasher, HashRing};
///
/// let ring: HashRing<str, Blake3Hasher> = HashRing::with_hasher(Blake3Hasher::default());
/// ring.add_node("cache-1");
/// assert_eq!(ring.len(), 1);
/// ```
///
///  [BLAKE3.io]: https://blake3.io/
///  [blake3]: https://docs.rs/blake3/0.3/blake3/
#[cfg(any(feature = "blake3-hash", doc))]
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3Hasher;

#[cfg(feature = "blake3-hash")]
impl Hasher for Blake3Hasher {
    #[inline]
    fn digest(&self, bytes: &[u8]) -> u32 {
        leading_u32(blake3::hash(bytes).as_bytes())
    }
}

/// A [`Hasher`] implementation based on the [BLAKE2b][BLAKE2b] cryptographic hash function, as
/// implemented in the [blake2b_simd][blake2b_simd] crate.
///
/// The first four bytes of the digest are used, in big-endian order.
/// To use this `Hasher` implementation in `chring-rs`, the `blake2b-hash` crate feature must be
/// enabled.
///
/// # Examples
///
/// ```rust
/// use chring::{Blake2bHasher, HashRing};
///
/// let ring: HashRing<str, Blake2bHasher> = HashRing::with_hasher(Blake2bHasher::default());
/// ring.add_node("cache-1");
/// assert_eq!(ring.len(), 1);
/// ```
///
///  [BLAKE2b]: https://www.blake2.net/
///  [blake2b_simd]: https://docs.rs/blake2b_simd/0.5/blake2b_simd/
#[cfg(any(feature = "blake2b-hash", doc))]
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake2bHasher;

#[cfg(feature = "blake2b-hash")]
impl Hasher for Blake2bHasher {
    #[inline]
    fn digest(&self, bytes: &[u8]) -> u32 {
        leading_u32(blake2b_simd::blake2b(bytes).as_bytes())
    }
}

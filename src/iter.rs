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

use std::iter::FusedIterator;

use crate::{node::Node, state::HashRingState, types::Host};

/// An iterator over the [`Node`]s of a [`HashRing<N, H>`], in ascending hash order.
///
/// It walks the snapshot of the ring that was current when it was created, which the epoch
/// `Guard` it borrows keeps alive; nodes inserted or removed afterwards are not reflected.
///
///  [`HashRing<N, H>`]: struct.HashRing.html
pub struct Iter<'guard, N>
where
    N: Host + ?Sized,
{
    inner: &'guard HashRingState<N>,
    front: usize,
    back: usize,
}

impl<'guard, N> Iter<'guard, N>
where
    N: Host + ?Sized,
{
    #[inline]
    pub(crate) fn new(inner: &'guard HashRingState<N>) -> Self {
        Iter {
            inner,
            front: 0,
            back: inner.len(),
        }
    }
}

impl<'guard, N> Iterator for Iter<'guard, N>
where
    N: Host + ?Sized,
{
    type Item = &'guard Node<N>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.front += 1;
            self.inner.nodes.get(self.front - 1)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.back - self.front;
        (rem, Some(rem))
    }
}

impl<'guard, N> DoubleEndedIterator for Iter<'guard, N>
where
    N: Host + ?Sized,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            self.inner.nodes.get(self.back)
        } else {
            None
        }
    }
}

impl<'guard, N> ExactSizeIterator for Iter<'guard, N>
where
    N: Host + ?Sized,
{
    #[inline]
    fn len(&self) -> usize {
        self.back - self.front
    }
}

impl<'guard, N: Host + ?Sized> FusedIterator for Iter<'guard, N> {}

/*
This file is part of the Building Aggregration Tool
Copyright (C) 2022 Novel-T

The Building Aggregration Tool is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use num::{FromPrimitive, Integer, ToPrimitive};

/// Numeric bound used by [`ChunkIterator`]/[`ChunkPairIterator`]. Any signed
/// or unsigned integer type satisfies it.
pub trait ChunkIteratorConstraints: Integer + Copy + FromPrimitive + ToPrimitive {}

impl<T: Integer + Copy + FromPrimitive + ToPrimitive> ChunkIteratorConstraints for T {}

/// Lazily yields the step boundaries of `[start, end]` split into pieces of
/// at most `step_size`, always including `end` as the final boundary. Used
/// to build [`crate::grid::Grid::subdivide`] out of per-axis chunk ranges.
pub struct ChunkIterator<I>
where
    I: ChunkIteratorConstraints,
{
    step_size: I,
    num_steps: usize,
    cur_step: usize,
    start: I,
    end: I,
}

impl<I> ChunkIterator<I>
where
    I: ChunkIteratorConstraints,
{
    /// Inclusive `[start, end]`.
    pub fn new(start: I, end: I, step_size: I) -> Self {
        assert!(end >= start);
        assert!(step_size >= I::one());

        let range_len = end - start;
        let mut num_steps = I::one() + range_len / step_size;
        if range_len % step_size > I::zero() {
            num_steps = num_steps + I::one();
        }

        ChunkIterator {
            step_size,
            start,
            end,
            num_steps: num_steps.to_usize().unwrap(),
            cur_step: 0,
        }
    }

    fn current(&self) -> I {
        if self.cur_step >= self.num_steps - 1 {
            return self.end;
        }

        self.start + self.step_size * I::from_usize(self.cur_step).unwrap()
    }

    fn go_back(&mut self) {
        if self.cur_step > 0 {
            self.cur_step -= 1;
        }
    }

    pub fn reset(&mut self) {
        self.cur_step = 0;
    }
}

impl<I> Iterator for ChunkIterator<I>
where
    I: ChunkIteratorConstraints,
{
    type Item = I;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur_step >= self.num_steps {
            return None;
        }

        let r = self.current();
        self.cur_step += 1;
        Some(r)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let l = self.num_steps - self.cur_step;
        (l, Some(l))
    }
}

impl<I> ExactSizeIterator for ChunkIterator<I> where I: ChunkIteratorConstraints {}

/// Yields inclusive `(lower, upper)` sub-range pairs of `[start, end]`, each
/// at most `step_size` long. This is what [`crate::grid::Grid::subdivide`]
/// actually iterates: one pair per row-chunk, one pair per col-chunk.
pub struct ChunkPairIterator<I>
where
    I: ChunkIteratorConstraints,
{
    chunk_iter: ChunkIterator<I>,
}

impl<I> ChunkPairIterator<I>
where
    I: ChunkIteratorConstraints,
{
    /// `start` and `end` are inclusive.
    pub fn new(start: I, end: I, step_size: I) -> Self {
        let chunk_iter = ChunkIterator::new(start, end + I::one(), step_size);

        assert!(chunk_iter.size_hint().0 > 1);

        ChunkPairIterator { chunk_iter }
    }

    pub fn reset(&mut self) {
        self.chunk_iter.reset();
    }
}

impl<I> Iterator for ChunkPairIterator<I>
where
    I: ChunkIteratorConstraints,
{
    type Item = (I, I);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(lower_bound_inc) = self.chunk_iter.next() {
            if let Some(upper_bound_inc) = self.chunk_iter.next() {
                self.chunk_iter.go_back();
                return Some((lower_bound_inc, upper_bound_inc - I::one()));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let sh = self.chunk_iter.size_hint();

        if sh.0 <= 1 {
            (0, Some(0))
        } else {
            (sh.0 - 1, Some(sh.0 - 1))
        }
    }
}

impl<I> ExactSizeIterator for ChunkPairIterator<I> where I: ChunkIteratorConstraints {}

#[cfg(test)]
mod chunk_iterator_tests {
    use super::*;

    #[test]
    fn test_chunk_iter() {
        let v: Vec<_> = ChunkIterator::new(0, 10, 3).collect();
        assert_eq!(v, vec![0, 3, 6, 9, 10]);

        let v: Vec<_> = ChunkIterator::new(2, 11, 3).collect();
        assert_eq!(v, vec![2, 5, 8, 11]);

        let v: Vec<_> = ChunkIterator::new(4, 5, 30).collect();
        assert_eq!(v, vec![4, 5]);

        let v: Vec<_> = ChunkIterator::new(4, 4, 30).collect();
        assert_eq!(v, vec![4]);

        let v: Vec<_> = ChunkIterator::new(0, 54, 10).collect();
        assert_eq!(v, vec![0, 10, 20, 30, 40, 50, 54]);
    }

    #[test]
    fn test_pair_chunk_iter() {
        let v: Vec<_> = ChunkPairIterator::new(0, 10, 3).collect();
        assert_eq!(v, vec![(0, 2), (3, 5), (6, 8), (9, 10)]);

        let v: Vec<_> = ChunkPairIterator::new(2, 10, 3).collect();
        assert_eq!(v, vec![(2, 4), (5, 7), (8, 10)]);

        let v: Vec<_> = ChunkPairIterator::new(3, 5, 30).collect();
        assert_eq!(v, vec![(3, 5)]);

        let v: Vec<_> = ChunkPairIterator::new(0, 54, 10).collect();
        assert_eq!(
            v,
            vec![(0, 9), (10, 19), (20, 29), (30, 39), (40, 49), (50, 54)]
        );
    }
}

//! Suffix array construction
//!
//! Index building only needs "sorted suffix positions of this text", so the
//! construction algorithm sits behind `SuffixArrayProvider`. The bundled
//! provider sorts by prefix doubling with rayon: O(n log^2 n) worst case
//! regardless of how repetitive the text is.

use super::types::{MAX_TEXT_LEN, Position};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::fmt;

/// Below this many suffixes sorting stays on the calling thread
const PARALLEL_THRESHOLD: usize = 100_000;

/// Builds the suffix array of a text
pub trait SuffixArrayProvider: Sync {
    /// Positions `0..text.len()` ordered so their suffixes are non-decreasing
    fn build(&self, text: &[u8]) -> Result<Vec<Position>>;
}

/// Prefix-doubling suffix sorter
///
/// Each round sorts positions by the rank pair `(rank[i], rank[i + k])`,
/// doubling `k` until every rank is distinct.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixDoublingProvider;

impl SuffixArrayProvider for PrefixDoublingProvider {
    fn build(&self, text: &[u8]) -> Result<Vec<Position>> {
        let n = text.len();
        if n as u64 > MAX_TEXT_LEN {
            return Err(Error::SizeExceeded {
                total_length: n as u64,
            });
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut sa = alloc_positions(n, "suffix array")?;
        sa.extend(0..n as Position);
        let mut rank = alloc_positions(n, "suffix ranks")?;
        rank.extend(text.iter().map(|&b| b as Position));
        let mut next = alloc_positions(n, "suffix ranks")?;
        next.resize(n, 0);

        let mut k = 1usize;
        loop {
            let key = |i: Position| -> u64 {
                let i = i as usize;
                let second = if i + k < n { rank[i + k] as u64 + 1 } else { 0 };
                ((rank[i] as u64) << 32) | second
            };

            if n > PARALLEL_THRESHOLD {
                sa.par_sort_unstable_by_key(|&i| key(i));
            } else {
                sa.sort_unstable_by_key(|&i| key(i));
            }

            next[sa[0] as usize] = 0;
            for w in 1..n {
                let step = (key(sa[w - 1]) != key(sa[w])) as Position;
                next[sa[w] as usize] = next[sa[w - 1] as usize] + step;
            }
            std::mem::swap(&mut rank, &mut next);

            if rank[sa[n - 1] as usize] as usize == n - 1 {
                break;
            }
            k *= 2;
        }

        Ok(sa)
    }
}

fn alloc_positions(n: usize, what: &'static str) -> Result<Vec<Position>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n).map_err(|_| Error::AllocationFailed {
        what,
        bytes: (n * std::mem::size_of::<Position>()) as u64,
    })?;
    Ok(v)
}

/// First defect found in a candidate suffix array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuffixArrayFault {
    /// Entry count differs from the text length
    Length { expected: usize, actual: usize },
    /// Entry points past the end of the text
    OutOfRange { index: usize, position: Position },
    /// Position occurs twice
    Duplicate { index: usize, position: Position },
    /// Suffix at `index` sorts after the one at `index + 1`
    Unsorted { index: usize },
}

impl fmt::Display for SuffixArrayFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuffixArrayFault::Length { expected, actual } => {
                write!(f, "{} entries, expected {}", actual, expected)
            }
            SuffixArrayFault::OutOfRange { index, position } => {
                write!(f, "entry {} = {} is out of range", index, position)
            }
            SuffixArrayFault::Duplicate { index, position } => {
                write!(f, "entry {} repeats position {}", index, position)
            }
            SuffixArrayFault::Unsorted { index } => {
                write!(f, "entries {} and {} are out of order", index, index + 1)
            }
        }
    }
}

/// Check that `sa` is a permutation of `0..text.len()` in suffix order
///
/// Runs in linear time: neighbours with the same first byte are ordered by
/// the rank of their next suffix instead of by comparing whole suffixes.
pub fn find_fault<I>(text: &[u8], sa: I) -> Option<SuffixArrayFault>
where
    I: IntoIterator<Item = Position>,
{
    let n = text.len();
    let sa: Vec<Position> = sa.into_iter().collect();
    if sa.len() != n {
        return Some(SuffixArrayFault::Length {
            expected: n,
            actual: sa.len(),
        });
    }

    // rank[p] = index of position p; unset slots hold Position::MAX
    let mut rank = vec![Position::MAX; n];
    for (index, &position) in sa.iter().enumerate() {
        let pos = position as usize;
        if pos >= n {
            return Some(SuffixArrayFault::OutOfRange { index, position });
        }
        if rank[pos] != Position::MAX {
            return Some(SuffixArrayFault::Duplicate { index, position });
        }
        rank[pos] = index as Position;
    }

    // The empty suffix (None) sorts before every other
    let next_rank = |p: usize| (p + 1 < n).then(|| rank[p + 1]);
    for (index, pair) in sa.windows(2).enumerate() {
        let (a, b) = (pair[0] as usize, pair[1] as usize);
        let ordered = match text[a].cmp(&text[b]) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => next_rank(a) < next_rank(b),
        };
        if !ordered {
            return Some(SuffixArrayFault::Unsorted { index });
        }
    }
    None
}

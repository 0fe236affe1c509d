//! 3-gram bucket table
//!
//! For every possible 3-byte prefix `g`, the table stores how many document
//! positions carry a gram smaller than `g`. Because suffix order refines
//! gram order, `table[g]` is also the index in the finished suffix array of
//! the first suffix starting with `g`. The bucket for `g` spans
//! `table[g]..table[g + 1]` (or `..n` for the last gram).
//!
//! Grams at the last two positions read into the zero padding, so a suffix
//! shorter than three bytes lands in the bucket of its zero-extended prefix.

use super::assembler::LogicalBuffer;
use super::types::*;
use crate::error::{Error, Result};
use std::ops::Range;

/// Bucket start for each of the 2^24 grams, plus the document length
#[derive(Debug, Clone)]
pub struct GramBucketTable {
    starts: Vec<Position>,
    total: Position,
}

impl GramBucketTable {
    /// Build the table over an assembled document
    pub fn build(buffer: &LogicalBuffer) -> Result<Self> {
        let mut starts = alloc_table()?;
        compute_gram_starts(buffer.padded(), buffer.len(), &mut starts)?;
        Ok(Self {
            starts,
            total: buffer.len() as Position,
        })
    }

    /// Wrap a table read back from an artifact
    ///
    /// The table must start at 0, never decrease and stay within `total`;
    /// anything else is reported as `ArtifactMismatch`.
    pub fn from_starts(starts: Vec<Position>, total: Position) -> Result<Self> {
        if starts.len() != GRAM_TABLE_SIZE {
            return Err(Error::InvalidInput(format!(
                "gram table has {} slots, expected {}",
                starts.len(),
                GRAM_TABLE_SIZE
            )));
        }
        if starts[0] != 0 {
            return Err(Error::ArtifactMismatch(format!(
                "gram table: slot 000000 holds {}, expected 0",
                starts[0]
            )));
        }
        if let Some(g) = starts.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::ArtifactMismatch(format!(
                "gram table: slot {:06x} holds {}, below slot {:06x} ({})",
                g + 1,
                starts[g + 1],
                g,
                starts[g]
            )));
        }
        let last = starts[GRAM_TABLE_SIZE - 1];
        if last > total {
            return Err(Error::ArtifactMismatch(format!(
                "gram table: last slot holds {}, past the {}-position document",
                last, total
            )));
        }
        Ok(Self { starts, total })
    }

    /// Raw bucket starts, one per gram
    #[inline]
    pub fn starts(&self) -> &[Position] {
        &self.starts
    }

    /// First suffix array index for gram `g`
    #[inline]
    pub fn start(&self, gram: Gram) -> Position {
        self.starts[gram as usize]
    }

    /// Suffix array index range holding every suffix that starts with gram `g`
    #[inline]
    pub fn bucket(&self, gram: Gram) -> Range<Position> {
        bucket_range(&self.starts, self.total, gram)
    }

    /// Number of positions whose gram is exactly `g`
    #[inline]
    pub fn width(&self, gram: Gram) -> Position {
        let range = self.bucket(gram);
        range.end - range.start
    }

    /// Number of grams with at least one position
    pub fn populated(&self) -> usize {
        let mut count = self.starts.windows(2).filter(|w| w[1] > w[0]).count();
        if self.total > self.starts[GRAM_TABLE_SIZE - 1] {
            count += 1;
        }
        count
    }

    /// Gram with the widest bucket and its width (lowest gram wins ties)
    pub fn widest(&self) -> Option<(Gram, Position)> {
        let mut best: Option<(Gram, Position)> = None;
        for gram in 0..GRAM_TABLE_SIZE as Gram {
            let width = self.width(gram);
            if width > 0 && best.is_none_or(|(_, w)| width > w) {
                best = Some((gram, width));
            }
        }
        best
    }
}

impl PartialEq for GramBucketTable {
    fn eq(&self, other: &Self) -> bool {
        self.total == other.total && self.starts == other.starts
    }
}

impl Eq for GramBucketTable {}

/// Bucket range for `gram` in a raw starts table over `total` positions
#[inline]
pub fn bucket_range(starts: &[Position], total: Position, gram: Gram) -> Range<Position> {
    let g = gram as usize;
    let end = if g + 1 < GRAM_TABLE_SIZE {
        starts[g + 1]
    } else {
        total
    };
    starts[g]..end
}

/// Zeroed table of `GRAM_TABLE_SIZE` slots
fn alloc_table() -> Result<Vec<Position>> {
    let mut table = Vec::new();
    table
        .try_reserve_exact(GRAM_TABLE_SIZE)
        .map_err(|_| Error::AllocationFailed {
            what: "gram table",
            bytes: (GRAM_TABLE_SIZE * ENTRY_SIZE) as u64,
        })?;
    table.resize(GRAM_TABLE_SIZE, 0);
    Ok(table)
}

/// Fill `table` with the bucket start of every gram in `padded[..n]`
///
/// `padded` must extend at least two zero bytes past `n` and `table` must
/// hold exactly `GRAM_TABLE_SIZE` slots, otherwise `InvalidInput`. Any prior
/// table content is discarded. An `n` past `MAX_TEXT_LEN` is reported as
/// `SizeExceeded`, the same kind the build raises for oversized documents.
pub fn compute_gram_starts(padded: &[u8], n: usize, table: &mut [Position]) -> Result<()> {
    if n as u64 > MAX_TEXT_LEN {
        return Err(Error::SizeExceeded {
            total_length: n as u64,
        });
    }
    if padded.len() < n + 2 {
        return Err(Error::InvalidInput(format!(
            "text of {} bytes needs 2 bytes of padding, buffer holds {}",
            n,
            padded.len()
        )));
    }
    if table.len() != GRAM_TABLE_SIZE {
        return Err(Error::InvalidInput(format!(
            "gram table has {} slots, expected {}",
            table.len(),
            GRAM_TABLE_SIZE
        )));
    }

    // Histogram
    table.fill(0);
    for i in 0..n {
        table[gram_at(padded, i) as usize] += 1;
    }

    // Inclusive prefix sum: table[g] = #positions with gram <= g
    for g in 0..GRAM_TABLE_SIZE - 1 {
        table[g + 1] += table[g];
    }

    // Shift to exclusive: table[g] = #positions with gram < g
    for g in (1..GRAM_TABLE_SIZE).rev() {
        table[g] = table[g - 1];
    }
    table[0] = 0;

    Ok(())
}

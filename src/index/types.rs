//! Core index types and constants

/// Position in the logical document, also the width of every persisted integer
pub type Position = u32;

/// A gram is a 3-byte sequence stored as u32 (only lower 24 bits used)
pub type Gram = u32;

/// Number of bits in a gram value
pub const GRAM_BITS: u32 = 24;

/// Number of slots in the gram bucket table (one per possible 3-byte prefix)
pub const GRAM_TABLE_SIZE: usize = 1 << GRAM_BITS;

/// Zeroed bytes kept past the end of the document so the last two
/// positions still have a full 3-byte window
pub const PAD: usize = 8;

/// Largest logical document length an index can describe
pub const MAX_TEXT_LEN: u64 = Position::MAX as u64;

/// Width in bytes of every integer in the artifact
pub const ENTRY_SIZE: usize = std::mem::size_of::<Position>();

/// Convert 3 bytes to a gram value
#[inline]
pub fn gram_of(b0: u8, b1: u8, b2: u8) -> Gram {
    ((b0 as u32) << 16) | ((b1 as u32) << 8) | (b2 as u32)
}

/// Gram starting at `i`; `padded` must hold at least `i + 3` bytes
#[inline]
pub fn gram_at(padded: &[u8], i: usize) -> Gram {
    gram_of(padded[i], padded[i + 1], padded[i + 2])
}

/// Convert gram value back to bytes
#[inline]
pub fn gram_bytes(gram: Gram) -> [u8; 3] {
    [(gram >> 16) as u8, (gram >> 8) as u8, gram as u8]
}

/// Expected artifact size in bytes for a document of `n` bytes
pub fn artifact_len(n: u64) -> u64 {
    (n + GRAM_TABLE_SIZE as u64) * ENTRY_SIZE as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gram_conversion() {
        let gram = gram_of(b'a', b'n', b'a');
        assert_eq!(gram, 0x616E61);
        assert_eq!(gram_bytes(gram), *b"ana");
    }

    #[test]
    fn test_gram_at_reads_into_padding() {
        let padded = [b'x', 0, 0, 0];
        assert_eq!(gram_at(&padded, 0), 0x780000);
        assert_eq!(gram_at(&padded, 1), 0);
    }

    #[test]
    fn test_gram_fits_table() {
        assert!((gram_of(0xFF, 0xFF, 0xFF) as usize) < GRAM_TABLE_SIZE);
    }

    #[test]
    fn test_artifact_len() {
        assert_eq!(artifact_len(0), 4 * (1 << 24));
        assert_eq!(artifact_len(6), 4 * (6 + (1 << 24)));
    }
}

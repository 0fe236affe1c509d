//! Human-readable rendering for CLI output

use crate::index::types::{Gram, gram_bytes};

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Render a gram as its 3 bytes, escaping anything non-printable
pub fn format_gram(gram: Gram) -> String {
    let escaped: String = gram_bytes(gram)
        .iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect();
    format!("\"{}\" ({:06x})", escaped, gram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::gram_of;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(64 * 1024 * 1024), "64.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn test_format_gram() {
        assert_eq!(format_gram(gram_of(b'a', b'n', b'a')), "\"ana\" (616e61)");
        assert_eq!(format_gram(gram_of(b'a', 0, b'\n')), "\"a\\x00\\n\" (61000a)");
    }
}

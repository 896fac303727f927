//! String/bytes runtime helpers (spec §4.E).

/// CEL `size()` on a string counts Unicode code points, not UTF-16 units
/// or bytes.
pub fn string_size(s: &str) -> i64 {
    s.chars().count() as i64
}

/// CEL `size()` on bytes counts raw bytes.
pub fn bytes_size(b: &[u8]) -> i64 {
    b.len() as i64
}

/// Unsigned lexicographic byte comparison.
pub fn bytes_cmp(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    a.cmp(b)
}

pub fn concat_str(a: &str, b: &str) -> String {
    let mut out = String::with_capacity(a.len() + b.len());
    out.push_str(a);
    out.push_str(b);
    out
}

pub fn concat_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// Renders bytes the way `Value`'s `Display` impl embeds them inside a
/// `b"..."` literal: printable ASCII verbatim, everything else as `\xNN`.
pub fn bytes_repr(b: &[u8]) -> String {
    let mut out = String::with_capacity(b.len());
    for &byte in b {
        if byte.is_ascii_graphic() || byte == b' ' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("\\x{byte:02x}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_counts_codepoints_not_bytes() {
        assert_eq!(string_size("😀"), 1);
        assert_eq!(string_size("abc"), 3);
        assert_eq!(bytes_size("😀".as_bytes()), 4);
    }

    #[test]
    fn bytes_compare_unsigned_lexicographic() {
        assert_eq!(bytes_cmp(&[0x00], &[0xff]), std::cmp::Ordering::Less);
    }
}

//! Component-wise percent-encoding per RFC 3986.
//!
//! Each URI component keeps its own set of characters that may appear
//! literally; everything else is percent-encoded byte-wise. A `%` that is
//! already followed by two hex digits is copied through untouched, so
//! normalizing an already-encoded component never double-encodes it.

/// Unreserved characters plus sub-delims, shared by every component set.
const fn is_component_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'_' | b'-' | b'.' | b'~'
                | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'='
        )
}

/// Allowed literally in the path component: pchar plus `/`.
pub(crate) const fn is_path_byte(byte: u8) -> bool {
    is_component_byte(byte) || matches!(byte, b':' | b'@' | b'/')
}

/// Allowed literally in query and fragment: path set plus `?`.
pub(crate) const fn is_query_or_fragment_byte(byte: u8) -> bool {
    is_path_byte(byte) || byte == b'?'
}

/// Allowed literally in the user-info component. The `:` separating user and
/// password is emitted by the caller, never passed through here.
pub(crate) const fn is_user_info_byte(byte: u8) -> bool {
    is_component_byte(byte)
}

/// Percent-encodes every character of `input` that is not allowed literally.
///
/// Existing `%XX` sequences are preserved. When `keep_letters` is set,
/// non-ASCII alphabetic characters also pass through unencoded (user-info
/// permits them).
pub(crate) fn encode(input: &str, allowed: fn(u8) -> bool, keep_letters: bool) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());

    let mut iter = input.char_indices().peekable();
    while let Some((index, ch)) = iter.next() {
        if ch == '%' && is_pct_encoded(bytes, index) {
            out.push('%');
            continue;
        }

        if ch.is_ascii() {
            let byte = ch as u8;
            if allowed(byte) {
                out.push(ch);
            } else {
                push_pct(&mut out, byte);
            }
            continue;
        }

        if keep_letters && ch.is_alphabetic() {
            out.push(ch);
            continue;
        }

        let mut buf = [0u8; 4];
        for byte in ch.encode_utf8(&mut buf).bytes() {
            push_pct(&mut out, byte);
        }
    }

    out
}

fn is_pct_encoded(bytes: &[u8], index: usize) -> bool {
    matches!(bytes.get(index + 1), Some(b) if b.is_ascii_hexdigit())
        && matches!(bytes.get(index + 2), Some(b) if b.is_ascii_hexdigit())
}

fn push_pct(out: &mut String, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push('%');
    out.push(HEX[(byte >> 4) as usize] as char);
    out.push(HEX[(byte & 0x0F) as usize] as char);
}

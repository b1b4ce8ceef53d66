use percent_encoding::percent_decode_str;

#[inline]
pub(crate) fn is_hex(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

/// Decodes a percent-escaped path segment.
///
/// Unlike [`percent_decode_str`] on its own, a `%` that is not followed by
/// two hex digits is an error, as is a result that is not UTF-8.
pub(crate) fn unescape(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() || !is_hex(bytes[i + 1]) || !is_hex(bytes[i + 2]) {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

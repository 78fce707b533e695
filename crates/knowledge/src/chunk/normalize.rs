//! Whitespace normalization.
//!
//! Line endings become `\n`, runs of horizontal whitespace collapse to one
//! space, spaces next to a line break are dropped and three or more line
//! breaks collapse to a blank line. The output is trimmed.

/// Normalize `raw`. Idempotent.
pub fn normalize(raw: &str) -> String {
    normalize_with_offsets(raw, &[]).0
}

/// Normalize `raw` and map character offsets into the normalized text.
///
/// `offsets` must be ascending character offsets into `raw`. Each maps to
/// the number of normalized characters emitted before that raw position,
/// so an offset inside collapsed whitespace lands before the separator.
pub fn normalize_with_offsets(raw: &str, offsets: &[usize]) -> (String, Vec<usize>) {
    let mut out = String::with_capacity(raw.len());
    let mut out_len = 0usize;
    let mut mapped = Vec::with_capacity(offsets.len());
    let mut next_offset = 0usize;

    let mut pending_newlines = 0usize;
    let mut pending_space = false;

    let mut raw_idx = 0usize;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        while next_offset < offsets.len() && offsets[next_offset] <= raw_idx {
            mapped.push(out_len);
            next_offset += 1;
        }
        raw_idx += 1;

        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                    raw_idx += 1;
                }
                pending_newlines += 1;
            }
            '\n' => pending_newlines += 1,
            c if c.is_whitespace() => pending_space = true,
            c => {
                if out_len > 0 {
                    if pending_newlines >= 2 {
                        out.push_str("\n\n");
                        out_len += 2;
                    } else if pending_newlines == 1 {
                        out.push('\n');
                        out_len += 1;
                    } else if pending_space {
                        out.push(' ');
                        out_len += 1;
                    }
                }
                pending_newlines = 0;
                pending_space = false;

                out.push(c);
                out_len += 1;
            }
        }
    }

    mapped.resize(offsets.len(), out_len);
    (out, mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings() {
        assert_eq!(normalize("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn test_collapse_horizontal_whitespace() {
        assert_eq!(normalize("a  \t b\u{a0}c"), "a b c");
    }

    #[test]
    fn test_paragraph_breaks() {
        assert_eq!(normalize("one\n\n\n\ntwo"), "one\n\ntwo");
        assert_eq!(normalize("one \n \n two"), "one\n\ntwo");
        assert_eq!(normalize("one  \n  two"), "one\ntwo");
    }

    #[test]
    fn test_trim() {
        assert_eq!(normalize("\n\n  hello world \n\n"), "hello world");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn test_idempotent() {
        let raw = "  Title\r\n\r\n\r\nBody   text\n\n more\t\ttext \n";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_offset_mapping() {
        // Pages "first" and "second" joined by a newline; the break sits at
        // the start of the second page.
        let (text, mapped) = normalize_with_offsets("first  page\nsecond", &[12]);
        assert_eq!(text, "first page\nsecond");
        assert_eq!(mapped, vec![10]);
        assert_eq!(&text[11..], "second");
    }

    #[test]
    fn test_offset_past_end() {
        let (text, mapped) = normalize_with_offsets("abc  ", &[2, 5, 99]);
        assert_eq!(text, "abc");
        assert_eq!(mapped, vec![2, 3, 3]);
    }
}

use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Flattens feed-supplied text into a single printable line.
///
/// Feed titles and descriptions are attacker-controlled. Before they reach the
/// terminal this removes ANSI escape sequences (CSI `ESC [ ... final`, OSC
/// `ESC ] ... BEL|ESC \`), bare ESC and every other control character.
/// Line breaks and tabs become single spaces and runs of whitespace collapse.
///
/// Returns `Cow::Borrowed` when the input is already clean.
pub fn sanitize_line(s: &str) -> Cow<'_, str> {
    let clean = !s.chars().any(|c| c.is_control())
        && !s.contains("  ")
        && s.trim().len() == s.len();
    if clean {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        match c {
            '\u{1b}' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    // Parameter and intermediate bytes run until a final byte in 0x40..=0x7e.
                    for n in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&n) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(n) = chars.next() {
                        if n == '\u{07}' {
                            break;
                        }
                        if n == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            c if c.is_whitespace() => pending_space = true,
            c if c.is_control() => {}
            c => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
    }

    Cow::Owned(out)
}

/// Truncates `s` to at most `max_width` terminal columns, ending with `…`
/// when anything was cut.
///
/// Width is measured with `unicode-width`, so CJK and emoji count as two
/// columns.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    let mut out = String::with_capacity(end + ELLIPSIS.len_utf8());
    out.push_str(&s[..end]);
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_borrowed() {
        assert!(matches!(sanitize_line("Тестовый фид"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_newlines_and_runs_collapse() {
        assert_eq!(sanitize_line("  First\n\n  second\tthird  "), "First second third");
    }

    #[test]
    fn test_ansi_sequences_removed() {
        assert_eq!(sanitize_line("\u{1b}[31mred\u{1b}[0m text"), "red text");
        assert_eq!(sanitize_line("a\u{1b}]0;title\u{07}b"), "ab");
        assert_eq!(sanitize_line("a\u{1b}]8;;http://x\u{1b}\\b"), "ab");
        assert_eq!(sanitize_line("bare\u{1b}esc"), "bareesc");
    }

    #[test]
    fn test_other_controls_removed() {
        assert_eq!(sanitize_line("nul\u{0}del\u{7f}bell\u{7}"), "nuldelbell");
    }

    #[test]
    fn test_truncate_fits() {
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("Exact", 5), "Exact");
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_to_width("Hello World", 6), "Hello…");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK character is two columns; the ellipsis takes one.
        assert_eq!(truncate_to_width("你好世界", 6), "你好…");
    }

    #[test]
    fn test_truncate_zero_width() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "…");
    }
}

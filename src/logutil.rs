//! Helpers that keep user-supplied text (item names, regex patterns, replies) on a
//! single log line.

const MAX_PREVIEW: usize = 200;

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///
/// Strings longer than the preview limit are cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// First line of a multi-line reply plus how many lines were left out.
pub fn reply_summary(reply: &str) -> String {
    let mut lines = reply.lines();
    let first = lines.next().unwrap_or("");
    let rest = lines.filter(|l| !l.trim().is_empty()).count();
    if rest == 0 {
        escape_log(first)
    } else {
        format!("{} (+{} lines)", escape_log(first), rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_newlines_and_backslashes() {
        assert_eq!(escape_log("Iron\nOre\\\t"), "Iron\\nOre\\\\\\t");
    }

    #[test]
    fn truncates_long_patterns() {
        let long = "a".repeat(MAX_PREVIEW + 10);
        let esc = escape_log(&long);
        assert!(esc.ends_with('…'));
        assert_eq!(esc.chars().count(), MAX_PREVIEW + 1);
    }

    #[test]
    fn summary_counts_remaining_lines() {
        assert_eq!(reply_summary("one line"), "one line");
        assert_eq!(reply_summary("Type: A\nType: B\n\nhint"), "Type: A (+2 lines)");
    }
}

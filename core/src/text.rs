//! Line and column helpers shared by the parser and the query layer.
//! Columns handed out here are UTF-16 code units; slicing is done on
//! byte indices derived from them.

/// Split on `\n`, dropping a trailing `\r` from each line. Always yields at
/// least one (possibly empty) line.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect()
}

pub fn utf16_len(s: &str) -> u32 {
    s.encode_utf16().count() as u32
}

/// UTF-16 column of byte offset `byte_idx` in `line`.
pub fn utf16_col(line: &str, byte_idx: usize) -> u32 {
    let end = byte_idx.min(line.len());
    line.get(..end).map(utf16_len).unwrap_or_else(|| utf16_len(line))
}

/// Byte offset for a UTF-16 column, clamped to the end of the line. A column
/// that falls inside a surrogate pair rounds down to the char boundary.
pub fn byte_index(line: &str, character: u32) -> usize {
    let mut seen = 0u32;
    for (idx, ch) in line.char_indices() {
        let next = seen + ch.len_utf16() as u32;
        if next > character {
            return idx;
        }
        seen = next;
    }
    line.len()
}

/// Characters that may appear inside a method or variable name.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '?' || c == '!'
}

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Byte range of the word touching `character`. A cursor past the end of the
/// line is clamped onto the last character, so a word ending at the cursor
/// is still found.
pub fn word_range_at(line: &str, character: u32) -> Option<(usize, usize)> {
    if line.is_empty() {
        return None;
    }
    let mut idx = byte_index(line, character);
    if idx >= line.len() {
        idx = line.char_indices().last().map(|(i, _)| i).unwrap_or(0);
    }
    let mut start = idx;
    while let Some(prev) = line[..start].chars().next_back() {
        if !is_word_char(prev) {
            break;
        }
        start -= prev.len_utf8();
    }
    let mut end = idx;
    while let Some(next) = line[end..].chars().next() {
        if !is_word_char(next) {
            break;
        }
        end += next.len_utf8();
    }
    (start < end).then_some((start, end))
}

pub fn word_at(line: &str, character: u32) -> Option<&str> {
    word_range_at(line, character).map(|(s, e)| &line[s..e])
}

/// Byte offsets of whole-word occurrences of `word` in `line`.
pub fn word_occurrences(line: &str, word: &str) -> Vec<usize> {
    let mut out = Vec::new();
    if word.is_empty() {
        return out;
    }
    let mut from = 0;
    while let Some(found) = line[from..].find(word) {
        let start = from + found;
        let end = start + word.len();
        let before_ok = line[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = line[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            out.push(start);
        }
        from = end;
    }
    out
}

/// Copy of `line` with string-literal bodies and the trailing comment
/// blanked to spaces. Byte offsets are preserved; the quotes themselves are
/// kept so literals still read as literals. An unterminated string blanks to
/// end of line.
pub fn mask_non_code(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    blank(&mut out, ch);
                } else if ch == '\\' {
                    escaped = true;
                    blank(&mut out, ch);
                } else if ch == q {
                    quote = None;
                    out.push(ch);
                } else {
                    blank(&mut out, ch);
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '#' => {
                    blank(&mut out, ch);
                    for rest in chars.by_ref() {
                        blank(&mut out, rest);
                    }
                }
                _ => out.push(ch),
            },
        }
    }
    out
}

fn blank(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(' ');
    }
}

/// Split `s` on top-level `sep`, ignoring separators nested in brackets.
/// Each piece is returned with its byte offset in `s`.
pub fn split_top_level(s: &str, sep: char) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth <= 0 => {
                out.push((start, &s[start..idx]));
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    out.push((start, &s[start..]));
    out
}

/// Byte offset of the `)` matching the `(` at `open`, if any.
pub fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, ch) in s[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_at_cursor() {
        assert_eq!(word_at("hello world", 3), Some("hello"));
        assert_eq!(word_at("hello world", 7), Some("world"));
        assert_eq!(word_at("foo.bar", 5), Some("bar"));
        assert_eq!(word_at("x.empty?", 4), Some("empty?"));
        assert_eq!(word_at("", 0), None);
        assert_eq!(word_at("abc", 99), Some("abc"));
        assert_eq!(word_at("  (", 1), None);
    }

    #[test]
    fn whole_word_occurrences_skip_substrings() {
        assert_eq!(word_occurrences("foo food foo_bar foo", "foo"), vec![0, 17]);
        assert_eq!(word_occurrences("a.size size?", "size"), vec![2]);
    }

    #[test]
    fn mask_keeps_offsets() {
        let line = r#"x = "a # b" # tail"#;
        let masked = mask_non_code(line);
        assert_eq!(masked.len(), line.len());
        assert_eq!(masked, r#"x = "     "       "#);
        assert_eq!(mask_non_code("puts \"open"), "puts \"    ");
        assert_eq!(mask_non_code(r#"s = "a\"b""#), r#"s = "    ""#);
    }

    #[test]
    fn utf16_columns_round_trip() {
        let line = "é😀x";
        assert_eq!(utf16_col(line, line.len()), 4);
        assert_eq!(byte_index(line, 3), "é😀".len());
        assert_eq!(byte_index(line, 2), "é".len());
        assert_eq!(byte_index(line, 100), line.len());
    }

    #[test]
    fn top_level_split_respects_nesting() {
        let parts: Vec<&str> = split_top_level("a : Hash(String, Int32), b = [1, 2]", ',')
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(parts, vec!["a : Hash(String, Int32)", " b = [1, 2]"]);
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        assert_eq!(split_lines("a\r\nb\n"), vec!["a", "b", ""]);
    }
}

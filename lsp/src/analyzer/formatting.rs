use tower_lsp::lsp_types::{FormattingOptions, Position, Range, TextEdit};

use crls_core::{blocks, text};
use crls_core::util::fast_map::FastHashMap;

use super::Source;

pub(super) fn indent_unit(options: Option<&FormattingOptions>, indent_width: usize) -> String {
    match options {
        Some(opts) if opts.insert_spaces => " ".repeat(opts.tab_size.clamp(1, 8) as usize),
        Some(_) => "\t".to_string(),
        None => " ".repeat(indent_width.max(1)),
    }
}

/// Fixed levels, not nesting depth: `class`/`module` at column 0, `def` one
/// unit in, `end` aligned with whatever line opened it.
pub(super) fn edits(source: &Source<'_>, unit: &str) -> Vec<TextEdit> {
    let openers: FastHashMap<u32, u32> = blocks::scan(&source.lines)
        .pairs
        .iter()
        .map(|p| (p.end_line, p.start_line))
        .collect();

    let mut formatted: Vec<String> = Vec::with_capacity(source.lines.len());
    for (idx, line) in source.lines.iter().enumerate() {
        let trimmed = line.trim_start();
        let new_line = if starts_with_word(trimmed, "class") || starts_with_word(trimmed, "module") {
            trimmed.trim_end().to_string()
        } else if starts_with_word(trimmed, "def") {
            format!("{unit}{}", trimmed.trim_end())
        } else if is_end_line(trimmed) {
            let indent = openers
                .get(&(idx as u32))
                .and_then(|start| formatted.get(*start as usize))
                .map(|opener| leading_whitespace(opener))
                .unwrap_or_else(|| leading_whitespace(line));
            format!("{indent}{}", trimmed.trim_end())
        } else {
            line.trim_end().to_string()
        };
        formatted.push(new_line);
    }

    let mut out = Vec::new();
    for (idx, (old, new)) in source.lines.iter().zip(formatted).enumerate() {
        if *old == new {
            continue;
        }
        let line_no = idx as u32;
        out.push(TextEdit {
            range: Range::new(Position::new(line_no, 0), Position::new(line_no, text::utf16_len(old))),
            new_text: new,
        });
    }
    out
}

fn starts_with_word(line: &str, word: &str) -> bool {
    line.strip_prefix(word)
        .is_some_and(|rest| rest.starts_with(char::is_whitespace) || (word == "end" && rest.is_empty()))
}

fn is_end_line(trimmed: &str) -> bool {
    starts_with_word(trimmed, "end")
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

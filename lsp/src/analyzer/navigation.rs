use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{DocumentHighlight, DocumentHighlightKind, Location, Position, Range, Url};

use crls_core::structure::{parse_accessor, parse_def_header};
use crls_core::{infer, lang, text};

use super::{line_range, to_lsp_position, Source};

static TYPE_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:abstract\s+)?(?:class|module|struct|enum)\s+([A-Za-z_]\w*)").expect("valid type declaration regex")
});

/// One whole-word occurrence of a symbol, outside strings and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Occurrence {
    pub(crate) range: Range,
    /// Declaration or assignment target.
    pub(crate) is_write: bool,
}

pub(super) fn definition(source: &Source<'_>, uri: &Url, position: Position) -> Vec<Location> {
    let Some(at) = source.word_at(position) else {
        return Vec::new();
    };
    find_definition(source, at.word, position.line)
        .map(|range| vec![Location::new(uri.clone(), range)])
        .unwrap_or_default()
}

/// Class declaration, else the first `def` of that name, else the nearest
/// assignment at or above `from_line`.
fn find_definition(source: &Source<'_>, word: &str, from_line: u32) -> Option<Range> {
    let table = &source.table;

    if let Some(class) = table.class(word) {
        let start = to_lsp_position(class.location);
        let end = Position::new(start.line, start.character + text::utf16_len(word));
        return Some(Range::new(start, end));
    }

    if table.is_method(word) {
        for (idx, line) in source.lines.iter().enumerate() {
            if let Some(header) = parse_def_header(line).filter(|h| h.name == word) {
                let start = header.name_start;
                return Some(line_range(idx as u32, line, start, start + word.len()));
            }
        }
        // Accessor-synthesized methods have no `def` line.
        if let Some(method) = table.all_methods().find(|m| m.name == word) {
            let start = to_lsp_position(method.location);
            let end = Position::new(start.line, start.character + text::utf16_len(word));
            return Some(Range::new(start, end));
        }
    }

    let last = (from_line as usize).min(source.lines.len().saturating_sub(1));
    for idx in (0..=last).rev() {
        let line = source.lines[idx];
        if let Some((start, _)) = infer::assignment_at(line, word) {
            return Some(line_range(idx as u32, line, start, start + word.len()));
        }
    }
    None
}

/// Byte offset of `word` where `line` declares it: a type, a `def` or an
/// accessor.
fn declaration_start(line: &str, word: &str) -> Option<usize> {
    if let Some(name) = TYPE_DECL_RE.captures(line).and_then(|c| c.get(1)) {
        if name.as_str() == word {
            return Some(name.start());
        }
    }
    if let Some(header) = parse_def_header(line) {
        if header.name == word {
            return Some(header.name_start);
        }
    }
    parse_accessor(line).filter(|a| a.name == word).map(|a| a.name_start)
}

pub(crate) fn occurrences(source: &Source<'_>, word: &str) -> Vec<Occurrence> {
    let mut out = Vec::new();
    for (idx, line) in source.lines.iter().enumerate() {
        let masked = text::mask_non_code(line);
        let found = text::word_occurrences(&masked, word);
        if found.is_empty() {
            continue;
        }
        let declared = declaration_start(line, word);
        let assigned = infer::assignment_at(&masked, word).map(|(start, _)| start);
        for start in found {
            out.push(Occurrence {
                range: line_range(idx as u32, line, start, start + word.len()),
                is_write: Some(start) == declared || Some(start) == assigned,
            });
        }
    }
    out
}

pub(super) fn references(source: &Source<'_>, uri: &Url, position: Position, include_declaration: bool) -> Vec<Location> {
    let Some(at) = source.word_at(position) else {
        return Vec::new();
    };
    occurrences(source, at.word)
        .into_iter()
        .filter(|o| include_declaration || !o.is_write)
        .map(|o| Location::new(uri.clone(), o.range))
        .collect()
}

pub(super) fn document_highlights(source: &Source<'_>, position: Position) -> Vec<DocumentHighlight> {
    let Some(at) = source.word_at(position) else {
        return Vec::new();
    };
    let keyword = lang::is_keyword(at.word);
    occurrences(source, at.word)
        .into_iter()
        .map(|o| DocumentHighlight {
            range: o.range,
            kind: Some(if keyword {
                DocumentHighlightKind::TEXT
            } else if o.is_write {
                DocumentHighlightKind::WRITE
            } else {
                DocumentHighlightKind::READ
            }),
        })
        .collect()
}

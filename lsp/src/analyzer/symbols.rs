use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind, Location, SymbolInformation, SymbolKind, Url};

use crls_core::blocks;
use crls_core::structure::parse_def_header;

use super::{full_line_range, Source};

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:abstract\s+)?class\s+([A-Za-z_]\w*)").expect("valid class regex"));

static MODULE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*module\s+([A-Za-z_][\w:]*)").expect("valid module regex"));

fn declared_symbol(line: &str) -> Option<(String, SymbolKind)> {
    if let Some(caps) = CLASS_RE.captures(line) {
        return Some((caps[1].to_string(), SymbolKind::CLASS));
    }
    if let Some(caps) = MODULE_RE.captures(line) {
        return Some((caps[1].to_string(), SymbolKind::MODULE));
    }
    parse_def_header(line).map(|h| (h.name.to_string(), SymbolKind::METHOD))
}

/// Flat list in document order; nesting is not reconstructed.
pub(super) fn document_symbols(source: &Source<'_>, uri: &Url) -> Vec<SymbolInformation> {
    source
        .lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let (name, kind) = declared_symbol(line)?;
            #[allow(deprecated)]
            let symbol = SymbolInformation {
                name,
                kind,
                tags: None,
                deprecated: None,
                location: Location::new(uri.clone(), full_line_range(idx as u32, line)),
                container_name: None,
            };
            Some(symbol)
        })
        .collect()
}

pub(super) fn folding_ranges(source: &Source<'_>) -> Vec<FoldingRange> {
    let mut ranges: Vec<FoldingRange> = blocks::scan(&source.lines)
        .pairs
        .into_iter()
        .filter(|p| p.end_line > p.start_line)
        .map(|p| fold(p.start_line, p.end_line, FoldingRangeKind::Region))
        .collect();

    let mut run_start: Option<usize> = None;
    for idx in 0..=source.lines.len() {
        let is_comment = source.lines.get(idx).is_some_and(|l| l.trim_start().starts_with('#'));
        match (is_comment, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start >= 2 {
                    ranges.push(fold(start as u32, (idx - 1) as u32, FoldingRangeKind::Comment));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    ranges.sort_by_key(|r| (r.start_line, r.end_line));
    ranges
}

fn fold(start_line: u32, end_line: u32, kind: FoldingRangeKind) -> FoldingRange {
    FoldingRange {
        start_line,
        end_line,
        kind: Some(kind),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_by_kind() {
        assert_eq!(declared_symbol("class Foo < Bar"), Some(("Foo".to_string(), SymbolKind::CLASS)));
        assert_eq!(declared_symbol("module Net::Http"), Some(("Net::Http".to_string(), SymbolKind::MODULE)));
        assert_eq!(declared_symbol("  private def self.build(x)"), Some(("build".to_string(), SymbolKind::METHOD)));
        assert_eq!(declared_symbol("  x.class"), None);
    }
}

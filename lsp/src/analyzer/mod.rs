use crls_core::infer::{InferContext, DEFAULT_LOOKBACK_LINES};
use crls_core::{parse, text, SymbolTable};
use tower_lsp::lsp_types::{
    CompletionList, Diagnostic, DocumentHighlight, FoldingRange, FormattingOptions, Hover, Location, Position, Range,
    SignatureHelp, SymbolInformation, TextEdit, Url,
};

mod completions;
mod diagnostics;
mod formatting;
mod hover;
mod navigation;
mod signature;
mod symbols;

// Soft limits to keep the editor responsive on broken files
const MAX_DIAGNOSTICS: usize = 200;

/// Tunables for the analysis engine. Every field has a working default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// How many lines above the cursor the variable lookup scans.
    pub lookback_lines: usize,
    pub max_diagnostics: usize,
    pub undefined_identifiers: bool,
    pub parameter_syntax: bool,
    /// Indentation unit for formatting when the editor sends no options.
    pub indent_width: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            lookback_lines: DEFAULT_LOOKBACK_LINES,
            max_diagnostics: MAX_DIAGNOSTICS,
            undefined_identifiers: true,
            parameter_syntax: true,
            indent_width: 2,
        }
    }
}

/// Read-only view of one document version, as handed over by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub uri: Url,
    pub text: String,
    pub version: i32,
}

impl DocumentSnapshot {
    pub fn new(uri: Url, text: impl Into<String>, version: i32) -> Self {
        Self {
            uri,
            text: text.into(),
            version,
        }
    }
}

/// Heuristic Crystal analyzer. Stateless apart from its options: every call
/// re-parses the snapshot it is given.
#[derive(Debug, Clone, Default)]
pub struct CrystalAnalyzer {
    options: AnalyzerOptions,
}

impl CrystalAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    pub fn analyze(&self, doc: &DocumentSnapshot) -> Vec<Diagnostic> {
        diagnostics::collect(&Source::parse(&doc.text), &self.options)
    }

    pub fn complete(&self, doc: &DocumentSnapshot, position: Position) -> CompletionList {
        completions::complete(&Source::parse(&doc.text), position, &self.options)
    }

    pub fn hover(&self, doc: &DocumentSnapshot, position: Position) -> Option<Hover> {
        hover::hover(&Source::parse(&doc.text), position)
    }

    pub fn signature_help(&self, doc: &DocumentSnapshot, position: Position) -> Option<SignatureHelp> {
        signature::signature_help(&Source::parse(&doc.text), position, &self.options)
    }

    pub fn definition(&self, doc: &DocumentSnapshot, position: Position) -> Vec<Location> {
        navigation::definition(&Source::parse(&doc.text), &doc.uri, position)
    }

    pub fn references(&self, doc: &DocumentSnapshot, position: Position, include_declaration: bool) -> Vec<Location> {
        navigation::references(&Source::parse(&doc.text), &doc.uri, position, include_declaration)
    }

    pub fn document_highlights(&self, doc: &DocumentSnapshot, position: Position) -> Vec<DocumentHighlight> {
        navigation::document_highlights(&Source::parse(&doc.text), position)
    }

    pub fn document_symbols(&self, doc: &DocumentSnapshot) -> Vec<SymbolInformation> {
        symbols::document_symbols(&Source::parse(&doc.text), &doc.uri)
    }

    pub fn folding_ranges(&self, doc: &DocumentSnapshot) -> Vec<FoldingRange> {
        symbols::folding_ranges(&Source::parse(&doc.text))
    }

    /// Line-local cleanup edits. Editor `options` take precedence over the
    /// configured indent width.
    pub fn formatting_edits(&self, doc: &DocumentSnapshot, options: Option<&FormattingOptions>) -> Vec<TextEdit> {
        let unit = formatting::indent_unit(options, self.options.indent_width);
        formatting::edits(&Source::parse(&doc.text), &unit)
    }
}

/// Text plus the symbol table derived from it, alive for one call.
pub(crate) struct Source<'a> {
    pub(crate) text: &'a str,
    pub(crate) lines: Vec<&'a str>,
    pub(crate) table: SymbolTable,
}

/// A word under the cursor with its columns in UTF-16 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WordAt<'a> {
    pub(crate) word: &'a str,
    pub(crate) range: Range,
}

impl<'a> Source<'a> {
    pub(crate) fn parse(text: &'a str) -> Self {
        Self {
            text,
            lines: text::split_lines(text),
            table: parse(text),
        }
    }

    pub(crate) fn line(&self, line: u32) -> Option<&'a str> {
        self.lines.get(line as usize).copied()
    }

    pub(crate) fn word_at(&self, position: Position) -> Option<WordAt<'a>> {
        let line = self.line(position.line)?;
        let (start, end) = text::word_range_at(line, position.character)?;
        Some(WordAt {
            word: &line[start..end],
            range: line_range(position.line, line, start, end),
        })
    }

    pub(crate) fn infer_context(&self, line: u32, lookback: usize) -> InferContext<'_> {
        InferContext {
            table: &self.table,
            lines: &self.lines,
            line: line as usize,
            lookback,
        }
    }
}

/// Range over the byte span `start..end` of `line`.
pub(crate) fn line_range(line_no: u32, line: &str, start: usize, end: usize) -> Range {
    Range::new(
        Position::new(line_no, text::utf16_col(line, start)),
        Position::new(line_no, text::utf16_col(line, end)),
    )
}

/// Range spanning a whole line.
pub(crate) fn full_line_range(line_no: u32, line: &str) -> Range {
    Range::new(Position::new(line_no, 0), Position::new(line_no, text::utf16_len(line)))
}

pub(crate) fn to_lsp_position(pos: crls_core::Position) -> Position {
    Position::new(pos.line, pos.character)
}

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};
use tracing::debug;

use crls_core::structure::{is_valid_parameter, parse_def_header, parse_parameter};
use crls_core::util::fast_map::FastHashSet;
use crls_core::{blocks, lang, text, Token, TokenKind, Tokenizer};

use super::{full_line_range, line_range, AnalyzerOptions, Source};

const SOURCE: &str = "crystal";

static DEFINITION_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:private|protected|abstract)\s+)?(?:class|def|property|getter|setter|module|enum|struct|lib|macro|alias)\s+\S|^\s*end\s*$",
    )
    .expect("valid definition regex")
});

static BLOCK_PARAMS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\bdo|\{)\s*\|([^|]*)\|").expect("valid block parameter regex"));

static FOR_VARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*for\s+([\w\s,]+?)\s+in\b").expect("valid for-loop regex"));

pub(super) fn collect(source: &Source<'_>, options: &AnalyzerOptions) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    check_block_balance(source, &mut out);
    for (idx, line) in source.lines.iter().enumerate() {
        let line_no = idx as u32;
        if has_unclosed_string(line) {
            out.push(diagnostic(
                full_line_range(line_no, line),
                DiagnosticSeverity::ERROR,
                "unclosed-string",
                "Unclosed string literal".to_string(),
            ));
        }
        if options.parameter_syntax {
            check_parameters(line_no, line, &mut out);
        }
    }
    if options.undefined_identifiers {
        check_undefined_identifiers(source, &mut out);
    }

    debug!(count = out.len(), cap = options.max_diagnostics, "diagnostics pass");
    out.truncate(options.max_diagnostics);
    out
}

fn diagnostic(range: Range, severity: DiagnosticSeverity, code: &str, message: String) -> Diagnostic {
    Diagnostic::new(
        range,
        Some(severity),
        Some(NumberOrString::String(code.to_string())),
        Some(SOURCE.to_string()),
        message,
        None,
        None,
    )
}

fn check_block_balance(source: &Source<'_>, out: &mut Vec<Diagnostic>) {
    let scan = blocks::scan(&source.lines);
    for line_no in scan.unexpected_ends {
        let line = source.line(line_no).unwrap_or_default();
        out.push(diagnostic(
            full_line_range(line_no, line),
            DiagnosticSeverity::ERROR,
            "unexpected-end",
            "Unexpected 'end' keyword - no matching opening statement".to_string(),
        ));
    }
    for open in scan.unclosed {
        let line = source.line(open.line).unwrap_or_default();
        out.push(diagnostic(
            full_line_range(open.line, line),
            DiagnosticSeverity::ERROR,
            "unclosed-block",
            format!("Unclosed '{}' statement - missing 'end'", open.keyword),
        ));
    }
}

/// Whether a double-quoted string is still open at end of line. Escapes are
/// honored, single-quoted literals are skipped and a `#` outside any literal
/// ends the scan.
pub(crate) fn has_unclosed_string(line: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                if ch == '\\' {
                    chars.next();
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '#' => break,
                _ => {}
            },
        }
    }
    quote == Some('"')
}

fn check_parameters(line_no: u32, line: &str, out: &mut Vec<Diagnostic>) {
    let Some(header) = parse_def_header(line) else {
        return;
    };
    for (idx, param) in header.params.iter().enumerate() {
        if is_valid_parameter(param.text) {
            continue;
        }
        out.push(diagnostic(
            line_range(line_no, line, param.start, param.start + param.text.len()),
            DiagnosticSeverity::WARNING,
            "invalid-parameter",
            format!("Invalid parameter syntax: {} (parameter {})", param.text, idx + 1),
        ));
    }
}

fn check_undefined_identifiers(source: &Source<'_>, out: &mut Vec<Diagnostic>) {
    let known = declared_names(source);
    let tokens = Tokenizer::tokenize(source.text);

    for (idx, token) in tokens.iter().enumerate() {
        if !matches!(token.kind, TokenKind::Identifier | TokenKind::Constant) {
            continue;
        }
        let Some(line) = source.line(token.position.line) else {
            continue;
        };
        if DEFINITION_LINE_RE.is_match(line) || is_member_or_call(line, token, tokens.get(idx + 1)) {
            continue;
        }
        let name = token.value.as_str();
        if lang::is_builtin_type(name) || known.contains(name) {
            continue;
        }
        let table = &source.table;
        if table.is_class(name) || table.variable(name).is_some() || table.is_method(name) {
            continue;
        }
        out.push(diagnostic(
            Range::new(
                Position::new(token.position.line, token.position.character),
                Position::new(token.position.line, token.end_character()),
            ),
            DiagnosticSeverity::WARNING,
            "undefined-identifier",
            format!("Undefined variable or method: {name}"),
        ));
    }
}

/// Member access (`x.name`), instance and global variables, symbols-as-keys
/// (`name: 1`) and calls (`name(`) are not variable reads.
fn is_member_or_call(line: &str, token: &Token, next: Option<&Token>) -> bool {
    let start = text::byte_index(line, token.position.character);
    if matches!(line[..start].chars().next_back(), Some('.' | '@' | '$' | ':')) {
        return true;
    }
    let end = text::byte_index(line, token.end_character());
    if line[end..].starts_with(':') && !line[end..].starts_with("::") {
        return true;
    }
    next.is_some_and(|n| n.position.line == token.position.line && n.is_operator("("))
}

/// Names introduced anywhere in the document: assignment targets, method
/// parameters, block parameters and `for` loop variables.
fn declared_names(source: &Source<'_>) -> FastHashSet<String> {
    let mut names = FastHashSet::default();
    for line in &source.lines {
        let masked = text::mask_non_code(line);

        if let Some(header) = parse_def_header(line) {
            for raw in &header.params {
                names.insert(parse_parameter(raw.text).name);
            }
        }
        if let Some(caps) = BLOCK_PARAMS_RE.captures(&masked) {
            if let Some(params) = caps.get(1) {
                names.extend(split_names(params.as_str()));
            }
        }
        if let Some(caps) = FOR_VARS_RE.captures(&masked) {
            if let Some(vars) = caps.get(1) {
                names.extend(split_names(vars.as_str()));
            }
        }
        names.extend(assignment_targets(&masked));
    }
    names
}

fn split_names(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(|p| p.trim().trim_start_matches(['*', '&', '(']).trim_end_matches(')'))
        .filter(|p| p.starts_with(text::is_ident_start))
        .map(str::to_string)
}

/// Left-hand names of `=`, `+=`, `||=` and multiple assignment.
fn assignment_targets(masked: &str) -> Vec<String> {
    let bytes = masked.as_bytes();
    let mut targets = Vec::new();
    for (idx, _) in masked.match_indices('=') {
        let prev = idx.checked_sub(1).map(|i| bytes[i]);
        let next = bytes.get(idx + 1).copied();
        if matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) || matches!(next, Some(b'=' | b'~' | b'>')) {
            continue;
        }
        let lhs = masked[..idx].trim_end_matches(['+', '-', '*', '/', '|', '&']);
        let lhs = lhs.rsplit([';', '(']).next().unwrap_or(lhs);
        for part in lhs.split(',') {
            let part = part.trim();
            let name_start = part
                .char_indices()
                .rev()
                .take_while(|(_, c)| text::is_word_char(*c))
                .last()
                .map(|(i, _)| i);
            let Some(start) = name_start else {
                continue;
            };
            let before = part[..start].chars().next_back();
            let name = &part[start..];
            if name.starts_with(text::is_ident_start) && !matches!(before, Some('.' | '@' | '$')) {
                targets.push(name.to_string());
            }
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_scan() {
        assert!(has_unclosed_string("puts \"unclosed"));
        assert!(!has_unclosed_string("puts \"closed\""));
        assert!(!has_unclosed_string("puts \"esc \\\" still\""));
        assert!(!has_unclosed_string("x = 1 # don't \" count"));
        assert!(!has_unclosed_string("c = '\"'"));
        assert!(has_unclosed_string("s = \"a\" + \"b"));
    }

    #[test]
    fn assignment_targets_cover_compound_forms() {
        assert_eq!(assignment_targets("x = 1"), vec!["x"]);
        assert_eq!(assignment_targets("count += 1"), vec!["count"]);
        assert_eq!(assignment_targets("cache ||= {}"), vec!["cache"]);
        assert_eq!(assignment_targets("a, b = 1, 2"), vec!["a", "b"]);
        assert!(assignment_targets("if a == b").is_empty());
        assert!(assignment_targets("obj.value = 3").is_empty());
        assert!(assignment_targets("@ivar = 3").is_empty());
        assert!(assignment_targets("x >= y").is_empty());
    }

    #[test]
    fn names_in_blocks_and_loops() {
        let names: Vec<String> = split_names(" a, *rest, &blk ").collect();
        assert_eq!(names, vec!["a", "rest", "blk"]);
        let masked = text::mask_non_code("items.each do |item, idx|");
        let caps = BLOCK_PARAMS_RE.captures(&masked).expect("block params");
        assert_eq!(&caps[1], "item, idx");
        let caps = FOR_VARS_RE.captures("for k, v in pairs").expect("for vars");
        assert_eq!(&caps[1], "k, v");
    }
}

//! Best-effort type inference from expression text.
//!
//! Inference is an ordered list of rules; the first rule that produces a
//! type wins. Literal rules need nothing but the text. Contextual rules
//! consult the symbol table and a bounded window of preceding lines. None of
//! this is lexically scoped: the most recent textual assignment at or before
//! the query line wins, wherever it is.


use once_cell::sync::Lazy;
use regex::Regex;

use crate::lang;
use crate::structure::SymbolTable;
use crate::text;

/// Default backward-scan window for variable lookup.
pub const DEFAULT_LOOKBACK_LINES: usize = 100;

static CONSTRUCTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)\.new\b").expect("valid constructor regex"));

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d[\d_]*(\.\d[\d_]*)?(?:_?([iuf](?:8|16|32|64|128)))?$").expect("valid number regex")
});

static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:[A-Za-z_]\w*[?!]?$").expect("valid symbol regex"));

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*[?!]?$").expect("valid identifier regex"));

/// What the contextual rules may consult.
#[derive(Debug, Clone, Copy)]
pub struct InferContext<'a> {
    pub table: &'a SymbolTable,
    pub lines: &'a [&'a str],
    /// Zero-based line of the query; the backward scan starts here.
    pub line: usize,
    pub lookback: usize,
}

type RuleFn = fn(&str, Option<&InferContext<'_>>) -> Option<String>;

/// Evaluated top to bottom, first match wins.
const RULES: &[(&str, RuleFn)] = &[
    ("string", string_literal),
    ("collection", collection_literal),
    ("bool", bool_literal),
    ("nil", nil_literal),
    ("symbol", symbol_literal),
    ("number", number_literal),
    ("constructor", constructor_call),
    ("class", known_class),
    ("variable", known_variable),
    ("member", member_return_type),
];

/// Type of the right-hand side of an assignment, using only the rules that
/// need no context.
pub fn infer_assignment_type(expr: &str) -> String {
    apply_rules(expr.trim(), None).unwrap_or_else(|| lang::DEFAULT_TYPE.to_string())
}

/// Type of `expr` evaluated at `ctx.line`.
pub fn infer_expression_type(expr: &str, ctx: &InferContext<'_>) -> String {
    apply_rules(expr.trim(), Some(ctx)).unwrap_or_else(|| lang::DEFAULT_TYPE.to_string())
}

/// Name of the first rule that matches `expr`, for diagnostics and tests.
pub fn matching_rule(expr: &str, ctx: Option<&InferContext<'_>>) -> Option<&'static str> {
    let expr = expr.trim();
    RULES.iter().find(|(_, rule)| rule(expr, ctx).is_some()).map(|(name, _)| *name)
}

fn apply_rules(expr: &str, ctx: Option<&InferContext<'_>>) -> Option<String> {
    if expr.is_empty() {
        return None;
    }
    RULES.iter().find_map(|(_, rule)| rule(expr, ctx))
}

/// Type of variable `name` as seen from `ctx.line`: the nearest assignment
/// within the lookback window, else the symbol table entry. `None` means the
/// variable is unknown.
pub fn find_variable_type(name: &str, ctx: &InferContext<'_>) -> Option<String> {
    if !ctx.lines.is_empty() {
        let from = ctx.line.min(ctx.lines.len() - 1);
        let to = from.saturating_sub(ctx.lookback);
        for idx in (to..=from).rev() {
            if let Some(expr) = assignment_rhs(ctx.lines[idx], name) {
                return Some(infer_assignment_type(expr));
            }
        }
    }
    ctx.table.variable(name).map(|v| v.type_name.clone())
}

/// Right-hand side of the first `name = ...` assignment on `line`. Member
/// writes (`obj.name =`), instance variables and comparisons are not
/// assignments to `name`.
pub fn assignment_rhs<'l>(line: &'l str, name: &str) -> Option<&'l str> {
    assignment_at(line, name).map(|(_, rhs)| rhs)
}

/// Byte offset of the assigned `name` and the right-hand side, for the first
/// assignment to `name` on `line`.
pub fn assignment_at<'l>(line: &'l str, name: &str) -> Option<(usize, &'l str)> {
    for start in text::word_occurrences(line, name) {
        if let Some(prev) = line[..start].chars().next_back() {
            if matches!(prev, '.' | '@' | '$' | ':') {
                continue;
            }
        }
        let rest = line[start + name.len()..].trim_start();
        let Some(after) = rest.strip_prefix('=') else {
            continue;
        };
        if after.starts_with(['=', '~', '>']) {
            continue;
        }
        return Some((start, after.trim()));
    }
    None
}

/// Trailing receiver of the text before a member-access dot: an identifier
/// chain, instance variable, or a bracketed or quoted literal.
pub fn receiver_expression(before_dot: &str) -> &str {
    let s = before_dot.trim_end();
    let mut start = s.len();
    while let Some(c) = s[..start].chars().next_back() {
        if text::is_word_char(c) || c == '.' || c == '@' {
            start -= c.len_utf8();
        } else if matches!(c, ')' | ']' | '}') {
            match matching_open(&s[..start]) {
                Some(open) => start = open,
                None => break,
            }
        } else if (c == '"' || c == '\'') && start == s.len() {
            match s[..start - 1].rfind(c) {
                Some(open) => start = open,
                None => break,
            }
        } else {
            break;
        }
    }
    s[start..].trim_start_matches('.')
}

/// Byte offset of the opener matching the closer that ends `s`.
fn matching_open(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, c) in s.char_indices().rev() {
        match c {
            ')' | ']' | '}' => depth += 1,
            '(' | '[' | '{' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split `recv.member(args)` at its last top-level dot into the receiver
/// and the bare member name.
fn split_member(expr: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    let mut dot = None;
    for (idx, c) in expr.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '.' if depth == 0 => dot = Some(idx),
            _ => {}
        }
    }
    let dot = dot?;
    let receiver = expr[..dot].trim();
    let member = expr[dot + 1..].trim();
    let name_end = member.find(|c: char| !text::is_word_char(c)).unwrap_or(member.len());
    let member = &member[..name_end];
    if receiver.is_empty() || !IDENT_RE.is_match(member) {
        return None;
    }
    Some((receiver, member))
}

fn string_literal(expr: &str, _: Option<&InferContext<'_>>) -> Option<String> {
    let quoted = expr.len() >= 2
        && ((expr.starts_with('"') && expr.ends_with('"')) || (expr.starts_with('\'') && expr.ends_with('\'')));
    quoted.then(|| "String".to_string())
}

fn collection_literal(expr: &str, _: Option<&InferContext<'_>>) -> Option<String> {
    if expr.starts_with('[') && expr.ends_with(']') {
        Some("Array".to_string())
    } else if expr.starts_with('{') && expr.ends_with('}') {
        Some("Hash".to_string())
    } else {
        None
    }
}

fn bool_literal(expr: &str, _: Option<&InferContext<'_>>) -> Option<String> {
    matches!(expr, "true" | "false").then(|| "Bool".to_string())
}

fn nil_literal(expr: &str, _: Option<&InferContext<'_>>) -> Option<String> {
    (expr == "nil").then(|| "Nil".to_string())
}

fn symbol_literal(expr: &str, _: Option<&InferContext<'_>>) -> Option<String> {
    SYMBOL_RE.is_match(expr).then(|| "Symbol".to_string())
}

fn number_literal(expr: &str, _: Option<&InferContext<'_>>) -> Option<String> {
    let caps = NUMBER_RE.captures(expr)?;
    if let Some(suffix) = caps.get(2) {
        let s = suffix.as_str();
        let (kind, bits) = s.split_at(1);
        let name = match kind {
            "i" => format!("Int{bits}"),
            "u" => format!("UInt{bits}"),
            _ => format!("Float{bits}"),
        };
        return Some(name);
    }
    if caps.get(1).is_some() {
        Some("Float64".to_string())
    } else {
        Some("Int32".to_string())
    }
}

fn constructor_call(expr: &str, _: Option<&InferContext<'_>>) -> Option<String> {
    match split_member(expr) {
        Some((receiver, "new")) => IDENT_RE.is_match(receiver).then(|| receiver.to_string()),
        Some(_) => None,
        None => CONSTRUCTOR_RE.captures(expr).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()),
    }
}

fn known_class(expr: &str, ctx: Option<&InferContext<'_>>) -> Option<String> {
    let ctx = ctx?;
    ctx.table.is_class(expr).then(|| expr.to_string())
}

fn known_variable(expr: &str, ctx: Option<&InferContext<'_>>) -> Option<String> {
    let ctx = ctx?;
    if !IDENT_RE.is_match(expr) {
        return None;
    }
    find_variable_type(expr, ctx)
}

fn member_return_type(expr: &str, ctx: Option<&InferContext<'_>>) -> Option<String> {
    let ctx = ctx?;
    let (receiver, member) = split_member(expr)?;
    let receiver_type = infer_expression_type(receiver, ctx);

    if let Some(method) = ctx.table.find_method(&receiver_type, member) {
        return (method.return_type != lang::DEFAULT_RETURN_TYPE).then(|| method.return_type.clone());
    }

    let builtin = lang::builtin_methods(&receiver_type).find(|m| m.name == member)?;
    let (_, declared) = builtin.signature.rsplit_once(" : ")?;
    match declared {
        "self" => Some(receiver_type),
        t if lang::is_builtin_type(t) => Some(t.to_string()),
        _ => None,
    }
}

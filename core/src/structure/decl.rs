//! Line-level recognizers for declarations: `def` headers, parameter lists
//! and accessor macros. Shared by the structural parser and the parameter
//! syntax check.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{lang, text};

use super::{ParameterInfo, Visibility};

static DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(private|protected)\s+)?def\s+(self\.)?([A-Za-z_]\w*[?!=]?)").expect("valid def regex")
});

static RETURN_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*:\s*([A-Za-z_][\w:]*(?:\([^)]*\))?\??)").expect("valid return type regex")
});

static ACCESSOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(property|getter|setter)\s+([A-Za-z_]\w*)(?:\s*:\s*([A-Za-z_][\w:]*(?:\([^)]*\))?\??))?")
        .expect("valid accessor regex")
});

static PARAM_SYNTAX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:@|\*{1,2}|&)?\w+(?:\s*:\s*[\w:]+(?:\[\w+\]|\([\w:,\s]*\))?\??)?(?:\s*=\s*.+)?$")
        .expect("valid parameter regex")
});

/// One comma-separated entry of a parameter list, trimmed, with the byte
/// offset of its first character in the source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawParam<'a> {
    pub text: &'a str,
    pub start: usize,
}

/// A recognized `def` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefHeader<'a> {
    pub visibility: Visibility,
    pub is_static: bool,
    pub name: &'a str,
    /// Byte offset of the method name in the line.
    pub name_start: usize,
    pub has_parens: bool,
    pub params: Vec<RawParam<'a>>,
    pub return_type: Option<&'a str>,
}

pub fn parse_def_header(line: &str) -> Option<DefHeader<'_>> {
    let caps = DEF_RE.captures(line)?;
    let visibility = match caps.get(1).map(|m| m.as_str()) {
        Some("private") => Visibility::Private,
        Some("protected") => Visibility::Protected,
        _ => Visibility::Public,
    };
    let name_match = caps.get(3)?;
    let name_end = name_match.end();

    let mut params = Vec::new();
    let mut has_parens = false;
    let mut tail_start = name_end;
    if line[name_end..].starts_with('(') {
        has_parens = true;
        // An unclosed list runs to end of line.
        let close = text::matching_paren(line, name_end).unwrap_or(line.len());
        let inner_start = name_end + 1;
        let inner = &line[inner_start..close.max(inner_start)];
        for (offset, piece) in text::split_top_level(inner, ',') {
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                continue;
            }
            let lead = piece.len() - piece.trim_start().len();
            params.push(RawParam {
                text: trimmed,
                start: inner_start + offset + lead,
            });
        }
        tail_start = (close + 1).min(line.len());
    }

    let return_type = RETURN_TYPE_RE
        .captures(&line[tail_start..])
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());

    Some(DefHeader {
        visibility,
        is_static: caps.get(2).is_some(),
        name: name_match.as_str(),
        name_start: name_match.start(),
        has_parens,
        params,
        return_type,
    })
}

/// Split one parameter into name, type and default. Never fails: anything
/// unrecognized keeps the generic type.
pub fn parse_parameter(raw: &str) -> ParameterInfo {
    let raw = raw.trim();
    // A `:` only introduces a type when it comes before any `=`.
    let (name_part, type_name, default) = match (raw.find(':'), raw.find('=')) {
        (Some(c), e) if e.map_or(true, |e| c < e) => {
            let rest = &raw[c + 1..];
            match rest.split_once('=') {
                Some((ty, default)) => (&raw[..c], ty.trim(), Some(default)),
                None => (&raw[..c], rest.trim(), None),
            }
        }
        (_, Some(e)) => (&raw[..e], "", Some(&raw[e + 1..])),
        _ => (raw, "", None),
    };

    let name = name_part.trim().trim_start_matches(['@', '*', '&']).to_string();
    let default_value = default.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string);
    let type_name = if type_name.is_empty() {
        lang::DEFAULT_TYPE.to_string()
    } else {
        type_name.to_string()
    };

    ParameterInfo {
        name,
        is_optional: default_value.is_some(),
        type_name,
        default_value,
    }
}

/// Whether a parameter matches the accepted grammar: optional `@`, splat or
/// block marker, a name, an optional `: Type` (generic or array suffix, `?`
/// allowed) and an optional `= default`.
pub fn is_valid_parameter(raw: &str) -> bool {
    PARAM_SYNTAX_RE.is_match(raw.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Property,
    Getter,
    Setter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorDecl<'a> {
    pub kind: AccessorKind,
    pub name: &'a str,
    pub name_start: usize,
    pub type_name: Option<&'a str>,
}

pub fn parse_accessor(line: &str) -> Option<AccessorDecl<'_>> {
    let caps = ACCESSOR_RE.captures(line)?;
    let kind = match caps.get(1)?.as_str() {
        "property" => AccessorKind::Property,
        "getter" => AccessorKind::Getter,
        _ => AccessorKind::Setter,
    };
    let name = caps.get(2)?;
    Some(AccessorDecl {
        kind,
        name: name.as_str(),
        name_start: name.start(),
        type_name: caps.get(3).map(|m| m.as_str()),
    })
}

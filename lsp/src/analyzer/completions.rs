use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, CompletionList, Documentation, Position};

use crls_core::structure::{method_signature, MethodInfo};
use crls_core::{infer, lang, text};

use super::{AnalyzerOptions, Source};

/// What the text before the cursor asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompletionContext<'a> {
    /// `receiver.partial` with the receiver text and the partial member name.
    Member { receiver: &'a str, partial: &'a str },
    /// Anything else, with the identifier run being typed.
    General { partial: &'a str },
}

pub(crate) fn completion_context(prefix: &str) -> CompletionContext<'_> {
    if let Some(dot) = prefix.rfind('.') {
        let partial = &prefix[dot + 1..];
        let receiver = infer::receiver_expression(&prefix[..dot]);
        if partial.chars().all(text::is_word_char) && !receiver.is_empty() {
            return CompletionContext::Member { receiver, partial };
        }
    }
    let start = prefix
        .char_indices()
        .rev()
        .take_while(|(_, c)| text::is_word_char(*c))
        .last()
        .map_or(prefix.len(), |(i, _)| i);
    CompletionContext::General {
        partial: &prefix[start..],
    }
}

pub(super) fn complete(source: &Source<'_>, position: Position, options: &AnalyzerOptions) -> CompletionList {
    let Some(line) = source.line(position.line) else {
        return CompletionList {
            is_incomplete: false,
            items: Vec::new(),
        };
    };
    let prefix = &line[..text::byte_index(line, position.character)];

    let items = match completion_context(prefix) {
        CompletionContext::Member { receiver, partial } => {
            member_items(source, position.line, receiver, partial, options.lookback_lines)
        }
        CompletionContext::General { partial } => general_items(source, partial),
    };

    CompletionList {
        is_incomplete: false,
        items,
    }
}

fn matches_prefix(label: &str, partial: &str) -> bool {
    partial.is_empty() || label.to_lowercase().starts_with(&partial.to_lowercase())
}

fn method_item(name: &str, signature: &str, doc: &str) -> CompletionItem {
    CompletionItem {
        label: name.to_string(),
        kind: Some(CompletionItemKind::METHOD),
        detail: Some(signature.to_string()),
        documentation: Some(Documentation::String(doc.to_string())),
        ..Default::default()
    }
}

fn member_items(source: &Source<'_>, line: u32, receiver: &str, partial: &str, lookback: usize) -> Vec<CompletionItem> {
    let table = &source.table;
    let is_static = table.is_class(receiver);
    let type_name = infer::infer_expression_type(receiver, &source.infer_context(line, lookback));

    let mut items: Vec<CompletionItem> = Vec::new();
    let locals = table.members(&type_name, is_static);
    for method in &locals {
        items.push(method_item(&method.name, &method.signature, &method.documentation));
    }

    if is_static {
        if !locals.iter().any(|m| m.name == "new") {
            let (signature, doc) = constructor_signature(table.find_method(&type_name, lang::INITIALIZER_NAME), &type_name);
            items.push(method_item("new", &signature, &doc));
        }
    } else {
        for builtin in lang::builtin_methods(&type_name) {
            if !items.iter().any(|i| i.label == builtin.name) {
                items.push(method_item(builtin.name, builtin.signature, builtin.doc));
            }
        }
    }

    items.retain(|i| matches_prefix(&i.label, partial));
    items
}

/// `new` mirrors the parameters of `initialize` and returns the class.
pub(crate) fn constructor_signature(init: Option<&MethodInfo>, class_name: &str) -> (String, String) {
    let params = init.map(|m| m.parameters.as_slice()).unwrap_or_default();
    let signature = method_signature("new", params, class_name);
    (signature, format!("Creates a new {class_name}"))
}

fn general_items(source: &Source<'_>, partial: &str) -> Vec<CompletionItem> {
    let mut items = Vec::new();

    for keyword in lang::KEYWORDS.iter().filter(|k| matches_prefix(k, partial)) {
        items.push(CompletionItem {
            label: keyword.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            ..Default::default()
        });
    }

    for ty in lang::BUILTIN_TYPES.iter().filter(|t| matches_prefix(t, partial)) {
        items.push(CompletionItem {
            label: ty.to_string(),
            kind: Some(CompletionItemKind::CLASS),
            detail: Some("Built-in type".to_string()),
            ..Default::default()
        });
    }

    for name in source.table.class_names().into_iter().filter(|c| matches_prefix(c, partial)) {
        items.push(CompletionItem {
            label: name.to_string(),
            kind: Some(CompletionItemKind::CLASS),
            detail: Some("Local class".to_string()),
            ..Default::default()
        });
    }

    let mut variables: Vec<_> = source
        .table
        .variables
        .values()
        .filter(|v| matches_prefix(&v.name, partial))
        .collect();
    variables.sort_by(|a, b| a.name.cmp(&b.name));
    for var in variables {
        items.push(CompletionItem {
            label: var.name.clone(),
            kind: Some(CompletionItemKind::VARIABLE),
            detail: Some(var.type_name.clone()),
            ..Default::default()
        });
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_context_after_dot() {
        assert_eq!(
            completion_context("  x.up"),
            CompletionContext::Member {
                receiver: "x",
                partial: "up"
            }
        );
        assert_eq!(
            completion_context("puts foo.bar."),
            CompletionContext::Member {
                receiver: "foo.bar",
                partial: ""
            }
        );
    }

    #[test]
    fn general_context_uses_trailing_identifier() {
        assert_eq!(completion_context("  pri"), CompletionContext::General { partial: "pri" });
        assert_eq!(completion_context("call(ar"), CompletionContext::General { partial: "ar" });
        assert_eq!(completion_context(""), CompletionContext::General { partial: "" });
        // A dot followed by non-word text is not member access.
        assert_eq!(completion_context("x.y + z"), CompletionContext::General { partial: "z" });
    }

    #[test]
    fn prefix_matching_ignores_case() {
        assert!(matches_prefix("String", "str"));
        assert!(matches_prefix("anything", ""));
        assert!(!matches_prefix("Int32", "s"));
    }
}

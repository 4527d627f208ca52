use tower_lsp::lsp_types::{Hover, HoverContents, MarkedString, Position};

use crls_core::lang;

use super::Source;

pub(super) fn hover(source: &Source<'_>, position: Position) -> Option<Hover> {
    let at = source.word_at(position)?;
    let text = describe(source, at.word)?;
    Some(Hover {
        contents: HoverContents::Array(vec![MarkedString::String(text)]),
        range: Some(at.range),
    })
}

/// Local classes shadow keywords and built-in types of the same name.
fn describe(source: &Source<'_>, word: &str) -> Option<String> {
    if let Some(class) = source.table.class(word) {
        let methods = class.method_names().join(", ");
        return Some(format!("**{word}** - Local class\n\nMethods: {methods}"));
    }
    if lang::is_keyword(word) {
        return Some(format!("**{word}** - Crystal keyword"));
    }
    if lang::is_builtin_type(word) {
        return Some(format!("**{word}** - Built-in Crystal type"));
    }
    None
}

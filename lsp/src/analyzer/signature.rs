use tower_lsp::lsp_types::{
    Documentation, ParameterInformation, ParameterLabel, Position, SignatureHelp, SignatureInformation,
};

use crls_core::structure::{MethodInfo, ParameterInfo};
use crls_core::{infer, lang, text};

use super::completions::constructor_signature;
use super::{AnalyzerOptions, Source};

/// Words that take a parenthesized condition rather than arguments.
const CONTROL_WORDS: &[&str] = &["elsif", "until", "when", "return", "while", "if", "unless", "case"];

pub(crate) fn sig(label: &str, params: &[&str], doc: &str) -> SignatureInformation {
    sig_owned(label.to_string(), params.iter().map(|p| (*p).to_string()).collect(), doc)
}

pub(crate) fn sig_owned(label: String, params: Vec<String>, doc: &str) -> SignatureInformation {
    SignatureInformation {
        label,
        documentation: Some(Documentation::String(doc.to_string())),
        parameters: Some(
            params
                .into_iter()
                .map(|p| ParameterInformation {
                    label: ParameterLabel::Simple(p),
                    documentation: None,
                })
                .collect(),
        ),
        active_parameter: None,
    }
}

/// The innermost call still open at the end of `prefix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OpenCall<'a> {
    pub(crate) name: &'a str,
    /// Receiver text before `.name(`, if any.
    pub(crate) receiver: Option<&'a str>,
    /// Zero-based index of the argument under the cursor.
    pub(crate) active_parameter: usize,
}

pub(crate) fn find_open_call(prefix: &str) -> Option<OpenCall<'_>> {
    let masked = text::mask_non_code(prefix);
    let mut depth = 0i32;
    let mut open = None;
    for (idx, c) in masked.char_indices().rev() {
        match c {
            ')' | ']' | '}' => depth += 1,
            '(' | '[' | '{' if depth > 0 => depth -= 1,
            '(' => {
                open = Some(idx);
                break;
            }
            '[' | '{' => return None,
            _ => {}
        }
    }
    let open = open?;

    let head = masked[..open].trim_end();
    let name_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| text::is_word_char(*c))
        .last()
        .map(|(i, _)| i)?;
    let name = &prefix[name_start..head.len()];
    if !name.starts_with(text::is_ident_start) || CONTROL_WORDS.contains(&name) {
        return None;
    }

    let receiver = prefix[..name_start]
        .strip_suffix('.')
        .map(infer::receiver_expression)
        .filter(|r| !r.is_empty());
    let args = &masked[open + 1..];
    let active_parameter = text::split_top_level(args, ',').len() - 1;

    Some(OpenCall {
        name,
        receiver,
        active_parameter,
    })
}

pub(super) fn signature_help(source: &Source<'_>, position: Position, options: &AnalyzerOptions) -> Option<SignatureHelp> {
    let line = source.line(position.line)?;
    let prefix = &line[..text::byte_index(line, position.character)];
    let call = find_open_call(prefix)?;

    let info = resolve(source, &call, position.line, options.lookback_lines)
        .unwrap_or_else(|| sig(&format!("{}(args)", call.name), &[], &format!("Method call: {}", call.name)));

    Some(SignatureHelp {
        signatures: vec![info],
        active_signature: Some(0),
        active_parameter: Some(call.active_parameter as u32),
    })
}

fn param_labels(params: &[ParameterInfo]) -> Vec<String> {
    params
        .iter()
        .map(|p| match &p.default_value {
            Some(default) => format!("{} : {} = {}", p.name, p.type_name, default),
            None => format!("{} : {}", p.name, p.type_name),
        })
        .collect()
}

fn method_sig(method: &MethodInfo) -> SignatureInformation {
    sig_owned(method.signature.clone(), param_labels(&method.parameters), &method.documentation)
}

/// Receiver type first, then any local class, then top-level defs.
fn resolve(source: &Source<'_>, call: &OpenCall<'_>, line: u32, lookback: usize) -> Option<SignatureInformation> {
    let table = &source.table;

    if let Some(receiver) = call.receiver {
        if call.name == "new" && table.is_class(receiver) {
            let init = table.find_method(receiver, lang::INITIALIZER_NAME);
            let (label, doc) = constructor_signature(init, receiver);
            let params = init.map(|m| param_labels(&m.parameters)).unwrap_or_default();
            return Some(sig_owned(label, params, &doc));
        }
        let type_name = infer::infer_expression_type(receiver, &source.infer_context(line, lookback));
        if let Some(method) = table.find_method(&type_name, call.name) {
            return Some(method_sig(method));
        }
        if let Some(builtin) = lang::builtin_methods(&type_name).find(|m| m.name == call.name) {
            return Some(sig(builtin.signature, &[], builtin.doc));
        }
    }

    for class_name in table.class_names() {
        if let Some(method) = table.class(class_name).and_then(|c| c.methods.get(call.name)) {
            return Some(method_sig(method));
        }
    }

    table
        .top_level_methods
        .iter()
        .rev()
        .find(|m| m.name == call.name)
        .map(method_sig)
}

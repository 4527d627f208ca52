use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::token::Position;
use crate::{infer, lang, text};

use super::{
    decl::{parse_accessor, parse_def_header, parse_parameter, AccessorKind, DefHeader},
    ClassInfo, MethodInfo, ParameterInfo, PropertyInfo, SymbolTable, VariableInfo, VariableScope, Visibility,
};

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:abstract\s+)?class\s+(\w+)(?:\s*<\s*(\w+))?").expect("valid class regex"));

static ASSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)\s*=([^=~>].*)$").expect("valid assignment regex"));

/// Line prefixes that open a block inside a class body, for deciding whether
/// a bare `end` closes the class itself.
const INNER_BLOCK_PREFIXES: &[&str] = &[
    "def ",
    "private def ",
    "protected def ",
    "if ",
    "unless ",
    "case ",
    "while ",
    "for ",
];

/// Build the symbol table for `source`. Pure and deterministic.
pub fn parse(source: &str) -> SymbolTable {
    let mut table = SymbolTable::default();
    let mut current: Option<String> = None;
    // Inner block balance for lines after the current class header.
    let mut inner_depth: i32 = 0;

    for (idx, line) in text::split_lines(source).into_iter().enumerate() {
        let line_no = idx as u32;

        if let Some(caps) = CLASS_RE.captures(line) {
            if let Some(name) = caps.get(1) {
                let location = Position::new(line_no, text::utf16_col(line, name.start()));
                let superclass = caps.get(2).map(|m| m.as_str());
                table
                    .classes
                    .insert(name.as_str().to_string(), ClassInfo::new(name.as_str(), superclass, location));
                current = Some(name.as_str().to_string());
                inner_depth = 0;
                parse_member_lines(&mut table, current.as_deref(), line, line_no);
                continue;
            }
        }

        parse_member_lines(&mut table, current.as_deref(), line, line_no);

        if current.is_some() {
            let code = text::mask_non_code(line);
            let trimmed = code.trim();
            if trimmed == "end" {
                if inner_depth == 0 {
                    current = None;
                } else {
                    inner_depth -= 1;
                }
            } else if INNER_BLOCK_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
                inner_depth += 1;
            }
        }
    }

    debug!(
        classes = table.classes.len(),
        variables = table.variables.len(),
        top_level_methods = table.top_level_methods.len(),
        "structural parse"
    );
    table
}

fn parse_member_lines(table: &mut SymbolTable, current: Option<&str>, line: &str, line_no: u32) {
    if let Some(header) = parse_def_header(line) {
        let method = method_from_header(&header, line, line_no);
        match current.and_then(|name| table.classes.get_mut(name)) {
            Some(class) => {
                class.methods.insert(method.name.clone(), method);
            }
            None => table.top_level_methods.push(method),
        }
    }

    if let Some(accessor) = parse_accessor(line) {
        if let Some(class) = current.and_then(|name| table.classes.get_mut(name)) {
            let location = Position::new(line_no, text::utf16_col(line, accessor.name_start));
            let type_name = accessor.type_name.unwrap_or(lang::DEFAULT_TYPE);
            add_accessor(class, accessor.kind, accessor.name, type_name, location);
        }
    }

    if let Some(caps) = ASSIGN_RE.captures(line) {
        if let (Some(name), Some(expr)) = (caps.get(1), caps.get(2)) {
            let type_name = infer::infer_assignment_type(expr.as_str());
            table.variables.insert(
                name.as_str().to_string(),
                VariableInfo {
                    name: name.as_str().to_string(),
                    type_name,
                    location: Position::new(line_no, text::utf16_col(line, name.start())),
                    scope: VariableScope::Global,
                },
            );
        }
    }
}

fn method_from_header(header: &DefHeader<'_>, line: &str, line_no: u32) -> MethodInfo {
    let parameters: Vec<ParameterInfo> = header.params.iter().map(|p| parse_parameter(p.text)).collect();
    let return_type = header.return_type.unwrap_or(lang::DEFAULT_RETURN_TYPE).to_string();
    let documentation = if header.is_static {
        format!("Static method {}", header.name)
    } else {
        format!("Method {}", header.name)
    };
    MethodInfo {
        name: header.name.to_string(),
        signature: method_signature(header.name, &parameters, &return_type),
        parameters,
        return_type,
        visibility: header.visibility,
        location: Position::new(line_no, text::utf16_col(line, header.name_start)),
        documentation,
        is_property: false,
        is_initializer: !header.is_static && header.name == lang::INITIALIZER_NAME,
        is_static: header.is_static,
    }
}

fn add_accessor(class: &mut ClassInfo, kind: AccessorKind, name: &str, type_name: &str, location: Position) {
    let wants_getter = matches!(kind, AccessorKind::Property | AccessorKind::Getter);
    let wants_setter = matches!(kind, AccessorKind::Property | AccessorKind::Setter);

    class.properties.insert(
        name.to_string(),
        PropertyInfo {
            name: name.to_string(),
            type_name: type_name.to_string(),
            visibility: Visibility::Public,
            location,
            has_getter: wants_getter,
            has_setter: wants_setter,
            is_read_only: kind == AccessorKind::Getter,
        },
    );

    if wants_getter {
        class.methods.insert(
            name.to_string(),
            MethodInfo {
                name: name.to_string(),
                parameters: Vec::new(),
                return_type: type_name.to_string(),
                visibility: Visibility::Public,
                location,
                documentation: format!("Property getter for {name}"),
                is_property: true,
                is_initializer: false,
                is_static: false,
                signature: format!("{name} : {type_name}"),
            },
        );
    }

    if wants_setter {
        let setter = format!("{name}=");
        class.methods.insert(
            setter.clone(),
            MethodInfo {
                signature: format!("{setter}({type_name}) : {type_name}"),
                name: setter,
                parameters: vec![ParameterInfo {
                    name: "value".to_string(),
                    type_name: type_name.to_string(),
                    default_value: None,
                    is_optional: false,
                }],
                return_type: type_name.to_string(),
                visibility: Visibility::Public,
                location,
                documentation: format!("Property setter for {name}"),
                is_property: true,
                is_initializer: false,
                is_static: false,
            },
        );
    }
}

/// `name(a : T, b : U = d) : R`, or `name : R` without parameters.
pub fn method_signature(name: &str, parameters: &[ParameterInfo], return_type: &str) -> String {
    if parameters.is_empty() {
        return format!("{name} : {return_type}");
    }
    let params: Vec<String> = parameters
        .iter()
        .map(|p| match &p.default_value {
            Some(default) => format!("{} : {} = {}", p.name, p.type_name, default),
            None => format!("{} : {}", p.name, p.type_name),
        })
        .collect();
    format!("{name}({}) : {return_type}", params.join(", "))
}

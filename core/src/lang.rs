//! Static language catalog: keywords, built-in type names and the method
//! tables offered for built-in receivers.

/// Reserved words plus the handful of top-level IO helpers that read like
/// keywords in practice (`puts`, `print`, `p`, `pp`, `gets`).
pub const KEYWORDS: &[&str] = &[
    "abstract",
    "alias",
    "and",
    "as",
    "begin",
    "break",
    "case",
    "class",
    "def",
    "do",
    "else",
    "elsif",
    "end",
    "ensure",
    "enum",
    "extend",
    "false",
    "for",
    "fun",
    "if",
    "in",
    "include",
    "instance_sizeof",
    "is_a?",
    "lib",
    "macro",
    "module",
    "next",
    "nil",
    "not",
    "of",
    "or",
    "out",
    "pointerof",
    "private",
    "protected",
    "rescue",
    "return",
    "require",
    "select",
    "self",
    "sizeof",
    "struct",
    "super",
    "then",
    "true",
    "type",
    "typeof",
    "union",
    "unless",
    "until",
    "when",
    "while",
    "with",
    "yield",
    "puts",
    "print",
    "p",
    "pp",
    "gets",
];

pub const BUILTIN_TYPES: &[&str] = &[
    "Array", "Bool", "Char", "Class", "Enum", "Float32", "Float64", "Hash", "Int8", "Int16", "Int32", "Int64",
    "Int128", "Module", "Nil", "Number", "Object", "Proc", "Range", "Regex", "Set", "String", "Symbol", "Tuple",
    "UInt8", "UInt16", "UInt32", "UInt64", "UInt128", "Union", "Value", "Void",
];

/// Keywords that open a block closed by `end`.
pub const BLOCK_OPENERS: &[&str] = &["class", "def", "if", "while", "case", "begin", "module", "unless", "for"];

/// Name of the designated constructor method.
pub const INITIALIZER_NAME: &str = "initialize";

/// Type assigned when nothing better is known.
pub const DEFAULT_TYPE: &str = "Object";

/// Return type recorded for methods without an annotation.
pub const DEFAULT_RETURN_TYPE: &str = "Void";

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_builtin_type(word: &str) -> bool {
    BUILTIN_TYPES.contains(&word)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinMethod {
    pub name: &'static str,
    pub signature: &'static str,
    pub doc: &'static str,
}

const fn m(name: &'static str, signature: &'static str, doc: &'static str) -> BuiltinMethod {
    BuiltinMethod { name, signature, doc }
}

const STRING_METHODS: &[BuiltinMethod] = &[
    m("size", "size : Int32", "Returns the size of the string"),
    m("length", "length : Int32", "Returns the length of the string"),
    m("empty?", "empty? : Bool", "Returns true if the string is empty"),
    m("upcase", "upcase : String", "Returns a new string with all characters uppercase"),
    m("downcase", "downcase : String", "Returns a new string with all characters lowercase"),
    m("strip", "strip : String", "Returns a new string with leading and trailing whitespace removed"),
    m("split", "split(delimiter : String) : Array(String)", "Splits the string by delimiter"),
    m("gsub", "gsub(pattern, replacement) : String", "Replaces all occurrences of pattern with replacement"),
    m("includes?", "includes?(substring : String) : Bool", "Returns true if string contains substring"),
    m("starts_with?", "starts_with?(prefix : String) : Bool", "Returns true if string starts with prefix"),
    m("ends_with?", "ends_with?(suffix : String) : Bool", "Returns true if string ends with suffix"),
];

const ARRAY_METHODS: &[BuiltinMethod] = &[
    m("size", "size : Int32", "Returns the size of the array"),
    m("length", "length : Int32", "Returns the length of the array"),
    m("empty?", "empty? : Bool", "Returns true if the array is empty"),
    m("push", "push(element) : self", "Adds element to the end of array"),
    m("<<", "<<(element) : self", "Adds element to the end of array"),
    m("pop", "pop : T?", "Removes and returns the last element"),
    m("first", "first : T", "Returns the first element"),
    m("last", "last : T", "Returns the last element"),
    m("each", "each(&block) : Nil", "Iterates over each element"),
    m("map", "map(&block) : Array", "Returns a new array with transformed elements"),
    m("select", "select(&block) : Array", "Returns a new array with elements that match the block"),
    m("reject", "reject(&block) : Array", "Returns a new array without elements that match the block"),
];

const HASH_METHODS: &[BuiltinMethod] = &[
    m("size", "size : Int32", "Returns the size of the hash"),
    m("length", "length : Int32", "Returns the length of the hash"),
    m("empty?", "empty? : Bool", "Returns true if the hash is empty"),
    m("keys", "keys : Array", "Returns an array of all keys"),
    m("values", "values : Array", "Returns an array of all values"),
    m("has_key?", "has_key?(key) : Bool", "Returns true if hash contains key"),
    m("each", "each(&block) : Nil", "Iterates over each key-value pair"),
];

const NUMBER_METHODS: &[BuiltinMethod] = &[
    m("abs", "abs : self", "Returns the absolute value"),
    m("round", "round : Int32", "Returns the rounded value"),
    m("ceil", "ceil : Int32", "Returns the ceiling value"),
    m("floor", "floor : Int32", "Returns the floor value"),
    m("+", "+(other) : self", "Addition"),
    m("-", "-(other) : self", "Subtraction"),
    m("*", "*(other) : self", "Multiplication"),
    m("/", "/(other) : self", "Division"),
];

const OBJECT_METHODS: &[BuiltinMethod] = &[
    m("class", "class : Class", "Returns the class of the object"),
    m("to_s", "to_s : String", "Returns a string representation of the object"),
    m("inspect", "inspect : String", "Returns a detailed string representation of the object"),
    m("nil?", "nil? : Bool", "Returns true if the object is nil"),
    m("responds_to?", "responds_to?(method : String) : Bool", "Returns true if the object responds to the method"),
];

/// Methods specific to a built-in type, without the universal object methods.
pub fn type_methods(type_name: &str) -> &'static [BuiltinMethod] {
    match type_name {
        "String" => STRING_METHODS,
        "Array" => ARRAY_METHODS,
        "Hash" => HASH_METHODS,
        "Int32" | "Int64" | "Float32" | "Float64" => NUMBER_METHODS,
        _ => &[],
    }
}

/// Methods every instance answers to.
pub fn object_methods() -> &'static [BuiltinMethod] {
    OBJECT_METHODS
}

/// Instance methods for `type_name`: type-specific entries first, then the
/// universal object methods.
pub fn builtin_methods(type_name: &str) -> impl Iterator<Item = &'static BuiltinMethod> {
    type_methods(type_name).iter().chain(OBJECT_METHODS.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_and_type_lookups() {
        assert!(is_keyword("def"));
        assert!(is_keyword("is_a?"));
        assert!(!is_keyword("Def"));
        assert!(is_builtin_type("Int32"));
        assert!(!is_builtin_type("int32"));
    }

    #[test]
    fn builtin_methods_append_object_methods() {
        let names: Vec<&str> = builtin_methods("String").map(|m| m.name).collect();
        assert_eq!(names.first(), Some(&"size"));
        assert!(names.contains(&"inspect"));
        let unknown: Vec<&str> = builtin_methods("Widget").map(|m| m.name).collect();
        assert_eq!(unknown.len(), object_methods().len());
    }
}

//! Schema names → Java identifiers.
//!
//! - fields/methods: camelCase (`user_id` → `userId`, `Position` → `position`)
//! - types: PascalCase (`user-address` → `UserAddress`)
//! - enum constants: UPPER_SNAKE_CASE (`inProgress` → `IN_PROGRESS`)
//!
//! Reserved words are escaped by appending a suffix; callers must apply the
//! same escaped identifier at every emission site.
use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());
static CAMEL_HUMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char",
    "class", "const", "continue", "default", "do", "double", "else", "enum",
    "extends", "final", "finally", "float", "for", "goto", "if", "implements",
    "import", "instanceof", "int", "interface", "long", "native", "new",
    "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while", "true", "false", "null",
    "var", "yield", "record",
];

pub fn is_reserved(ident: &str) -> bool {
    RESERVED.contains(&ident)
}

fn segments(raw: &str) -> Vec<&str> {
    SEPARATORS.split(raw).filter(|s| !s.is_empty()).collect()
}

fn upper_first(s: &str) -> String {
    let mut cs = s.chars();
    match cs.next() {
        Some(c) => c.to_ascii_uppercase().to_string() + cs.as_str(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    // all-caps acronyms lower entirely: `ID` → `id`, `URL` → `url`
    if s.chars().all(|c| !c.is_ascii_lowercase()) {
        return s.to_ascii_lowercase();
    }
    let mut cs = s.chars();
    match cs.next() {
        Some(c) => c.to_ascii_lowercase().to_string() + cs.as_str(),
        None => String::new(),
    }
}

fn guard_leading_digit(s: String) -> String {
    if s.starts_with(|c: char| c.is_ascii_digit()) { format!("_{s}") } else { s }
}

pub fn to_camel_case(raw: &str) -> String {
    let segs = segments(raw);
    if segs.is_empty() {
        return "value".to_string();
    }
    let mut out = lower_first(segs[0]);
    for seg in &segs[1..] {
        out.push_str(&upper_first(seg));
    }
    guard_leading_digit(out)
}

pub fn to_pascal_case(raw: &str) -> String {
    let out: String = segments(raw).into_iter().map(upper_first).collect();
    if out.is_empty() {
        return "Anonymous".to_string();
    }
    guard_leading_digit(out)
}

pub fn to_constant_case(raw: &str) -> String {
    let split = CAMEL_HUMP.replace_all(raw, "${1}_${2}");
    let out = segments(&split)
        .into_iter()
        .map(|s| s.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_");
    if out.is_empty() {
        return "VALUE".to_string();
    }
    guard_leading_digit(out)
}

/// Append `suffix` when `ident` is reserved.
pub fn escape(ident: String, suffix: &str) -> String {
    if is_reserved(&ident) { ident + suffix } else { ident }
}

/// Escaped field identifier for a raw property name.
pub fn field_ident(raw: &str, suffix: &str) -> String {
    escape(to_camel_case(raw), suffix)
}

/// Accessor name derived from an (already escaped) field identifier.
pub fn getter_name(field: &str) -> String {
    format!("get{}", upper_first(field.trim_start_matches('_')))
}

//! String transformation utilities for code generation

/// Keywords that need the raw identifier prefix to be used as a binding
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords which cannot be raw identifiers either
const PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Ensures that `s` starts with an uppercase letter. The rest is kept verbatim.
pub fn public(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Makes from `/my/path` a string like `MyPath`.
///
/// Only `/` separates words; every other character is kept.
pub fn slash_to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut next_up = true;
    for ch in s.chars() {
        if ch == '/' {
            next_up = true;
            continue;
        }
        if next_up {
            out.extend(ch.to_uppercase());
            next_up = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Assembles a `// ` line comment block, one line per input line.
pub fn comment(text: &str) -> String {
    comment_with("// ", text)
}

/// Like [`comment`] but produces `/// ` doc lines, which survive formatting.
pub fn doc_comment(text: &str) -> String {
    comment_with("/// ", text)
}

fn comment_with(prefix: &str, text: &str) -> String {
    let mut out = String::new();
    for line in text.trim().split('\n') {
        out.push_str(prefix);
        out.push_str(line.trim_end_matches('\r'));
        out.push('\n');
    }
    out
}

/// Returns the keys of a string keyed mapping in ascending order.
///
/// Every map walked during emission goes through here, so output never
/// depends on the map's own iteration order.
pub fn sorted_keys<'a, V: 'a, I>(map: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = (&'a String, &'a V)>,
{
    let mut keys: Vec<&str> = map.into_iter().map(|(k, _)| k.as_str()).collect();
    keys.sort_unstable();
    keys
}

/// Turns a declared name into something usable as a Rust binding.
///
/// Characters which cannot appear in an identifier become `_`.
pub fn ident(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c == '_' || c.is_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_numeric()) {
        out.insert(0, '_');
    }

    if PATH_KEYWORDS.contains(&out.as_str()) || out == "_" {
        format!("{out}_")
    } else if RUST_KEYWORDS.contains(&out.as_str()) {
        format!("r#{out}")
    } else {
        out
    }
}

/// Checks that `name` is a plain (non-keyword) Rust identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic());
    starts_ok
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && name != "_"
        && !RUST_KEYWORDS.contains(&name)
        && !PATH_KEYWORDS.contains(&name)
}

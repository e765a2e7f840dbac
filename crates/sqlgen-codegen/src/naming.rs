//! Identifier conversion for generated code

/// Words that cannot be used as plain identifiers
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that are not allowed as raw identifiers either
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super", "_"];

/// `select_users` -> `SelectUsers`
///
/// The name is split on every character that is not an ASCII letter or
/// digit; each part is lower-cased and its first letter capitalised.
pub fn to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for part in name.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }

    out
}

/// `IsSelectID` -> `is_select_id`, `HTTPServer` -> `http_server`
///
/// An acronym keeps a plural `s` when nothing lower-case follows it, so
/// `UserIDs` -> `user_ids`.
pub fn to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let plural_acronym = chars.get(i + 1) == Some(&'s')
                && !chars.get(i + 2).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower && !plural_acronym);
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out.trim_end_matches('_').to_string()
}

/// Rust field identifier for a directive field name
///
/// Returns `None` when no valid identifier can be formed.
pub fn field_ident(name: &str) -> Option<String> {
    let snake = to_snake(name);
    if !is_identifier(&snake) {
        return None;
    }

    if NON_RAW_KEYWORDS.contains(&snake.as_str()) {
        Some(format!("{}_", snake))
    } else if RUST_KEYWORDS.contains(&snake.as_str()) {
        Some(format!("r#{}", snake))
    } else {
        Some(snake)
    }
}

/// Record type name for a template base name, `None` if it is not a valid
/// type identifier
pub fn record_name(stem: &str, suffix: &str) -> Option<String> {
    let base = to_camel(stem);
    let starts_with_letter = base.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let name = format!("{}{}", base, suffix);

    (starts_with_letter && is_identifier(&name)).then_some(name)
}

/// `SelectUsersQueryElem` -> `SELECT_USERS_QUERY_ELEM_SQL`
pub fn template_const_name(record_name: &str) -> String {
    format!("{}_SQL", to_snake(record_name).to_ascii_uppercase())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

//! Signature formatting — raw qualified type references to compact labels.
//!
//! The export encodes generic argument lists with braces and generic
//! parameters as backtick-digit tokens. Everything here is a pure string
//! transform; a reference that cannot be parsed comes back unchanged so a
//! single bad signature never blocks a render.

use regex::Regex;
use std::sync::LazyLock;

// Generic parameter placeholders: ``n for method generic parameters,
// `n for type generic parameters. Both are zero-based in the export and
// one-based in display.
static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`{1,2}([0-9]+)").unwrap());

// Arity markers stripped from file names under clean-generics.
static RE_ARITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`{1,2}[0-9]+").unwrap());

/// Fixed table of well-known qualified names and their keyword aliases.
const ALIASES: &[(&str, &str)] = &[
    ("System.Boolean", "bool"),
    ("System.Byte", "byte"),
    ("System.Char", "char"),
    ("System.Decimal", "decimal"),
    ("System.Double", "double"),
    ("System.Int16", "short"),
    ("System.Int32", "int"),
    ("System.Int64", "long"),
    ("System.Object", "object"),
    ("System.SByte", "sbyte"),
    ("System.Single", "float"),
    ("System.String", "string"),
    ("System.UInt16", "ushort"),
    ("System.UInt32", "uint"),
    ("System.UInt64", "ulong"),
    ("System.Void", "void"),
];

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Token-aware alias substitution.
///
/// A qualified name is only replaced when neither flanking character is an
/// identifier character, so a type that merely embeds an aliasable name
/// (`System.StringComparer`) stays untouched.
pub fn apply_aliases(text: &str) -> String {
    let mut result = text.to_string();
    for (qualified, alias) in ALIASES {
        if !result.contains(qualified) {
            continue;
        }
        let mut out = String::with_capacity(result.len());
        let mut rest = result.as_str();
        while let Some(pos) = rest.find(qualified) {
            // The character before the match may live in the already-copied
            // output when matches are adjacent.
            let prev = rest[..pos].chars().last().or_else(|| out.chars().last());
            let next = rest[pos + qualified.len()..].chars().next();
            let boundary_ok =
                !prev.is_some_and(is_ident_char) && !next.is_some_and(is_ident_char);

            out.push_str(&rest[..pos]);
            out.push_str(if boundary_ok { alias } else { qualified });
            rest = &rest[pos + qualified.len()..];
        }
        out.push_str(rest);
        result = out;
    }
    result
}

/// Rewrite backtick placeholder tokens as 1-based `T{n}` names.
pub fn replace_placeholders(text: &str) -> String {
    RE_PLACEHOLDER
        .replace_all(text, |caps: &regex::Captures| {
            let n: usize = caps[1].parse().unwrap_or(0);
            format!("T{}", n + 1)
        })
        .into_owned()
}

/// Strip arity markers entirely (file-name policy, not display).
pub fn strip_arity_markers(text: &str) -> String {
    RE_ARITY.replace_all(text, "").into_owned()
}

/// Normalize the export's brace-delimited generic syntax to angle brackets
/// and rewrite placeholder tokens. The first two steps of [`shorten_type`],
/// also used on their own for display names that keep their namespace.
pub fn normalize_generics(raw: &str) -> String {
    replace_placeholders(&raw.replace('{', "<").replace('}', ">"))
}

/// Shorten a raw type reference into a compact display label.
///
/// Falls back to the input unchanged when the bracket structure does not
/// balance.
pub fn shorten_type(raw: &str) -> String {
    try_shorten(&normalize_generics(raw)).unwrap_or_else(|| raw.to_string())
}

fn try_shorten(text: &str) -> Option<String> {
    let lt = match text.find('<') {
        None => {
            let aliased = apply_aliases(text);
            return Some(strip_namespace(&aliased).to_string());
        }
        Some(lt) => lt,
    };

    // Locate the matching closing bracket by depth counting; the first `>`
    // is not necessarily the right one.
    let gt = matching_angle(text, lt)?;
    let head = &text[..lt];
    let inner = &text[lt + 1..gt];
    let tail = &text[gt + 1..];

    let head = apply_aliases(head);
    let head = strip_namespace(&head);

    let mut args = Vec::new();
    for arg in split_top_level(inner) {
        args.push(try_shorten(arg.trim())?);
    }

    Some(format!("{}<{}>{}", head, args.join(", "), tail))
}

/// Index of the `>` matching the `<` at `open`, or `None` if unbalanced.
fn matching_angle(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split at commas that sit at nesting depth zero. Commas inside nested
/// generic argument lists (angle or brace form) or array ranks never split.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '{' | '[' | '(' => depth += 1,
            '>' | '}' | ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() || !parts.is_empty() {
        parts.push(&text[start..]);
    }
    parts
}

/// Shorten a raw comma-separated parameter list, one parameter at a time.
pub fn shorten_param_list(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    split_top_level(raw)
        .iter()
        .map(|p| shorten_type(p.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a bare method name, expanding a method generic arity marker into
/// `<T1,...,Tn>` appended to the name.
pub fn format_method_name(raw: &str) -> String {
    if let Some(pos) = raw.find('`') {
        let name = &raw[..pos];
        let digits = raw[pos..].trim_start_matches('`');
        if let Ok(arity) = digits.parse::<usize>() {
            if arity > 0 {
                let params: Vec<String> = (1..=arity).map(|n| format!("T{n}")).collect();
                return format!("{}<{}>", name, params.join(","));
            }
        }
        return name.to_string();
    }
    raw.to_string()
}

/// Everything up to and including the final namespace separator goes.
fn strip_namespace(text: &str) -> &str {
    match text.rfind('.') {
        Some(pos) => &text[pos + 1..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_simple() {
        assert_eq!(apply_aliases("System.Int32"), "int");
        assert_eq!(apply_aliases("System.String"), "string");
    }

    #[test]
    fn alias_is_token_aware() {
        // StringComparer embeds the aliasable name as a prefix.
        assert_eq!(apply_aliases("System.StringComparer"), "System.StringComparer");
        assert_eq!(apply_aliases("MySystem.Int32Holder"), "MySystem.Int32Holder");
    }

    #[test]
    fn alias_inside_larger_text() {
        assert_eq!(
            apply_aliases("Map{System.String,System.Int32}"),
            "Map{string,int}"
        );
    }

    #[test]
    fn placeholders_one_based() {
        assert_eq!(replace_placeholders("`0"), "T1");
        assert_eq!(replace_placeholders("``1"), "T2");
        assert_eq!(replace_placeholders("List{``0}"), "List{T1}");
    }

    #[test]
    fn shorten_plain_type() {
        assert_eq!(shorten_type("Some.Deep.Namespace.Widget"), "Widget");
        assert_eq!(shorten_type("System.Int32"), "int");
    }

    #[test]
    fn shorten_single_generic() {
        assert_eq!(
            shorten_type("System.Collections.Generic.List{System.String}"),
            "List<string>"
        );
    }

    #[test]
    fn shorten_nested_generics_keeps_inner_commas() {
        assert_eq!(
            shorten_type(
                "System.Collections.Generic.Dictionary{System.String,System.Collections.Generic.List{System.Collections.Generic.Dictionary{System.String,System.Int32}}}"
            ),
            "Dictionary<string, List<Dictionary<string, int>>>"
        );
    }

    #[test]
    fn shorten_balances_brackets() {
        let out = shorten_type("List{Dictionary{System.String,System.Int32}}");
        assert_eq!(out.matches('<').count(), out.matches('>').count());
        assert!(!out.ends_with(')'));
        assert!(!out.ends_with('}'));
    }

    #[test]
    fn shorten_with_array_tail() {
        assert_eq!(
            shorten_type("System.Collections.Generic.List{System.Int32}[]"),
            "List<int>[]"
        );
    }

    #[test]
    fn shorten_malformed_returns_raw() {
        // Unbalanced bracket structures come back untouched.
        assert_eq!(shorten_type("Broken{List"), "Broken{List");
        assert_eq!(shorten_type("A{B{C}"), "A{B{C}");
    }

    #[test]
    fn split_ignores_nested_commas() {
        let parts = split_top_level("System.Int32,List{System.String,System.Int32}");
        assert_eq!(parts, vec!["System.Int32", "List{System.String,System.Int32}"]);
    }

    #[test]
    fn split_ignores_array_rank_commas() {
        let parts = split_top_level("System.Int32[0:,0:],System.String");
        assert_eq!(parts, vec!["System.Int32[0:,0:]", "System.String"]);
    }

    #[test]
    fn param_list_shortens_each_entry() {
        assert_eq!(
            shorten_param_list("System.Int32,System.Collections.Generic.List{System.String}"),
            "int, List<string>"
        );
        assert_eq!(shorten_param_list(""), "");
    }

    #[test]
    fn method_name_arity() {
        assert_eq!(format_method_name("Transform``2"), "Transform<T1,T2>");
        assert_eq!(format_method_name("Plain"), "Plain");
    }

    #[test]
    fn arity_markers_stripped() {
        assert_eq!(strip_arity_markers("List`1"), "List");
        assert_eq!(strip_arity_markers("Transform``2"), "Transform");
    }
}

//! Cross-reference resolution — anchors, slugs, file names, link targets.
//!
//! Everything here is a pure function of the reference token and the
//! render configuration. No model lookups happen: a link target is derived
//! from the token shape alone, so a dangling reference degrades to a
//! best-effort label instead of failing the render.

use crate::model::MemberKind;
use crate::signature;
use crate::{FileNameStyle, RenderOptions};

/// Active linking strategy, threaded explicitly through the render call
/// graph so renders stay reentrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// One file per type; member links are `file#anchor`.
    PerFile,
    /// One consolidated document; everything links to in-document anchors.
    SingleFile,
}

/// A resolved cross-reference. `href` is `None` when the token could not
/// be interpreted and only the label is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: Option<String>,
    pub label: String,
}

/// Resolve a kind-prefixed reference token into a link target and label.
pub fn resolve(token: &str, mode: LinkMode, options: &RenderOptions) -> Link {
    let Some((tag, id)) = token.split_once(':') else {
        return Link {
            href: None,
            label: token.to_string(),
        };
    };

    let kind = match single_char(tag).and_then(MemberKind::from_tag) {
        Some(kind) => kind,
        None => {
            // Unknown tag (the compiler emits `!:` for its own failures).
            // Keep the identifier text as the label.
            return Link {
                href: None,
                label: if id.is_empty() { token.to_string() } else { id.to_string() },
            };
        }
    };

    let label = member_label(kind, id);
    let href = match (kind, mode) {
        (MemberKind::Type, LinkMode::PerFile) => file_name_for(id, options),
        (MemberKind::Type, LinkMode::SingleFile) => {
            format!("#{}", heading_slug(&type_heading(id, options)))
        }
        (_, LinkMode::PerFile) => format!(
            "{}#{}",
            file_name_for(owning_type_id(id), options),
            id_to_anchor(id)
        ),
        (_, LinkMode::SingleFile) => format!("#{}", id_to_anchor(id)),
    };

    Link {
        href: Some(href),
        label,
    }
}

fn single_char(tag: &str) -> Option<char> {
    let mut chars = tag.chars();
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

/// Human label for a member reference.
///
/// Types get the short display form, methods their bare name plus a
/// shortened parameter list, everything else its simple name.
pub fn member_label(kind: MemberKind, id: &str) -> String {
    match kind {
        MemberKind::Type => signature::shorten_type(id),
        MemberKind::Method => {
            let (name_part, params) = split_params(id);
            let name = signature::format_method_name(simple_name(name_part));
            format!("{}({})", name, signature::shorten_param_list(params))
        }
        _ => simple_name(id).to_string(),
    }
}

/// Split a method identifier into its name part and raw parameter text.
fn split_params(id: &str) -> (&str, &str) {
    match id.find('(') {
        Some(paren) => {
            let inner = &id[paren + 1..];
            let inner = inner.strip_suffix(')').unwrap_or(inner);
            (&id[..paren], inner)
        }
        None => (id, ""),
    }
}

fn simple_name(name_part: &str) -> &str {
    match name_part.rfind('.') {
        Some(pos) => &name_part[pos + 1..],
        None => name_part,
    }
}

/// Normalized grouping key for a member: the bare name, with method
/// generic arity formatted, so distinct overloads land in one group.
pub fn member_group_key(kind: MemberKind, id: &str) -> String {
    let (name_part, _) = split_params(id);
    let simple = simple_name(name_part);
    match kind {
        MemberKind::Method => signature::format_method_name(simple),
        _ => simple.to_string(),
    }
}

/// Owning-type portion of a member identifier.
///
/// For methods the cut happens at the last `.` before the parameter list;
/// cutting at the literal last `.` would land inside a parameter's
/// namespace.
pub fn owning_type_id(id: &str) -> &str {
    let name_part = match id.find('(') {
        Some(paren) => &id[..paren],
        None => id,
    };
    match name_part.rfind('.') {
        Some(pos) => &id[..pos],
        None => name_part,
    }
}

/// In-document anchor for a member identifier.
///
/// Aliased, brace delimiters squared, lowercased. The parameter list stays
/// in the anchor verbatim; the renderer reproduces exactly this value next
/// to the member section so links resolve in both modes.
pub fn id_to_anchor(id: &str) -> String {
    signature::apply_aliases(id)
        .replace('{', "[")
        .replace('}', "]")
        .to_lowercase()
}

/// GitHub-style slug of visible heading text: lowercase, whitespace runs
/// become a single hyphen, everything outside `[a-z0-9-]` is dropped.
pub fn heading_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_gap = false;
    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            pending_gap = !slug.is_empty();
            continue;
        }
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            if pending_gap {
                slug.push('-');
                pending_gap = false;
            }
            slug.push(c);
        }
    }
    slug
}

/// Display name for a type heading: root namespace trimmed (display only),
/// generic tokens normalized, remaining qualification kept.
pub fn type_display_name(type_id: &str, options: &RenderOptions) -> String {
    signature::normalize_generics(trim_root(type_id, options))
}

/// Visible heading text for a type section. Single-file slugs derive from
/// exactly this string.
pub fn type_heading(type_id: &str, options: &RenderOptions) -> String {
    format!("Type: {}", type_display_name(type_id, options))
}

fn trim_root<'a>(type_id: &'a str, options: &RenderOptions) -> &'a str {
    if let Some(root) = options.root_namespace_to_trim.as_deref() {
        if let Some(rest) = type_id.strip_prefix(root) {
            if let Some(rest) = rest.strip_prefix('.') {
                return rest;
            }
        }
    }
    type_id
}

/// Output file name for a type, per the active file-naming policy.
pub fn file_name_for(type_id: &str, options: &RenderOptions) -> String {
    let trimmed = if options.trim_root_namespace_in_file_names {
        trim_root(type_id, options)
    } else {
        type_id
    };
    let shaped = match options.file_name_style {
        FileNameStyle::Verbatim => trimmed.to_string(),
        FileNameStyle::CleanGenerics => signature::strip_arity_markers(trimmed)
            .replace('{', "<")
            .replace('}', ">"),
    };
    // Angle brackets are not filesystem-safe on every platform.
    let safe = shaped.replace('<', "[").replace('>', "]");
    format!("{safe}.md")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> RenderOptions {
        RenderOptions::default()
    }

    #[test]
    fn owning_type_cuts_before_parameter_list() {
        // The last literal `.` lives inside the parameter namespace and
        // must not be chosen.
        assert_eq!(
            owning_type_id("Heck.Mathx.Add(System.Int32,System.Int32)"),
            "Heck.Mathx"
        );
        assert_eq!(owning_type_id("Heck.Mathx.Count"), "Heck.Mathx");
        assert_eq!(owning_type_id("Loner"), "Loner");
    }

    #[test]
    fn anchor_is_aliased_squared_lowercase() {
        assert_eq!(
            id_to_anchor("Heck.Mathx.Add(System.Int32,System.Int32)"),
            "heck.mathx.add(int,int)"
        );
        assert_eq!(
            id_to_anchor("Ns.Box.Fill(System.Collections.Generic.List{System.String})"),
            "ns.box.fill(list[string])"
        );
    }

    #[test]
    fn slug_from_heading_text() {
        assert_eq!(heading_slug("Type: Mathx"), "type-mathx");
        assert_eq!(heading_slug("Type: Heck.Mathx"), "type-heckmathx");
        assert_eq!(heading_slug("Some   spaced   text"), "some-spaced-text");
    }

    #[test]
    fn file_name_verbatim() {
        assert_eq!(file_name_for("Heck.Mathx", &opts()), "Heck.Mathx.md");
        assert_eq!(file_name_for("Ns.List`1", &opts()), "Ns.List`1.md");
    }

    #[test]
    fn file_name_clean_generics() {
        let options = RenderOptions {
            file_name_style: FileNameStyle::CleanGenerics,
            ..RenderOptions::default()
        };
        assert_eq!(file_name_for("Ns.List`1", &options), "Ns.List.md");
        assert_eq!(
            file_name_for("Ns.Pair{System.Int32}", &options),
            "Ns.Pair[System.Int32].md"
        );
    }

    #[test]
    fn file_name_trims_root_when_asked() {
        let options = RenderOptions {
            root_namespace_to_trim: Some("Heck".to_string()),
            trim_root_namespace_in_file_names: true,
            ..RenderOptions::default()
        };
        assert_eq!(file_name_for("Heck.Mathx", &options), "Mathx.md");
        // Display-only trim leaves file names alone.
        let display_only = RenderOptions {
            root_namespace_to_trim: Some("Heck".to_string()),
            ..RenderOptions::default()
        };
        assert_eq!(file_name_for("Heck.Mathx", &display_only), "Heck.Mathx.md");
    }

    #[test]
    fn resolve_type_per_file() {
        let link = resolve("T:Heck.Mathx", LinkMode::PerFile, &opts());
        assert_eq!(link.href.as_deref(), Some("Heck.Mathx.md"));
        assert_eq!(link.label, "Mathx");
    }

    #[test]
    fn resolve_type_single_file_uses_heading_slug() {
        let link = resolve("T:Heck.Mathx", LinkMode::SingleFile, &opts());
        assert_eq!(link.href.as_deref(), Some("#type-heckmathx"));
    }

    #[test]
    fn resolve_method_per_file() {
        let link = resolve(
            "M:Heck.Mathx.Add(System.Int32,System.Int32)",
            LinkMode::PerFile,
            &opts(),
        );
        assert_eq!(
            link.href.as_deref(),
            Some("Heck.Mathx.md#heck.mathx.add(int,int)")
        );
        assert_eq!(link.label, "Add(int, int)");
    }

    #[test]
    fn resolve_method_single_file() {
        let link = resolve(
            "M:Heck.Mathx.Add(System.Int32,System.Int32)",
            LinkMode::SingleFile,
            &opts(),
        );
        assert_eq!(link.href.as_deref(), Some("#heck.mathx.add(int,int)"));
    }

    #[test]
    fn resolve_generic_method_label() {
        let link = resolve(
            "M:Ns.Box.Transform``2(System.Collections.Generic.List{``0})",
            LinkMode::SingleFile,
            &opts(),
        );
        assert_eq!(link.label, "Transform<T1,T2>(List<T1>)");
    }

    #[test]
    fn resolve_property_label_is_simple_name() {
        let link = resolve("P:Heck.Mathx.Count", LinkMode::PerFile, &opts());
        assert_eq!(link.label, "Count");
        assert_eq!(
            link.href.as_deref(),
            Some("Heck.Mathx.md#heck.mathx.count")
        );
    }

    #[test]
    fn resolve_parameterless_method_label() {
        let link = resolve("M:Heck.Mathx.Reset", LinkMode::PerFile, &opts());
        assert_eq!(link.label, "Reset()");
    }

    #[test]
    fn resolve_unknown_token_degrades() {
        let link = resolve("just some text", LinkMode::PerFile, &opts());
        assert_eq!(link.href, None);
        assert_eq!(link.label, "just some text");

        let link = resolve("!:Heck.Gone", LinkMode::PerFile, &opts());
        assert_eq!(link.href, None);
        assert_eq!(link.label, "Heck.Gone");
    }

    #[test]
    fn display_name_trims_root_for_display() {
        let options = RenderOptions {
            root_namespace_to_trim: Some("Heck".to_string()),
            ..RenderOptions::default()
        };
        assert_eq!(type_display_name("Heck.Mathx", &options), "Mathx");
        assert_eq!(type_display_name("Other.Mathx", &options), "Other.Mathx");
        assert_eq!(type_heading("Heck.Mathx", &options), "Type: Mathx");
    }
}

//! Markdown rendering — per-type pages or one consolidated document.
//!
//! The renderer reads the model, never mutates it, and threads the link
//! mode through every call so a second render on the same engine behaves
//! exactly like a fresh one.

use crate::inherit::{merge_inherited, InheritStrategy, PrefixWalk};
use crate::links::{self, LinkMode};
use crate::model::{DocMember, DocModel, MemberContent, MemberKind};
use crate::text::{self, NormalizeContext};
use crate::RenderOptions;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// I/O failure while emitting output. The engine performs no retries;
/// write policy belongs to the caller.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Markdown renderer over a loaded model.
pub struct Renderer<'a> {
    model: &'a DocModel,
    options: &'a RenderOptions,
    inherit: Box<dyn InheritStrategy + 'a>,
}

impl<'a> Renderer<'a> {
    pub fn new(model: &'a DocModel, options: &'a RenderOptions) -> Self {
        Renderer {
            model,
            options,
            inherit: Box::new(PrefixWalk),
        }
    }

    /// Swap the inheritance strategy (tests, future symbol-backed walks).
    pub fn with_strategy(mut self, strategy: Box<dyn InheritStrategy + 'a>) -> Self {
        self.inherit = strategy;
        self
    }

    /// Write one page per type plus `index.md`. Returns the written paths.
    pub fn to_directory(&self, out_dir: &Path) -> Result<Vec<PathBuf>, OutputError> {
        fs::create_dir_all(out_dir).map_err(|source| OutputError::CreateDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::new();
        for ty in self.model.types() {
            let file_name = links::file_name_for(&ty.id, self.options);
            let heading = links::type_heading(&ty.id, self.options);
            let body = self.render_type_body(ty, LinkMode::PerFile);
            let page = if body.is_empty() {
                format!("# {heading}\n")
            } else {
                format!("# {heading}\n\n{body}\n")
            };

            let path = out_dir.join(&file_name);
            fs::write(&path, page).map_err(|source| OutputError::Write {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }

        let index_path = out_dir.join("index.md");
        fs::write(&index_path, self.render_index(LinkMode::PerFile)).map_err(|source| {
            OutputError::Write {
                path: index_path.clone(),
                source,
            }
        })?;
        written.push(index_path);

        Ok(written)
    }

    /// Write the consolidated single-file document.
    pub fn to_single_file(&self, out_path: &Path) -> Result<(), OutputError> {
        fs::write(out_path, self.to_string()).map_err(|source| OutputError::Write {
            path: out_path.to_path_buf(),
            source,
        })
    }

    /// Render the consolidated document as a string.
    #[allow(clippy::inherent_to_string)]
    pub fn to_string(&self) -> String {
        let mut sections = Vec::new();
        sections.push(self.render_index(LinkMode::SingleFile).trim_end().to_string());

        for ty in self.model.types() {
            let heading = links::type_heading(&ty.id, self.options);
            let slug = links::heading_slug(&heading);
            let body = self.render_type_body(ty, LinkMode::SingleFile);
            let mut section = format!("<a id=\"{slug}\"></a>\n# {heading}");
            if !body.is_empty() {
                section.push_str("\n\n");
                section.push_str(&body);
            }
            sections.push(section);
        }

        let mut doc = sections.join("\n\n---\n\n");
        doc.push('\n');
        doc
    }

    /// Index of all types, sorted by display label.
    fn render_index(&self, mode: LinkMode) -> String {
        let mut entries: Vec<(String, Option<String>)> = self
            .model
            .types()
            .map(|ty| {
                let link = links::resolve(&ty.identifier, mode, self.options);
                (link.label, link.href)
            })
            .collect();
        entries.sort();

        let mut out = String::from("# Index\n");
        for (label, href) in entries {
            out.push('\n');
            match href {
                Some(href) => out.push_str(&format!("* [{label}]({href})")),
                None => out.push_str(&format!("* {label}")),
            }
        }
        out.push('\n');
        out
    }

    /// Type section body: summary, remarks, examples, see-also, members.
    /// The heading line itself belongs to the caller so single-file mode
    /// can emit it once with its anchor.
    fn render_type_body(&self, ty: &DocMember, mode: LinkMode) -> String {
        let content = self.effective_content(ty);
        let mut blocks = Vec::new();

        if let Some(summary) = content.summary.as_deref() {
            push_nonempty(&mut blocks, self.prose(summary, mode, false));
        }
        if let Some(remarks) = content.remarks.as_deref() {
            let md = self.prose(remarks, mode, false);
            if !md.is_empty() {
                blocks.push("## Remarks".to_string());
                blocks.push(md);
            }
        }
        for example in &content.examples {
            let md = self.prose(example, mode, true);
            if !md.is_empty() {
                blocks.push("## Example".to_string());
                blocks.push(md);
            }
        }
        if !content.see_also.is_empty() {
            blocks.push("## See also".to_string());
            blocks.push(self.see_also_list(&content.see_also, mode));
        }

        push_nonempty(&mut blocks, self.render_members(ty, mode));
        blocks.join("\n\n")
    }

    /// Members of a type, overloads grouped under one heading.
    fn render_members(&self, ty: &DocMember, mode: LinkMode) -> String {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&DocMember>> = HashMap::new();
        for member in self.model.members_of(&ty.id) {
            let key = links::member_group_key(member.kind, &member.id);
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(member);
        }

        let mut blocks = Vec::new();
        for key in order {
            let group = &groups[&key];
            let all_methods = group.iter().all(|m| m.kind == MemberKind::Method);
            if group.len() > 1 && all_methods {
                blocks.push(self.render_overload_group(&key, group, mode));
            } else {
                for member in group {
                    blocks.push(self.render_member_section(member, mode));
                }
            }
        }
        blocks.join("\n\n")
    }

    /// One heading for the whole overload set, one bullet per overload.
    fn render_overload_group(&self, key: &str, group: &[&DocMember], mode: LinkMode) -> String {
        let mut blocks = vec![format!("## Method: {key}")];
        for member in group {
            let anchor = links::id_to_anchor(&member.id);
            let label = links::member_label(member.kind, &member.id);
            let content = self.effective_content(member);
            let detail = self.member_detail(&content, member.kind, mode, true);
            let mut bullet = format!("<a id=\"{anchor}\"></a>\n- `{label}`");
            if !detail.is_empty() {
                bullet.push_str("\n\n");
                bullet.push_str(&indent(&detail));
            }
            blocks.push(bullet);
        }
        blocks.join("\n\n")
    }

    /// Full `##` section for a member that stands alone.
    fn render_member_section(&self, member: &DocMember, mode: LinkMode) -> String {
        let anchor = links::id_to_anchor(&member.id);
        let label = links::member_label(member.kind, &member.id);
        let content = self.effective_content(member);
        let detail = self.member_detail(&content, member.kind, mode, false);

        let mut out = format!(
            "<a id=\"{anchor}\"></a>\n## {}: {label}",
            member.kind.word()
        );
        if !detail.is_empty() {
            out.push_str("\n\n");
            out.push_str(&detail);
        }
        out
    }

    /// Member detail blocks: summary, parameters, returns, exceptions,
    /// examples, see-also. `as_bullet` switches the sub-headings to bold
    /// labels so they can nest under a list item.
    fn member_detail(
        &self,
        content: &MemberContent,
        kind: MemberKind,
        mode: LinkMode,
        as_bullet: bool,
    ) -> String {
        let head = |title: &str| {
            if as_bullet {
                format!("**{title}**")
            } else {
                format!("### {title}")
            }
        };
        let mut blocks = Vec::new();

        let summary = content
            .summary
            .as_deref()
            .or_else(|| match kind {
                // Property value text stands in for a missing summary.
                MemberKind::Property => content.value.as_deref(),
                _ => None,
            });
        if let Some(summary) = summary {
            push_nonempty(&mut blocks, self.prose(summary, mode, false));
        }

        if !content.type_params.is_empty() {
            blocks.push(head("Type parameters"));
            blocks.push(self.named_list(&content.type_params, mode));
        }
        if !content.params.is_empty() {
            blocks.push(head("Parameters"));
            blocks.push(self.named_list(&content.params, mode));
        }
        if let Some(returns) = content.returns.as_deref() {
            let md = self.prose(returns, mode, false);
            if !md.is_empty() {
                blocks.push(head("Returns"));
                blocks.push(md);
            }
        }
        if !content.exceptions.is_empty() {
            blocks.push(head("Exceptions"));
            let mut lines = Vec::new();
            for exception in &content.exceptions {
                let link = links::resolve(&exception.cref, mode, self.options);
                let text = self.prose(&exception.nodes, mode, false);
                let target = match link.href {
                    Some(href) => format!("[{}]({href})", link.label),
                    None => link.label,
                };
                if text.is_empty() {
                    lines.push(format!("* {target}"));
                } else {
                    lines.push(format!("* {target}: {}", continuation(&text)));
                }
            }
            blocks.push(lines.join("\n"));
        }
        for example in &content.examples {
            let md = self.prose(example, mode, true);
            if !md.is_empty() {
                blocks.push(head("Example"));
                blocks.push(md);
            }
        }
        if !content.see_also.is_empty() {
            blocks.push(head("See also"));
            blocks.push(self.see_also_list(&content.see_also, mode));
        }

        blocks.join("\n\n")
    }

    fn named_list(&self, sections: &[crate::model::NamedSection], mode: LinkMode) -> String {
        let mut lines = Vec::new();
        for section in sections {
            let text = self.prose(&section.nodes, mode, false);
            if text.is_empty() {
                lines.push(format!("* **{}**", section.name));
            } else {
                lines.push(format!("* **{}**: {}", section.name, continuation(&text)));
            }
        }
        lines.join("\n")
    }

    fn see_also_list(&self, tokens: &[String], mode: LinkMode) -> String {
        let mut lines = Vec::new();
        for token in tokens {
            let link = links::resolve(token, mode, self.options);
            match link.href {
                Some(href) => lines.push(format!("* [{}]({href})", link.label)),
                None => lines.push(format!("* {}", link.label)),
            }
        }
        lines.join("\n")
    }

    fn prose(&self, nodes: &[crate::model::Node], mode: LinkMode, prefer_block: bool) -> String {
        text::to_markdown(
            nodes,
            &NormalizeContext {
                mode,
                options: self.options,
                prefer_block,
            },
        )
    }

    /// Content with inherited sections merged in. The merge happens on a
    /// clone; the loaded model is never touched, which keeps repeated
    /// renders identical.
    fn effective_content<'m>(&self, member: &'m DocMember) -> Cow<'m, MemberContent> {
        if member.content.inherit.is_some() {
            if let Some(source) = self.inherit.resolve(self.model, member) {
                let mut merged = member.content.clone();
                merge_inherited(&mut merged, &source.content);
                return Cow::Owned(merged);
            }
        }
        Cow::Borrowed(&member.content)
    }
}

fn push_nonempty(blocks: &mut Vec<String>, block: String) {
    if !block.is_empty() {
        blocks.push(block);
    }
}

/// Indent every non-empty line by two spaces (list-item nesting).
fn indent(text: &str) -> String {
    text.lines()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("  {l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep a multi-line value inside one list item.
fn continuation(text: &str) -> String {
    text.replace('\n', "\n  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_str;
    use tempfile::TempDir;

    const EXPORT: &str = r#"<?xml version="1.0"?>
<doc>
  <members>
    <member name="T:Heck.Mathx">
      <summary>Math helpers for tests.</summary>
      <seealso cref="M:Heck.Mathx.Add(System.Int32,System.Int32)"/>
    </member>
    <member name="M:Heck.Mathx.Add(System.Int32,System.Int32)">
      <summary>Adds two integers.</summary>
      <param name="a">Left value.</param>
      <param name="b">Right value.</param>
      <returns>The sum.</returns>
    </member>
    <member name="M:Heck.Mathx.Add(System.Int32,System.Int32,System.Int32)">
      <summary>Adds three integers.</summary>
    </member>
    <member name="M:Heck.Mathx.AddAlias(System.Int32,System.Int32)">
      <inheritdoc cref="M:Heck.Mathx.Add(System.Int32,System.Int32)"/>
    </member>
    <member name="M:Heck.Mathx.Transform``2(System.Collections.Generic.List{System.Collections.Generic.Dictionary{``0,System.Collections.Generic.List{``1}}})">
      <summary>Maps a nested structure.</summary>
    </member>
    <member name="P:Heck.Mathx.Count">
      <value>Number of operations run.</value>
    </member>
  </members>
</doc>
"#;

    fn render(options: &RenderOptions) -> String {
        let model = parse_str(EXPORT).unwrap();
        let out = Renderer::new(&model, options).to_string();
        out
    }

    #[test]
    fn overloads_share_one_group_heading() {
        let doc = render(&RenderOptions::default());
        assert_eq!(doc.matches("## Method: Add\n").count(), 1);
        assert!(doc.contains("- `Add(int, int)`"));
        assert!(doc.contains("- `Add(int, int, int)`"));
        // The alias is not an overload of Add; it stands alone.
        assert!(doc.contains("## Method: AddAlias(int, int)"));
    }

    #[test]
    fn inherited_summary_appears_on_alias() {
        let doc = render(&RenderOptions::default());
        let alias_at = doc.find("## Method: AddAlias(int, int)").unwrap();
        let after = &doc[alias_at..];
        assert!(after.contains("Adds two integers."));
    }

    #[test]
    fn generic_method_header_has_no_misplaced_commas() {
        let doc = render(&RenderOptions::default());
        assert!(doc.contains("Method: Transform<T1,T2>(List<Dictionary<T1, List<T2>>>)"));
    }

    #[test]
    fn every_member_emits_anchor_before_heading() {
        let doc = render(&RenderOptions::default());
        assert!(doc.contains(
            "<a id=\"heck.mathx.add(int,int)\"></a>\n- `Add(int, int)`"
        ));
        assert!(doc.contains(
            "<a id=\"heck.mathx.addalias(int,int)\"></a>\n## Method: AddAlias(int, int)"
        ));
    }

    #[test]
    fn single_file_links_match_emitted_anchors() {
        let doc = render(&RenderOptions::default());
        // The type's see-also points at Add; the link fragment must equal
        // the anchor the overload bullet emitted.
        assert!(doc.contains("[Add(int, int)](#heck.mathx.add(int,int))"));
        assert!(doc.contains("<a id=\"heck.mathx.add(int,int)\"></a>"));
    }

    #[test]
    fn single_file_type_sections_have_slug_anchor_and_rule() {
        let doc = render(&RenderOptions::default());
        assert!(doc.contains("\n---\n"));
        assert!(doc.contains("<a id=\"type-heckmathx\"></a>\n# Type: Heck.Mathx"));
        assert!(doc.contains("* [Mathx](#type-heckmathx)"));
    }

    #[test]
    fn property_value_stands_in_for_summary() {
        let doc = render(&RenderOptions::default());
        let at = doc.find("## Property: Count").unwrap();
        assert!(doc[at..].contains("Number of operations run."));
    }

    #[test]
    fn directory_mode_writes_pages_and_index() {
        let model = parse_str(EXPORT).unwrap();
        let options = RenderOptions::default();
        let dir = TempDir::new().unwrap();

        let written = Renderer::new(&model, &options)
            .to_directory(dir.path())
            .unwrap();

        let page = std::fs::read_to_string(dir.path().join("Heck.Mathx.md")).unwrap();
        assert!(page.starts_with("# Type: Heck.Mathx\n"));
        assert!(page.contains(
            "[Add(int, int)](Heck.Mathx.md#heck.mathx.add(int,int))"
        ));

        let index = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
        assert!(index.contains("* [Mathx](Heck.Mathx.md)"));

        assert_eq!(written.len(), 2);
        assert!(written.iter().any(|p| p.ends_with("index.md")));
    }

    #[test]
    fn repeated_renders_are_identical() {
        let model = parse_str(EXPORT).unwrap();
        let options = RenderOptions::default();
        let renderer = Renderer::new(&model, &options);
        assert_eq!(renderer.to_string(), renderer.to_string());
    }

    #[test]
    fn root_namespace_trim_is_display_only() {
        let options = RenderOptions {
            root_namespace_to_trim: Some("Heck".to_string()),
            ..RenderOptions::default()
        };
        let doc = render(&options);
        assert!(doc.contains("# Type: Mathx"));
        assert!(doc.contains("* [Mathx](#type-mathx)"));
        // Anchors keep the untrimmed identifier.
        assert!(doc.contains("<a id=\"heck.mathx.add(int,int)\"></a>"));
    }
}

//! Prose normalization — mixed documentation markup to Markdown.
//!
//! Two stages: the markup nodes are written out as raw Markdown (resolving
//! cross-references and choosing span vs. fence for code), then a single
//! top-to-bottom cleanup pass tidies whitespace while tracking fence state
//! so code blocks survive byte-for-byte.

use crate::links::{self, LinkMode};
use crate::model::Node;
use crate::RenderOptions;
use regex::Regex;
use std::sync::LazyLock;

static RE_WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

// Stray space left before closing punctuation after joins.
static RE_SPACE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +([.,;:)\]])").unwrap());

/// Context for one normalization call. Mode and options are call-scoped;
/// nothing here outlives the render that created it.
pub struct NormalizeContext<'a> {
    pub mode: LinkMode,
    pub options: &'a RenderOptions,
    /// Render the first code-bearing node as a block even if single-line
    /// (used for example sections).
    pub prefer_block: bool,
}

/// Convert a section's markup nodes into tidy Markdown prose.
pub fn to_markdown(nodes: &[Node], ctx: &NormalizeContext) -> String {
    let mut raw = String::new();
    let mut block_pending = ctx.prefer_block;
    write_nodes(nodes, ctx, &mut raw, &mut block_pending);
    tidy(&raw)
}

fn write_nodes(nodes: &[Node], ctx: &NormalizeContext, out: &mut String, block_pending: &mut bool) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::See { cref, text } => {
                let link = links::resolve(cref, ctx.mode, ctx.options);
                let label = text.clone().unwrap_or(link.label);
                match link.href {
                    Some(href) => out.push_str(&format!("[{label}]({href})")),
                    None => out.push_str(&label),
                }
            }
            Node::Link { href, text } => {
                let label = text.as_deref().unwrap_or(href);
                out.push_str(&format!("[{label}]({href})"));
            }
            Node::Langword(word) => out.push_str(&format!("`{word}`")),
            Node::ParamRef(name) | Node::TypeParamRef(name) => {
                out.push_str(&format!("`{name}`"));
            }
            Node::InlineCode(code) => {
                if code.contains('\n') || *block_pending {
                    *block_pending = false;
                    push_fence(out, code, &ctx.options.code_block_language);
                } else {
                    out.push_str(&format!("`{}`", code.trim()));
                }
            }
            Node::CodeBlock(code) => {
                *block_pending = false;
                push_fence(out, code, &ctx.options.code_block_language);
            }
            Node::Para(children) => {
                out.push_str("\n\n");
                write_nodes(children, ctx, out, block_pending);
                out.push_str("\n\n");
            }
        }
    }
}

/// Emit a fenced block. Only the boundary whitespace is ours; the content
/// keeps every internal byte.
fn push_fence(out: &mut String, code: &str, language: &str) {
    let body = code.trim_start_matches(['\n', '\r']).trim_end();
    out.push_str("\n\n```");
    out.push_str(language);
    out.push('\n');
    out.push_str(body);
    out.push_str("\n```\n\n");
}

enum Block {
    Paragraph(String),
    Verbatim(Vec<String>),
}

/// The fence-tracking cleanup pass.
///
/// Outside fences: whitespace runs collapse, lines are trimmed, stray
/// spaces before closing punctuation go away, blank-line runs become one
/// paragraph separator, and soft-wrapped lines join with a single space.
/// Inside fences every line passes through untouched.
pub fn tidy(input: &str) -> String {
    let mut blocks: Vec<Block> = Vec::new();
    let mut para: Vec<String> = Vec::new();
    let mut fence: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            if in_fence {
                fence.push(line.to_string());
                blocks.push(Block::Verbatim(std::mem::take(&mut fence)));
                in_fence = false;
            } else {
                flush_para(&mut para, &mut blocks);
                fence.push(trimmed.to_string());
                in_fence = true;
            }
            continue;
        }
        if in_fence {
            fence.push(line.to_string());
            continue;
        }
        if trimmed.is_empty() {
            flush_para(&mut para, &mut blocks);
            continue;
        }
        para.push(trimmed.to_string());
    }

    // An unterminated fence still flushes; the pass runs exactly once.
    if !fence.is_empty() {
        blocks.push(Block::Verbatim(fence));
    }
    flush_para(&mut para, &mut blocks);

    let rendered: Vec<String> = blocks
        .into_iter()
        .map(|b| match b {
            Block::Paragraph(text) => text,
            Block::Verbatim(lines) => lines.join("\n"),
        })
        .collect();
    rendered.join("\n\n")
}

fn flush_para(para: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if para.is_empty() {
        return;
    }
    let joined = para.join(" ");
    para.clear();
    let collapsed = RE_WS_RUN.replace_all(&joined, " ");
    let cleaned = RE_SPACE_PUNCT.replace_all(collapsed.trim(), "$1");
    blocks.push(Block::Paragraph(cleaned.into_owned()));
}

//! Data model for the parsed documentation export — format-agnostic.

use std::collections::BTreeMap;

/// Kind of a documented member, derived from the identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Type,
    Method,
    Property,
    Field,
    Event,
}

impl MemberKind {
    /// Map a one-letter kind tag to a kind.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'T' => Some(MemberKind::Type),
            'M' => Some(MemberKind::Method),
            'P' => Some(MemberKind::Property),
            'F' => Some(MemberKind::Field),
            'E' => Some(MemberKind::Event),
            _ => None,
        }
    }

    /// Long-form kind name used in member headers.
    pub fn word(&self) -> &'static str {
        match self {
            MemberKind::Type => "Type",
            MemberKind::Method => "Method",
            MemberKind::Property => "Property",
            MemberKind::Field => "Field",
            MemberKind::Event => "Event",
        }
    }
}

/// One node of mixed-markup prose inside a documentation section.
///
/// Text nodes keep their original whitespace; cleanup happens at render
/// time so code content survives the load untouched.
#[derive(Debug, Clone)]
pub enum Node {
    Text(String),
    /// Cross-reference tag. `text` is an author-supplied label override.
    See { cref: String, text: Option<String> },
    /// External link with display text.
    Link { href: String, text: Option<String> },
    /// Language keyword reference, rendered as inline code.
    Langword(String),
    ParamRef(String),
    TypeParamRef(String),
    /// Inline code tag. May still render as a fenced block when the
    /// content spans lines or the context prefers block rendering.
    InlineCode(String),
    /// Fenced code tag, always block-rendered.
    CodeBlock(String),
    /// Explicit paragraph break containing its own children.
    Para(Vec<Node>),
}

/// A named sub-section: `param` or `typeparam`.
#[derive(Debug, Clone)]
pub struct NamedSection {
    pub name: String,
    pub nodes: Vec<Node>,
}

/// A documented exception with its cross-reference token.
#[derive(Debug, Clone)]
pub struct ExceptionDoc {
    pub cref: String,
    pub nodes: Vec<Node>,
}

/// Inherit-directive. `cref` is the explicit target, if any.
#[derive(Debug, Clone)]
pub struct InheritDoc {
    pub cref: Option<String>,
}

/// Ordered documentation sections of a single member.
#[derive(Debug, Clone, Default)]
pub struct MemberContent {
    pub summary: Option<Vec<Node>>,
    pub remarks: Option<Vec<Node>>,
    /// `value` section on properties; used as a summary fallback.
    pub value: Option<Vec<Node>>,
    pub params: Vec<NamedSection>,
    pub type_params: Vec<NamedSection>,
    pub returns: Option<Vec<Node>>,
    pub exceptions: Vec<ExceptionDoc>,
    pub examples: Vec<Vec<Node>>,
    /// Raw cross-reference tokens from see-also entries.
    pub see_also: Vec<String>,
    pub inherit: Option<InheritDoc>,
}

impl MemberContent {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.remarks.is_none()
            && self.value.is_none()
            && self.params.is_empty()
            && self.type_params.is_empty()
            && self.returns.is_none()
            && self.exceptions.is_empty()
            && self.examples.is_empty()
            && self.see_also.is_empty()
            && self.inherit.is_none()
    }
}

/// One exported documentation record.
#[derive(Debug, Clone)]
pub struct DocMember {
    /// Full identifier including the kind tag, e.g. `M:Ns.Type.Method(Arg)`.
    pub identifier: String,
    pub kind: MemberKind,
    /// Identifier without the kind tag.
    pub id: String,
    pub content: MemberContent,
}

impl DocMember {
    /// Build a member from a record name. Returns `None` when the name
    /// carries no recognizable kind tag.
    pub fn from_name(name: &str, content: MemberContent) -> Option<Self> {
        let (tag, id) = name.split_once(':')?;
        let mut chars = tag.chars();
        let kind = MemberKind::from_tag(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(DocMember {
            identifier: name.to_string(),
            kind,
            id: id.to_string(),
            content,
        })
    }
}

/// Immutable-after-load mapping from identifier to member.
///
/// Lookups are exact and case-sensitive. Iteration order is identifier
/// order, which keeps every render deterministic.
#[derive(Debug, Default)]
pub struct DocModel {
    members: BTreeMap<String, DocMember>,
}

impl DocModel {
    /// Insert a member. Later duplicates overwrite earlier ones.
    pub fn insert(&mut self, member: DocMember) {
        self.members.insert(member.identifier.clone(), member);
    }

    pub fn get(&self, identifier: &str) -> Option<&DocMember> {
        self.members.get(identifier)
    }

    pub fn members(&self) -> impl Iterator<Item = &DocMember> {
        self.members.values()
    }

    /// All type entities — the enumeration root for rendering.
    pub fn types(&self) -> impl Iterator<Item = &DocMember> {
        self.members
            .values()
            .filter(|m| m.kind == MemberKind::Type)
    }

    /// Non-type members whose owning type matches `type_id`.
    pub fn members_of<'a>(&'a self, type_id: &'a str) -> impl Iterator<Item = &'a DocMember> {
        self.members.values().filter(move |m| {
            m.kind != MemberKind::Type && crate::links::owning_type_id(&m.id) == type_id
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

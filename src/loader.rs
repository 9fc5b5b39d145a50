//! Export loading — `<member name="...">` records into a [`DocModel`].
//!
//! The reader keeps original whitespace in text nodes; code-block fidelity
//! depends on it. Malformed input fails the whole load, per the no-partial-
//! model rule.

use crate::model::{
    DocMember, DocModel, ExceptionDoc, InheritDoc, MemberContent, NamedSection, Node,
};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Load failure. Surfaced verbatim to the caller; no partial model exists
/// after an error.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed documentation export: {0}")]
    Malformed(#[from] quick_xml::Error),
    #[error("unexpected end of input inside <{0}>")]
    Truncated(String),
}

/// Load a documentation export from disk.
pub fn load(path: &Path) -> Result<DocModel, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&text)
}

/// Parse an export document from a string.
pub fn parse_str(xml: &str) -> Result<DocModel, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut model = DocModel::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"member" => {
                let name = attr(&e, "name");
                let content = read_member(&mut reader)?;
                insert_record(&mut model, name, content);
            }
            Event::Empty(e) if e.name().as_ref() == b"member" => {
                insert_record(&mut model, attr(&e, "name"), MemberContent::default());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(model)
}

fn insert_record(model: &mut DocModel, name: Option<String>, content: MemberContent) {
    // Records without a usable kind-tagged name are not addressable and
    // get dropped.
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        if let Some(member) = DocMember::from_name(&name, content) {
            model.insert(member);
        }
    }
}

/// Read the sections of one `<member>` element up to its end tag.
fn read_member(reader: &mut Reader<&[u8]>) -> Result<MemberContent, LoadError> {
    let mut content = MemberContent::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = e.name().as_ref().to_vec();
                match tag.as_slice() {
                    b"summary" => content.summary = Some(read_nodes(reader, b"summary")?),
                    b"remarks" => content.remarks = Some(read_nodes(reader, b"remarks")?),
                    b"returns" => content.returns = Some(read_nodes(reader, b"returns")?),
                    b"value" => content.value = Some(read_nodes(reader, b"value")?),
                    b"example" => content.examples.push(read_nodes(reader, b"example")?),
                    b"param" => {
                        let name = attr(&e, "name").unwrap_or_default();
                        let nodes = read_nodes(reader, b"param")?;
                        content.params.push(NamedSection { name, nodes });
                    }
                    b"typeparam" => {
                        let name = attr(&e, "name").unwrap_or_default();
                        let nodes = read_nodes(reader, b"typeparam")?;
                        content.type_params.push(NamedSection { name, nodes });
                    }
                    b"exception" => {
                        let cref = attr(&e, "cref").unwrap_or_default();
                        let nodes = read_nodes(reader, b"exception")?;
                        content.exceptions.push(ExceptionDoc { cref, nodes });
                    }
                    b"seealso" => {
                        if let Some(cref) = attr(&e, "cref") {
                            content.see_also.push(cref);
                        }
                        reader.read_to_end(e.name())?;
                    }
                    b"inheritdoc" => {
                        content.inherit = Some(InheritDoc { cref: attr(&e, "cref") });
                        reader.read_to_end(e.name())?;
                    }
                    _ => {
                        reader.read_to_end(e.name())?;
                    }
                }
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"inheritdoc" => content.inherit = Some(InheritDoc { cref: attr(&e, "cref") }),
                b"seealso" => {
                    if let Some(cref) = attr(&e, "cref") {
                        content.see_also.push(cref);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"member" => break,
            Event::Eof => return Err(LoadError::Truncated("member".to_string())),
            _ => {}
        }
    }

    Ok(content)
}

/// Read mixed markup up to the named end tag, preserving text whitespace.
fn read_nodes(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<Vec<Node>, LoadError> {
    let mut nodes = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(e.as_ref()).into_owned());
                nodes.push(Node::Text(text));
            }
            Event::CData(e) => {
                nodes.push(Node::Text(String::from_utf8_lossy(e.as_ref()).into_owned()));
            }
            Event::Start(e) => {
                let tag = e.name().as_ref().to_vec();
                match tag.as_slice() {
                    b"para" => nodes.push(Node::Para(read_nodes(reader, b"para")?)),
                    b"c" => nodes.push(Node::InlineCode(read_raw_text(reader, &e)?)),
                    b"code" => nodes.push(Node::CodeBlock(read_raw_text(reader, &e)?)),
                    b"see" => {
                        let cref = attr(&e, "cref");
                        let href = attr(&e, "href");
                        let inner = read_raw_text(reader, &e)?;
                        let text = Some(inner.trim().to_string()).filter(|t| !t.is_empty());
                        nodes.push(see_node(cref, href, text, &e));
                    }
                    b"paramref" => {
                        nodes.push(Node::ParamRef(attr(&e, "name").unwrap_or_default()));
                        reader.read_to_end(e.name())?;
                    }
                    b"typeparamref" => {
                        nodes.push(Node::TypeParamRef(attr(&e, "name").unwrap_or_default()));
                        reader.read_to_end(e.name())?;
                    }
                    _ => {
                        // Unknown inline markup: keep its children so the
                        // prose text survives.
                        let mut inner = read_nodes(reader, &tag)?;
                        nodes.append(&mut inner);
                    }
                }
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"para" => nodes.push(Node::Para(Vec::new())),
                b"see" => nodes.push(see_node(attr(&e, "cref"), attr(&e, "href"), None, &e)),
                b"paramref" => {
                    nodes.push(Node::ParamRef(attr(&e, "name").unwrap_or_default()))
                }
                b"typeparamref" => {
                    nodes.push(Node::TypeParamRef(attr(&e, "name").unwrap_or_default()))
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == end => break,
            Event::Eof => {
                return Err(LoadError::Truncated(
                    String::from_utf8_lossy(end).into_owned(),
                ))
            }
            _ => {}
        }
    }

    Ok(nodes)
}

fn see_node(
    cref: Option<String>,
    href: Option<String>,
    text: Option<String>,
    e: &BytesStart,
) -> Node {
    if let Some(cref) = cref {
        return Node::See { cref, text };
    }
    if let Some(href) = href {
        return Node::Link { href, text };
    }
    if let Some(word) = attr(e, "langword") {
        return Node::Langword(word);
    }
    Node::Text(text.unwrap_or_default())
}

/// Raw inner text of an element, entities unescaped, whitespace intact.
fn read_raw_text(reader: &mut Reader<&[u8]>, e: &BytesStart) -> Result<String, LoadError> {
    let raw = reader.read_text(e.name())?;
    Ok(match unescape(&raw) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => raw.into_owned(),
    })
}

fn attr(e: &BytesStart, key: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        (a.key.as_ref() == key.as_bytes())
            .then(|| String::from_utf8_lossy(&a.value).into_owned())
    })
}

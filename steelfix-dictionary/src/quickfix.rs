//! QuickFIX XML dictionary loader.
//!
//! Parses a QuickFIX-style protocol description into a
//! [`ProtocolDescr`]. Loading is all-or-nothing: any grammar violation or
//! unresolved reference aborts with a [`LoadError`] and no descriptor is
//! produced.
//!
//! `<component>` references are expanded inline at load time; there is no
//! runtime component entity. `<group>` elements recurse into the group's
//! subfield layout. Header and trailer fields are inlined into every
//! message the same way, so session-level tags resolve through the same
//! per-message index as body tags.

use crate::schema::{FieldDescr, FieldKind, FieldType, MessageDescr, ProtocolDescr, Version};
use roxmltree::{Document, Node};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors produced while loading a dictionary.
///
/// All of them are fatal to the load; the caller never receives a partial
/// descriptor.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The XML library rejected the document.
    #[error("xml error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The document does not follow the dictionary grammar.
    #[error("dictionary load failed: {0}")]
    Malformed(String),

    /// The root `version` attribute names no supported FIX version.
    #[error("unknown protocol version `{0}`")]
    UnknownVersion(String),

    /// A field, group, or component reference names nothing the
    /// dictionary defines.
    #[error("`{0}` is unknown")]
    UnknownField(String),

    /// Two `<fields>` entries share a name.
    #[error("duplicate field type `{0}`")]
    DuplicateField(String),

    /// Two `<message>` entries share a msgtype.
    #[error("duplicate message type `{0}`")]
    DuplicateMessage(String),

    /// The dictionary file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolDescr {
    /// Loads a dictionary from an XML string.
    ///
    /// # Errors
    /// Any [`LoadError`]; the load is all-or-nothing.
    pub fn from_xml(xml: &str) -> Result<Self, LoadError> {
        let doc = Document::parse(xml)?;
        QuickFixReader::read(&doc)
    }

    /// Loads a dictionary from a file path.
    ///
    /// # Errors
    /// Any [`LoadError`]; the load is all-or-nothing.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }
}

struct QuickFixReader<'a> {
    components: Option<Node<'a, 'a>>,
}

impl<'a> QuickFixReader<'a> {
    fn read(doc: &'a Document<'a>) -> Result<ProtocolDescr, LoadError> {
        let root = doc.root_element();
        validate_grammar(root)?;

        let version = read_version(root)?;
        let mut protocol = ProtocolDescr::new(version);

        let fields_node = section(root, "fields")
            .ok_or_else(|| LoadError::Malformed("<fields> section not found".to_string()))?;
        load_field_types(&mut protocol, fields_node)?;

        let reader = QuickFixReader {
            components: section(root, "components"),
        };

        let header_fields = match section(root, "header") {
            Some(node) => reader.load_fields(&protocol, node)?,
            None => Vec::new(),
        };
        let trailer_fields = match section(root, "trailer") {
            Some(node) => reader.load_fields(&protocol, node)?,
            None => Vec::new(),
        };

        let messages_node = section(root, "messages")
            .ok_or_else(|| LoadError::Malformed("<messages> section not found".to_string()))?;
        for msg_node in elements(messages_node) {
            let name = req_attr(msg_node, "name")?;
            // Accept whichever msgtype spelling the dictionary uses.
            let msg_type = msg_node
                .attribute("msgtype")
                .or_else(|| msg_node.attribute("type"))
                .ok_or_else(|| {
                    LoadError::Malformed(format!("<message name=\"{name}\"> has no msgtype"))
                })?;

            let mut fields = header_fields.clone();
            fields.extend(reader.load_fields(&protocol, msg_node)?);
            fields.extend(trailer_fields.iter().cloned());
            resolve_length_companions(&mut fields);

            let descr = MessageDescr::new(name.to_string(), msg_type.to_string(), fields);
            if !protocol.add_message(descr) {
                return Err(LoadError::DuplicateMessage(msg_type.to_string()));
            }
        }

        debug!(
            version = %protocol.version(),
            field_types = protocol.field_types().count(),
            messages = protocol.messages().count(),
            "loaded FIX dictionary"
        );
        Ok(protocol)
    }

    /// Expands one member list (message body, component body, group body,
    /// header or trailer) into a flat `FieldDescr` list.
    fn load_fields(
        &self,
        protocol: &ProtocolDescr,
        parent: Node<'a, 'a>,
    ) -> Result<Vec<FieldDescr>, LoadError> {
        let mut fields = Vec::new();
        for child in elements(parent) {
            match child.tag_name().name() {
                "field" => {
                    let name = req_attr(child, "name")?;
                    let type_id = protocol
                        .field_type_id(name)
                        .ok_or_else(|| LoadError::UnknownField(name.to_string()))?;
                    fields.push(FieldDescr::new(
                        protocol.field_type_by_id(type_id),
                        type_id,
                        is_required(child),
                    ));
                }
                "component" => {
                    let name = req_attr(child, "name")?;
                    let component = self
                        .find_component(name)
                        .ok_or_else(|| LoadError::UnknownField(name.to_string()))?;
                    fields.extend(self.load_fields(protocol, component)?);
                }
                "group" => {
                    let name = req_attr(child, "name")?;
                    let type_id = protocol
                        .field_type_id(name)
                        .ok_or_else(|| LoadError::UnknownField(name.to_string()))?;
                    let field_type = protocol.field_type_by_id(type_id);
                    if field_type.kind != FieldKind::NumInGroup {
                        // Accepted here, rejected when the group is encoded.
                        warn!(tag = field_type.num, name, "group count field is not NumInGroup");
                    }
                    let mut descr = FieldDescr::new(field_type, type_id, is_required(child));
                    let mut subfields = self.load_fields(protocol, child)?;
                    resolve_length_companions(&mut subfields);
                    descr.set_subfields(subfields);
                    fields.push(descr);
                }
                _ => {}
            }
        }
        Ok(fields)
    }

    fn find_component(&self, name: &str) -> Option<Node<'a, 'a>> {
        elements(self.components?).find(|c| c.attribute("name") == Some(name))
    }
}

/// Resolves the Length companion of every data-kind field from the
/// immediately preceding field in the expanded layout.
fn resolve_length_companions(fields: &mut [FieldDescr]) {
    for i in 1..fields.len() {
        if fields[i].kind.is_data() && fields[i - 1].kind == FieldKind::Length {
            fields[i].length_tag = Some(fields[i - 1].tag);
        }
    }
}

fn load_field_types(protocol: &mut ProtocolDescr, fields_node: Node) -> Result<(), LoadError> {
    for field in elements(fields_node) {
        let name = req_attr(field, "name")?;
        let num: u32 = req_attr(field, "number")?
            .parse()
            .map_err(|_| LoadError::Malformed(format!("bad field number for `{name}`")))?;
        let kind: FieldKind = req_attr(field, "type")?.parse().unwrap_or(FieldKind::String);
        let field_type = FieldType {
            num,
            name: name.to_string(),
            kind,
        };
        if !protocol.add_field_type(field_type) {
            return Err(LoadError::DuplicateField(name.to_string()));
        }
    }
    Ok(())
}

fn read_version(root: Node) -> Result<Version, LoadError> {
    // Either a single `version` attribute, or the QuickFIX
    // type/major/minor/servicepack quartet.
    let spelled = match root.attribute("version") {
        Some(v) => v.to_string(),
        None => {
            let kind = req_attr(root, "type")?;
            let major = req_attr(root, "major")?;
            let minor = req_attr(root, "minor")?;
            let service_pack = root.attribute("servicepack").unwrap_or("0");
            if service_pack == "0" {
                format!("{kind}.{major}.{minor}")
            } else {
                format!("{kind}.{major}.{minor}SP{service_pack}")
            }
        }
    };
    spelled
        .parse()
        .map_err(|()| LoadError::UnknownVersion(spelled))
}

/// Structural check of the dictionary grammar. Violations are fatal
/// before any record is built.
fn validate_grammar(root: Node) -> Result<(), LoadError> {
    if root.tag_name().name() != "fix" {
        return Err(LoadError::Malformed(format!(
            "expected <fix> root, found <{}>",
            root.tag_name().name()
        )));
    }
    for sect in elements(root) {
        let sect_name = sect.tag_name().name();
        match sect_name {
            "header" | "trailer" => validate_members(sect)?,
            "messages" => {
                for message in elements(sect) {
                    expect_element(message, "message")?;
                    req_attr(message, "name")?;
                    validate_members(message)?;
                }
            }
            "components" => {
                for component in elements(sect) {
                    expect_element(component, "component")?;
                    req_attr(component, "name")?;
                    validate_members(component)?;
                }
            }
            "fields" => {
                for field in elements(sect) {
                    expect_element(field, "field")?;
                    req_attr(field, "number")?;
                    req_attr(field, "name")?;
                    req_attr(field, "type")?;
                    for value in elements(field) {
                        expect_element(value, "value")?;
                    }
                }
            }
            _ => {
                return Err(LoadError::Malformed(format!(
                    "unexpected element <{sect_name}>"
                )));
            }
        }
    }
    Ok(())
}

fn validate_members(parent: Node) -> Result<(), LoadError> {
    for child in elements(parent) {
        match child.tag_name().name() {
            "field" | "component" => {
                req_attr(child, "name")?;
            }
            "group" => {
                req_attr(child, "name")?;
                validate_members(child)?;
            }
            other => {
                return Err(LoadError::Malformed(format!(
                    "unexpected element <{other}> in <{}>",
                    parent.tag_name().name()
                )));
            }
        }
    }
    Ok(())
}

fn elements<'a>(parent: Node<'a, 'a>) -> impl Iterator<Item = Node<'a, 'a>> {
    parent.children().filter(Node::is_element)
}

fn section<'a>(root: Node<'a, 'a>, name: &'static str) -> Option<Node<'a, 'a>> {
    elements(root).find(|n| n.tag_name().name() == name)
}

fn expect_element(node: Node, name: &str) -> Result<(), LoadError> {
    if node.tag_name().name() == name {
        Ok(())
    } else {
        Err(LoadError::Malformed(format!(
            "expected <{name}>, found <{}>",
            node.tag_name().name()
        )))
    }
}

fn req_attr<'a>(node: Node<'a, '_>, attr: &str) -> Result<&'a str, LoadError> {
    node.attribute(attr).ok_or_else(|| {
        LoadError::Malformed(format!(
            "<{}> element missing `{attr}` attribute",
            node.tag_name().name()
        ))
    })
}

fn is_required(node: Node) -> bool {
    node.attribute("required") == Some("Y")
}

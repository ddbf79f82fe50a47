use crate::utils::error::{EtlError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::collections::HashMap;

/// Prefixes usable in field paths, bound to their ISO 19115-3 namespaces.
pub const NAMESPACES: &[(&str, &str)] = &[
    ("mdb", "http://standards.iso.org/iso/19115/-3/mdb/2.0"),
    ("cit", "http://standards.iso.org/iso/19115/-3/cit/2.0"),
    ("gco", "http://standards.iso.org/iso/19115/-3/gco/1.0"),
    ("mri", "http://standards.iso.org/iso/19115/-3/mri/1.0"),
    ("mcc", "http://standards.iso.org/iso/19115/-3/mcc/1.0"),
    ("mco", "http://standards.iso.org/iso/19115/-3/mco/1.0"),
    ("mrd", "http://standards.iso.org/iso/19115/-3/mrd/1.0"),
    ("mrs", "http://standards.iso.org/iso/19115/-3/mrs/1.0"),
    ("gex", "http://standards.iso.org/iso/19115/-3/gex/1.0"),
    ("gml", "http://www.opengis.net/gml/3.2"),
];

fn namespace_for(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    fn resolved(ns: &ResolveResult, local: &[u8]) -> Result<Self> {
        let namespace = match ns {
            ResolveResult::Bound(namespace) => String::from_utf8_lossy(namespace.0).into_owned(),
            ResolveResult::Unbound => String::new(),
            ResolveResult::Unknown(prefix) => {
                return Err(malformed(format!(
                    "unbound namespace prefix '{}'",
                    String::from_utf8_lossy(prefix)
                )))
            }
        };
        Ok(Self {
            namespace,
            local: String::from_utf8_lossy(local).into_owned(),
        })
    }
}

/// A `.//prefix:name/prefix:name[/@attribute]` selector.
///
/// Selects the first element, in document order, whose ancestry ends with the
/// given steps; with a trailing `@attribute` the attribute's value is read
/// instead of the element text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    steps: Vec<QName>,
    attribute: Option<String>,
}

impl FieldPath {
    pub fn parse(expression: &str) -> Result<Self> {
        let body = expression
            .strip_prefix(".//")
            .or_else(|| expression.strip_prefix("//"))
            .unwrap_or(expression);

        let mut steps = Vec::new();
        let mut attribute = None;
        let segments: Vec<&str> = body.split('/').collect();
        for (index, segment) in segments.iter().enumerate() {
            if let Some(name) = segment.strip_prefix('@') {
                if index + 1 != segments.len() || name.is_empty() {
                    return Err(bad_path(expression, "attribute must be the last step"));
                }
                attribute = Some(name.to_string());
                continue;
            }
            if segment.is_empty() {
                return Err(bad_path(expression, "empty step"));
            }
            let step = match segment.split_once(':') {
                Some((prefix, local)) => QName {
                    namespace: namespace_for(prefix)
                        .ok_or_else(|| bad_path(expression, &format!("unknown prefix '{}'", prefix)))?
                        .to_string(),
                    local: local.to_string(),
                },
                None => QName {
                    namespace: String::new(),
                    local: segment.to_string(),
                },
            };
            steps.push(step);
        }

        if steps.is_empty() {
            return Err(bad_path(expression, "no element steps"));
        }

        Ok(Self { steps, attribute })
    }
}

fn bad_path(expression: &str, reason: &str) -> EtlError {
    EtlError::ConfigError {
        message: format!("invalid field path '{}': {}", expression, reason),
    }
}

fn malformed(reason: impl std::fmt::Display) -> EtlError {
    EtlError::XmlError {
        message: reason.to_string(),
    }
}

#[derive(Debug, Clone)]
struct Element {
    path: Vec<QName>,
    attributes: HashMap<String, String>,
    text: String,
}

/// Flat, namespace-resolved view of a metadata XML document.
#[derive(Debug, Clone)]
pub struct MetadataDocument {
    elements: Vec<Element>,
}

impl MetadataDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut elements: Vec<Element> = Vec::new();
        let mut path: Vec<QName> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            let position = reader.buffer_position();
            match reader.read_resolved_event() {
                Ok((ns, Event::Start(start))) => {
                    path.push(QName::resolved(&ns, start.local_name().as_ref())?);
                    elements.push(Element {
                        path: path.clone(),
                        attributes: read_attributes(&start)?,
                        text: String::new(),
                    });
                    open.push(elements.len() - 1);
                }
                Ok((ns, Event::Empty(start))) => {
                    path.push(QName::resolved(&ns, start.local_name().as_ref())?);
                    elements.push(Element {
                        path: path.clone(),
                        attributes: read_attributes(&start)?,
                        text: String::new(),
                    });
                    path.pop();
                }
                Ok((_, Event::Text(text))) => {
                    if let Some(&index) = open.last() {
                        let text = text.unescape().map_err(malformed)?;
                        elements[index].text.push_str(&text);
                    }
                }
                Ok((_, Event::CData(data))) => {
                    if let Some(&index) = open.last() {
                        elements[index]
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Ok((_, Event::End(_))) => {
                    open.pop();
                    path.pop();
                }
                Ok((_, Event::Eof)) => break,
                Ok(_) => {}
                Err(e) => return Err(malformed(format!("{} at position {}", e, position))),
            }
        }

        if !open.is_empty() {
            return Err(malformed("unexpected end of document"));
        }
        if elements.is_empty() {
            return Err(malformed("document has no root element"));
        }

        Ok(Self { elements })
    }

    /// The whole document as a section.
    pub fn root(&self) -> Section<'_> {
        Section {
            elements: &self.elements,
        }
    }

    /// Text (or attribute value) of the first element matching `path`.
    /// The text is returned as found; callers decide whether blank counts.
    pub fn value(&self, path: &FieldPath) -> Option<&str> {
        self.root().value(path)
    }

    /// Trimmed, non-blank value of the first element matching `path`.
    pub fn text(&self, path: &FieldPath) -> Option<&str> {
        self.root().text(path)
    }

    pub fn sections(&self, path: &FieldPath) -> Vec<Section<'_>> {
        self.root().sections(path)
    }
}

/// One element together with its descendants. Lookups on a section only see
/// elements inside it.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    elements: &'a [Element],
}

impl<'a> Section<'a> {
    pub fn value(&self, path: &FieldPath) -> Option<&'a str> {
        let element = self
            .elements
            .iter()
            .find(|element| element.path.ends_with(&path.steps))?;

        match &path.attribute {
            Some(name) => element.attributes.get(name).map(String::as_str),
            None => Some(element.text.as_str()),
        }
    }

    pub fn text(&self, path: &FieldPath) -> Option<&'a str> {
        self.value(path)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Every element matching `path`, in document order, each with its subtree.
    /// A trailing `@attribute` on `path` is ignored.
    pub fn sections(&self, path: &FieldPath) -> Vec<Section<'a>> {
        let elements = self.elements;
        elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.path.ends_with(&path.steps))
            .map(|(start, element)| {
                let depth = element.path.len();
                let len = elements[start + 1..]
                    .iter()
                    .take_while(|descendant| descendant.path.len() > depth)
                    .count();
                Section {
                    elements: &elements[start..=start + len],
                }
            })
            .collect()
    }
}

fn read_attributes(start: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attributes = HashMap::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(malformed)?;
        // Namespace declarations are resolved by the reader.
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(malformed)?.into_owned();
        attributes.insert(name, value);
    }
    Ok(attributes)
}

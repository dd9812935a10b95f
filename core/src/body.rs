//! Response body classification: JSON first, XML as the fallback.
//!
//! A payload is taken as JSON only when it decodes to a truthy value. Falsy
//! JSON (`null`, `false`, `0`, `""`, `"0"`, `[]`, `{}`) and non-JSON text are
//! handed to the XML parser. Anything the XML parser rejects ends up as no
//! body at all.
//!
//! XML is read from the raw bytes, so a document declaring a non-UTF-8
//! encoding (`GBK`, `ISO-8859-1`, ...) is decoded per its declaration. The
//! reader never fetches DTDs or external entities; an unknown entity
//! reference is reported as a parse error.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::types::{ResponseBody, XmlElement};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error(transparent)]
    Parse(#[from] quick_xml::Error),

    #[error("document has no root element")]
    NoRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("closing tag </{0}> has no matching opening tag")]
    UnexpectedEnd(String),

    #[error("character data outside the root element")]
    StrayText,
}

/// Classify a raw payload. Empty payloads have no body.
pub fn decode_body(raw: &[u8]) -> Option<ResponseBody> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_slice::<Value>(raw) {
        if is_truthy(&value) {
            return Some(ResponseBody::Json(value));
        }
    }

    match parse_xml_bytes(raw) {
        Ok(root) => Some(ResponseBody::Xml(root)),
        Err(err) => {
            debug!(error = %err, "response body is neither JSON nor well-formed XML");
            None
        }
    }
}

/// Loose truthiness of a decoded JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Parse a complete XML document into its root element.
pub fn parse_xml(text: &str) -> Result<XmlElement, XmlError> {
    parse_xml_bytes(text.as_bytes())
}

/// Parse raw XML bytes, honouring the encoding in the XML declaration.
pub fn parse_xml_bytes(raw: &[u8]) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open_element(&start, reader.decoder())?),
            Event::Empty(start) => {
                let element = open_element(&start, reader.decoder())?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(end) => {
                let Some(element) = stack.pop() else {
                    let name = decode(reader.decoder(), end.name().as_ref())?;
                    return Err(XmlError::UnexpectedEnd(name));
                };
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(quick_xml::Error::from)?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(cdata) => {
                let text = decode(reader.decoder(), &cdata)?;
                append_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.ok_or(XmlError::NoRoot)
}

fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String, XmlError> {
    let text = decoder.decode(bytes).map_err(quick_xml::Error::from)?;
    Ok(text.into_owned())
}

fn open_element(start: &BytesStart<'_>, decoder: Decoder) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement {
        name: decode(decoder, start.name().as_ref())?,
        ..XmlElement::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = decode(decoder, attr.key.as_ref())?;
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(quick_xml::Error::from)?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(XmlError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

fn append_text(stack: &mut [XmlElement], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(current) => current.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => return Err(XmlError::StrayText),
    }
    Ok(())
}

pub mod io;

use std::io::BufReader;
use xml::reader::{ParserConfig, XmlEvent};

/// Reasons an inbound envelope is dropped
#[derive(Debug, thiserror::Error)]
pub enum MalformedPacket {
    #[error("XML parse error: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error("root element <{0}> is not a SOAP Envelope")]
    NotAnEnvelope(String),

    #[error("SOAP Body is missing or empty")]
    EmptyBody,

    #[error("missing MessageID header")]
    MissingMessageId,
}

/// What the responder and the dispatcher need to know about an envelope.
/// Elements are matched on their local name, so any namespace prefix works.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[rustfmt::skip]
pub struct EnvelopeSummary {
    pub message_id:     Option<String>,
    pub action:         Option<String>,
    pub body_element:   Option<String>,
}

/// One inbound WS-Discovery datagram, kept only while it is being handled
#[derive(Debug, Clone, PartialEq, Eq)]
#[rustfmt::skip]
pub struct DiscoveryMessage {
    pub message_id:     String,
    pub action:         String,
    pub body_element:   String,
    pub raw_envelope:   String,
}

impl DiscoveryMessage {
    pub fn is_probe(&self) -> bool {
        self.body_element == "Probe"
    }
}

/// Walks the envelope once, picking up the MessageID and Action headers and
/// the local name of the first element inside the Body.
pub fn inspect_envelope(bytes: &[u8]) -> Result<EnvelopeSummary, MalformedPacket> {
    let reader = ParserConfig::new()
        .trim_whitespace(true)
        .create_reader(BufReader::new(bytes));

    let mut summary = EnvelopeSummary::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    for event in reader {
        match event? {
            XmlEvent::StartElement { name, .. } => {
                if path.is_empty() && name.local_name != "Envelope" {
                    return Err(MalformedPacket::NotAnEnvelope(name.local_name));
                }

                if summary.body_element.is_none() && is_body(&path) {
                    summary.body_element = Some(name.local_name.clone());
                }

                path.push(name.local_name);
                text.clear();
            }
            XmlEvent::Characters(chars) | XmlEvent::CData(chars) => text.push_str(&chars),
            XmlEvent::EndElement { .. } => {
                let value = text.trim();

                match header_field(&path) {
                    Some("MessageID") if summary.message_id.is_none() && !value.is_empty() => {
                        summary.message_id = Some(value.to_string());
                    }
                    Some("Action") if summary.action.is_none() && !value.is_empty() => {
                        summary.action = Some(value.to_string());
                    }
                    _ => {}
                }

                path.pop();
                text.clear();
            }
            _ => {}
        }
    }

    Ok(summary)
}

/// Local name of the first element inside the SOAP Body
pub fn body_action(bytes: &[u8]) -> Result<String, MalformedPacket> {
    inspect_envelope(bytes)?
        .body_element
        .ok_or(MalformedPacket::EmptyBody)
}

pub fn parse_discovery(bytes: &[u8]) -> Result<DiscoveryMessage, MalformedPacket> {
    let summary = inspect_envelope(bytes)?;

    let message_id = summary.message_id.ok_or(MalformedPacket::MissingMessageId)?;
    let body_element = summary.body_element.ok_or(MalformedPacket::EmptyBody)?;

    Ok(DiscoveryMessage {
        message_id,
        action: summary.action.unwrap_or_default(),
        body_element,
        raw_envelope: String::from_utf8_lossy(bytes).into_owned(),
    })
}

fn is_body(path: &[String]) -> bool {
    path.len() == 2 && path[1] == "Body"
}

fn header_field(path: &[String]) -> Option<&str> {
    match path {
        [_, header, field] if header == "Header" => Some(field.as_str()),
        _ => None,
    }
}

/// Text of every `element` in `xml`, optionally only inside `ancestor`.
/// Test helper for asserting on rendered replies.
#[cfg(test)]
pub(crate) fn element_text(
    xml: &[u8],
    element: &str,
    ancestor: Option<&str>,
    first_only: bool,
) -> Vec<String> {
    let reader = ParserConfig::new()
        .trim_whitespace(true)
        .create_reader(BufReader::new(xml));

    let mut path: Vec<String> = Vec::new();
    let mut found = Vec::new();

    for event in reader {
        match event {
            Ok(XmlEvent::StartElement { name, .. }) => path.push(name.local_name),
            Ok(XmlEvent::EndElement { .. }) => {
                path.pop();
            }
            Ok(XmlEvent::Characters(text)) => {
                let in_scope = ancestor.map_or(true, |a| path.iter().any(|e| e == a));

                if in_scope && path.last().map(String::as_str) == Some(element) {
                    found.push(text);
                    if first_only {
                        break;
                    }
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }

    found
}

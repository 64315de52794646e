use std::io::BufReader;
use xml::reader::{ParserConfig, XmlEvent};

/// Text of every element named `local_name`, whatever its prefix
pub fn element_text(xml: &[u8], local_name: &str) -> Vec<String> {
    let reader = ParserConfig::new()
        .trim_whitespace(true)
        .create_reader(BufReader::new(xml));

    let mut current: Vec<String> = Vec::new();
    let mut found = Vec::new();

    for event in reader {
        match event.expect("reply is well-formed XML") {
            XmlEvent::StartElement { name, .. } => current.push(name.local_name),
            XmlEvent::EndElement { .. } => {
                current.pop();
            }
            XmlEvent::Characters(text) if current.last().map(String::as_str) == Some(local_name) => {
                found.push(text)
            }
            _ => {}
        }
    }

    found
}

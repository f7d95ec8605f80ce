//! HTTP/SOAP request parsing.
//!
//! Works on whatever bytes a connection had available in one read.  The body
//! is everything after the header block; `Content-Length` is not consulted, so
//! a body that arrives in several segments is seen only partially.

use std::borrow::Cow;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;

/// One parsed SOAP-over-HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapRequest {
    /// Request target from the request line, e.g. `/onvif/device_service`.
    pub path:   String,
    /// Action identifier, usually a fully qualified WSDL operation URI.
    pub action: String,
    /// Raw message body.
    pub body:   String,
}

/// Outcome of parsing one batch of available bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Nothing was available; try again on a later tick.
    Empty,
    /// The request line is not a POST; nothing is answered.
    Ignored(String),
    Request(SoapRequest),
}

/// Parse the bytes of one request.
pub fn parse_request(bytes: &[u8]) -> Parsed {
    if bytes.is_empty() {
        return Parsed::Empty;
    }
    let owned = String::from_utf8_lossy(bytes);
    let text: &str = &owned;

    let (request_line, mut rest) = text.split_once('\n').unwrap_or((text, ""));
    if !request_line.contains("POST") {
        return Parsed::Ignored(request_line.trim_end().to_string());
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let mut headers = Vec::new();
    while !rest.is_empty() {
        let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
        rest = tail;
        if line == "\r" || line.is_empty() {
            break;
        }
        headers.push(line.trim_end_matches('\r'));
    }

    Parsed::Request(SoapRequest {
        path,
        action: extract_action(&headers),
        body: rest.to_string(),
    })
}

/// Find the action identifier among the header lines.
///
/// `SOAPAction: "<action>"` wins.  Without it, the SOAP 1.2 `action="..."`
/// parameter of `Content-Type` is used.  A missing header or an unterminated
/// quote yields the empty string.
pub fn extract_action(headers: &[&str]) -> String {
    let header = |wanted: &str| {
        headers.iter().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim().eq_ignore_ascii_case(wanted).then_some(value)
        })
    };

    if let Some(value) = header("SOAPAction") {
        return quoted(value).unwrap_or_default().to_string();
    }
    header("Content-Type")
        .and_then(|value| {
            let at = value.to_ascii_lowercase().find("action=")?;
            quoted(&value[at..])
        })
        .unwrap_or_default()
        .to_string()
}

/// Text between the first pair of double quotes in `s`.
fn quoted(s: &str) -> Option<&str> {
    let start = s.find('"')? + 1;
    let len = s[start..].find('"')?;
    Some(&s[start..start + len])
}

impl SoapRequest {
    /// Raw inner markup of the envelope's `Body` element, whatever its prefix.
    pub fn soap_body(&self) -> Option<Cow<'_, str>> {
        let mut reader = Reader::from_str(&self.body);
        loop {
            match reader.read_event().ok()? {
                Event::Start(e) if e.local_name().as_ref() == b"Body" => {
                    let end = e.to_end().into_owned();
                    return reader.read_text(end.name()).ok();
                }
                Event::Eof => return None,
                _ => {}
            }
        }
    }

    /// `ProfileToken` named inside the SOAP body, if any.
    pub fn profile_token(&self) -> Option<String> {
        let body = self.soap_body();
        let scope = body.as_deref().unwrap_or(&self.body);
        element_text(scope, b"ProfileToken")
    }
}

/// Decoded, trimmed text of the first element whose local name is `local`.
/// Entities and CDATA sections are resolved; malformed XML yields `None`.
fn element_text(xml: &str, local: &[u8]) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().ok()? {
            Event::Start(e) if e.local_name().as_ref() == local => break,
            Event::Eof => return None,
            _ => {}
        }
    }

    let mut text = String::new();
    let mut depth: u32 = 0;
    loop {
        match reader.read_event().ok()? {
            Event::Text(e) => {
                let decoded = e.decode().ok()?;
                text.push_str(&unescape(&decoded).ok()?);
            }
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::GeneralRef(e) => match e.resolve_char_ref().ok()? {
                Some(ch) => text.push(ch),
                None => {
                    let name = e.decode().ok()?;
                    text.push_str(resolve_predefined_entity(&name)?);
                }
            },
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Some(text.trim().to_string()),
            Event::End(_) => depth -= 1,
            Event::Eof => return None,
            _ => {}
        }
    }
}

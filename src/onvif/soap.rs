//! SOAP envelope and fault builders, plus HTTP framing of the result.
//!
//! Every document leaves this module as an HTTP 200: SOAP-level errors are
//! reported only inside the fault body, never through the status line.

pub const NS_SOAP: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const NS_TDS:  &str = "http://www.onvif.org/ver10/device/wsdl";
pub const NS_TRT:  &str = "http://www.onvif.org/ver10/media/wsdl";
pub const NS_TT:   &str = "http://www.onvif.org/ver10/schema";

const CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// SOAP fault code carried in `<soap:Code><soap:Value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    /// The request named something this device does not offer.
    Client,
    /// The request is understood but the device cannot answer it.
    Server,
}

impl FaultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::Client => "soap:Client",
            FaultCode::Server => "soap:Server",
        }
    }
}

// ── Builder: success envelope ────────────────────────────────────────────────

/// Wrap `body` in a complete envelope whose body element is `action`.
///
/// `body` is inserted verbatim; callers are responsible for escaping any
/// dynamic text inside it.
pub fn build_response(action: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="{NS_SOAP}" xmlns:tds="{NS_TDS}" xmlns:trt="{NS_TRT}" xmlns:tt="{NS_TT}">
    <soap:Body>
        <{action}>{body}</{action}>
    </soap:Body>
</soap:Envelope>"#
    )
}

// ── Builder: fault envelope ──────────────────────────────────────────────────

pub fn build_fault(code: FaultCode, reason: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="{NS_SOAP}">
    <soap:Body>
        <soap:Fault>
            <soap:Code>
                <soap:Value>{code}</soap:Value>
            </soap:Code>
            <soap:Reason>
                <soap:Text>{reason}</soap:Text>
            </soap:Reason>
        </soap:Fault>
    </soap:Body>
</soap:Envelope>"#,
        code = code.as_str(),
        reason = xml_escape(reason),
    )
}

// ── HTTP framing ─────────────────────────────────────────────────────────────

/// Frame `document` as a complete `HTTP/1.1 200 OK` response.
pub fn serialize_as_http(document: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {CONTENT_TYPE}\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {document}",
        document.len()
    )
}

pub fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

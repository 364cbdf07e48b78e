//! XML codec for the device's request and response documents.
//!
//! Requests are flat `<request>` documents built from ordered field/value
//! pairs. Responses are flat `<response>` documents, except for rejections,
//! which arrive as an `<error>` document; callers dispatch on [`root_name`]
//! before deserializing.

use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Build a request document from ordered (field, value) pairs.
#[must_use]
pub fn request_body(fields: &[(&str, &str)]) -> String {
    let mut body = String::from(XML_DECL);
    body.push_str("<request>");
    for (field, value) in fields {
        body.push_str(&format!("<{field}>{}</{field}>", escape(*value)));
    }
    body.push_str("</request>");
    body
}

/// Name of the document's root element.
///
/// # Errors
/// Returns `Error::Protocol` on malformed or empty documents.
pub fn root_name(document: &str) -> Result<String> {
    let mut reader = Reader::from_str(document);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                return Ok(String::from_utf8_lossy(start.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) => return Err(Error::Protocol("empty XML document".to_string())),
            Ok(_) => {}
            Err(e) => return Err(Error::Protocol(format!("malformed XML: {e}"))),
        }
    }
}

/// Deserialize a response document.
///
/// # Errors
/// Returns `Error::Protocol` if the document does not carry the expected
/// fields.
pub fn parse<T: DeserializeOwned>(document: &str) -> Result<T> {
    quick_xml::de::from_str(document)
        .map_err(|e| Error::Protocol(format!("unexpected response document: {e}")))
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenDoc {
    pub token: String,
}

/// Phase-one challenge response.
#[derive(Debug, Deserialize)]
pub struct ChallengeDoc {
    pub servernonce: String,
    pub salt: String,
    pub iterations: u32,
}

/// Phase-two authentication response.
#[derive(Debug, Deserialize)]
pub struct AuthDoc {
    pub serversignature: String,
    pub rsapubkeysignature: String,
    pub rsan: String,
    pub rsae: String,
}

/// Device rejection document.
#[derive(Debug, Deserialize)]
pub struct ErrorDoc {
    pub code: Option<u32>,
    pub waittime: Option<u64>,
}

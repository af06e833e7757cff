//! Serializable snapshot of an HTTP response.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use crate::error::TaskError;
use crate::task::{RESPONSE, Value};

/// A fetched page, as carried by the `response` attribute of scrape tasks
///
/// Header names are lowercase. `url` is the final URL after redirects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Canonical reason phrase ("OK", "Not Found", ...)
    pub reason: String,
    /// Final URL after redirects
    pub url: String,
    /// Response headers with lowercase names
    pub headers: BTreeMap<String, String>,
    /// Raw body
    pub content: Vec<u8>,
    /// Charset declared by the `content-type` header
    pub encoding: Option<String>,
    /// Whether the status is below 400
    pub ok: bool,
}

impl HttpResponse {
    /// Header value by (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Media type of the body, lowercased and without parameters
    ///
    /// Defaults to `text/html` when the header is missing.
    pub fn media_type(&self) -> String {
        self.header("content-type")
            .and_then(|ct| ct.split(';').next())
            .map(|mt| mt.trim().to_ascii_lowercase())
            .filter(|mt| !mt.is_empty())
            .unwrap_or_else(|| "text/html".to_string())
    }

    /// Charset of the body
    ///
    /// The recorded `encoding` wins, then the `content-type` charset. An
    /// unknown or missing label falls back to UTF-8 when the body is valid
    /// UTF-8, otherwise to a guess from the bytes.
    pub fn charset(&self) -> &'static Encoding {
        self.encoding
            .clone()
            .or_else(|| self.header("content-type").and_then(charset_param))
            .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
            .unwrap_or_else(|| self.detect_charset())
    }

    fn detect_charset(&self) -> &'static Encoding {
        if std::str::from_utf8(&self.content).is_ok() {
            return encoding_rs::UTF_8;
        }
        let mut detector = EncodingDetector::new();
        detector.feed(&self.content, true);
        detector.guess(None, true)
    }

    /// Body decoded with [`HttpResponse::charset`], replacing invalid sequences
    ///
    /// A byte order mark overrides the declared charset.
    pub fn text(&self) -> Cow<'_, str> {
        let (text, _, _) = self.charset().decode(&self.content);
        text
    }

    /// Encode as a task attribute value
    pub fn to_value(&self) -> Value {
        let headers: BTreeMap<String, Value> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();

        let mut map = BTreeMap::new();
        map.insert("status_code".to_string(), Value::from(u32::from(self.status_code)));
        map.insert("reason".to_string(), Value::from(self.reason.as_str()));
        map.insert("url".to_string(), Value::from(self.url.as_str()));
        map.insert("headers".to_string(), Value::Map(headers));
        map.insert("content".to_string(), Value::Bytes(self.content.clone()));
        map.insert("encoding".to_string(), Value::from(self.encoding.clone()));
        map.insert("ok".to_string(), Value::from(self.ok));
        Value::Map(map)
    }
}

/// Charset parameter of a `content-type` header value
pub(crate) fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn invalid() -> TaskError {
    TaskError::InvalidAttribute {
        key: RESPONSE.to_string(),
        expected: "an HTTP response map",
    }
}

impl TryFrom<&Value> for HttpResponse {
    type Error = TaskError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let map = value.as_map().ok_or_else(invalid)?;
        let str_field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        let status_code = map
            .get("status_code")
            .and_then(Value::as_int)
            .and_then(|code| u16::try_from(code).ok())
            .ok_or_else(invalid)?;

        let headers = match map.get("headers") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(headers) => headers
                .as_map()
                .ok_or_else(invalid)?
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.to_ascii_lowercase(), v.to_string())))
                .collect(),
        };

        let content = match map.get("content") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Bytes(bytes)) => bytes.clone(),
            Some(Value::Str(text)) => text.as_bytes().to_vec(),
            Some(_) => return Err(invalid()),
        };

        Ok(Self {
            status_code,
            reason: str_field("reason").unwrap_or_default(),
            url: str_field("url").unwrap_or_default(),
            headers,
            content,
            encoding: str_field("encoding"),
            ok: map
                .get("ok")
                .and_then(Value::as_bool)
                .unwrap_or(status_code < 400),
        })
    }
}

impl From<&HttpResponse> for Value {
    fn from(response: &HttpResponse) -> Self {
        response.to_value()
    }
}

impl From<HttpResponse> for Value {
    fn from(response: HttpResponse) -> Self {
        response.to_value()
    }
}

impl fmt::Display for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<HttpResponse {} ({})>", self.status_code, self.url)
    }
}

//! Caller-facing request descriptions.
//!
//! # Design
//! `RequestSpec` is the input of the raw `send` machine. `Target` is the
//! smaller input shared by the shortcut verbs; it turns into a
//! `RequestSpec` once the verb is known, which is all a shortcut adds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RequestError;
use crate::http::HttpMethod;

/// How a request body is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    #[default]
    Json,
    FormUrlencoded,
    Multipart,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::FormUrlencoded => "form-urlencoded",
            Encoding::Multipart => "multipart",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Encoding::Json),
            "form-urlencoded" | "form" => Ok(Encoding::FormUrlencoded),
            "multipart" => Ok(Encoding::Multipart),
            other => Err(RequestError::Encoding(format!(
                "unsupported encoding mode `{other}`"
            ))),
        }
    }
}

/// Everything the raw `send` machine needs to build one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSpec {
    /// Verb, matched case-insensitively. Empty means GET.
    pub method: String,
    /// Absolute URL, or a path when `base_url` is set.
    pub url: String,
    pub base_url: Option<String>,
    /// Later entries win over earlier ones with the same name.
    pub headers: Vec<(String, String)>,
    /// Mapping encoded into the query string.
    pub query: Option<Value>,
    /// Payload serialized under `encoding`. Folded into the query for GET.
    pub body: Option<Value>,
    pub encoding: Encoding,
}

impl RequestSpec {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Inputs of the shortcut verbs and the streaming GET.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Target {
    pub url: String,
    pub base_url: Option<String>,
    /// Query data for GET, JSON body for every other verb.
    pub data: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn into_spec(self, method: HttpMethod) -> RequestSpec {
        let (query, body) = match method {
            HttpMethod::Get => (self.data, None),
            _ => (None, self.data),
        };
        RequestSpec {
            method: method.as_str().to_string(),
            url: self.url,
            base_url: self.base_url,
            headers: self.headers,
            query,
            body,
            encoding: Encoding::Json,
        }
    }
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Target::new(url)
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Target::new(url)
    }
}

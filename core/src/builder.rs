//! Builds a transport-ready `HttpRequest` from a `RequestSpec`.
//!
//! # Design
//! Building is pure and synchronous: every input or encoding problem
//! surfaces here as a `RequestError`, before a transport is involved.
//!
//! Header precedence, lowest first: headers implied by the body encoding,
//! then client defaults, then the request's own headers. A later header
//! replaces an earlier one with the same name (compared case-insensitively).

use serde_json::{Map, Value};
use url::form_urlencoded;
use url::Url;
use uuid::Uuid;

use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest};
use crate::resolve::resolve;
use crate::types::{Encoding, RequestSpec};

pub const CONTENT_TYPE: &str = "Content-Type";

pub fn build_request(
    spec: &RequestSpec,
    default_headers: &[(String, String)],
) -> Result<HttpRequest, RequestError> {
    let method: HttpMethod = spec.method.parse()?;
    let resolved = resolve(spec.base_url.as_deref(), &spec.url)?;

    let mut pairs = Vec::new();
    if let Some(query) = &spec.query {
        query_pairs(query, &mut pairs)?;
    }

    let mut headers = Vec::new();
    let body = match (&spec.body, method) {
        (Some(payload), HttpMethod::Get) => {
            query_pairs(payload, &mut pairs)?;
            None
        }
        (Some(payload), _) => {
            let (content_type, body) = encode_body(payload, spec.encoding)?;
            merge_header(&mut headers, CONTENT_TYPE, &content_type);
            Some(body)
        }
        (None, _) => None,
    };

    for (name, value) in default_headers.iter().chain(&spec.headers) {
        merge_header(&mut headers, name, value);
    }
    for (name, value) in &headers {
        validate_header(name, value)?;
    }

    let url = if pairs.is_empty() {
        resolved
    } else {
        let mut url = Url::parse(&resolved)
            .map_err(|e| RequestError::InputValidation(format!("invalid URL `{resolved}`: {e}")))?;
        url.query_pairs_mut().extend_pairs(pairs);
        url.to_string()
    };

    Ok(HttpRequest {
        method,
        url,
        headers,
        body,
    })
}

/// Insert a header, replacing any existing one with the same name.
pub fn merge_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        Some(slot) => *slot = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), RequestError> {
    ::http::HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RequestError::InputValidation(format!("invalid header name `{name}`")))?;
    ::http::HeaderValue::from_str(value).map_err(|_| {
        RequestError::InputValidation(format!("invalid value for header `{name}`"))
    })?;
    Ok(())
}

/// Serialize `payload` and return it with its implied content type.
pub fn encode_body(payload: &Value, encoding: Encoding) -> Result<(String, String), RequestError> {
    match encoding {
        Encoding::Json => {
            let body = serde_json::to_string(payload)
                .map_err(|e| RequestError::Encoding(e.to_string()))?;
            Ok(("application/json".to_string(), body))
        }
        Encoding::FormUrlencoded => {
            let fields = flat_fields(payload, encoding)?;
            let body = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields)
                .finish();
            Ok(("application/x-www-form-urlencoded".to_string(), body))
        }
        Encoding::Multipart => {
            let fields = flat_fields(payload, encoding)?;
            let boundary = format!("------------------------{}", Uuid::new_v4().simple());
            Ok((
                format!("multipart/form-data; boundary={boundary}"),
                multipart_body(&fields, &boundary),
            ))
        }
    }
}

fn multipart_body(fields: &[(String, String)], boundary: &str) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        let name = name
            .replace('"', "%22")
            .replace('\r', "%0D")
            .replace('\n', "%0A");
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}

/// Form and multipart bodies only take a mapping of scalars.
fn flat_fields(payload: &Value, encoding: Encoding) -> Result<Vec<(String, String)>, RequestError> {
    let Value::Object(map) = payload else {
        return Err(RequestError::Encoding(format!(
            "{encoding} bodies require a mapping, got {}",
            kind_of(payload)
        )));
    };
    map.iter()
        .map(|(name, value)| {
            scalar_text(value).map(|text| (name.clone(), text)).ok_or_else(|| {
                RequestError::Encoding(format!(
                    "field `{name}` is {}; {encoding} bodies require a flat mapping",
                    kind_of(value)
                ))
            })
        })
        .collect()
}

/// Flatten a query mapping, using bracket keys for nested values
/// (`a[b]=1`, `list[0]=x`).
fn query_pairs(query: &Value, out: &mut Vec<(String, String)>) -> Result<(), RequestError> {
    let Value::Object(map) = query else {
        return Err(RequestError::Encoding(format!(
            "query data must be a mapping, got {}",
            kind_of(query)
        )));
    };
    flatten_object(None, map, out);
    Ok(())
}

fn flatten_object(prefix: Option<&str>, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let key = match prefix {
            Some(prefix) => format!("{prefix}[{key}]"),
            None => key.clone(),
        };
        flatten_value(&key, value, out);
    }
}

fn flatten_value(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => flatten_object(Some(key), map, out),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(&format!("{key}[{index}]"), item, out);
            }
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                out.push((key.to_string(), text));
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

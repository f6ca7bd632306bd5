//! Client-wide defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Used when a request has no base URL of its own and its `url` is a
    /// path starting with `/`.
    pub base_url: Option<String>,
    /// Sent with every request unless the request sets the same header.
    pub headers: BTreeMap<String, String>,
    /// Sent as `User-Agent` below any explicit `User-Agent` header.
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn from_json(raw: &str) -> Result<Self, RequestError> {
        serde_json::from_str(raw)
            .map_err(|e| RequestError::InputValidation(format!("invalid client config: {e}")))
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub(crate) fn default_headers(&self) -> Vec<(String, String)> {
        self.user_agent
            .iter()
            .map(|agent| ("User-Agent".to_string(), agent.clone()))
            .chain(
                self.headers
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            )
            .collect()
    }
}

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::HttpApiError;

/// Decoded response body.
///
/// Body decoding never fails: JSON parses to `Json`, any other non-empty
/// text degrades to `Text`, and an empty body is `Empty`. A plain-text error
/// page therefore still reaches the caller as data instead of aborting the
/// pipeline before status classification.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Json(Value),
    Text(String),
    Empty,
}

impl ResponseData {
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Self::Json(value),
            Err(_) if text.is_empty() => Self::Empty,
            Err(_) => Self::Text(text.to_owned()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Status, headers and decoded body of one completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: u16,
    /// Header names lowercased for case-insensitive lookup.
    pub headers: BTreeMap<String, String>,
    pub data: ResponseData,
}

impl ResponseEnvelope {
    /// Drain a transport response into an envelope. Reading the body is the
    /// only fallible step; decoding it is not.
    pub async fn read(response: reqwest::Response) -> Result<Self, HttpApiError> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let text = response.text().await.map_err(HttpApiError::Transport)?;
        Ok(Self {
            status,
            headers,
            data: ResponseData::from_text(&text),
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Deserialize the JSON body into a typed model.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpApiError> {
        match &self.data {
            ResponseData::Json(value) => Ok(serde_json::from_value(value.clone())?),
            ResponseData::Text(text) => Ok(serde_json::from_str(text)?),
            ResponseData::Empty => Ok(serde_json::from_value(Value::Null)?),
        }
    }
}

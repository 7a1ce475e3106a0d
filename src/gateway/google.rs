use serde_json::{json, Value};

use super::GatewayError;

pub const GOOGLE_DOCS_TOKEN_ENV: &str = "GOOGLE_DOCS_TOKEN";
const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1/documents";

/// Concatenate every text run in a `documents.get` response body.
pub fn document_text(doc: &Value) -> String {
    let mut text = String::new();
    let content = doc
        .pointer("/body/content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for element in content {
        let Some(runs) = element
            .pointer("/paragraph/elements")
            .and_then(Value::as_array)
        else {
            continue;
        };
        for run in runs {
            if let Some(s) = run.pointer("/textRun/content").and_then(Value::as_str) {
                text.push_str(s);
            }
        }
    }

    // Every Docs body ends with a paragraph terminator that is not content.
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

/// Index at which appended text lands: just before the body's final newline.
pub fn append_index(doc: &Value) -> Result<u64, GatewayError> {
    let Some(last) = doc
        .pointer("/body/content")
        .and_then(Value::as_array)
        .and_then(|c| c.last())
    else {
        return Ok(1);
    };

    let end = last
        .get("endIndex")
        .and_then(Value::as_u64)
        .ok_or_else(|| GatewayError::Malformed("last structural element has no endIndex".into()))?;
    Ok(end.saturating_sub(1).max(1))
}

pub fn insert_text_request(index: u64, text: &str) -> Value {
    json!({
        "requests": [
            {
                "insertText": {
                    "location": { "index": index },
                    "text": text,
                }
            }
        ]
    })
}

#[cfg_attr(not(feature = "gdocs"), allow(dead_code))]
fn document_url(doc_id: &str) -> String {
    format!("{DOCS_API_BASE}/{doc_id}")
}

#[cfg_attr(not(feature = "gdocs"), allow(dead_code))]
fn batch_update_url(doc_id: &str) -> String {
    format!("{DOCS_API_BASE}/{doc_id}:batchUpdate")
}

#[cfg(feature = "gdocs")]
mod client {
    use anyhow::{Context, Result};
    use reqwest::StatusCode;
    use serde_json::Value;

    use super::*;
    use crate::document::DocumentId;
    use crate::gateway::DocumentGateway;

    /// Google Docs REST backend authenticated with a bearer access token.
    #[derive(Debug)]
    pub struct GoogleDocsGateway {
        runtime: tokio::runtime::Runtime,
        client: reqwest::Client,
        token: String,
    }

    impl GoogleDocsGateway {
        pub fn from_env() -> Result<Self> {
            dotenvy::dotenv().ok();
            let token = std::env::var(GOOGLE_DOCS_TOKEN_ENV)
                .with_context(|| format!("{GOOGLE_DOCS_TOKEN_ENV} is not set"))?;
            Self::new(token)
        }

        pub fn new(token: impl Into<String>) -> Result<Self> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start tokio runtime")?;
            let client = reqwest::Client::builder()
                .user_agent("typist")
                .build()
                .context("failed to build HTTP client")?;

            Ok(Self {
                runtime,
                client,
                token: token.into(),
            })
        }

        fn get_document(&self, doc: &DocumentId) -> Result<Value, GatewayError> {
            self.runtime.block_on(async {
                let response = self
                    .client
                    .get(document_url(doc.as_str()))
                    .bearer_auth(&self.token)
                    .send()
                    .await
                    .map_err(|err| GatewayError::Transport(err.to_string()))?;
                let response = check_status(doc, response)?;
                response
                    .json::<Value>()
                    .await
                    .map_err(|err| GatewayError::Malformed(err.to_string()))
            })
        }

        fn batch_update(&self, doc: &DocumentId, body: &Value) -> Result<(), GatewayError> {
            self.runtime.block_on(async {
                let response = self
                    .client
                    .post(batch_update_url(doc.as_str()))
                    .bearer_auth(&self.token)
                    .json(body)
                    .send()
                    .await
                    .map_err(|err| GatewayError::Transport(err.to_string()))?;
                check_status(doc, response).map(|_| ())
            })
        }
    }

    fn check_status(
        doc: &DocumentId,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        match response.status() {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(doc.clone())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GatewayError::Auth(format!(
                "Docs API returned {} for {doc}",
                response.status()
            ))),
            s => Err(GatewayError::Transport(format!(
                "Docs API returned {s} for {doc}"
            ))),
        }
    }

    impl DocumentGateway for GoogleDocsGateway {
        fn fetch(&mut self, doc: &DocumentId) -> Result<String, GatewayError> {
            let body = self.get_document(doc)?;
            Ok(document_text(&body))
        }

        fn append(&mut self, doc: &DocumentId, text: &str) -> Result<(), GatewayError> {
            // The target grows between calls; read its end every time.
            let current = self.get_document(doc)?;
            let index = append_index(&current)?;
            tracing::debug!(doc = %doc, index, len = text.len(), "docs insertText");
            self.batch_update(doc, &insert_text_request(index, text))
        }
    }
}

#[cfg(feature = "gdocs")]
pub use client::GoogleDocsGateway;

#[cfg(not(feature = "gdocs"))]
mod client {
    use anyhow::{anyhow, Result};

    use crate::document::DocumentId;
    use crate::gateway::{DocumentGateway, GatewayError};

    #[derive(Debug)]
    pub struct GoogleDocsGateway;

    impl GoogleDocsGateway {
        pub fn from_env() -> Result<Self> {
            Err(anyhow!(
                "Google Docs support is disabled (build with --features gdocs)"
            ))
        }

        pub fn new(_token: impl Into<String>) -> Result<Self> {
            Err(anyhow!(
                "Google Docs support is disabled (build with --features gdocs)"
            ))
        }
    }

    impl DocumentGateway for GoogleDocsGateway {
        fn fetch(&mut self, _doc: &DocumentId) -> Result<String, GatewayError> {
            Err(GatewayError::Transport(
                "Google Docs support is disabled".to_string(),
            ))
        }

        fn append(&mut self, _doc: &DocumentId, _text: &str) -> Result<(), GatewayError> {
            Err(GatewayError::Transport(
                "Google Docs support is disabled".to_string(),
            ))
        }
    }
}

#[cfg(not(feature = "gdocs"))]
pub use client::GoogleDocsGateway;

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: Value) -> Value {
        json!({ "documentId": "x", "body": { "content": content } })
    }

    #[test]
    fn extracts_text_runs_across_paragraphs() {
        let body = doc(json!([
            { "endIndex": 1, "sectionBreak": {} },
            { "endIndex": 12, "paragraph": { "elements": [
                { "textRun": { "content": "Hello " } },
                { "textRun": { "content": "world\n" } }
            ]}},
            { "endIndex": 19, "paragraph": { "elements": [
                { "textRun": { "content": "again\n" } },
                { "inlineObjectElement": {} }
            ]}},
            { "endIndex": 20, "table": {} }
        ]));
        assert_eq!(document_text(&body), "Hello world\nagain");
        assert_eq!(append_index(&body).unwrap(), 19);
    }

    #[test]
    fn empty_body_appends_at_one() {
        assert_eq!(document_text(&json!({})), "");
        assert_eq!(append_index(&json!({})).unwrap(), 1);
        assert_eq!(append_index(&doc(json!([]))).unwrap(), 1);
    }

    #[test]
    fn missing_end_index_is_malformed() {
        let body = doc(json!([{ "paragraph": {} }]));
        assert!(matches!(
            append_index(&body),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn builds_insert_text_request() {
        let req = insert_text_request(7, "hi ");
        assert_eq!(req["requests"][0]["insertText"]["location"]["index"], 7);
        assert_eq!(req["requests"][0]["insertText"]["text"], "hi ");
        assert!(batch_update_url("abc").ends_with("/abc:batchUpdate"));
    }
}

//! Firestore REST (v1) document store.
//!
//! Only the two calls the updater needs are implemented: paged
//! `documents.list` and masked `documents.patch`.

use crate::domain::model::{Document, FieldMap, FieldValue};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{Result, UpdaterError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";
const DEFAULT_PAGE_SIZE: usize = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub database: String,
    pub base_url: String,
    /// OAuth2 access token or emulator `owner` token.
    pub token: Option<String>,
    pub page_size: usize,
    pub timeout: Duration,
}

impl FirestoreSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.database
        )
    }
}

#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Client,
    settings: FirestoreSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    pub fn new(settings: FirestoreSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FirestoreSettings {
        &self.settings
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.settings.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Each segment is percent-encoded, so ids holding `#`, `?` or `/` stay one path segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let root = self.settings.documents_root();
        let invalid = |reason: String| UpdaterError::InvalidConfigValueError {
            field: "firestore.base_url".to_string(),
            value: root.clone(),
            reason,
        };

        let mut url = Url::parse(&root).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(&[collection])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &self.settings.page_size.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            tracing::debug!("Listing Firestore documents: {}", url);
            let response = self.authorized(self.client.get(url)).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(UpdaterError::StoreReadError {
                    collection: collection.to_string(),
                    message: format!("HTTP {}: {}", status, body.trim()),
                });
            }

            let page: ListDocumentsResponse = response.json().await?;
            for raw in page.documents {
                documents.push(decode_document(raw));
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: &FieldMap) -> Result<()> {
        let write_error = |message: String| UpdaterError::StoreWriteError {
            id: id.to_string(),
            message,
        };

        let mut url = self.url(&[collection, id])?;
        {
            let mut query = url.query_pairs_mut();
            for key in fields.keys() {
                query.append_pair("updateMask.fieldPaths", key);
            }
            // 與 update() 相同語意：文件已刪除 (已售出) 時不重建
            query.append_pair("currentDocument.exists", "true");
        }

        let body: Map<String, Value> = fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect();

        let response = self
            .authorized(self.client.patch(url))
            .json(&json!({ "fields": body }))
            .send()
            .await
            .map_err(|e| write_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(write_error(format!("HTTP {}: {}", status, body.trim())));
        }

        Ok(())
    }
}

fn decode_document(raw: RawDocument) -> Document {
    let id = raw.name.rsplit('/').next().unwrap_or_default().to_string();
    let fields = raw
        .fields
        .into_iter()
        .map(|(key, value)| (key, decode_value(value)))
        .collect();
    Document::new(id, fields)
}

pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        // int64 在 REST 中以字串傳送
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::AutoSi, true) })
        }
        FieldValue::Other(raw) => raw.clone(),
    }
}

pub fn decode_value(value: Value) -> FieldValue {
    let decoded = match &value {
        Value::Object(obj) if obj.len() == 1 => obj.iter().next().and_then(|(kind, inner)| {
            match kind.as_str() {
                "nullValue" => Some(FieldValue::Null),
                "booleanValue" => inner.as_bool().map(FieldValue::Bool),
                "integerValue" => match inner {
                    Value::String(s) => s.parse().ok().map(FieldValue::Integer),
                    other => other.as_i64().map(FieldValue::Integer),
                },
                "doubleValue" => inner.as_f64().map(FieldValue::Double),
                "stringValue" => inner.as_str().map(|s| FieldValue::String(s.to_string())),
                "timestampValue" => inner
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc))),
                _ => None,
            }
        }),
        _ => None,
    };
    decoded.unwrap_or(FieldValue::Other(value))
}

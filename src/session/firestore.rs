//! Firestore REST backend
//!
//! Talks to the public `v1` REST surface directly:
//!
//! - reads: `GET {documents}/{path}` and `POST {parent}:runQuery`
//! - merges: `PATCH {documents}/{path}?updateMask.fieldPaths=..`, which only
//!   touches the listed fields
//! - overwrites: `PATCH` without a mask
//!
//! Only string and string-array values are written. Other value types coming
//! back from the server are flattened to text.

use super::{Document, DocumentPath, DocumentStore, FieldValue, Fields, StoreError, StoreFuture};
use crate::util::truncate;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

#[derive(Debug, Clone)]
pub struct FirestoreOptions {
    pub endpoint: String,
    pub project_id: String,
    /// Web API key, sent as `?key=`
    pub api_key: Option<String>,
    /// Firebase ID token, sent as a bearer token
    pub id_token: Option<String>,
    pub timeout: Duration,
}

impl FirestoreOptions {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            endpoint: FIRESTORE_ENDPOINT.to_string(),
            project_id: project_id.into(),
            api_key: None,
            id_token: None,
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FirestoreStore {
    http: reqwest::Client,
    documents_root: Url,
    api_key: Option<String>,
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RestDocument>,
}

#[derive(Deserialize)]
struct RestErrorBody {
    error: RestError,
}

#[derive(Deserialize)]
struct RestError {
    #[serde(default)]
    message: String,
}

impl FirestoreStore {
    pub fn new(options: FirestoreOptions) -> Result<Self, StoreError> {
        let root = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            options.endpoint.trim_end_matches('/'),
            options.project_id
        );
        let documents_root =
            Url::parse(&root).map_err(|e| StoreError::InvalidPath(format!("{}: {}", root, e)))?;
        let http = reqwest::Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            http,
            documents_root,
            api_key: options.api_key,
            id_token: options.id_token,
        })
    }

    /// `documents_root` + path segments, with `suffix` glued onto the last one
    fn url_for(&self, segments: &[&str], suffix: &str) -> Result<Url, StoreError> {
        let mut url = self.documents_root.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidPath(self.documents_root.to_string()))?;
            match segments.split_last() {
                Some((last, rest)) => {
                    parts.extend(rest.iter().copied());
                    parts.push(&format!("{}{}", last, suffix));
                }
                None => {
                    // Suffix applies to the `documents` segment itself
                    parts.pop();
                    parts.push(&format!("documents{}", suffix));
                }
            }
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<(u16, String), StoreError> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }

    fn rejected(status: u16, text: &str) -> StoreError {
        let message = serde_json::from_str::<RestErrorBody>(text)
            .map(|body| body.error.message)
            .unwrap_or_else(|_| truncate(text, 200));
        StoreError::Rejected { status, message }
    }

    /// Convert a REST document name back into a collection-relative path
    fn relative_path(&self, name: &str) -> Result<DocumentPath, StoreError> {
        let marker = "/documents/";
        let relative = name
            .find(marker)
            .map(|idx| &name[idx + marker.len()..])
            .ok_or_else(|| StoreError::Malformed(format!("unexpected document name '{}'", name)))?;
        DocumentPath::parse(relative)
    }

    fn decode_document(&self, doc: RestDocument) -> Result<Document, StoreError> {
        Ok(Document {
            path: self.relative_path(&doc.name)?,
            fields: decode_fields(&doc.fields),
        })
    }

    async fn patch(
        &self,
        path: &DocumentPath,
        fields: Fields,
        mask: bool,
    ) -> Result<(), StoreError> {
        let segments: Vec<&str> = path.as_str().split('/').collect();
        let mut url = self.url_for(&segments, "")?;
        if mask {
            let mut pairs = url.query_pairs_mut();
            for key in fields.keys() {
                pairs.append_pair("updateMask.fieldPaths", &quote_field_path(key));
            }
        }

        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .authorize(self.http.patch(url))
            .json(&body)
            .send()
            .await?;
        let (status, text) = Self::read_body(response).await?;
        if !(200..300).contains(&status) {
            return Err(Self::rejected(status, &text));
        }
        debug!(%path, status, merge = mask, "document written");
        Ok(())
    }
}

impl DocumentStore for FirestoreStore {
    fn query_first<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            // "users/u1/feature" -> parent "users/u1", collection id "feature"
            let (parent, collection_id) = match collection.rsplit_once('/') {
                Some((parent, id)) => (Some(parent), id),
                None => (None, collection),
            };
            let parent_segments: Vec<&str> = parent
                .map(|p| p.split('/').collect())
                .unwrap_or_default();
            let url = self.url_for(&parent_segments, ":runQuery")?;

            let body = json!({
                "structuredQuery": {
                    "from": [{ "collectionId": collection_id }],
                    "where": {
                        "fieldFilter": {
                            "field": { "fieldPath": quote_field_path(field) },
                            "op": "EQUAL",
                            "value": { "stringValue": value }
                        }
                    },
                    "limit": 1
                }
            });

            let response = self
                .authorize(self.http.post(url))
                .json(&body)
                .send()
                .await?;
            let (status, text) = Self::read_body(response).await?;
            if !(200..300).contains(&status) {
                return Err(Self::rejected(status, &text));
            }

            let items: Vec<RunQueryItem> = serde_json::from_str(&text)
                .map_err(|e| StoreError::Malformed(format!("{}: {}", e, truncate(&text, 200))))?;
            items
                .into_iter()
                .find_map(|item| item.document)
                .map(|doc| self.decode_document(doc))
                .transpose()
        })
    }

    fn get<'a>(&'a self, path: &'a DocumentPath) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            let segments: Vec<&str> = path.as_str().split('/').collect();
            let url = self.url_for(&segments, "")?;
            let response = self.authorize(self.http.get(url)).send().await?;
            let (status, text) = Self::read_body(response).await?;
            if status == 404 {
                return Ok(None);
            }
            if !(200..300).contains(&status) {
                return Err(Self::rejected(status, &text));
            }
            let doc: RestDocument = serde_json::from_str(&text)
                .map_err(|e| StoreError::Malformed(format!("{}: {}", e, truncate(&text, 200))))?;
            self.decode_document(doc).map(Some)
        })
    }

    fn merge<'a>(&'a self, path: &'a DocumentPath, fields: Fields) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            // No mask means a full overwrite on the server side
            if fields.is_empty() {
                debug!(%path, "empty merge skipped");
                return Ok(());
            }
            self.patch(path, fields, true).await
        })
    }

    fn set<'a>(&'a self, path: &'a DocumentPath, fields: Fields) -> StoreFuture<'a, ()> {
        Box::pin(self.patch(path, fields, false))
    }
}

/// Field paths outside `[A-Za-z_][A-Za-z0-9_]*` must be backtick-quoted
fn quote_field_path(key: &str) -> String {
    let simple = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => json!({ "stringValue": s }),
        FieldValue::List(items) => {
            let values: Vec<Value> = items.iter().map(|s| json!({ "stringValue": s })).collect();
            json!({ "arrayValue": { "values": values } })
        }
    }
}

fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Flatten a scalar REST value to text
fn scalar_text(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    if let Some(s) = obj.get("stringValue").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    // integerValue is a JSON string in the REST encoding
    if let Some(s) = obj.get("integerValue").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    if let Some(n) = obj.get("doubleValue").and_then(Value::as_f64) {
        return Some(n.to_string());
    }
    if let Some(b) = obj.get("booleanValue").and_then(Value::as_bool) {
        return Some(b.to_string());
    }
    obj.get("timestampValue")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn decode_value(value: &Value) -> Option<FieldValue> {
    if let Some(array) = value.get("arrayValue") {
        let items = array
            .get("values")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(scalar_text).collect())
            .unwrap_or_default();
        return Some(FieldValue::List(items));
    }
    scalar_text(value).map(FieldValue::Text)
}

fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .filter_map(|(k, v)| decode_value(v).map(|value| (k.clone(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";

    fn store_for(server: &MockServer) -> FirestoreStore {
        let mut options = FirestoreOptions::new("demo");
        options.endpoint = server.uri();
        options.api_key = Some("web-key".to_string());
        options.id_token = Some("id-token".to_string());
        FirestoreStore::new(options).expect("store")
    }

    #[test]
    fn test_quote_field_path() {
        assert_eq!(quote_field_path("featureName"), "featureName");
        assert_eq!(quote_field_path("_x1"), "_x1");
        assert_eq!(quote_field_path("a.b"), "`a.b`");
        assert_eq!(quote_field_path("1st"), "`1st`");
    }

    #[test]
    fn test_value_codec() {
        let list = FieldValue::List(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(decode_value(&encode_value(&list)), Some(list));
        assert_eq!(
            decode_value(&json!({ "integerValue": "42" })),
            Some(FieldValue::Text("42".to_string()))
        );
        assert_eq!(decode_value(&json!({ "nullValue": null })), None);
        assert_eq!(
            decode_value(&json!({ "arrayValue": {} })),
            Some(FieldValue::List(Vec::new()))
        );
    }

    #[tokio::test]
    async fn test_merge_sends_update_mask() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{}/users/u1/feature/d1", DOCS)))
            .and(query_param("updateMask.fieldPaths", "featureName"))
            .and(query_param("key", "web-key"))
            .and(header("authorization", "Bearer id-token"))
            .and(body_partial_json(json!({
                "fields": {
                    "featureName": {
                        "arrayValue": { "values": [{ "stringValue": "Checkout Flow" }] }
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/users/u1/feature/d1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = Fields::new();
        fields.insert(
            "featureName".to_string(),
            FieldValue::List(vec!["Checkout Flow".to_string()]),
        );
        store_for(&server)
            .merge(&DocumentPath::user_feature("u1", "d1"), fields)
            .await
            .expect("merge");
    }

    #[tokio::test]
    async fn test_empty_merge_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        store_for(&server)
            .merge(&DocumentPath::session_record("d1"), Fields::new())
            .await
            .expect("empty merge");
    }

    #[tokio::test]
    async fn test_query_first_decodes_first_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", DOCS)))
            .and(body_partial_json(json!({
                "structuredQuery": { "from": [{ "collectionId": "features" }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "document": {
                        "name": "projects/demo/databases/(default)/documents/features/d1",
                        "fields": {
                            "sessionId": { "stringValue": "s1" },
                            "targetCustomer": { "stringValue": "Shoppers" }
                        }
                    },
                    "readTime": "2024-01-01T00:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let doc = store_for(&server)
            .query_first("features", "sessionId", "s1")
            .await
            .expect("query")
            .expect("document");
        assert_eq!(doc.path.as_str(), "features/d1");
        assert_eq!(
            doc.fields.get("targetCustomer"),
            Some(&FieldValue::Text("Shoppers".to_string()))
        );
    }

    #[tokio::test]
    async fn test_query_without_match_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", DOCS)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "readTime": "2024-01-01T00:00:00Z" }])),
            )
            .mount(&server)
            .await;

        let doc = store_for(&server)
            .query_first("features", "sessionId", "missing")
            .await
            .expect("query");
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_document_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/features/nope", DOCS)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "not found", "status": "NOT_FOUND" }
            })))
            .mount(&server)
            .await;

        let doc = store_for(&server)
            .get(&DocumentPath::session_record("nope"))
            .await
            .expect("get");
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_rejected_write_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .set(
                &DocumentPath::waitlist("a@example.com").expect("path"),
                Fields::new(),
            )
            .await
            .expect_err("should be rejected");
        match err {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing or insufficient permissions.");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

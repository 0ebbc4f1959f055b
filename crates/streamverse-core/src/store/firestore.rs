use super::{Direction, Document, DocumentStore, FieldValue, Fields, Query, SetMode, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::sync::RwLock;
use std::time::Duration;
use streamverse_config::FirebaseConfig;
use tracing::debug;

/// Cloud Firestore over its REST API.
pub struct FirestoreStore {
    client: Client,
    /// `projects/{p}/databases/(default)/documents`
    database_path: String,
    base_url: String,
    id_token: RwLock<Option<String>>,
}

impl FirestoreStore {
    pub fn new(config: &FirebaseConfig) -> Self {
        let client = Client::builder()
            .user_agent(concat!("streamverse/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            database_path: format!("projects/{}/databases/(default)/documents", config.project_id),
            base_url: config.firestore_base_url.trim_end_matches('/').to_string(),
            id_token: RwLock::new(None),
        }
    }

    pub fn with_id_token(self, token: impl Into<String>) -> Self {
        self.set_id_token(Some(token.into()));
        self
    }

    /// Replace the bearer token, e.g. after a refresh or sign-out.
    pub fn set_id_token(&self, token: Option<String>) {
        let mut guard = self.id_token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.database_path, collection, id)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.base_url, self.document_name(collection, id))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let guard = self.id_token.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorize(request).send().await?;
        check_response(response).await
    }
}

/// Map non-2xx responses to `StoreError`, keeping Firestore's message.
async fn check_response(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unauthenticated(message)),
        _ => Err(StoreError::Backend {
            status: status.as_u16(),
            message,
        }),
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let request = self.client.get(self.document_url(collection, id));
        let response = match self.send(request).await {
            Ok(response) => response,
            Err(StoreError::Backend { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let body: Value = response.json().await?;
        decode_document(&body).map(Some)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields, mode: SetMode) -> Result<(), StoreError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if mode == SetMode::Merge {
            params.extend(fields.keys().map(|k| ("updateMask.fieldPaths", k.clone())));
        }
        debug!("PATCH {}/{} ({:?}, {} fields)", collection, id, mode, fields.len());

        let request = self
            .client
            .patch(self.document_url(collection, id))
            .query(&params)
            .json(&json!({ "fields": encode_fields(&fields) }));
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let request = self.client.delete(self.document_url(collection, id));
        match self.send(request).await {
            Ok(_) | Err(StoreError::Backend { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn increment(&self, collection: &str, id: &str, deltas: &[(&str, i64)]) -> Result<(), StoreError> {
        let transforms: Vec<Value> = deltas
            .iter()
            .map(|(field, delta)| {
                json!({
                    "fieldPath": field,
                    "increment": { "integerValue": delta.to_string() }
                })
            })
            .collect();
        let body = json!({
            "writes": [{
                "transform": {
                    "document": self.document_name(collection, id),
                    "fieldTransforms": transforms
                }
            }]
        });

        let url = format!("{}/{}:commit", self.base_url, self.database_path);
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let body = json!({ "structuredQuery": structured_query(collection, query) });
        let url = format!("{}/{}:runQuery", self.base_url, self.database_path);
        let response = self.send(self.client.post(url).json(&body)).await?;

        let rows: Vec<Value> = response.json().await?;
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect()
    }
}

fn structured_query(collection: &str, query: &Query) -> Value {
    let mut structured = Map::new();
    structured.insert("from".into(), json!([{ "collectionId": collection }]));

    let filters: Vec<Value> = query
        .equals
        .iter()
        .map(|(field, value)| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": encode_value(value)
                }
            })
        })
        .collect();
    match filters.len() {
        0 => {}
        1 => {
            structured.insert("where".into(), filters[0].clone());
        }
        _ => {
            structured.insert(
                "where".into(),
                json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
            );
        }
    }

    if let Some((field, direction)) = &query.order_by {
        let direction = match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured.insert(
            "orderBy".into(),
            json!([{ "field": { "fieldPath": field }, "direction": direction }]),
        );
    }
    if let Some(limit) = query.limit {
        structured.insert("limit".into(), json!(limit));
    }
    Value::Object(structured)
}

pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(n) => json!({ "integerValue": n.to_string() }),
        FieldValue::Double(n) => json!({ "doubleValue": n }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(t) => json!({ "timestampValue": t.to_rfc3339() }),
    }
}

fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), encode_value(value)))
            .collect(),
    )
}

pub fn decode_value(value: &Value) -> Result<FieldValue, StoreError> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected a typed value, got {}", value)))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| StoreError::Decode("empty value object".to_string()))?;

    let decoded = match kind.as_str() {
        "nullValue" => FieldValue::Null,
        "booleanValue" => FieldValue::Bool(inner.as_bool().unwrap_or(false)),
        "integerValue" => {
            let n = match inner {
                Value::String(s) => s.parse().ok(),
                other => other.as_i64(),
            };
            FieldValue::Integer(n.ok_or_else(|| StoreError::Decode(format!("bad integer {}", inner)))?)
        }
        "doubleValue" => FieldValue::Double(
            inner
                .as_f64()
                .ok_or_else(|| StoreError::Decode(format!("bad double {}", inner)))?,
        ),
        "stringValue" => FieldValue::String(inner.as_str().unwrap_or_default().to_string()),
        "timestampValue" => {
            let raw = inner.as_str().unwrap_or_default();
            let parsed = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| StoreError::Decode(format!("bad timestamp '{}': {}", raw, e)))?;
            FieldValue::Timestamp(parsed.with_timezone(&Utc))
        }
        other => return Err(StoreError::Decode(format!("unsupported value type {}", other))),
    };
    Ok(decoded)
}

fn decode_document(body: &Value) -> Result<Document, StoreError> {
    let name = body["name"]
        .as_str()
        .ok_or_else(|| StoreError::Decode("document without a name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name);

    let mut fields = Fields::new();
    if let Some(raw) = body["fields"].as_object() {
        for (field, value) in raw {
            fields.insert(field.clone(), decode_value(value)?);
        }
    }
    Ok(Document::new(id, fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fields;
    use chrono::TimeZone;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: &str = "/projects/demo/databases/(default)/documents";

    fn store(server: &MockServer) -> FirestoreStore {
        let mut config = FirebaseConfig::new("key", "demo");
        config.firestore_base_url = server.uri();
        FirestoreStore::new(&config).with_id_token("token-1")
    }

    #[test]
    fn test_value_codec() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        for value in [
            FieldValue::Null,
            FieldValue::Bool(true),
            FieldValue::Integer(-7),
            FieldValue::Double(1.5),
            FieldValue::String("x".into()),
            FieldValue::Timestamp(at),
        ] {
            assert_eq!(decode_value(&encode_value(&value)).unwrap(), value);
        }
        assert_eq!(encode_value(&FieldValue::Integer(3)), json!({"integerValue": "3"}));
        assert!(decode_value(&json!({"mapValue": {}})).is_err());
    }

    #[test]
    fn test_structured_query_shape() {
        let query = Query::new()
            .where_eq("userId", "u1")
            .order_by("createdAt", Direction::Descending)
            .limit(20);
        let value = structured_query("likes", &query);
        assert_eq!(value["from"][0]["collectionId"], "likes");
        assert_eq!(value["where"]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(value["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(value["limit"], 20);

        let two = Query::new().where_eq("a", 1i64).where_eq("b", true);
        assert_eq!(structured_query("x", &two)["where"]["compositeFilter"]["op"], "AND");
    }

    #[tokio::test]
    async fn test_get_existing_and_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/likes/u1_42", DOCS)))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/likes/u1_42",
                "fields": {"userId": {"stringValue": "u1"}, "createdAt": {"timestampValue": "2025-01-02T03:04:05Z"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/likes/u1_43", DOCS)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let store = store(&server);
        let doc = store.get("likes", "u1_42").await.unwrap().unwrap();
        assert_eq!(doc.id, "u1_42");
        assert_eq!(doc.get_str("userId"), Some("u1"));
        assert!(doc.get_timestamp("createdAt").is_some());
        assert!(store.get("likes", "u1_43").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_sends_update_mask() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{}/watchHistory/u1_42", DOCS)))
            .and(query_param("updateMask.fieldPaths", "progress"))
            .and(body_partial_json(json!({"fields": {"progress": {"integerValue": "40"}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .set("watchHistory", "u1_42", fields([("progress", 40i64)]), SetMode::Merge)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_increment_commits_field_transforms() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/demo/databases/(default)/documents:commit"))
            .and(body_partial_json(json!({
                "writes": [{"transform": {
                    "document": "projects/demo/databases/(default)/documents/content/42",
                    "fieldTransforms": [
                        {"fieldPath": "likeCount", "increment": {"integerValue": "1"}},
                        {"fieldPath": "popularity", "increment": {"integerValue": "3"}}
                    ]
                }}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"writeResults": []})))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .increment("content", "42", &[("likeCount", 1), ("popularity", 3)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_query_skips_rows_without_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", DOCS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"document": {"name": "p/d/likes/u1_1", "fields": {"contentId": {"stringValue": "1"}}}, "readTime": "t"},
                {"readTime": "t"}
            ])))
            .mount(&server)
            .await;

        let docs = store(&server)
            .query("likes", &Query::new().where_eq("userId", "u1"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get_str("contentId"), Some("1"));
    }

    #[tokio::test]
    async fn test_permission_denied_maps_to_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let err = store(&server).delete("likes", "u1_1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthenticated(ref m) if m.contains("insufficient")));
    }
}

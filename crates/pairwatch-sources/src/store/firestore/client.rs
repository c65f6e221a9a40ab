use async_trait::async_trait;
use pairwatch_config::FirestoreConfig;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, trace};
use crate::error::SourceError;
use crate::store::firestore::value::{decode_document, decode_fields, encode_fields, encode_value};
use crate::traits::{Document, DocumentStore, FieldFilter, StoredDocument};

/// Firestore over its REST API (`v1`).
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
    database: String,
    bearer_token: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig, bearer_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database: config.database.clone(),
            bearer_token,
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url, self.project_id, self.database
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.documents_root(),
            urlencoding::encode(collection),
            urlencoding::encode(id)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, SourceError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(SourceError::Status {
            service: "firestore",
            status: status.as_u16(),
            body,
        })
    }

    async fn patch(&self, collection: &str, id: &str, fields: &Document, mask: Option<&[String]>) -> Result<(), SourceError> {
        let mut request = self
            .authorize(self.client.patch(self.document_url(collection, id)))
            .json(&json!({ "fields": encode_fields(fields) }));
        if let Some(paths) = mask {
            let query: Vec<(&str, &str)> = paths
                .iter()
                .map(|p| ("updateMask.fieldPaths", p.as_str()))
                .collect();
            request = request.query(&query);
        }
        Self::check(request.send().await?).await?;
        Ok(())
    }

    /// `structuredQuery` body for equality filters on one collection.
    pub fn structured_query(collection: &str, filters: &[FieldFilter]) -> Value {
        let field_filters: Vec<Value> = filters
            .iter()
            .map(|f| {
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": f.field },
                        "op": "EQUAL",
                        "value": encode_value(&f.value),
                    }
                })
            })
            .collect();

        let mut query = json!({ "from": [{ "collectionId": collection }] });
        match field_filters.len() {
            0 => {}
            1 => query["where"] = field_filters[0].clone(),
            _ => {
                query["where"] = json!({
                    "compositeFilter": { "op": "AND", "filters": field_filters }
                })
            }
        }
        json!({ "structuredQuery": query })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn backend_name(&self) -> &str {
        "firestore"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, SourceError> {
        trace!("Firestore get {}/{}", collection, id);
        let response = self
            .authorize(self.client.get(self.document_url(collection, id)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resource: Value = Self::check(response).await?.json().await?;
        let fields = resource.get("fields").map(decode_fields).transpose()?.unwrap_or_default();
        Ok(Some(fields))
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), SourceError> {
        trace!("Firestore set {}/{}", collection, id);
        self.patch(collection, id, &doc, None).await
    }

    async fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), SourceError> {
        trace!("Firestore merge {}/{} ({} fields)", collection, id, fields.len());
        let mask: Vec<String> = fields.keys().cloned().collect();
        self.patch(collection, id, &fields, Some(&mask)).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), SourceError> {
        trace!("Firestore delete {}/{}", collection, id);
        let response = self
            .authorize(self.client.delete(self.document_url(collection, id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<StoredDocument>, SourceError> {
        let url = format!("{}:runQuery", self.documents_root());
        let body = Self::structured_query(collection, filters);
        let response = self.authorize(self.client.post(&url)).json(&body).send().await?;
        let rows: Vec<Value> = Self::check(response).await?.json().await?;

        // Rows without a `document` only carry a readTime.
        let documents = rows
            .iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Firestore query {} with {} filter(s) returned {} document(s)",
            collection,
            filters.len(),
            documents.len()
        );
        Ok(documents)
    }
}

//! Thin per-verb CRUD wrapper over the request pipeline.
//!
//! `CrudService` binds a controller URL and maps create/read/update/delete
//! intents onto [`HttpClient`] calls. It contains no logic of its own beyond
//! URL assembly and the fail-fast check for empty ids.

use crate::client::{HttpClient, RequestBody};
use crate::error::HttpApiError;
use crate::hooks::{NoopHooks, RequestHooks};
use crate::options::QueryOptions;
use crate::response::ResponseEnvelope;
use crate::url::{join_path, normalize_base_url};

#[derive(Debug)]
pub struct CrudService<H: RequestHooks = NoopHooks> {
    controller: String,
    http: HttpClient<H>,
}

impl<H: RequestHooks> CrudService<H> {
    /// Bind a controller URL to an existing pipeline.
    pub fn new(controller: impl Into<String>, http: HttpClient<H>) -> Self {
        Self {
            controller: normalize_base_url(&controller.into()),
            http,
        }
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn http(&self) -> &HttpClient<H> {
        &self.http
    }

    /// URL of a single model.
    pub fn item_url(&self, id: &str) -> String {
        join_path(&self.controller, &[id])
    }

    /// URL of the id-list endpoint (`controller/many/id1,id2`).
    pub fn many_url(&self, ids: &[&str]) -> String {
        join_path(&self.controller, &["many", &ids.join(",")])
    }

    /// Create a new model from the given body.
    pub async fn create(
        &self,
        body: impl Into<RequestBody>,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.http.post(&self.controller, body, options).await
    }

    /// Fetch a model by id. An empty id fails fast instead of degenerating
    /// into a collection request.
    pub async fn get(
        &self,
        id: &str,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        if id.is_empty() {
            return Err(HttpApiError::MissingId);
        }
        self.http.get(&self.item_url(id), options).await
    }

    /// Fetch multiple models by id.
    pub async fn get_many(
        &self,
        ids: &[&str],
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.http.get(&self.many_url(ids), options).await
    }

    /// Fetch all models the options select.
    pub async fn get_all(
        &self,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.http.get(&self.controller, options).await
    }

    /// Overwrite a model; the target id travels inside the body.
    pub async fn replace(
        &self,
        body: impl Into<RequestBody>,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.http.put(&self.controller, body, options).await
    }

    /// Merge the body into an existing model; the target id travels inside
    /// the body.
    pub async fn merge(
        &self,
        body: impl Into<RequestBody>,
        options: Option<QueryOptions>,
    ) -> Result<ResponseEnvelope, HttpApiError> {
        self.http.patch(&self.controller, body, options).await
    }

    /// Delete a model by id.
    pub async fn delete(&self, id: &str) -> Result<ResponseEnvelope, HttpApiError> {
        if id.is_empty() {
            return Err(HttpApiError::MissingId);
        }
        self.http.delete(&self.item_url(id), None).await
    }
}

//! The task store implementation that talks to the hosted backend
//!
//! The backend exposes its tables over a PostgREST-style REST dialect: equality
//! filters are query parameters (`priority=eq.high`), ordering is
//! `order=due_date.asc`, and every request carries the project API key plus the
//! signed-in user's bearer token. Row-level security on the server side scopes
//! every query to the authenticated user, which is why no `owner` filter ever
//! appears in the requests below.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use url::Url;

use crate::config::Settings;
use crate::store::{StoreError, TaskFilter, TaskStore};
use crate::task::{NewTask, Task, TaskId, TaskPatch};

const TASKS_TABLE: &str = "tasks";
/// PostgREST: ask for a bare object instead of a one-element array
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// A task store that fetches its rows from the hosted backend
pub struct RestStore {
    base_url: Url,
    api_key: String,
    /// The signed-in user's access token. `None` until a sign-in happened.
    access_token: Mutex<Option<String>>,
    http: reqwest::Client,
}

impl RestStore {
    /// Create a store client. This does not start a connection
    pub fn new(settings: &Settings) -> Self {
        Self {
            base_url: settings.base_url().clone(),
            api_key: settings.api_key().to_string(),
            access_token: Mutex::new(None),
            http: reqwest::Client::new(),
        }
    }

    /// Attach the access token obtained from a sign-in.
    /// Until this is called, every operation fails with [`StoreError::Unauthenticated`]
    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.lock().unwrap() = token;
    }

    fn bearer(&self) -> Result<String, StoreError> {
        match &*self.access_token.lock().unwrap() {
            Some(token) => Ok(format!("Bearer {}", token)),
            None => Err(StoreError::Unauthenticated),
        }
    }

    /// Build `{base}/rest/v1/{table}` with the given query parameters
    fn table_url(&self, table: &str, query: &[(String, String)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("rest/v1/{}", table));
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        accept: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, StoreError> {
        let mut request = self
            .http
            .request(method, url.as_str())
            .header("apikey", self.api_key.as_str())
            .header(AUTHORIZATION, self.bearer()?);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        log::debug!("{} {} -> {}", url.path(), url.query().unwrap_or(""), response.status());
        Ok(response)
    }

    async fn reject(response: reqwest::Response) -> StoreError {
        let status = response.status();
        if status.as_u16() == 401 {
            return StoreError::Unauthenticated;
        }
        let message = response.text().await.unwrap_or_default();
        StoreError::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    fn id_query(id: &TaskId) -> (String, String) {
        ("id".to_string(), format!("eq.{}", id))
    }
}

fn filter_query(filter: &TaskFilter) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), "*".to_string())];
    if let Some(status) = filter.status() {
        query.push(("status".to_string(), format!("eq.{}", status)));
    }
    if let Some(priority) = filter.priority() {
        query.push(("priority".to_string(), format!("eq.{}", priority)));
    }
    query.push((
        "order".to_string(),
        format!("due_date.{}", filter.order().as_order_suffix()),
    ));
    query
}

#[async_trait]
impl TaskStore for RestStore {
    async fn select(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let url = self.table_url(TASKS_TABLE, &filter_query(filter));
        let response = self.send(Method::GET, url, None, None).await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        let tasks = response.json().await?;
        Ok(tasks)
    }

    async fn select_by_id(&self, id: &TaskId) -> Result<Task, StoreError> {
        let url = self.table_url(TASKS_TABLE, &[Self::id_query(id)]);
        let response = self.send(Method::GET, url, Some(SINGLE_OBJECT), None).await?;
        // PostgREST answers 406 when the single-object representation matches no row
        if response.status().as_u16() == 406 {
            return Err(StoreError::NotFound(*id));
        }
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        let task = response.json().await?;
        Ok(task)
    }

    async fn insert(&self, new: NewTask) -> Result<Task, StoreError> {
        let url = self.table_url(TASKS_TABLE, &[]);
        let body = serde_json::to_value(&new)
            .unwrap(/* NewTask's fields all have infallible serializers */);
        let response = self
            .http
            .request(Method::POST, url.as_str())
            .header("apikey", self.api_key.as_str())
            .header(AUTHORIZATION, self.bearer()?)
            .header(ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        let created = response.json().await?;
        Ok(created)
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let url = self.table_url(TASKS_TABLE, &[Self::id_query(id)]);
        let body = serde_json::to_value(&patch)
            .unwrap(/* TaskPatch's fields all have infallible serializers */);
        let response = self.send(Method::PATCH, url, None, Some(body)).await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let url = self.table_url(TASKS_TABLE, &[Self::id_query(id)]);
        let response = self.send(Method::DELETE, url, None, None).await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortDirection;
    use crate::task::{Priority, TaskStatus};

    fn test_store() -> RestStore {
        let settings = Settings::new(
            Url::parse("https://example.supabase.co").unwrap(),
            "anon-key".to_string(),
        );
        RestStore::new(&settings)
    }

    #[test]
    fn table_urls_carry_filters() {
        let store = test_store();
        let filter = TaskFilter::all()
            .with_priority(Priority::High)
            .with_order(SortDirection::Ascending);
        let url = store.table_url(TASKS_TABLE, &filter_query(&filter));

        assert_eq!(url.path(), "/rest/v1/tasks");
        let query = url.query().unwrap();
        assert!(query.contains("select=*"));
        assert!(query.contains("priority=eq.high"));
        assert!(query.contains("order=due_date.asc"));
    }

    #[test]
    fn status_filters_serialize_like_the_backend_expects() {
        let store = test_store();
        let filter = TaskFilter::all()
            .with_status(TaskStatus::Completed)
            .with_order(SortDirection::Descending);
        let url = store.table_url(TASKS_TABLE, &filter_query(&filter));

        let query = url.query().unwrap();
        assert!(query.contains("status=eq.completed"));
        assert!(query.contains("order=due_date.desc"));
    }

    #[tokio::test]
    async fn operations_require_a_token() {
        let store = test_store();
        let result = store.select(&TaskFilter::all()).await;
        match result {
            Err(StoreError::Unauthenticated) => {}
            other => panic!("expected Unauthenticated, got {:?}", other.map(|t| t.len())),
        }
    }
}

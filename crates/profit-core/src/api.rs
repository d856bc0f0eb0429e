//! Backend transport
//!
//! `ProfitApi` is the seam between the pipeline and the profits backend.
//! `HttpApi` talks JSON over reqwest; tests substitute an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants;
use crate::error::{ApiError, Result};
use crate::identity::{IdentityEntry, IdentitySource};
use crate::models::{
    AddWorkerResponse, OverviewPayload, PagePayload, SubmitRequest, SubmitResponse, Worker,
    WorkersPayload,
};

#[async_trait]
pub trait ProfitApi: Send + Sync {
    /// Totals plus the newest profits
    async fn fetch_overview(&self) -> Result<OverviewPayload>;

    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<PagePayload>;

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse>;

    /// Register (or refresh) a worker with whatever identity data we resolved
    async fn add_worker(&self, identity: &IdentityEntry) -> Result<AddWorkerResponse>;

    async fn fetch_workers(&self) -> Result<Vec<Worker>>;
}

/// Add-worker request body
#[derive(Debug, Serialize)]
struct AddWorkerBody<'a> {
    username: &'a str,
    telegram_id: Option<i64>,
    first_name: &'a str,
    last_name: &'a str,
    source: IdentitySource,
}

/// Error body some endpoints send with a failure status
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// JSON-over-HTTP backend client
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => ApiError::Rejected(body.error),
            Err(_) => ApiError::Status(status.as_u16()),
        });
    }

    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl ProfitApi for HttpApi {
    async fn fetch_overview(&self) -> Result<OverviewPayload> {
        self.get_json(&self.url(constants::OVERVIEW_PATH)).await
    }

    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<PagePayload> {
        let url = format!(
            "{}?limit={}&offset={}",
            self.url(constants::PROFITS_PATH),
            limit,
            offset
        );
        self.get_json(&url).await
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
        self.post_json(&self.url(constants::PROFITS_PATH), request)
            .await
    }

    async fn add_worker(&self, identity: &IdentityEntry) -> Result<AddWorkerResponse> {
        let body = AddWorkerBody {
            username: &identity.handle,
            telegram_id: identity.id,
            first_name: &identity.first_name,
            last_name: &identity.last_name,
            source: identity.source,
        };
        self.post_json(&self.url(constants::ADD_WORKER_PATH), &body)
            .await
    }

    async fn fetch_workers(&self) -> Result<Vec<Worker>> {
        let payload: WorkersPayload = self.get_json(&self.url(constants::WORKERS_PATH)).await?;
        Ok(payload.workers)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend for session tests

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::models::WorkerAction;

    #[derive(Default)]
    pub struct FakeApi {
        /// `None` makes the overview request fail
        pub overview: Option<OverviewPayload>,
        /// Served in order; `None` entries fail
        pub pages: Mutex<VecDeque<Option<PagePayload>>>,
        pub submit_response: Option<SubmitResponse>,
        pub workers: Vec<Worker>,
        pub page_requests: Mutex<Vec<(usize, usize)>>,
        pub submitted: Mutex<Vec<SubmitRequest>>,
        pub registered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProfitApi for FakeApi {
        async fn fetch_overview(&self) -> Result<OverviewPayload> {
            self.overview.clone().ok_or(ApiError::Status(500))
        }

        async fn fetch_page(&self, limit: usize, offset: usize) -> Result<PagePayload> {
            self.page_requests.lock().unwrap().push((limit, offset));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .ok_or(ApiError::Status(502))
        }

        async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
            self.submitted.lock().unwrap().push(request.clone());
            self.submit_response.clone().ok_or(ApiError::Status(500))
        }

        async fn add_worker(&self, identity: &IdentityEntry) -> Result<AddWorkerResponse> {
            self.registered.lock().unwrap().push(identity.handle.clone());
            Ok(AddWorkerResponse {
                action: Some(WorkerAction::Added),
                worker: None,
                error: None,
            })
        }

        async fn fetch_workers(&self) -> Result<Vec<Worker>> {
            Ok(self.workers.clone())
        }
    }
}

//! Dashboard session: owns the record store, the identity resolver and the
//! active filter, and drives the backend collaborator.
//!
//! Page faults never escape as errors. They are logged, the store falls back
//! to a safe state, and the caller gets a [`LoadOutcome::Failed`] to show.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::ProfitApi;
use crate::codec;
use crate::constants;
use crate::demo;
use crate::error::{ApiError, Result};
use crate::filters::{self, FilterKind};
use crate::identity::{normalize_handle, IdentityResolver};
use crate::models::{ProfitRecord, SubmitRequest, Worker};
use crate::stats::{self, Bucket, WorkerCard};
use crate::store::{AggregateStats, RecordStore};
use crate::worker_lookup::{lookup_worker, WorkerLookup, WorkerLookupResult};

/// Result of a page load, for the host to render
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Records were added
    Loaded(usize),
    /// The backend has no records
    Empty,
    /// Nothing more to load
    Exhausted,
    /// The request failed; the store is in its fallback state
    Failed(String),
}

/// Profit as typed into the submission form
#[derive(Debug, Clone, Default)]
pub struct SubmissionDraft {
    /// Free-form amount text ("5.400", "1.234,5")
    pub amount: String,
    pub worker_percent: u32,
    pub service: String,
    /// Handle, with or without `@`
    pub worker: String,
}

impl SubmissionDraft {
    fn to_request(&self, added_by: Option<i64>) -> Result<SubmitRequest> {
        let service = self.service.trim();
        let worker = normalize_handle(&self.worker);
        if self.amount.trim().is_empty() || service.is_empty() || worker.is_empty() {
            return Err(ApiError::Invalid("all fields are required".to_string()));
        }

        let amount = codec::parse_amount(&self.amount);
        if amount <= 0.0 {
            return Err(ApiError::Invalid("amount must be greater than zero".to_string()));
        }

        Ok(SubmitRequest {
            amount,
            worker_percent: self.worker_percent,
            service: service.to_string(),
            worker_username: worker,
            added_by,
        })
    }
}

/// Headline numbers for the stats panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overview {
    pub stats: AggregateStats,
    pub average_per_record: f64,
}

pub struct Dashboard {
    store: RecordStore,
    filter: FilterKind,
    resolver: Arc<IdentityResolver>,
    /// `None` in offline mode
    api: Option<Arc<dyn ProfitApi>>,
    /// Offline project balance, accumulated on the client
    local_balance: f64,
}

impl Dashboard {
    pub fn new(api: Arc<dyn ProfitApi>, resolver: Arc<IdentityResolver>, page_size: usize) -> Self {
        Self {
            store: RecordStore::new(page_size),
            filter: FilterKind::default(),
            resolver,
            api: Some(api),
            local_balance: 0.0,
        }
    }

    /// Session without a backend; loads serve demo data
    pub fn offline(resolver: Arc<IdentityResolver>, page_size: usize) -> Self {
        Self {
            store: RecordStore::new(page_size),
            filter: FilterKind::default(),
            resolver,
            api: None,
            local_balance: 0.0,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.api.is_none()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn stats(&self) -> AggregateStats {
        self.store.stats()
    }

    pub fn resolver(&self) -> &Arc<IdentityResolver> {
        &self.resolver
    }

    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    pub fn set_filter(&mut self, kind: FilterKind) {
        self.filter = kind;
    }

    /// Active filter applied to the current records
    pub fn view<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<ProfitRecord> {
        filters::apply(self.store.records(), self.filter, now)
    }

    /// Drop everything and load the first page again
    pub async fn refresh(&mut self) -> LoadOutcome {
        self.store.reset();

        let Some(api) = self.api.clone() else {
            return match self.load_demo() {
                0 => LoadOutcome::Empty,
                n => LoadOutcome::Loaded(n),
            };
        };

        match api.fetch_overview().await {
            Ok(payload) => {
                let kept = self.store.load_initial_page(&payload, Utc::now());
                info!(
                    records = kept,
                    total_amount = self.store.stats().total_amount,
                    has_more = self.store.has_more(),
                    "loaded profits"
                );
                if kept == 0 {
                    LoadOutcome::Empty
                } else {
                    LoadOutcome::Loaded(kept)
                }
            }
            Err(e) => {
                warn!(error = %e, "initial load failed, showing empty dashboard");
                self.store.fail_initial_load();
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Fetch and append the next page. Does nothing once pagination ended.
    pub async fn load_more(&mut self) -> LoadOutcome {
        if !self.store.has_more() {
            return LoadOutcome::Exhausted;
        }
        let Some(api) = self.api.clone() else {
            self.store.close_pagination();
            return LoadOutcome::Exhausted;
        };

        let limit = self.store.page_size();
        let offset = self.store.next_offset();

        match api.fetch_page(limit, offset).await {
            Ok(page) => match self.store.load_next_page(&page, Utc::now()) {
                0 => LoadOutcome::Exhausted,
                n => {
                    info!(records = n, offset, has_more = self.store.has_more(), "loaded more profits");
                    LoadOutcome::Loaded(n)
                }
            },
            Err(e) => {
                warn!(error = %e, offset, "loading more profits failed, pagination closed");
                self.store.close_pagination();
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Replace the store with the offline demo data set
    pub fn load_demo(&mut self) -> usize {
        let (records, stats) = demo::demo_snapshot();
        let count = records.len();
        self.local_balance = records
            .iter()
            .map(|r| r.project_running_total)
            .fold(0.0, f64::max);
        self.store.load_snapshot(records, stats);
        count
    }

    /// Validate and submit a new profit. On success the totals are replaced
    /// from the backend response and the record is appended to the store.
    /// Offline, the submission is applied locally and the record carries the
    /// client-side project balance.
    pub async fn submit(&mut self, draft: &SubmissionDraft) -> Result<ProfitRecord> {
        let request = draft.to_request(self.resolver.session_user_id())?;
        let previous = self.store.stats();

        let (total_amount, record_count, running_total) = match &self.api {
            Some(api) => {
                let response = api.submit(&request).await?;
                if !response.success {
                    return Err(ApiError::Rejected(
                        response.error.unwrap_or_else(|| "unknown error".to_string()),
                    ));
                }
                let total_amount = response
                    .total_amount
                    .unwrap_or(previous.total_amount + request.amount);
                (
                    total_amount,
                    response.profits_count.unwrap_or(previous.record_count + 1),
                    total_amount,
                )
            }
            None => {
                self.local_balance += request.amount;
                (
                    previous.total_amount + request.amount,
                    previous.record_count + 1,
                    self.local_balance,
                )
            }
        };

        self.store.replace_stats(AggregateStats {
            total_amount,
            worker_count: previous.worker_count,
            record_count,
        });

        let record = ProfitRecord {
            amount: request.amount,
            worker_percent: request.worker_percent,
            service: request.service,
            worker: request.worker_username,
            date: Utc::now(),
            project_running_total: running_total,
        };
        self.store.append_submitted(record.clone());

        info!(
            amount = record.amount,
            service = %record.service,
            worker = %record.worker,
            "profit submitted"
        );
        Ok(record)
    }

    pub fn service_breakdown(&self) -> Vec<Bucket> {
        stats::by_service(self.store.records())
    }

    pub fn worker_breakdown(&self) -> Vec<Bucket> {
        stats::by_worker(self.store.records())
    }

    pub fn average_per_record(&self) -> f64 {
        stats::average_per_record(&self.store.stats())
    }

    pub fn overview(&self) -> Overview {
        Overview {
            stats: self.store.stats(),
            average_per_record: self.average_per_record(),
        }
    }

    /// Worker cards for the workers listing. Offline, the workers are the
    /// distinct handles found in the loaded records.
    pub async fn worker_cards(&self) -> Result<Vec<WorkerCard>> {
        let workers = match &self.api {
            Some(api) => api.fetch_workers().await?,
            None => self
                .worker_breakdown()
                .into_iter()
                .map(|bucket| Worker {
                    username: bucket.label,
                    ..Default::default()
                })
                .collect(),
        };
        Ok(stats::worker_cards(&workers, self.store.records()))
    }

    /// Resolve a typed handle and register the worker with the backend
    pub async fn register_worker(&self, input: &str) -> Result<WorkerLookupResult> {
        let handle = normalize_handle(input);
        if handle.is_empty() {
            return Err(ApiError::Invalid("worker handle is empty".to_string()));
        }
        Ok(lookup_worker(&self.resolver, self.api.as_deref(), &handle).await)
    }

    /// Debounced lookup for handles typed character by character. Shares this
    /// session's resolver cache and backend.
    pub fn worker_lookup(&self) -> (WorkerLookup, mpsc::UnboundedReceiver<WorkerLookupResult>) {
        WorkerLookup::new(
            Arc::clone(&self.resolver),
            self.api.clone(),
            Duration::from_millis(constants::USERNAME_DEBOUNCE_MS),
        )
    }
}

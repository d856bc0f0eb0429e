//! Arrival-ordered profit record store with pagination state
//!
//! Records are kept in the order they arrived (pages appended in fetch order,
//! submissions appended last). Chronological ordering is a view concern; see
//! `filters`.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{OverviewPayload, PagePayload, ProfitRecord};

/// Backend-reported project totals. Always replaced as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateStats {
    pub total_amount: f64,
    pub worker_count: u64,
    pub record_count: u64,
}

impl AggregateStats {
    pub const ZERO: AggregateStats = AggregateStats {
        total_amount: 0.0,
        worker_count: 0,
        record_count: 0,
    };

    pub fn from_overview(payload: &OverviewPayload) -> Self {
        Self {
            total_amount: payload.total_amount.unwrap_or(0.0),
            worker_count: payload.workers_count.unwrap_or(0),
            record_count: payload.profits_count.unwrap_or(0),
        }
    }
}

/// Ordered profit records, page cursor and "more available" flag
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<ProfitRecord>,
    page_cursor: usize,
    has_more: bool,
    stats: AggregateStats,
    page_size: usize,
}

impl RecordStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            page_cursor: 0,
            has_more: true,
            stats: AggregateStats::ZERO,
            page_size: page_size.max(1),
        }
    }

    pub fn records(&self) -> &[ProfitRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pages fetched so far (the initial load counts as page 1)
    pub fn page_cursor(&self) -> usize {
        self.page_cursor
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn stats(&self) -> AggregateStats {
        self.stats
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Offset of the next page request
    pub fn next_offset(&self) -> usize {
        self.page_cursor * self.page_size
    }

    /// Replace everything with the first page of an overview response.
    ///
    /// Keeps at most `page_size` records; more available when the backend
    /// sent more than a page. Returns the number of records kept.
    pub fn load_initial_page(&mut self, payload: &OverviewPayload, now: DateTime<Utc>) -> usize {
        let raw = payload.profits.as_deref().unwrap_or_default();

        self.records = raw
            .iter()
            .take(self.page_size)
            .map(|p| ProfitRecord::from_raw(p, now))
            .collect();
        self.has_more = raw.len() > self.page_size;
        self.page_cursor = 1;
        self.stats = AggregateStats::from_overview(payload);

        debug!(
            kept = self.records.len(),
            received = raw.len(),
            has_more = self.has_more,
            "initial page loaded"
        );
        self.records.len()
    }

    /// A failed first load looks exactly like "no data": nothing survives.
    pub fn fail_initial_load(&mut self) {
        self.records.clear();
        self.page_cursor = 0;
        self.has_more = false;
        self.stats = AggregateStats::ZERO;
    }

    /// Append a subsequent page. An empty page ends pagination without
    /// advancing the cursor. Returns the number of records appended.
    ///
    /// Callers check `has_more` first; a call after pagination ended is
    /// ignored.
    pub fn load_next_page(&mut self, payload: &PagePayload, now: DateTime<Utc>) -> usize {
        if !self.has_more {
            warn!(page_cursor = self.page_cursor, "next page applied after pagination ended, ignoring");
            return 0;
        }

        let raw = payload.profits.as_deref().unwrap_or_default();
        if raw.is_empty() {
            self.has_more = false;
            return 0;
        }

        self.records
            .extend(raw.iter().map(|p| ProfitRecord::from_raw(p, now)));
        self.has_more = payload.has_more;
        self.page_cursor += 1;

        debug!(
            appended = raw.len(),
            page_cursor = self.page_cursor,
            has_more = self.has_more,
            "next page loaded"
        );
        raw.len()
    }

    /// Stop offering further pages after a transport failure. Records stay.
    pub fn close_pagination(&mut self) {
        self.has_more = false;
    }

    /// Clear before a forced full refresh
    pub fn reset(&mut self) {
        self.records.clear();
        self.page_cursor = 0;
        self.has_more = true;
    }

    /// Install a complete snapshot (offline demo data): no further pages.
    pub fn load_snapshot(&mut self, records: Vec<ProfitRecord>, stats: AggregateStats) {
        self.records = records;
        self.page_cursor = 1;
        self.has_more = false;
        self.stats = stats;
    }

    /// Append a freshly submitted record in arrival position
    pub fn append_submitted(&mut self, record: ProfitRecord) {
        self.records.push(record);
    }

    pub fn replace_stats(&mut self, stats: AggregateStats) {
        self.stats = stats;
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(crate::constants::PAGE_SIZE)
    }
}

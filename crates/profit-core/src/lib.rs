//! Profit feed pipeline
//!
//! Ingests profit records from the backend (or an offline demo set),
//! normalizes their loosely-typed fields, keeps them in a paginated store
//! and derives the aggregate statistics and filtered views the dashboard
//! shows. Worker identities typed into the submission form are resolved
//! once per session and registered with the backend.

pub mod api;
pub mod codec;
pub mod constants;
pub mod dashboard;
pub mod debounce;
pub mod demo;
pub mod error;
pub mod filters;
pub mod identity;
pub mod models;
pub mod stats;
pub mod store;
pub mod worker_lookup;

pub use api::{HttpApi, ProfitApi};
pub use codec::{decode_value, format_grouped, format_limited, parse_amount};
pub use dashboard::{Dashboard, LoadOutcome, Overview, SubmissionDraft};
pub use error::{ApiError, Result};
pub use filters::FilterKind;
pub use identity::{IdentityEntry, IdentityResolver, IdentitySource, StaticContext};
pub use models::{ProfitRecord, Worker};
pub use stats::{Bucket, WorkerCard};
pub use store::{AggregateStats, RecordStore};
pub use worker_lookup::{WorkerLookup, WorkerLookupResult};

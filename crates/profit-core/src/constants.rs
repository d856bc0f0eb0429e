//! Centralized constants for the profit dashboard pipeline
//!
//! Deployment-specific values (backend URL, page size override, currency)
//! are loaded from the host's config file; these are the defaults.

// =============================================================================
// API Endpoints
// =============================================================================

/// Default backend base URL
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

/// Overview endpoint: project totals plus the first batch of profits
pub const OVERVIEW_PATH: &str = "/api/data";

/// Paginated profits endpoint (GET) and submission endpoint (POST)
pub const PROFITS_PATH: &str = "/api/profits";

/// Worker listing endpoint
pub const WORKERS_PATH: &str = "/api/workers";

/// Worker registration with identity-provider data
pub const ADD_WORKER_PATH: &str = "/api/workers/add-telegram";

/// Default request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Pagination & Views
// =============================================================================

/// Records per page
pub const PAGE_SIZE: usize = 5;

/// Number of records kept by the "top" filter
pub const TOP_LIMIT: usize = 5;

/// Fractional digits kept by limited formatting
pub const DISPLAY_DECIMALS: u32 = 3;

// =============================================================================
// Record Defaults
// =============================================================================

/// Worker share used when the backend omits `worker_percent`
pub const DEFAULT_WORKER_PERCENT: u32 = 70;

/// Sentinel for a missing service label
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Sentinel for a missing worker handle
pub const UNKNOWN_WORKER: &str = "unknown";

// =============================================================================
// Identity Lookup
// =============================================================================

/// Quiet period before a username lookup runs (ms)
pub const USERNAME_DEBOUNCE_MS: u64 = 1000;

// =============================================================================
// Offline Demo Totals
// =============================================================================

pub const DEMO_TOTAL_AMOUNT: f64 = 34_463.0;
pub const DEMO_WORKER_COUNT: u64 = 6;
pub const DEMO_PROFIT_COUNT: u64 = 156;

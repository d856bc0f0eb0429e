//! Debounced "resolve then register" flow for a typed worker handle

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::ProfitApi;
use crate::debounce::Debouncer;
use crate::error::ApiError;
use crate::identity::{normalize_handle, IdentityEntry, IdentityResolver};
use crate::models::AddWorkerResponse;

/// Resolved identity plus what the backend made of it
#[derive(Debug)]
pub struct WorkerLookupResult {
    pub entry: Arc<IdentityEntry>,
    /// Backend answer; `None` when running offline
    pub registration: Option<Result<AddWorkerResponse, ApiError>>,
}

/// Resolve `handle` and forward the identity to the add-worker endpoint
pub async fn lookup_worker(
    resolver: &IdentityResolver,
    api: Option<&dyn ProfitApi>,
    handle: &str,
) -> WorkerLookupResult {
    let entry = resolver.resolve(handle);

    let registration = match api {
        Some(api) => {
            let result = api.add_worker(&entry).await;
            match &result {
                Ok(response) => info!(handle, action = ?response.action, "worker registered"),
                Err(e) => warn!(handle, error = %e, "worker registration failed"),
            }
            Some(result)
        }
        None => None,
    };

    WorkerLookupResult {
        entry,
        registration,
    }
}

/// Feeds keystrokes in, emits lookup results once typing pauses
pub struct WorkerLookup {
    resolver: Arc<IdentityResolver>,
    api: Option<Arc<dyn ProfitApi>>,
    debouncer: Debouncer,
    results: mpsc::UnboundedSender<WorkerLookupResult>,
}

impl WorkerLookup {
    pub fn new(
        resolver: Arc<IdentityResolver>,
        api: Option<Arc<dyn ProfitApi>>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerLookupResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let lookup = Self {
            resolver,
            api,
            debouncer: Debouncer::new(delay),
            results: tx,
        };
        (lookup, rx)
    }

    /// Handle the current contents of the username field
    pub fn on_input(&mut self, text: &str) {
        let handle = normalize_handle(text);
        if handle.is_empty() {
            self.debouncer.cancel();
            return;
        }

        let resolver = Arc::clone(&self.resolver);
        let api = self.api.clone();
        let results = self.results.clone();

        self.debouncer.schedule(async move {
            let result = lookup_worker(&resolver, api.as_deref(), &handle).await;
            // Receiver gone means nobody is listening any more
            let _ = results.send(result);
        });
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;
    use crate::identity::IdentitySource;
    use crate::models::WorkerAction;

    #[tokio::test(start_paused = true)]
    async fn test_lookup_after_typing_pauses() {
        let api = Arc::new(FakeApi::default());
        let (mut lookup, mut rx) = WorkerLookup::new(
            Arc::new(IdentityResolver::offline()),
            Some(api.clone() as Arc<dyn ProfitApi>),
            Duration::from_millis(1000),
        );

        for text in ["@a", "@al", "@ali", "@alice"] {
            lookup.on_input(text);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        let result = rx.recv().await.unwrap();
        assert_eq!(result.entry.handle, "alice");
        assert_eq!(result.entry.source, IdentitySource::OfflineFallback);
        let response = result.registration.unwrap().unwrap();
        assert_eq!(response.action, Some(WorkerAction::Added));
        assert_eq!(*api.registered.lock().unwrap(), vec!["alice".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_cancels() {
        let (mut lookup, mut rx) = WorkerLookup::new(
            Arc::new(IdentityResolver::offline()),
            None,
            Duration::from_millis(1000),
        );

        lookup.on_input("bob");
        lookup.on_input("  @ ");
        assert!(!lookup.is_pending());

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_offline_lookup_has_no_registration() {
        let resolver = IdentityResolver::offline();
        let result = lookup_worker(&resolver, None, "carol").await;
        assert_eq!(result.entry.first_name, "carol");
        assert!(result.registration.is_none());
        assert!(Arc::ptr_eq(&result.entry, &resolver.resolve("carol")));
    }
}

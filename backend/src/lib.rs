pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod sources;
pub mod store;
#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use config::Config;
pub use error::Error;
pub use history::{HistoryQuery, HistoryService};
pub use llm::{InferenceClient, OllamaClient};
pub use pipeline::{BatchJob, BatchOrchestrator, BatchReport};
pub use store::AnalysisStore;

use std::sync::Arc;

use tokio::sync::watch;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub inference: Arc<dyn InferenceClient>,
    pub store: Arc<AnalysisStore>,
    pub history: HistoryService,
    pub orchestrator: BatchOrchestrator,
    /// Flipped to `true` once the server starts shutting down.
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config, inference: Arc<dyn InferenceClient>, store: Arc<AnalysisStore>) -> Self {
        let history = HistoryService::new(store.clone(), config.history.clone());
        let orchestrator = BatchOrchestrator::new(inference.clone(), config.batch.concurrency);
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            inference,
            store,
            history,
            orchestrator,
            shutdown,
        }
    }

    /// Resolves once [`begin_shutdown`](Self::begin_shutdown) has been called.
    /// Running batches race this to hand back partial reports.
    pub fn shutdown_signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            if rx.wait_for(|stopping| *stopping).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

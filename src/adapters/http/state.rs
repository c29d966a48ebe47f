use std::sync::Arc;
use crate::application::services::PredictionService;

/// Shared state for the Axum handlers: the use cases, not the adapters behind them.
#[derive(Clone)]
pub struct HttpState {
    /// Upload -> annotated image + summary.
    pub prediction: Arc<PredictionService>,
}

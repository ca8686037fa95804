use career_match::config::AppConfig;
use career_match::scoring::{Category, EngineError, RecommendationService, UserProfile};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_service(config: &AppConfig) -> Arc<RecommendationService> {
    Arc::new(RecommendationService::from_app_config(config))
}

/// Scores a throwaway profile per category so the element tables are loaded
/// before traffic arrives. Returns how many categories were warmed; missing
/// tables are logged and left to fail per request.
pub(crate) fn warm_tables(service: &RecommendationService) -> usize {
    let profile = UserProfile::default();
    let mut warmed = 0;
    for category in Category::ALL {
        match service.score_category(category, &profile) {
            Err(EngineError::DataUnavailable(error)) => {
                warn!(%category, %error, "element table unavailable at startup");
            }
            _ => warmed += 1,
        }
    }
    info!(warmed, "element tables warmed");
    warmed
}

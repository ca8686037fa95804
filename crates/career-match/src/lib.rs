pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;

pub use config::AppConfig;
pub use error::AppError;
pub use scoring::{career_router, RecommendationService};

pub mod config;
pub mod models;
pub mod pipeline;

pub use config::AnalyzerConfig;
pub use models::{AssessmentResult, EnrichedResult, HealthInput, ManualRecord};
pub use pipeline::analysis::{AnalysisError, HealthAnalyzer};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, honoring `RUST_LOG`. Safe to call more than
/// once; later calls are no-ops.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialized", config::APP_NAME, config::APP_VERSION);
    }
}

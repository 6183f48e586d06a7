use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    // Logs go to stderr so rendered documents can be piped from stdout.
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "favicons_settings_cache_hit_total",
            Unit::Count,
            "Favicon settings served from the cache."
        );
        describe_counter!(
            "favicons_settings_cache_miss_total",
            Unit::Count,
            "Favicon settings resolved from the content store."
        );
        describe_counter!(
            "favicons_variant_written_total",
            Unit::Count,
            "Icon variants written to storage."
        );
        describe_counter!(
            "favicons_variant_failed_total",
            Unit::Count,
            "Icon variants skipped after a resize or storage failure."
        );
        describe_histogram!(
            "favicons_pipeline_ms",
            Unit::Milliseconds,
            "Duration of one variant family generation in milliseconds."
        );
    });
}

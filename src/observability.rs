use anyhow::Result;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, ObservabilityConfig};

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_observability(
    service_name: &str,
    service_version: &str,
    config: &ObservabilityConfig,
) -> Result<()> {
    let format = config.format();

    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_filter(filter(&config.log_level))
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_filter(filter(&config.log_level))
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::info!(
        service.name = service_name,
        service.version = service_version,
        ?format,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_installs_once() {
        let config = ObservabilityConfig {
            log_level: "debug".to_string(),
            log_format: Some(LogFormat::Json),
        };

        let first = init_observability("test-service", "0.1.0", &config);
        assert!(first.is_ok(), "init should succeed: {:?}", first.err());

        assert!(init_observability("test-service", "0.1.0", &config).is_err());
    }

    #[test]
    fn test_explicit_format_wins() {
        let config = ObservabilityConfig {
            log_format: Some(LogFormat::Pretty),
            ..Default::default()
        };

        assert_eq!(config.format(), LogFormat::Pretty);
    }
}

//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured level when set. Noisy HTTP internals
//! are capped at `warn` either way.

use crate::config::LoggingSettings;
use tracing_subscriber::EnvFilter;

const QUIET_TARGETS: &[(&str, &str)] = &[("hyper", "warn"), ("reqwest", "warn"), ("h2", "warn")];

/// Filter directives for the given base level
#[must_use]
pub fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.to_string()];
    for (target, lvl) in QUIET_TARGETS {
        directives.push(format!("{target}={lvl}"));
    }
    directives.join(",")
}

fn build_filter(settings: &LoggingSettings) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = filter_directives(&settings.level);
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("invalid tracing filter '{directives}': {e}"))
}

/// Install the global subscriber
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = build_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_quiet_targets() {
        assert_eq!(filter_directives("debug"), "debug,hyper=warn,reqwest=warn,h2=warn");
    }

    #[test]
    fn configured_level_parses() {
        let settings = LoggingSettings {
            level: "codepad_core=debug".to_string(),
            json: false,
        };
        assert!(EnvFilter::try_new(filter_directives(&settings.level)).is_ok());
    }
}

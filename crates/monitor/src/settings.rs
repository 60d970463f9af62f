//! Layered configuration loading
//!
//! Order of precedence (last wins): built-in defaults, TOML file, environment.

use config::{Config, Environment, File, FileFormat, Source};
use std::env;

use pricewatch_core::MonitorConfig;

pub const CONFIG_PATH_ENV: &str = "PRICEWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "pricewatch.toml";
pub const ENV_PREFIX: &str = "PRICEWATCH";

/// Environment source: `PRICEWATCH_INTERVAL_SECS`, `PRICEWATCH_REPORTER__URL`, ...
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load from `$PRICEWATCH_CONFIG` (or `pricewatch.toml`) and the process environment
pub fn load() -> anyhow::Result<MonitorConfig> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let file = File::new(&path, FileFormat::Toml).required(false);

    load_layered(file, environment())
}

pub fn load_layered<S>(file: S, env: Environment) -> anyhow::Result<MonitorConfig>
where
    S: Source + Send + Sync + 'static,
{
    let defaults = Config::try_from(&MonitorConfig::default())?;

    let settings = Config::builder()
        .add_source(defaults)
        .add_source(file)
        .add_source(env)
        .build()?;

    let config: MonitorConfig = settings.try_deserialize()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_core::LogFormat;
    use std::time::Duration;

    fn env_with(vars: &[(&str, &str)]) -> Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    fn toml(content: &str) -> impl Source + Send + Sync + 'static {
        File::from_str(content, FileFormat::Toml)
    }

    #[test]
    fn test_defaults_only() {
        let config = load_layered(toml(""), env_with(&[])).unwrap();
        let defaults = MonitorConfig::default();

        assert_eq!(config.asset, defaults.asset);
        assert_eq!(config.interval_secs, 300);
        assert_eq!(config.request_timeout_ms, defaults.request_timeout_ms);
        assert!(config.reporter.is_none());
        assert!(!config.run_once);

        let names: Vec<_> = config.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["coingecko", "cryptocompare"]);
        assert_eq!(config.sources[0].field_path.to_string(), "bitcoin.usd");
        assert_eq!(config.sources[0].headers.len(), 1);
    }

    #[test]
    fn test_file_overrides_sources() {
        let config = load_layered(
            toml(
                r#"
                asset = "ETH"
                interval_secs = 60

                [[sources]]
                name = "binance"
                url = "https://api.binance.com/api/v3/ticker/price?symbol=ETHUSDT"
                field_path = "price"

                [reporter]
                url = "http://localhost:3000/api/precio"
                price_field = "precio_eth"
                "#,
            ),
            env_with(&[]),
        )
        .unwrap();

        assert_eq!(config.asset, "ETH");
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].field_path.to_string(), "price");

        let reporter = config.reporter.unwrap();
        assert_eq!(reporter.price_field, "precio_eth");
        assert_eq!(reporter.timeout_ms, 10_000);
    }

    #[test]
    fn test_environment_overrides_file() {
        let config = load_layered(
            toml("interval_secs = 60"),
            env_with(&[
                ("PRICEWATCH_INTERVAL_SECS", "15"),
                ("PRICEWATCH_RUN_ONCE", "true"),
                ("PRICEWATCH_LOG_FORMAT", "json"),
                ("PRICEWATCH_REPORTER__URL", "http://backend:8080/precio"),
            ]),
        )
        .unwrap();

        assert_eq!(config.interval_secs, 15);
        assert!(config.run_once);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.reporter.unwrap().url, "http://backend:8080/precio");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = load_layered(toml("interval_secs = 0"), env_with(&[]));
        assert!(result.is_err());

        let result = load_layered(
            toml(
                r#"
                [[sources]]
                name = "broken"
                url = "https://example.com"
                field_path = "a..b"
                "#,
            ),
            env_with(&[]),
        );
        assert!(result.is_err());
    }
}

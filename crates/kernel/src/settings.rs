use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LIBMANAGER_ENV";
const CONFIG_DIR_ENV: &str = "LIBMANAGER_CONFIG_DIR";
const ENV_PREFIX: &str = "LIBMANAGER";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay
    /// and `LIBMANAGER_*` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to repo root `config` directory.
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from `config_dir` for the named environment.
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment = environment.parse::<Environment>()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selected environment wins over anything the files declare.
        settings.environment = parsed_environment;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Where the book catalog lives and how it starts out.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CatalogSettings {
    /// JSON snapshot backing the catalog; in-memory only when unset.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Load the demo books into an empty catalog on startup.
    #[serde(default)]
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default filter directive, used when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_level")]
    pub level: String,
}

impl TelemetrySettings {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // `load_from` reads process-wide `LIBMANAGER_*` variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sets environment variables and removes them again on drop.
    struct EnvVars(Vec<&'static str>);

    impl EnvVars {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self(vars.iter().map(|(key, _)| *key).collect())
        }
    }

    impl Drop for EnvVars {
        fn drop(&mut self) {
            for key in &self.0 {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_catalog_is_in_memory() {
        let settings = Settings::default();
        assert!(settings.catalog.snapshot_path.is_none());
        assert!(!settings.catalog.seed_sample_data);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.telemetry.level, "info");
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = "qa".parse::<Environment>().unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }

    #[test]
    fn environment_overlay_overrides_base_file() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            "[server]\nport = 9000\n\n[catalog]\nseed_sample_data = true\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "[server]\nport = 9100\n\n[catalog]\nsnapshot_path = \"/var/lib/libmanager/catalog.json\"\n\n[telemetry]\nlog_format = \"json\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path(), "staging").unwrap();
        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert!(settings.catalog.seed_sample_data);
        assert_eq!(
            settings.catalog.snapshot_path,
            Some(PathBuf::from("/var/lib/libmanager/catalog.json"))
        );
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_config_files_fall_back_to_defaults() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(dir.path(), "local").unwrap();
        assert_eq!(settings.server.request_timeout_ms, 15000);
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn prefixed_environment_variables_override_files() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            "[server]\nport = 9000\n\n[catalog]\nseed_sample_data = false\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("local.toml"), "[server]\nport = 9100\n").unwrap();

        let _vars = EnvVars::set(&[
            ("LIBMANAGER_SERVER__PORT", "9300"),
            ("LIBMANAGER_CATALOG__SEED_SAMPLE_DATA", "true"),
        ]);

        let settings = Settings::load_from(dir.path(), "local").unwrap();
        assert_eq!(settings.server.port, 9300);
        assert!(settings.catalog.seed_sample_data);
        assert_eq!(settings.server.host, "0.0.0.0");
    }
}

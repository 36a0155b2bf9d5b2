// Configuration module entry point
// Loads the immutable server configuration and builds the shared request state

mod state;
mod types;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig};

/// Default configuration file name (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_FILE: &str = "fileserve";

/// Startup configuration errors, all fatal
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("FILESERVE_ROOT must be present and point to a subdirectory")]
    MissingRoot,
    #[error("invalid bind address '{ip}:{port}': {reason}")]
    InvalidAddress {
        ip: String,
        port: u16,
        reason: String,
    },
}

impl Config {
    /// Load configuration from the default file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, later ones winning:
    /// 1. Built-in defaults
    /// 2. Optional config file
    /// 3. `SIGN_*` environment (`SIGN_SECRET`)
    /// 4. `FILESERVE_*` environment, nested keys separated by `__`
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SIGN"))
            .add_source(
                config::Environment::with_prefix("FILESERVE")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Self::from_builder(builder)
    }

    /// Apply defaults to `builder`, deserialize and validate
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings = builder
            .set_default("root", "")?
            .set_default("ip", "")?
            .set_default("port", 8080)?
            .set_default("secret", "")?
            .set_default("shutdown_timeout", 10)?
            .set_default("logging.access_log", false)?
            .set_default("logging.access_log_format", "combined")?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()
    }

    /// Normalize the root directory and reject an empty one
    fn validate(mut self) -> Result<Self, ConfigError> {
        self.root = self.root.trim_end_matches('/').to_string();
        if self.root.is_empty() {
            return Err(ConfigError::MissingRoot);
        }
        Ok(self)
    }

    /// Whether writes must carry a valid signature
    pub fn signing_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Resolve `ip:port`, an empty IP meaning all IPv4 interfaces
    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.ip.is_empty() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            self.ip
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddress {
                    ip: self.ip.clone(),
                    port: self.port,
                    reason: e.to_string(),
                })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_overrides(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Config::from_builder(builder)
    }

    #[test]
    fn test_defaults() {
        let cfg = from_overrides(&[("root", "/srv/files")]).unwrap();
        assert_eq!(cfg.root, "/srv/files");
        assert_eq!(cfg.ip, "");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.secret, "");
        assert!(!cfg.signing_enabled());
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.workers, None);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        assert!(matches!(from_overrides(&[]), Err(ConfigError::MissingRoot)));
        // A root of only slashes trims to nothing
        assert!(matches!(
            from_overrides(&[("root", "///")]),
            Err(ConfigError::MissingRoot)
        ));
    }

    #[test]
    fn test_trailing_slashes_stripped() {
        let cfg = from_overrides(&[("root", "/srv/files//")]).unwrap();
        assert_eq!(cfg.root, "/srv/files");
    }

    #[test]
    fn test_port_from_string() {
        let cfg = from_overrides(&[("root", "/srv"), ("port", "9090")]).unwrap();
        assert_eq!(cfg.port, 9090);
    }

    #[test]
    fn test_secret_enables_signing() {
        let cfg = from_overrides(&[("root", "/srv"), ("secret", "s3cr3t")]).unwrap();
        assert!(cfg.signing_enabled());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = from_overrides(&[("root", "/srv")]).unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap(), "0.0.0.0:8080".parse().unwrap());

        let cfg = from_overrides(&[("root", "/srv"), ("ip", "127.0.0.1"), ("port", "81")]).unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap(), "127.0.0.1:81".parse().unwrap());

        let cfg = from_overrides(&[("root", "/srv"), ("ip", "[::1]")]).unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap(), "[::1]:8080".parse().unwrap());

        let cfg = from_overrides(&[("root", "/srv"), ("ip", "not-an-ip")]).unwrap();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }
}

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "医疗陪诊助手";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    "info,peizhen=debug".to_string()
}

/// Get the application data directory (~/Peizhen/ on all platforms)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Peizhen")
}

/// Runtime settings, read from the environment (a `.env` file is honoured).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub database_path: PathBuf,
}

impl Settings {
    /// Read settings from the environment, falling back to defaults that
    /// work for local development.
    pub fn from_env() -> Self {
        Self {
            host: env_parsed("PEIZHEN_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: env_parsed("PEIZHEN_PORT", 8000),
            llm_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            llm_api_key: env_or("OPENAI_API_KEY", ""),
            llm_model: env_or("OPENAI_MODEL", "gpt-4"),
            llm_timeout_secs: env_parsed("OPENAI_TIMEOUT_SECS", 120),
            database_path: std::env::var_os("PEIZHEN_DATABASE")
                .map(PathBuf::from)
                .unwrap_or_else(|| app_data_dir().join("peizhen.db")),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Peizhen"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn env_parsed_falls_back_on_garbage() {
        std::env::set_var("PEIZHEN_TEST_PORT", "not-a-number");
        let port: u16 = env_parsed("PEIZHEN_TEST_PORT", 8000);
        assert_eq!(port, 8000);
        std::env::remove_var("PEIZHEN_TEST_PORT");
    }
}

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Directory for session files; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
    pub session_idle_ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| crate::logging::DEFAULT_LOG_DIRECTIVES.to_string());

        let data_dir = std::env::var("RPS_DATA_DIR")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let session_idle_ttl = Duration::from_secs(env_secs("RPS_SESSION_IDLE_TTL_SECS", 3600));
        let cleanup_interval = Duration::from_secs(env_secs("RPS_CLEANUP_INTERVAL_SECS", 300).max(1));

        Self {
            host,
            port,
            log_level,
            data_dir,
            session_idle_ttl,
            cleanup_interval,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

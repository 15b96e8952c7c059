use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Process-level settings read once at startup. Database settings live in
/// `db::config` so the server can still boot without a reachable database.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub seed_demo_items: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let seed_demo_items = env_flag("SEED_DEMO_ITEMS").unwrap_or(false);

        Self {
            host,
            port,
            log_level,
            seed_demo_items,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 3000,
            },
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or(defaults.server.host),
            port: match std::env::var("APP_PORT") {
                Ok(v) => v.parse::<u16>().with_context(|| format!("APP_PORT={v}"))?,
                Err(_) => defaults.server.port,
            },
        };
        let max_body_bytes = match std::env::var("MAX_BODY_BYTES") {
            Ok(v) => v
                .parse::<usize>()
                .with_context(|| format!("MAX_BODY_BYTES={v}"))?,
            Err(_) => defaults.max_body_bytes,
        };
        Ok(Self {
            server,
            max_body_bytes,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_port_3000() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
        assert_eq!(cfg.max_body_bytes, 10 * 1024 * 1024);
    }
}

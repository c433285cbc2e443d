use super::{parsed, var_or};
use crate::core::Result;

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            workers: default_workers(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: var_or("SERVER_HOST", "0.0.0.0"),
            port: parsed("SERVER_PORT", "8080")?,
            workers: parsed("SERVER_WORKERS", &default_workers().to_string())?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! Server configuration.

use std::time::Duration;

/// Runtime configuration for both service endpoints.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hostname or IP advertised to clients in reconnect TLVs.
    pub oscar_host: String,
    /// Main (BOS) service port.
    pub bos_port: u16,
    /// Chat service port.
    pub chat_port: u16,
    /// Accept unknown screen names and wrong passwords, materializing stub
    /// users. Development only.
    pub disable_auth: bool,
    /// Idle read deadline; a connection silent this long is closed.
    pub read_timeout: Duration,
}

impl Config {
    /// `host:port` the main service advertises.
    #[must_use]
    pub fn bos_address(&self) -> String {
        format!("{}:{}", self.oscar_host, self.bos_port)
    }

    /// `host:port` the chat service advertises.
    #[must_use]
    pub fn chat_address(&self) -> String {
        format!("{}:{}", self.oscar_host, self.chat_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oscar_host: "127.0.0.1".to_string(),
            bos_port: 5190,
            chat_port: 5191,
            disable_auth: false,
            read_timeout: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertised_addresses_join_host_and_port() {
        let config = Config { oscar_host: "10.0.0.7".to_string(), ..Config::default() };
        assert_eq!(config.bos_address(), "10.0.0.7:5190");
        assert_eq!(config.chat_address(), "10.0.0.7:5191");
    }
}

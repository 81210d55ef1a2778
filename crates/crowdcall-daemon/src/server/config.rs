//! Server configuration.

use std::net::SocketAddr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP bind address.
    pub tcp_addr: SocketAddr,

    /// Leaderboard size when a request does not specify a limit.
    pub default_leaderboard_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tcp_addr: SocketAddr::from(([127, 0, 0, 1], 50061)),
            default_leaderboard_limit: 10,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with the given bind address.
    pub fn tcp(addr: SocketAddr) -> Self {
        Self {
            tcp_addr: addr,
            ..Default::default()
        }
    }

    /// Set the default leaderboard size.
    #[must_use]
    pub const fn with_default_leaderboard_limit(mut self, limit: u32) -> Self {
        self.default_leaderboard_limit = limit;
        self
    }
}

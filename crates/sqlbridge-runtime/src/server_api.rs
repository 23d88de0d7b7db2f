//! Capability handle the host passes to modules at load time.

use std::fmt;

/// Read-only view of the hosting server.
pub trait ServerApi: Send + Sync {
    /// Server name
    fn name(&self) -> String;

    /// Listening port
    fn port(&self) -> u32;

    /// Connected client count
    fn player_count(&self) -> u8;

    /// Maximum client count
    fn max_players(&self) -> u8;

    /// Game identifier
    fn game(&self) -> u8;

    /// Name of the client at `index`, if connected
    fn client_name(&self, index: u32) -> Option<String>;
}

impl fmt::Debug for dyn ServerApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerApi")
            .field("name", &self.name())
            .field("port", &self.port())
            .finish()
    }
}

/// A fixed `ServerApi`, used by standalone hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticServerApi {
    name: String,
    port: u32,
    max_players: u8,
    game: u8,
    clients: Vec<String>,
}

impl StaticServerApi {
    /// Create a server description with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the listening port.
    pub fn with_port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }

    /// Set the maximum client count.
    pub fn with_max_players(mut self, max: u8) -> Self {
        self.max_players = max;
        self
    }

    /// Add a connected client.
    pub fn with_client(mut self, name: impl Into<String>) -> Self {
        self.clients.push(name.into());
        self
    }
}

impl ServerApi for StaticServerApi {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn port(&self) -> u32 {
        self.port
    }

    fn player_count(&self) -> u8 {
        self.clients.len().min(u8::MAX as usize) as u8
    }

    fn max_players(&self) -> u8 {
        self.max_players
    }

    fn game(&self) -> u8 {
        self.game
    }

    fn client_name(&self, index: u32) -> Option<String> {
        self.clients.get(index as usize).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_server_api() {
        let api = StaticServerApi::new("test-server")
            .with_port(7777)
            .with_max_players(32)
            .with_client("alice")
            .with_client("bob");

        assert_eq!(api.name(), "test-server");
        assert_eq!(api.port(), 7777);
        assert_eq!(api.player_count(), 2);
        assert_eq!(api.client_name(1).as_deref(), Some("bob"));
        assert_eq!(api.client_name(2), None);
    }
}

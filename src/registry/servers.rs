//! Advertised game server registry.

use crate::config::schema::ServerEntry;

/// Immutable, order-preserving set of advertised game servers.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    entries: Vec<ServerEntry>,
}

impl ServerRegistry {
    /// Build the registry from validated config entries.
    pub fn from_config(entries: &[ServerEntry]) -> Self {
        Self {
            entries: entries.to_vec(),
        }
    }

    /// All entries in configuration order.
    pub fn entries(&self) -> &[ServerEntry] {
        &self.entries
    }

    /// Look up an entry by its stable server name.
    pub fn get(&self, server_name: &str) -> Option<&ServerEntry> {
        self.entries
            .iter()
            .find(|entry| entry.server_name == server_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ServerEntry {
        ServerEntry {
            server_name: name.to_string(),
            ..ServerEntry::default()
        }
    }

    #[test]
    fn preserves_configuration_order() {
        let registry =
            ServerRegistry::from_config(&[entry("beta_eu"), entry("alpha_us"), entry("dev_local")]);

        let names: Vec<_> = registry
            .entries()
            .iter()
            .map(|e| e.server_name.as_str())
            .collect();
        assert_eq!(names, ["beta_eu", "alpha_us", "dev_local"]);
    }

    #[test]
    fn lookup_by_server_name() {
        let registry = ServerRegistry::from_config(&[entry("alpha_us"), entry("beta_eu")]);

        assert!(registry.get("beta_eu").is_some());
        assert!(registry.get("gamma_jp").is_none());
        assert_eq!(registry.len(), 2);
    }
}

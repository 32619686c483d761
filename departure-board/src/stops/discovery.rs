//! Board locations and stop resolution.

use tracing::info;

use crate::domain::{Mode, StopRef};

use super::client::{StopSearchClient, select_stop};
use super::error::DiscoveryError;

/// A board the operator wants on screen, before its stop is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLocation {
    /// Name shown on the board.
    pub name: String,
    /// Text sent to the stop search.
    pub search_term: String,
    pub mode: Mode,
}

impl BoardLocation {
    pub fn new(name: impl Into<String>, search_term: impl Into<String>, mode: Mode) -> Self {
        Self {
            name: name.into(),
            search_term: search_term.into(),
            mode,
        }
    }

    /// The three downtown Auckland boards: train, bus and ferry.
    pub fn defaults() -> Vec<BoardLocation> {
        vec![
            BoardLocation::new("Waitemata Station", "Waitemata", Mode::Train),
            BoardLocation::new("Britomart Bus Hub", "Britomart", Mode::Bus),
            BoardLocation::new("Downtown Ferry Terminal", "Downtown Ferry", Mode::Ferry),
        ]
    }
}

/// Resolves board locations to stops.
#[derive(Debug, Clone)]
pub enum StopDirectory {
    /// Search the live stop API.
    Live(StopSearchClient),
    /// No credential: hand out placeholder stop ids without network access.
    Simulated,
}

impl StopDirectory {
    /// Resolve one location. `index` is the board's position on screen.
    pub async fn resolve(
        &self,
        location: &BoardLocation,
        index: usize,
    ) -> Result<StopRef, DiscoveryError> {
        match self {
            StopDirectory::Simulated => Ok(StopRef::new(
                location.mode,
                format!("mock_{index}"),
                location.name.clone(),
            )),
            StopDirectory::Live(client) => {
                let items = client.search(&location.search_term).await?;
                let item = select_stop(&items)
                    .ok_or_else(|| DiscoveryError::NotFound(location.search_term.clone()))?;
                info!(
                    board = %location.name,
                    stop_id = %item.id,
                    stop_name = item.attributes.stop_name.as_deref().unwrap_or("?"),
                    "resolved stop"
                );
                Ok(StopRef::new(location.mode, item.id.clone(), location.name.clone()))
            }
        }
    }

    /// Resolve every location, in order. Any failure fails the whole set.
    pub async fn resolve_all(
        &self,
        locations: &[BoardLocation],
    ) -> Result<Vec<StopRef>, DiscoveryError> {
        let mut stops = Vec::with_capacity(locations.len());
        for (index, location) in locations.iter().enumerate() {
            stops.push(self.resolve(location, index).await?);
        }
        Ok(stops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stops::StopSearchConfig;

    #[test]
    fn default_locations() {
        let locations = BoardLocation::defaults();
        let modes: Vec<Mode> = locations.iter().map(|l| l.mode).collect();
        assert_eq!(modes, vec![Mode::Train, Mode::Bus, Mode::Ferry]);
        assert_eq!(locations[2].search_term, "Downtown Ferry");
    }

    #[tokio::test]
    async fn simulated_ids_follow_board_order() {
        let stops = StopDirectory::Simulated
            .resolve_all(&BoardLocation::defaults())
            .await
            .unwrap();

        let ids: Vec<&str> = stops.iter().map(|s| s.stop_id()).collect();
        assert_eq!(ids, vec!["mock_0", "mock_1", "mock_2"]);
        assert_eq!(stops[1].display_name(), "Britomart Bus Hub");
        assert_eq!(stops[1].mode(), Mode::Bus);
    }

    #[tokio::test]
    async fn live_failure_fails_whole_set() {
        let client = StopSearchClient::new(
            StopSearchConfig::new("key")
                .with_base_url("http://127.0.0.1:9")
                .with_timeout(1),
        )
        .unwrap();

        let result = StopDirectory::Live(client)
            .resolve_all(&BoardLocation::defaults())
            .await;
        assert!(matches!(result, Err(DiscoveryError::Http(_))));
    }
}

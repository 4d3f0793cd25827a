//! Routing table rebuilds on catalog change.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::discovery::CatalogRecord;
use crate::routing::{MatcherRegistry, RoutingTable, SharedTable, TableError};
use crate::synthesis::Synthesizer;

/// Rebuilds and publishes the routing table from catalog snapshots.
#[derive(Debug, Clone)]
pub struct Reloader {
    table: Arc<SharedTable>,
    synthesizer: Synthesizer,
    registry: MatcherRegistry,
}

impl Reloader {
    pub fn new(table: Arc<SharedTable>, synthesizer: Synthesizer, registry: MatcherRegistry) -> Self {
        Self {
            table,
            synthesizer,
            registry,
        }
    }

    /// Build a table from one snapshot and publish it.
    ///
    /// On error the live table is left untouched.
    pub fn apply(&self, records: &[CatalogRecord]) -> Result<Arc<RoutingTable>, TableError> {
        let table = RoutingTable::from_catalog(records, &self.synthesizer, &self.registry)?;
        self.table.publish(table);
        Ok(self.table.load())
    }

    /// Apply snapshots until shutdown is signalled or the sender goes away.
    pub async fn run(
        self,
        mut updates: mpsc::UnboundedReceiver<Vec<CatalogRecord>>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(records) = update else {
                        tracing::info!("Catalog updates closed");
                        break;
                    };
                    if let Err(e) = self.apply(&records) {
                        tracing::error!(route = %e.route(), error = %e, "Rejected routing table rebuild");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reload loop stopping");
                    break;
                }
            }
        }
    }
}

//! Atomic publication of routing tables.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::table::RoutingTable;

/// The live routing table.
///
/// Readers take a snapshot with [`load`](Self::load) and keep it for the
/// whole request; a concurrent [`publish`](Self::publish) never tears it.
#[derive(Debug)]
pub struct SharedTable {
    current: ArcSwap<RoutingTable>,
}

impl SharedTable {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// Current table snapshot.
    pub fn load(&self) -> Arc<RoutingTable> {
        self.current.load_full()
    }

    /// Swap in a new table, returning the one it replaced.
    pub fn publish(&self, table: RoutingTable) -> Arc<RoutingTable> {
        let routes = table.len();
        let previous = self.current.swap(Arc::new(table));
        tracing::info!(routes, previous_routes = previous.len(), "Routing table published");
        previous
    }
}

impl Default for SharedTable {
    fn default() -> Self {
        Self::new(RoutingTable::default())
    }
}

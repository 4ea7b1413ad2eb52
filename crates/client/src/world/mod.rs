// World state cache: the last snapshot received from the server
use protocol::{Food, Player, Snapshot};

/// Holds exactly the most recent snapshot. Each update replaces the whole
/// thing; nothing is merged or interpolated.
#[derive(Debug, Default)]
pub struct WorldCache {
    snapshot: Snapshot,
    revision: u64,
    updated_at: Option<f64>,
}

impl WorldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new snapshot. `now_ms` is only kept for diagnostics.
    pub fn replace(&mut self, snapshot: Snapshot, now_ms: f64) {
        self.snapshot = snapshot;
        self.revision += 1;
        self.updated_at = Some(now_ms);
    }

    pub fn players(&self) -> &[Player] {
        &self.snapshot.players
    }

    pub fn foods(&self) -> &[Food] {
        &self.snapshot.foods
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.snapshot.players.iter().find(|p| p.id == id)
    }

    /// Number of snapshots applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn updated_at(&self) -> Option<f64> {
        self.updated_at
    }
}

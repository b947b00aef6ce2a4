use std::sync::Arc;

use jiff::Timestamp;
use parking_lot::RwLock;

/// When the catalog last committed a refresh, for this process only.
///
/// Starts out empty. Only the refresh orchestrator writes it, once per
/// committed refresh; clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    last_refreshed_at: Arc<RwLock<Option<Timestamp>>>,
}

impl RefreshState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_refreshed_at(&self) -> Option<Timestamp> {
        *self.last_refreshed_at.read()
    }

    pub(crate) fn publish(&self, at: Timestamp) {
        *self.last_refreshed_at.write() = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_is_shared_between_clones() {
        let state = RefreshState::new();
        let reader = state.clone();
        assert_eq!(reader.last_refreshed_at(), None);

        let at = Timestamp::from_second(1_700_000_000).unwrap();
        state.publish(at);
        assert_eq!(reader.last_refreshed_at(), Some(at));
    }
}

use serde::Serialize;

use crate::planner::Transition;

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub devices_checked: usize,
    pub connected: usize,
    pub disconnected: usize,
    pub roamed: usize,
    pub refreshed: usize,
    pub blocked_changes: usize,
    pub intervals_closed: usize,
    pub intervals_opened: usize,
    pub intervals_healed: usize,
    pub lookup_failures: usize,
    pub events_emitted: usize,
    pub delivery_failures: usize,
}

impl CycleReport {
    pub(crate) fn count(&mut self, transition: Transition) {
        match transition {
            Transition::Idle => {}
            Transition::Connected => self.connected += 1,
            Transition::Disconnected => self.disconnected += 1,
            Transition::Roamed => self.roamed += 1,
            Transition::Refreshed => self.refreshed += 1,
        }
    }

    pub fn has_transitions(&self) -> bool {
        self.connected + self.disconnected + self.roamed + self.blocked_changes > 0
    }
}

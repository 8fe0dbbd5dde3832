//! Tab lifecycle tracking.
//!
//! The DevTools endpoint has no push channel for tab events, so the daemon
//! polls the target list and diffs successive snapshots. Chrome orders
//! targets most-recently-activated first, so the first page entry is the
//! foreground tab: a change of its id is a tab switch, a change of its URL
//! is a completed navigation.

use crate::tabs::TabTarget;
use crate::types::TabEvent;
use std::collections::HashSet;
use tracing::trace;

/// Tracks the foreground tab across target-list polls.
#[derive(Default)]
pub struct TabTracker {
    /// Foreground target id and URL from the previous poll
    foreground: Option<(String, String)>,
    /// All target ids from the previous poll
    known: HashSet<String>,
    /// Whether at least one poll has been observed
    primed: bool,
}

impl TabTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one target-list snapshot and report the events it implies.
    ///
    /// The first snapshot primes the tracker and reports nothing: events are
    /// changes between polls, not initial state.
    pub fn observe(&mut self, targets: &[TabTarget]) -> Vec<TabEvent> {
        let mut events = Vec::new();

        let current_ids: HashSet<String> = targets.iter().map(|t| t.id.clone()).collect();
        for id in current_ids.difference(&self.known) {
            trace!("Tab opened: {}", id);
        }
        for id in self.known.difference(&current_ids) {
            trace!("Tab closed: {}", id);
        }

        let foreground = targets
            .first()
            .map(|t| (t.id.clone(), t.url.clone()));

        if self.primed {
            match (&self.foreground, &foreground) {
                (Some((prev_id, prev_url)), Some((id, url))) => {
                    if prev_id != id {
                        events.push(TabEvent::ForegroundSwitched {
                            target_id: id.clone(),
                        });
                    } else if prev_url != url {
                        events.push(TabEvent::ForegroundNavigated { url: url.clone() });
                    }
                }
                (None, Some((id, _))) => {
                    events.push(TabEvent::ForegroundSwitched {
                        target_id: id.clone(),
                    });
                }
                _ => {}
            }
        }

        self.foreground = foreground;
        self.known = current_ids;
        self.primed = true;

        events
    }
}

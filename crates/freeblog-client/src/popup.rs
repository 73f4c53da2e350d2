//! Global click fan-out for pop-up menus
//!
//! Every open pop-up menu holds a [`PopupMenuSubscription`]. A click anywhere
//! is reported once through [`PopupMenus::global_click`], and each menu decides
//! on its own whether to close. Dropping the subscription unregisters the menu.

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::LOG_TARGET;

const DEFAULT_CAPACITY: usize = 16;

/// Notification sent to menus on any global click. No payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalClick;

/// Registry of currently rendered pop-up menus
#[derive(Debug, Clone)]
pub struct PopupMenus {
    tx: broadcast::Sender<GlobalClick>,
}

impl Default for PopupMenus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PopupMenus {
    /// `capacity` clicks can be pending per menu; `0` is treated as `1`
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a newly rendered menu
    pub fn subscribe(&self) -> PopupMenuSubscription {
        PopupMenuSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn menu_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Notify every registered menu about a click
    ///
    /// Returns the number of menus notified.
    pub fn global_click(&self) -> usize {
        match self.tx.send(GlobalClick) {
            Ok(count) => {
                trace!(target: LOG_TARGET, count, "Global click dispatched");
                count
            }
            Err(_) => 0,
        }
    }
}

/// One menu's view of the global clicks
#[derive(Debug)]
pub struct PopupMenuSubscription {
    rx: broadcast::Receiver<GlobalClick>,
}

impl PopupMenuSubscription {
    /// Wait for the next global click
    ///
    /// Returns `None` once the [`PopupMenus`] registry is gone.
    pub async fn next_click(&mut self) -> Option<GlobalClick> {
        match self.rx.recv().await {
            Ok(click) => Some(click),
            // Missed some clicks, but a click did happen
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(target: LOG_TARGET, missed = n, "Popup menu lagging behind clicks");
                Some(GlobalClick)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Drain pending clicks without waiting; `true` if there was at least one
    pub fn take_clicks(&mut self) -> bool {
        let mut clicked = false;
        loop {
            match self.rx.try_recv() {
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => clicked = true,
                Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                    return clicked;
                }
            }
        }
    }
}

//! Client-side mirror of a bound seat: its capabilities and name, plus
//! change notifications for subscribers.

use lattice_core::protocol::{SeatCapabilities, SeatEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatChange {
    Capabilities(SeatCapabilities),
    Name(String),
}

/// Last known state of a bound seat.
#[derive(Debug, Default)]
pub struct SeatMirror {
    capabilities: SeatCapabilities,
    /// `None` until a name event arrives; seats bound below version 2 never get one.
    name: Option<String>,
    listeners: Vec<UnboundedSender<SeatChange>>,
}

impl SeatMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capabilities(&self) -> SeatCapabilities {
        self.capabilities
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has_pointer(&self) -> bool {
        self.capabilities.contains(SeatCapabilities::POINTER)
    }

    pub fn has_keyboard(&self) -> bool {
        self.capabilities.contains(SeatCapabilities::KEYBOARD)
    }

    pub fn has_touch(&self) -> bool {
        self.capabilities.contains(SeatCapabilities::TOUCH)
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<SeatChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    pub fn handle_event(&mut self, event: SeatEvent) {
        let change = match event {
            SeatEvent::Capabilities(caps) => {
                if caps == self.capabilities {
                    return;
                }
                debug!("Seat capabilities: {:?} -> {:?}", self.capabilities, caps);
                self.capabilities = caps;
                SeatChange::Capabilities(caps)
            }
            SeatEvent::Name(name) => {
                if self.name.as_deref() == Some(name.as_str()) {
                    return;
                }
                debug!("Seat name: {}", name);
                self.name = Some(name.clone());
                SeatChange::Name(name)
            }
        };
        self.listeners.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mirror_reports_only_changes() {
        let mut seat = SeatMirror::new();
        let mut rx = seat.subscribe();
        seat.handle_event(SeatEvent::Capabilities(SeatCapabilities::POINTER));
        seat.handle_event(SeatEvent::Capabilities(SeatCapabilities::POINTER));
        seat.handle_event(SeatEvent::Name("seat0".into()));
        seat.handle_event(SeatEvent::Name("seat0".into()));

        assert!(seat.has_pointer());
        assert!(!seat.has_keyboard());
        assert_eq!(seat.name(), Some("seat0"));
        assert_eq!(rx.try_recv().unwrap(), SeatChange::Capabilities(SeatCapabilities::POINTER));
        assert_eq!(rx.try_recv().unwrap(), SeatChange::Name("seat0".into()));
        assert!(rx.try_recv().is_err());
    }
}

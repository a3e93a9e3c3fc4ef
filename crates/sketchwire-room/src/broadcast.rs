//! Broadcast fan-out: serialize once, deliver to every open connection.

use std::sync::Arc;

use sketchwire_protocol::{Codec, JsonCodec, ServerEvent, SessionId};
use sketchwire_session::ConnectionRegistry;
use sketchwire_transport::ConnectionId;

/// Delivers server events through the connection registry.
///
/// A failed send to one recipient is logged by the registry and never
/// removes the connection; removal only happens when the connection's
/// own handler reports it closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fanout {
    codec: JsonCodec,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    fn encode(&self, event: &ServerEvent) -> Option<Arc<str>> {
        match self.codec.encode(event) {
            Ok(frame) => Some(Arc::from(frame)),
            Err(e) => {
                tracing::error!(kind = event.kind(), error = %e, "failed to encode event");
                None
            }
        }
    }

    /// Sends `event` to every open connection except `exclude`.
    pub fn broadcast(
        &self,
        registry: &ConnectionRegistry,
        event: &ServerEvent,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let Some(frame) = self.encode(event) else {
            return 0;
        };
        tracing::trace!(kind = event.kind(), "broadcast");
        registry.for_each_open(|entry| {
            if Some(entry.connection) == exclude {
                return Ok(());
            }
            entry.deliver(frame.clone())
        })
    }

    /// Sends `drawer_event` to the drawer and `guesser_event` to everyone
    /// else. Each variant is serialized once.
    pub fn broadcast_split(
        &self,
        registry: &ConnectionRegistry,
        drawer: &SessionId,
        drawer_event: &ServerEvent,
        guesser_event: &ServerEvent,
    ) -> usize {
        let (Some(drawer_frame), Some(guesser_frame)) =
            (self.encode(drawer_event), self.encode(guesser_event))
        else {
            return 0;
        };
        registry.for_each_open(|entry| {
            if &entry.session_id == drawer {
                entry.deliver(drawer_frame.clone())
            } else {
                entry.deliver(guesser_frame.clone())
            }
        })
    }

    /// Sends `event` to one connection, if it is registered and open.
    pub fn send_to(
        &self,
        registry: &ConnectionRegistry,
        connection: ConnectionId,
        event: &ServerEvent,
    ) -> bool {
        let Some(entry) = registry.find_by_connection(connection) else {
            return false;
        };
        let Some(frame) = self.encode(event) else {
            return false;
        };
        match entry.deliver(frame) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%connection, error = %e, "direct send failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchwire_session::{Outbound, outbound_channel};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn setup(names: &[&str]) -> (ConnectionRegistry, Vec<UnboundedReceiver<Outbound>>) {
        let mut reg = ConnectionRegistry::new();
        let mut rxs = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let (tx, rx) = outbound_channel();
            reg.register(conn(i as u64 + 1), name, tx).unwrap();
            rxs.push(rx);
        }
        (reg, rxs)
    }

    fn frame(rx: &mut UnboundedReceiver<Outbound>) -> Option<String> {
        match rx.try_recv() {
            Ok(Outbound::Frame(f)) => Some(f.to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_broadcast_excludes_author() {
        let (reg, mut rxs) = setup(&["a", "b", "c"]);
        let sent = Fanout::new().broadcast(&reg, &ServerEvent::ClearCanvas, Some(conn(2)));

        assert_eq!(sent, 3, "excluded recipient counts as handled");
        assert_eq!(frame(&mut rxs[0]).as_deref(), Some(r#"{"type":"clearCanvas"}"#));
        assert!(frame(&mut rxs[1]).is_none());
        assert!(frame(&mut rxs[2]).is_some());
    }

    #[test]
    fn test_broadcast_survives_dead_recipient() {
        let (reg, mut rxs) = setup(&["a", "b", "c"]);
        let dead = rxs.remove(1);
        drop(dead);

        Fanout::new().broadcast(&reg, &ServerEvent::error("x"), None);

        assert!(frame(&mut rxs[0]).is_some());
        assert!(frame(&mut rxs[1]).is_some());
        assert_eq!(reg.len(), 3, "fan-out never unregisters");
    }

    #[test]
    fn test_broadcast_split_sends_word_only_to_drawer() {
        let (reg, mut rxs) = setup(&["a", "b"]);
        let drawer = reg.find_by_connection(conn(1)).unwrap().session_id.clone();

        Fanout::new().broadcast_split(
            &reg,
            &drawer,
            &ServerEvent::Chat { sender: "s".into(), content: "secret".into() },
            &ServerEvent::Chat { sender: "s".into(), content: "______".into() },
        );

        assert!(frame(&mut rxs[0]).unwrap().contains("secret"));
        assert!(!frame(&mut rxs[1]).unwrap().contains("secret"));
    }

    #[test]
    fn test_send_to_unknown_connection_is_false() {
        let (reg, _rxs) = setup(&["a"]);
        assert!(!Fanout::new().send_to(&reg, conn(99), &ServerEvent::ClearCanvas));
        assert!(Fanout::new().send_to(&reg, conn(1), &ServerEvent::ClearCanvas));
    }
}

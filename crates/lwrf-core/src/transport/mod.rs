// ── UDP transport ──
//
// Sending side of the hub link. Each datagram is `<code>,<address><body>`
// where `code` is a monotonically increasing sequence number rendered with
// at least three digits. Replies come back on a separate socket, handled
// by the receive task in `receive`.

pub mod listeners;
pub mod receive;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::command::HubCommand;
use crate::error::CoreError;
use crate::queue::ReplySender;

pub use listeners::{ListenerMap, listener_key};
pub use receive::{Reply, parse_reply};

/// Pending listeners beyond which the hub is probably not answering.
const BACKLOG_WARN_THRESHOLD: usize = 1;

/// Render a sequence number as a wire code: zero-padded to three digits,
/// wider once the counter passes 999.
pub fn sequence_code(sequence: u64) -> String {
    format!("{sequence:03}")
}

/// Sends commands to the hub and registers reply listeners.
#[derive(Debug)]
pub struct HubTransport {
    socket: UdpSocket,
    hub_addr: SocketAddr,
    sequence: AtomicU64,
    listeners: Arc<ListenerMap>,
}

impl HubTransport {
    /// Bind an ephemeral send socket with broadcast enabled, so a broadcast
    /// hub address works.
    pub async fn bind(hub_addr: SocketAddr, listeners: Arc<ListenerMap>) -> Result<Self, CoreError> {
        let local: IpAddr = if hub_addr.is_ipv4() {
            Ipv4Addr::UNSPECIFIED.into()
        } else {
            Ipv6Addr::UNSPECIFIED.into()
        };
        let socket = UdpSocket::bind((local, 0)).await?;
        socket.set_broadcast(true)?;
        debug!(local = ?socket.local_addr().ok(), hub = %hub_addr, "hub send socket bound");

        Ok(Self {
            socket,
            hub_addr,
            sequence: AtomicU64::new(0),
            listeners,
        })
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Send one command. With a reply sender, a listener is registered
    /// before the datagram leaves. Returns the sequence code used.
    pub async fn send(&self, command: &HubCommand, reply: Option<ReplySender>) -> String {
        let sequence = self.next_sequence();
        let code = sequence_code(sequence);
        let payload = format!("{code},{}", command.wire());

        let key = reply.map(|reply| {
            let key = listener_key(sequence);
            let pending = self.listeners.register(key.clone(), reply);
            if pending > BACKLOG_WARN_THRESHOLD {
                warn!(
                    pending,
                    "hub is not answering; check its IP address and that this client is registered on the hub"
                );
            }
            key
        });

        match self.socket.send_to(payload.as_bytes(), self.hub_addr).await {
            Ok(_) => debug!(code = %code, command = %command.label(), "sent to hub"),
            Err(e) => {
                warn!(code = %code, error = %e, "failed to send to hub");
                if let Some(key) = key {
                    self.listeners.fail(&key, CoreError::Socket(e));
                }
            }
        }
        code
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    use super::*;
    use crate::queue::Ack;

    #[test]
    fn codes_are_padded_then_widen() {
        assert_eq!(sequence_code(1), "001");
        assert_eq!(sequence_code(42), "042");
        assert_eq!(sequence_code(999), "999");
        assert_eq!(sequence_code(1000), "1000");
    }

    #[tokio::test]
    async fn datagram_carries_code_and_wire_text() {
        let hub = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let listeners = Arc::new(ListenerMap::new());
        let transport = HubTransport::bind(hub.local_addr().unwrap(), Arc::clone(&listeners))
            .await
            .unwrap();

        let (tx, mut rx) = oneshot::channel();
        assert_eq!(transport.send(&HubCommand::on(1, 2), Some(tx)).await, "001");
        assert_eq!(transport.send(&HubCommand::room_off(3), None).await, "002");

        let mut buf = [0u8; 64];
        let (n, _) = hub.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"001,!R1D2F1\0");
        let (n, _) = hub.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"002,!R3Fa\0");

        // Only the first command asked for a reply.
        assert_eq!(listeners.len(), 1);
        assert!(listeners.resolve("1", "OK".into()));
        assert_eq!(rx.try_recv().unwrap().unwrap(), Ack::Replied("OK".into()));
    }
}

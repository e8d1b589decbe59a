// ── Reply receiving ──
//
// The hub answers on a fixed port with `<code>,<content>`. Unsolicited
// status pushes start with `*!` and carry JSON; they are ignored.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::listeners::ListenerMap;

const STATUS_PUSH_PREFIX: &[u8] = b"*!";
const RECV_BUFFER_SIZE: usize = 2048;
/// How often expired listeners are swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// A parsed hub reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Listener key: the code's numeric value without padding.
    pub key: String,
    /// Everything after the first comma, with CR and LF removed.
    pub content: String,
}

/// Parse a reply payload. Returns `None` for status pushes and for
/// anything without a numeric code before the first comma.
pub fn parse_reply(payload: &[u8]) -> Option<Reply> {
    if payload.starts_with(STATUS_PUSH_PREFIX) {
        return None;
    }
    let text = String::from_utf8_lossy(payload);
    let (code, content) = text.split_once(',')?;
    let sequence: u64 = code.trim().parse().ok()?;
    Some(Reply {
        key: sequence.to_string(),
        content: content.chars().filter(|c| !matches!(c, '\r' | '\n')).collect(),
    })
}

/// Route one datagram to its listener. Returns `true` if a listener took it.
pub fn handle_datagram(
    listeners: &ListenerMap,
    hub_ip: IpAddr,
    src: SocketAddr,
    payload: &[u8],
) -> bool {
    if src.ip().to_canonical() != hub_ip.to_canonical() {
        trace!(%src, "ignoring datagram from foreign address");
        return false;
    }
    let Some(reply) = parse_reply(payload) else {
        trace!(%src, len = payload.len(), "ignoring unparseable or status datagram");
        return false;
    };
    let matched = listeners.resolve(&reply.key, reply.content);
    if matched {
        debug!(code = %reply.key, "hub reply matched");
    } else {
        trace!(code = %reply.key, "no listener for hub reply");
    }
    matched
}

/// Receive loop: routes replies and sweeps expired listeners until
/// cancelled. A socket error ends the task and closes the socket.
pub async fn receive_task(
    socket: UdpSocket,
    hub_ip: IpAddr,
    listeners: Arc<ListenerMap>,
    reply_ttl: Duration,
    cancel: CancellationToken,
) {
    let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, src)) => {
                    handle_datagram(&listeners, hub_ip, src, &buf[..len]);
                }
                Err(e) => {
                    warn!(error = %e, "hub receive socket failed");
                    break;
                }
            },
            _ = sweep.tick() => {
                let expired = listeners.sweep(reply_ttl);
                if expired > 0 {
                    debug!(expired, "swept expired reply listeners");
                }
            }
        }
    }
    debug!("receive task stopped");
}

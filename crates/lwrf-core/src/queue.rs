// ── Command queue ──
//
// Pending hub commands, owned by the dispatcher task. Enqueueing coalesces
// exact duplicates, supersedes older commands for the same address and
// keeps the queue within its capacity. Every entry's reply sender is
// resolved exactly once: by the transport after dispatch, or here when the
// entry is coalesced, superseded, evicted or failed on close.

use std::collections::VecDeque;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::command::HubCommand;
use crate::config::OverflowPolicy;
use crate::error::CoreError;

/// How a hub command completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// The hub answered; carries the reply content.
    Replied(String),
    /// An identical command was already queued and will be sent instead.
    Coalesced,
    /// A newer command for the same address replaced this one before it was sent.
    Superseded,
}

impl Ack {
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Replied(content) => Some(content),
            Self::Coalesced | Self::Superseded => None,
        }
    }
}

pub type ReplySender = oneshot::Sender<Result<Ack, CoreError>>;

/// Resolve an optional reply sender. A dropped receiver is not an error.
pub(crate) fn resolve(reply: Option<ReplySender>, result: Result<Ack, CoreError>) {
    if let Some(tx) = reply {
        let _ = tx.send(result);
    }
}

/// A command waiting for its dispatch slot.
#[derive(Debug)]
pub struct PendingCommand {
    pub command: HubCommand,
    pub reply: Option<ReplySender>,
}

/// Result of [`CommandQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Appended; `superseded` older entries for the address were removed and
    /// `evicted` entries were dropped for capacity.
    Queued { superseded: usize, evicted: usize },
    /// Already queued; nothing changed.
    Coalesced,
}

#[derive(Debug)]
pub struct CommandQueue {
    entries: VecDeque<PendingCommand>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl CommandQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    pub fn enqueue(&mut self, command: HubCommand, reply: Option<ReplySender>) -> EnqueueOutcome {
        if self.entries.iter().any(|entry| entry.command == command) {
            debug!(command = %command.label(), "identical command already queued");
            resolve(reply, Ok(Ack::Coalesced));
            return EnqueueOutcome::Coalesced;
        }

        let mut superseded = 0;
        let mut kept = VecDeque::with_capacity(self.capacity);
        for entry in self.entries.drain(..) {
            if entry.command.address == command.address {
                debug!(
                    old = %entry.command.label(),
                    new = %command.label(),
                    "superseding queued command"
                );
                resolve(entry.reply, Ok(Ack::Superseded));
                superseded += 1;
            } else {
                kept.push_back(entry);
            }
        }
        self.entries = kept;
        self.entries.push_back(PendingCommand { command, reply });

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            let victim = match self.policy {
                OverflowPolicy::DropOldest => self.entries.pop_front(),
                OverflowPolicy::DropNewest => self.entries.pop_back(),
            };
            let Some(victim) = victim else { break };
            warn!(
                command = %victim.command.label(),
                capacity = self.capacity,
                "command queue full, dropping command"
            );
            resolve(
                victim.reply,
                Err(CoreError::QueueOverflow {
                    address: victim.command.label(),
                    capacity: self.capacity,
                }),
            );
            evicted += 1;
        }

        EnqueueOutcome::Queued {
            superseded,
            evicted,
        }
    }

    /// Remove the oldest entry for dispatch.
    pub fn pop(&mut self) -> Option<PendingCommand> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued commands, oldest first.
    pub fn commands(&self) -> impl Iterator<Item = &HubCommand> {
        self.entries.iter().map(|entry| &entry.command)
    }

    /// Empty the queue, failing every waiting caller with `HubClosed`.
    pub fn close(&mut self) -> usize {
        let drained = self.entries.len();
        for entry in self.entries.drain(..) {
            resolve(entry.reply, Err(CoreError::HubClosed));
        }
        drained
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::command::Action;

    fn queue() -> CommandQueue {
        CommandQueue::new(100, OverflowPolicy::DropOldest)
    }

    fn with_reply() -> (Option<ReplySender>, oneshot::Receiver<Result<Ack, CoreError>>) {
        let (tx, rx) = oneshot::channel();
        (Some(tx), rx)
    }

    #[test]
    fn identical_command_is_coalesced() {
        let mut q = queue();
        q.enqueue(HubCommand::on(1, 1), None);
        let (reply, mut rx) = with_reply();

        let outcome = q.enqueue(HubCommand::on(1, 1), reply);

        assert_eq!(outcome, EnqueueOutcome::Coalesced);
        assert_eq!(q.len(), 1);
        assert_eq!(rx.try_recv().unwrap().unwrap(), Ack::Coalesced);
    }

    #[test]
    fn newer_command_supersedes_same_address() {
        let mut q = queue();
        let (reply, mut rx) = with_reply();
        q.enqueue(HubCommand::on(1, 1), reply);
        q.enqueue(HubCommand::on(2, 1), None);

        let outcome = q.enqueue(HubCommand::off(1, 1), None);

        assert_eq!(
            outcome,
            EnqueueOutcome::Queued {
                superseded: 1,
                evicted: 0
            }
        );
        let queued: Vec<_> = q.commands().copied().collect();
        assert_eq!(queued, vec![HubCommand::on(2, 1), HubCommand::off(1, 1)]);
        assert_eq!(rx.try_recv().unwrap().unwrap(), Ack::Superseded);
    }

    #[test]
    fn room_and_device_addresses_are_distinct() {
        let mut q = queue();
        q.enqueue(HubCommand::on(1, 1), None);
        q.enqueue(HubCommand::room_off(1), None);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn never_exceeds_capacity_dropping_oldest() {
        let mut q = CommandQueue::new(3, OverflowPolicy::DropOldest);
        let (reply, mut rx) = with_reply();
        q.enqueue(HubCommand::on(1, 1), reply);
        for device in 2..=4 {
            q.enqueue(HubCommand::on(1, device), None);
            assert!(q.len() <= 3);
        }

        let queued: Vec<_> = q.commands().copied().collect();
        assert_eq!(
            queued,
            vec![HubCommand::on(1, 2), HubCommand::on(1, 3), HubCommand::on(1, 4)]
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            Err(CoreError::QueueOverflow { capacity: 3, .. })
        ));
    }

    #[test]
    fn drop_newest_rejects_incoming() {
        let mut q = CommandQueue::new(2, OverflowPolicy::DropNewest);
        q.enqueue(HubCommand::on(1, 1), None);
        q.enqueue(HubCommand::on(1, 2), None);
        let (reply, mut rx) = with_reply();

        let outcome = q.enqueue(HubCommand::on(1, 3), reply);

        assert_eq!(
            outcome,
            EnqueueOutcome::Queued {
                superseded: 0,
                evicted: 1
            }
        );
        assert_eq!(q.len(), 2);
        assert!(rx.try_recv().unwrap().is_err());
    }

    #[test]
    fn pops_in_arrival_order() {
        let mut q = queue();
        q.enqueue(HubCommand::on(1, 1), None);
        q.enqueue(HubCommand::device(2, 1, Action::Open), None);
        q.enqueue(HubCommand::room_off(3), None);

        let order: Vec<_> = std::iter::from_fn(|| q.pop().map(|p| p.command)).collect();
        assert_eq!(
            order,
            vec![
                HubCommand::on(1, 1),
                HubCommand::device(2, 1, Action::Open),
                HubCommand::room_off(3)
            ]
        );
    }

    #[test]
    fn close_fails_waiting_callers() {
        let mut q = queue();
        let (reply, mut rx) = with_reply();
        q.enqueue(HubCommand::on(1, 1), reply);

        assert_eq!(q.close(), 1);
        assert!(q.is_empty());
        assert!(matches!(rx.try_recv().unwrap(), Err(CoreError::HubClosed)));
    }
}

//! In-memory [`LocalMailbox`].

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{IdentityKey, Message, MessageId};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::entities::InsertOutcome;
use crate::domain::errors::MailboxError;
use crate::ports::outbound::LocalMailbox;

/// Acknowledged ids remembered for duplicate detection when no capacity is
/// given.
pub const DEFAULT_ACKED_CAPACITY: usize = 100_000;

#[derive(Default)]
struct MailboxState {
    boxes: HashMap<(IdentityKey, String), Vec<Message>>,
    /// Ids of messages currently stored.
    stored: HashSet<MessageId>,
    /// Recently acknowledged ids, oldest first, so a redelivery after
    /// acknowledgement is still a duplicate. Bounded by `acked_capacity`.
    acked: HashSet<MessageId>,
    acked_order: VecDeque<MessageId>,
}

impl MailboxState {
    fn remember_acked(&mut self, id: MessageId, capacity: usize) {
        if capacity == 0 || !self.acked.insert(id.clone()) {
            return;
        }
        self.acked_order.push_back(id);
        while self.acked_order.len() > capacity {
            if let Some(oldest) = self.acked_order.pop_front() {
                self.acked.remove(&oldest);
            }
        }
    }
}

/// Message boxes held in process memory.
///
/// Memory is bounded by the stored messages plus at most `acked_capacity`
/// acknowledged ids. A redelivery older than that window is accepted again.
pub struct InMemoryMailbox {
    state: RwLock<MailboxState>,
    acked_capacity: usize,
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::with_acked_capacity(DEFAULT_ACKED_CAPACITY)
    }
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_acked_capacity(acked_capacity: usize) -> Self {
        Self {
            state: RwLock::new(MailboxState::default()),
            acked_capacity,
        }
    }

    /// Messages currently stored across all boxes.
    pub fn message_count(&self) -> usize {
        self.state.read().boxes.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl LocalMailbox for InMemoryMailbox {
    async fn box_exists(
        &self,
        recipient: &IdentityKey,
        message_box: &str,
    ) -> Result<bool, MailboxError> {
        Ok(self
            .state
            .read()
            .boxes
            .contains_key(&(recipient.clone(), message_box.to_string())))
    }

    async fn ensure_box(
        &self,
        recipient: &IdentityKey,
        message_box: &str,
    ) -> Result<(), MailboxError> {
        self.state
            .write()
            .boxes
            .entry((recipient.clone(), message_box.to_string()))
            .or_default();
        Ok(())
    }

    async fn insert_message(&self, message: Message) -> Result<InsertOutcome, MailboxError> {
        let mut state = self.state.write();
        if state.stored.contains(&message.message_id) || state.acked.contains(&message.message_id) {
            return Ok(InsertOutcome::Duplicate);
        }

        let key = (message.recipient.clone(), message.message_box.clone());
        let Some(messages) = state.boxes.get_mut(&key) else {
            return Err(MailboxError::NoSuchBox {
                recipient: message.recipient.to_string(),
                message_box: message.message_box,
            });
        };
        let id = message.message_id.clone();
        messages.push(message);
        state.stored.insert(id);
        Ok(InsertOutcome::Inserted)
    }

    async fn list_messages(
        &self,
        recipient: &IdentityKey,
        message_box: &str,
    ) -> Result<Vec<Message>, MailboxError> {
        Ok(self
            .state
            .read()
            .boxes
            .get(&(recipient.clone(), message_box.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn acknowledge(
        &self,
        recipient: &IdentityKey,
        message_ids: &[String],
    ) -> Result<usize, MailboxError> {
        let wanted: HashSet<&str> = message_ids.iter().map(String::as_str).collect();
        let mut state = self.state.write();
        let mut removed = Vec::new();
        for ((owner, _), messages) in state.boxes.iter_mut() {
            if owner != recipient {
                continue;
            }
            messages.retain(|m| {
                let keep = !wanted.contains(m.message_id.as_str());
                if !keep {
                    removed.push(m.message_id.clone());
                }
                keep
            });
        }
        let count = removed.len();
        for id in removed {
            state.stored.remove(&id);
            state.remember_acked(id, self.acked_capacity);
        }
        Ok(count)
    }
}

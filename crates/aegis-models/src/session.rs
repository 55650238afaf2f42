//! Conversation session, exclusively owned by the session store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;
use crate::mode::Mode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub channel: String,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Session {
    pub fn new(channel: impl Into<String>, mode: Mode) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            channel: channel.into(),
            mode,
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Append a message, evicting the oldest non-system message if the
    /// session exceeds its message cap `m`.
    pub fn push_message(&mut self, message: Message, cap: usize) {
        self.messages.push(message);
        while self.messages.len() > cap {
            self.messages.remove(0);
        }
    }
}

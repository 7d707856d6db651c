// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Chat session state
//!
//! The ordered, in-memory record of one conversation. Messages are only ever
//! appended; the only removal is an explicit clear, which empties the list.
//! User messages are frozen on creation. Assistant messages grow through
//! [`ResponseEvent`]s until completed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::attachment::Attachment;
use crate::error::SessionError;
use crate::llm::message::{ChatMessage, ChatRequest, Role, WireAttachment};
use crate::llm::stream::ResponseEvent;

/// One entry in the conversation
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
    /// Frozen; no further events apply
    pub complete: bool,
}

impl Message {
    fn user(content: String, attachments: Vec<Attachment>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content,
            attachments,
            timestamp: Utc::now(),
            complete: true,
        }
    }

    fn assistant(content: String, complete: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content,
            attachments: Vec::new(),
            timestamp: Utc::now(),
            complete,
        }
    }
}

/// Direct reference to an in-progress assistant message.
///
/// Carries the session generation so a handle taken before a clear can
/// never touch a message created after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssistantHandle {
    index: usize,
    id: Uuid,
    generation: u64,
}

impl AssistantHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// What a submit sends to the relay
#[derive(Debug, Clone)]
pub struct PendingSubmit {
    /// Id of the user message just appended
    pub message_id: Uuid,
    pub request: ChatRequest,
}

/// Client-held conversation state
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    pending: Vec<Attachment>,
    busy: bool,
    generation: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Queue an attachment for the next submit.
    pub fn add_attachment(&mut self, attachment: Attachment) {
        tracing::debug!(
            name = attachment.display_name(),
            category = ?attachment.category(),
            "attachment added"
        );
        self.pending.push(attachment);
    }

    /// Drop a queued attachment by position.
    pub fn remove_attachment(&mut self, index: usize) -> Result<Attachment, SessionError> {
        if index >= self.pending.len() {
            return Err(SessionError::NoSuchAttachment(index));
        }
        Ok(self.pending.remove(index))
    }

    pub fn pending_attachments(&self) -> &[Attachment] {
        &self.pending
    }

    /// Start a submit: append the user message and build the request.
    ///
    /// Pending attachments move into the user message. Attachments whose
    /// payload never became ready stay on the message but are not sent.
    pub fn begin_submit(&mut self, text: &str) -> Result<PendingSubmit, SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        if text.trim().is_empty() && self.pending.is_empty() {
            return Err(SessionError::EmptySubmit);
        }

        let attachments = std::mem::take(&mut self.pending);
        let wire: Vec<WireAttachment> = attachments
            .iter()
            .filter_map(|a| {
                let wire = a.to_wire();
                if wire.is_none() {
                    tracing::warn!(name = a.display_name(), "attachment has no payload, not sent");
                }
                wire
            })
            .collect();

        let message = Message::user(text.to_string(), attachments);
        let message_id = message.id;
        self.messages.push(message);
        self.busy = true;

        Ok(PendingSubmit {
            message_id,
            request: ChatRequest {
                messages: self.to_wire_messages(),
                attachments: wire,
            },
        })
    }

    /// Append an empty assistant message and return a handle to it.
    pub fn begin_assistant(&mut self) -> AssistantHandle {
        let message = Message::assistant(String::new(), false);
        let handle = AssistantHandle {
            index: self.messages.len(),
            id: message.id,
            generation: self.generation,
        };
        self.messages.push(message);
        handle
    }

    /// The message behind a handle, if it still exists.
    pub fn message(&self, handle: &AssistantHandle) -> Option<&Message> {
        if handle.generation != self.generation {
            return None;
        }
        self.messages
            .get(handle.index)
            .filter(|m| m.id == handle.id)
    }

    /// Apply one event. Returns `false` when the target is gone or frozen,
    /// or when the event names a different message.
    pub fn apply(&mut self, handle: &AssistantHandle, event: &ResponseEvent) -> bool {
        if handle.generation != self.generation {
            return false;
        }
        let Some(message) = self
            .messages
            .get_mut(handle.index)
            .filter(|m| m.id == handle.id && !m.complete)
        else {
            return false;
        };

        match event {
            ResponseEvent::AppendText { message_id, text } if *message_id == handle.id => {
                message.content.push_str(text);
                true
            }
            ResponseEvent::Complete { message_id } if *message_id == handle.id => {
                message.complete = true;
                true
            }
            _ => false,
        }
    }

    /// Drop the assistant message behind `handle` if it is still the last
    /// message and never received text. Returns `true` when it was removed.
    pub fn discard_if_empty(&mut self, handle: &AssistantHandle) -> bool {
        let is_last = handle.index + 1 == self.messages.len();
        if is_last && self.message(handle).is_some_and(|m| m.content.is_empty()) {
            self.messages.pop();
            return true;
        }
        false
    }

    /// Append a completed assistant message carrying a user-facing error.
    pub fn push_error(&mut self, text: impl Into<String>) -> Uuid {
        let message = Message::assistant(text.into(), true);
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// End the in-flight submit, whatever its outcome.
    pub fn finish_submit(&mut self) {
        self.busy = false;
        self.pending.clear();
    }

    /// Remove every message. Handles taken before the clear become inert.
    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.generation += 1;
        tracing::debug!(generation = self.generation, "history cleared");
    }

    /// Role-tagged history as sent to the relay.
    pub fn to_wire_messages(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}

//! Reply payloads and the reply capability.
//!
//! The core never talks to a chat platform directly. Every invocation carries
//! a [`Reply`] implementation supplied by the collaborator, and everything the
//! core wants to say goes through it as a [`ReplyPayload`].

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ReplyResult;

/// A structured chat reply: a body text plus ordered attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    /// Main message text. May be empty when the attachments carry everything.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    /// Attachments rendered below the text, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ReplyPayload {
    /// Creates a payload with body text only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Appends an attachment (builder pattern).
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns the body text followed by every attachment's text.
    ///
    /// Handy for logging and for plain-text transports.
    pub fn plain_text(&self) -> String {
        std::iter::once(self.text.as_str())
            .chain(self.attachments.iter().flat_map(|a| {
                a.pretext
                    .as_deref()
                    .into_iter()
                    .chain(std::iter::once(a.text.as_str()))
            }))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<String> for ReplyPayload {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for ReplyPayload {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

/// One attachment block of a [`ReplyPayload`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Line shown above the attachment body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,

    /// Attachment body.
    pub text: String,

    /// Side-bar colour, e.g. `#FF0000`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Plain-text summary for clients that cannot render attachments.
    pub fallback: String,
}

impl Attachment {
    /// Creates an attachment with the given body and fallback.
    pub fn new(text: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            pretext: None,
            text: text.into(),
            color: None,
            fallback: fallback.into(),
        }
    }

    /// Sets the pretext line.
    pub fn pretext(mut self, pretext: impl Into<String>) -> Self {
        self.pretext = Some(pretext.into());
        self
    }

    /// Sets the side-bar colour.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// The capability to answer one invocation.
///
/// Implementations are supplied per invocation by the collaborator (for
/// example a wrapper around a chat platform's `response_url`). `send` may be
/// called any number of times: an acknowledgement followed by a final answer
/// is common.
#[async_trait]
pub trait Reply: Send + Sync + 'static {
    /// Sends one payload.
    async fn send(&self, payload: ReplyPayload) -> ReplyResult<()>;
}

/// A shared, type-erased reply capability.
pub type BoxedReply = Arc<dyn Reply>;

/// A [`Reply`] that records every payload in memory.
///
/// Useful in tests and for collaborators that batch replies into an HTTP
/// response body.
#[derive(Debug, Default)]
pub struct MemoryReply {
    sent: Mutex<Vec<ReplyPayload>>,
}

impl MemoryReply {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty recorder behind an `Arc`, ready to hand to a dispatcher.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns a copy of everything sent so far.
    pub fn sent(&self) -> Vec<ReplyPayload> {
        self.sent.lock().clone()
    }

    /// Removes and returns everything sent so far.
    pub fn take(&self) -> Vec<ReplyPayload> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Returns the number of payloads sent so far.
    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    /// Returns `true` if nothing has been sent.
    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

#[async_trait]
impl Reply for MemoryReply {
    async fn send(&self, payload: ReplyPayload) -> ReplyResult<()> {
        self.sent.lock().push(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serializes_without_empty_fields() {
        let payload = ReplyPayload::default().attachment(Attachment::new("body", "body"));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "attachments": [{ "text": "body", "fallback": "body" }]
            })
        );
    }

    #[test]
    fn test_attachment_builder() {
        let att = Attachment::new("t", "f").pretext("p").color("#FF0000");
        assert_eq!(att.pretext.as_deref(), Some("p"));
        assert_eq!(att.color.as_deref(), Some("#FF0000"));
    }

    #[test]
    fn test_plain_text_joins_parts() {
        let payload = ReplyPayload::text("hello")
            .attachment(Attachment::new("body", "body").pretext("pre"));
        assert_eq!(payload.plain_text(), "hello\npre\nbody");
    }

    #[test]
    fn test_memory_reply_records_in_order() {
        let reply = MemoryReply::new();
        tokio_test::block_on(async {
            reply.send("first".into()).await.unwrap();
            reply.send("second".into()).await.unwrap();
        });
        let sent = reply.take();
        assert_eq!(sent[0].text, "first");
        assert_eq!(sent[1].text, "second");
        assert!(reply.is_empty());
    }
}

//! Per-sender conversation window used to give the model short-term context.
//!
//! Each sender keeps only the most recent few user and assistant turns. Senders themselves are
//! held in an LRU so the map stays bounded no matter how many distinct numbers text in.

use crate::config::ConversationConfig;
use crate::llm::ChatMessage;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// Role of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn in a sender's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationEntry> for ChatMessage {
    fn from(e: &ConversationEntry) -> Self {
        ChatMessage::new(e.role.as_str(), e.content.clone())
    }
}

/// In-memory store of recent turns keyed by sender address.
///
/// `get` and `update` each take the lock once; two requests from the same sender that overlap
/// can still lose a turn (last writer wins).
pub struct ConversationWindow {
    user_turns: usize,
    assistant_turns: usize,
    inner: Mutex<LruCache<String, Vec<ConversationEntry>>>,
}

impl ConversationWindow {
    pub fn new(user_turns: usize, assistant_turns: usize, max_senders: usize) -> Self {
        let capacity = NonZeroUsize::new(max_senders).unwrap_or(NonZeroUsize::MIN);
        Self {
            user_turns,
            assistant_turns,
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(config.user_turns, config.assistant_turns, config.max_senders)
    }

    /// Entries kept per sender.
    #[cfg(test)]
    fn max_entries(&self) -> usize {
        self.user_turns + self.assistant_turns
    }

    /// Ordered history (oldest first) for a sender; empty if unknown.
    pub async fn get(&self, sender: &str) -> Vec<ConversationEntry> {
        self.inner
            .lock()
            .await
            .get(sender)
            .cloned()
            .unwrap_or_default()
    }

    /// Append a user turn and the assistant's reply, then trim to the window.
    pub async fn update(&self, sender: &str, user_turn: &str, assistant_turn: &str) {
        let mut g = self.inner.lock().await;
        let mut history = g.get(sender).cloned().unwrap_or_default();
        history.push(ConversationEntry::user(user_turn));
        history.push(ConversationEntry::assistant(assistant_turn));
        let window = trim_window(history, self.user_turns, self.assistant_turns);
        if let Some((evicted, _)) = g.push(sender.to_string(), window) {
            if evicted != sender {
                log::debug!(
                    "conversation: evicted least recently used sender {} ({} tracked)",
                    evicted,
                    g.len()
                );
            }
        }
    }

    /// Number of senders currently tracked.
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

/// Keep the newest `user_turns` user entries and `assistant_turns` assistant entries, preserving chronological order.
fn trim_window(
    history: Vec<ConversationEntry>,
    user_turns: usize,
    assistant_turns: usize,
) -> Vec<ConversationEntry> {
    let mut users = 0;
    let mut assistants = 0;
    let mut kept: Vec<ConversationEntry> = history
        .into_iter()
        .rev()
        .filter(|e| {
            let (seen, limit) = match e.role {
                Role::User => (&mut users, user_turns),
                Role::Assistant => (&mut assistants, assistant_turns),
            };
            *seen += 1;
            *seen <= limit
        })
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_sender_has_empty_history() {
        let window = ConversationWindow::new(3, 1, 16);
        assert!(window.get("+254700000000").await.is_empty());
        assert!(window.is_empty().await);
    }

    #[tokio::test]
    async fn first_update_stores_both_turns() {
        let window = ConversationWindow::new(3, 1, 16);
        window.update("+254700000001", "hi", "hello there").await;
        assert_eq!(
            window.get("+254700000001").await,
            vec![
                ConversationEntry::user("hi"),
                ConversationEntry::assistant("hello there")
            ]
        );
    }

    #[tokio::test]
    async fn keeps_three_user_turns_and_latest_reply() {
        let window = ConversationWindow::new(3, 1, 16);
        for i in 1..=5 {
            window
                .update("s", &format!("q{}", i), &format!("a{}", i))
                .await;
        }
        let history = window.get("s").await;
        assert_eq!(
            history,
            vec![
                ConversationEntry::user("q3"),
                ConversationEntry::user("q4"),
                ConversationEntry::user("q5"),
                ConversationEntry::assistant("a5"),
            ]
        );
    }

    #[tokio::test]
    async fn never_exceeds_entry_cap() {
        let window = ConversationWindow::new(3, 1, 16);
        for i in 0..20 {
            window.update("s", &i.to_string(), "r").await;
            assert!(window.get("s").await.len() <= window.max_entries());
        }
    }

    #[tokio::test]
    async fn senders_are_isolated() {
        let window = ConversationWindow::new(3, 1, 16);
        window.update("a", "from a", "to a").await;
        window.update("b", "from b", "to b").await;
        assert_eq!(window.get("a").await[0].content, "from a");
        assert_eq!(window.get("b").await[0].content, "from b");
        assert_eq!(window.len().await, 2);
    }

    #[tokio::test]
    async fn least_recently_used_sender_is_evicted() {
        let window = ConversationWindow::new(3, 1, 2);
        window.update("a", "1", "r").await;
        window.update("b", "1", "r").await;
        // touch a so b becomes least recently used
        let _ = window.get("a").await;
        window.update("c", "1", "r").await;
        assert_eq!(window.len().await, 2);
        assert!(window.get("b").await.is_empty());
        assert!(!window.get("a").await.is_empty());
        assert!(!window.get("c").await.is_empty());
    }

    #[test]
    fn entries_convert_to_chat_messages() {
        let msg = ChatMessage::from(&ConversationEntry::assistant("ok"));
        assert_eq!(msg.role, "assistant");
        assert_eq!(msg.content, "ok");
    }
}

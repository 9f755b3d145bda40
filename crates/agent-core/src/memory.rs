//! Conversation Memory
//!
//! Ordered turn storage with FIFO eviction. Pinned turns (the system prompt)
//! are exempt from eviction and do not count against `max_turns`.

use serde::{Deserialize, Serialize};

use crate::message::{Role, Turn};

/// Capacity limits for a conversation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredLimits")]
pub struct MemoryLimits {
    /// Maximum number of non-pinned turns retained (at least 1)
    pub max_turns: usize,

    /// Optional budget of estimated tokens across all turns
    pub max_tokens: Option<u32>,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            max_turns: 50,
            max_tokens: Some(16_000),
        }
    }
}

impl MemoryLimits {
    /// Same limits with `max_turns` raised to at least 1
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            max_turns: self.max_turns.max(1),
            ..self
        }
    }
}

// Limits read back from a saved session go through the same clamp
#[derive(Deserialize)]
struct StoredLimits {
    max_turns: usize,
    max_tokens: Option<u32>,
}

impl From<StoredLimits> for MemoryLimits {
    fn from(stored: StoredLimits) -> Self {
        Self {
            max_turns: stored.max_turns,
            max_tokens: stored.max_tokens,
        }
        .clamped()
    }
}

/// Conversation history for one session
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,

    #[serde(default)]
    limits: MemoryLimits,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: MemoryLimits) -> Self {
        Self {
            turns: Vec::new(),
            limits: limits.clamped(),
        }
    }

    /// New conversation starting with a pinned system turn
    pub fn with_system_prompt(prompt: impl Into<String>, limits: MemoryLimits) -> Self {
        let mut conv = Self::with_limits(limits);
        conv.append(Turn::system(prompt));
        conv
    }

    pub fn limits(&self) -> MemoryLimits {
        self.limits
    }

    /// Swap in new limits and evict down to them
    pub fn set_limits(&mut self, limits: MemoryLimits) {
        self.limits = limits.clamped();
        self.enforce_limits();
    }

    /// Add a turn, then evict the oldest non-pinned turns until within limits
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.enforce_limits();
    }

    fn enforce_limits(&mut self) {
        while self.unpinned_len() > self.limits.max_turns {
            if !self.evict_oldest() {
                break;
            }
        }

        if let Some(budget) = self.limits.max_tokens {
            // The newest turn always survives the token budget
            while self.estimate_tokens() > budget && self.unpinned_len() > 1 {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(pos) = self.turns.iter().position(|t| !t.is_pinned()) else {
            return false;
        };
        let evicted = self.turns.remove(pos);
        tracing::trace!(role = %evicted.role(), "Evicted turn from memory");
        true
    }

    /// Turns in chronological order.
    ///
    /// With a `limit`, every pinned turn is kept and only the `limit` most
    /// recent non-pinned turns are returned.
    pub fn history(&self, limit: Option<usize>) -> Vec<Turn> {
        let Some(limit) = limit else {
            return self.turns.clone();
        };

        let mut skip = self.unpinned_len().saturating_sub(limit);
        self.turns
            .iter()
            .filter(|t| {
                if t.is_pinned() {
                    true
                } else if skip > 0 {
                    skip -= 1;
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect()
    }

    /// Remove every non-pinned turn
    pub fn clear(&mut self) {
        self.turns.retain(Turn::is_pinned);
    }

    /// Replace the pinned system instructions
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.turns.retain(|t| !(t.is_pinned() && t.role() == Role::System));
        self.turns.insert(0, Turn::system(prompt));
    }

    /// Current pinned system prompt, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.turns
            .iter()
            .find(|t| t.is_pinned() && t.role() == Role::System)
            .map(Turn::content)
    }

    pub fn pinned(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.is_pinned())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Estimate total tokens in conversation
    pub fn estimate_tokens(&self) -> u32 {
        self.turns.iter().map(Turn::estimate_tokens).sum()
    }

    /// Whole conversation as `ROLE: content` blocks
    pub fn context_window(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role().to_string().to_uppercase(), t.content()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn unpinned_len(&self) -> usize {
        self.turns.iter().filter(|t| !t.is_pinned()).count()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns_only(max_turns: usize) -> MemoryLimits {
        MemoryLimits {
            max_turns,
            max_tokens: None,
        }
    }

    #[test]
    fn test_bound_keeps_last_turns_and_pinned_prompt() {
        let mut conv = Conversation::with_system_prompt("You are helpful.", turns_only(3));
        for i in 0..5 {
            if i % 2 == 0 {
                conv.append(Turn::user(format!("u{i}")));
            } else {
                conv.append(Turn::assistant(format!("a{i}")));
            }
        }

        let history = conv.history(None);
        let contents: Vec<_> = history.iter().map(Turn::content).collect();
        assert_eq!(contents, vec!["You are helpful.", "u2", "a3", "u4"]);
        assert_eq!(history[0].role(), Role::System);
    }

    #[test]
    fn test_pinned_turns_never_evicted() {
        let mut conv = Conversation::with_limits(turns_only(2));
        conv.append(Turn::user("first").pinned());
        for i in 0..20 {
            conv.append(Turn::user(format!("m{i}")));
            let unpinned = conv.turns().iter().filter(|t| !t.is_pinned()).count();
            assert!(unpinned <= 2);
        }
        assert_eq!(conv.pinned().count(), 1);
        assert_eq!(conv.turns()[0].content(), "first");
    }

    #[test]
    fn test_history_limit_keeps_pinned() {
        let mut conv = Conversation::with_system_prompt("sys", turns_only(10));
        for i in 0..6 {
            conv.append(Turn::user(format!("m{i}")));
        }

        let recent = conv.history(Some(2));
        let contents: Vec<_> = recent.iter().map(Turn::content).collect();
        assert_eq!(contents, vec!["sys", "m4", "m5"]);

        assert_eq!(conv.history(Some(100)).len(), 7);
    }

    #[test]
    fn test_token_budget_evicts_oldest() {
        let limits = MemoryLimits {
            max_turns: 100,
            max_tokens: Some(40),
        };
        let mut conv = Conversation::with_limits(limits);
        // Each turn estimates to 4 + 40 / 4 = 14 tokens
        for _ in 0..5 {
            conv.append(Turn::user("x".repeat(40)));
        }
        assert!(conv.estimate_tokens() <= 40);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_token_budget_keeps_newest_turn() {
        let limits = MemoryLimits {
            max_turns: 100,
            max_tokens: Some(10),
        };
        let mut conv = Conversation::with_limits(limits);
        conv.append(Turn::user("y".repeat(400)));
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn test_clear_keeps_pinned() {
        let mut conv = Conversation::with_system_prompt("sys", MemoryLimits::default());
        conv.append(Turn::user("hi"));
        conv.append(Turn::assistant("hello"));
        conv.clear();

        assert_eq!(conv.len(), 1);
        assert_eq!(conv.system_prompt(), Some("sys"));
    }

    #[test]
    fn test_set_system_prompt_replaces_pinned() {
        let mut conv = Conversation::with_system_prompt("old", MemoryLimits::default());
        conv.append(Turn::user("hi"));
        conv.set_system_prompt("new");

        assert_eq!(conv.system_prompt(), Some("new"));
        assert_eq!(conv.pinned().count(), 1);
        assert_eq!(conv.turns()[0].content(), "new");
    }

    #[test]
    fn test_zero_bound_is_clamped() {
        let mut conv = Conversation::with_limits(turns_only(0));
        conv.append(Turn::user("still here"));
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn test_stored_zero_bound_is_clamped() {
        let json = r#"{"turns":[],"limits":{"max_turns":0,"max_tokens":null}}"#;
        let mut conv: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conv.limits().max_turns, 1);

        conv.append(Turn::user("one"));
        conv.append(Turn::user("two"));
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.last().unwrap().content(), "two");
    }

    #[test]
    fn test_set_limits_evicts_down() {
        let mut conv = Conversation::with_system_prompt("sys", turns_only(10));
        for i in 0..6 {
            conv.append(Turn::user(format!("m{i}")));
        }
        conv.set_limits(turns_only(2));

        let contents: Vec<_> = conv.turns().iter().map(Turn::content).collect();
        assert_eq!(contents, vec!["sys", "m4", "m5"]);
        assert_eq!(conv.limits(), turns_only(2));

        conv.set_limits(turns_only(0));
        assert_eq!(conv.limits().max_turns, 1);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_context_window_format() {
        let mut conv = Conversation::with_system_prompt("sys", MemoryLimits::default());
        conv.append(Turn::user("hi"));
        assert_eq!(conv.context_window(), "SYSTEM: sys\n\nUSER: hi");
    }
}

//! Caller-side length bounds for assistant replies and the text sent to
//! speech synthesis.

use serde::{Deserialize, Serialize};

const ELLIPSIS: char = '…';

fn default_max_reply_chars() -> usize {
    400
}

/// Character budgets applied before a reply is stored or spoken.
///
/// Both bounds count Unicode scalar values, so multi-byte text is never split
/// mid-character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyBudget {
    /// Upper bound on the reply shown to the user. Default: 400.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
    /// Optional tighter bound on the text handed to synthesis, keeping
    /// synthesis latency bounded. `None` speaks the whole reply.
    #[serde(default)]
    pub max_spoken_chars: Option<usize>,
}

impl Default for ReplyBudget {
    fn default() -> Self {
        Self {
            max_reply_chars: default_max_reply_chars(),
            max_spoken_chars: None,
        }
    }
}

impl ReplyBudget {
    /// Trims a generated reply to the reply budget.
    pub fn fit_reply(&self, reply: &str) -> String {
        truncate_chars(reply.trim(), self.max_reply_chars)
    }

    /// Returns the part of `reply` that should be spoken.
    pub fn spoken_text(&self, reply: &str) -> String {
        let fitted = self.fit_reply(reply);
        match self.max_spoken_chars {
            Some(limit) => truncate_chars(&fitted, limit),
            None => fitted,
        }
    }
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with a
/// trailing ellipsis that counts toward the limit.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_chars("Hello there", 400), "Hello there");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn long_text_ends_with_ellipsis_within_limit() {
        let cut = truncate_chars("abcdefghij", 5);
        assert_eq!(cut, "abcd…");
        assert_eq!(cut.chars().count(), 5);
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let cut = truncate_chars("héllo wörld", 4);
        assert_eq!(cut, "hél…");
    }

    #[test]
    fn zero_limit_yields_empty() {
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn spoken_text_applies_both_bounds() {
        let budget = ReplyBudget {
            max_reply_chars: 10,
            max_spoken_chars: Some(6),
        };
        assert_eq!(budget.fit_reply("  0123456789abcdef  "), "012345678…");
        assert_eq!(budget.spoken_text("0123456789abcdef"), "01234…");
    }

    #[test]
    fn spoken_text_defaults_to_reply_budget() {
        let budget = ReplyBudget::default();
        let reply = "x".repeat(500);
        assert_eq!(budget.spoken_text(&reply).chars().count(), 400);
    }
}

//! Stream-tag state machine.
//!
//! Splits the logical text stream into three channels: thinking, an inline
//! delimited summary, and the response. Two orthogonal flags drive it:
//! the thinking phase (entered on `__THINKING__` or `<thinking>`, left on
//! `__END_THINKING__` or `</thinking>`) and the summary sub-phase (entered
//! and left by `<thinking_summary>` delimiters inside either phase).
//!
//! A machine is owned by one response stream. Its lifecycle is
//! [`TagMachine::new`], any number of [`TagMachine::ingest`] calls, then
//! [`TagMachine::finalize`], which resets it for reuse.

use crate::sanitize::sanitize;
use llmwire_core::sentinel::{
    END_THINKING, LEGACY_THINKING_CLOSE, LEGACY_THINKING_OPEN, SUMMARY_CLOSE, SUMMARY_OPEN,
    THINKING_PREFIX, TOKEN_USAGE_PREFIX,
};
use llmwire_core::TokenUsage;
use serde::{Deserialize, Serialize};

/// Default cap on summary length, in characters.
pub const DEFAULT_MAX_SUMMARY_CHARS: usize = 1200;

/// Output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Model reasoning.
    Thinking,
    /// Inline thinking summary.
    Summary,
    /// Final answer.
    Response,
}

/// Text routed to one channel, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDelta {
    /// Target channel.
    pub channel: Channel,
    /// Text.
    pub text: String,
}

impl ChannelDelta {
    /// Create a delta.
    pub fn new(channel: Channel, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
        }
    }
}

/// Accumulated result of one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedOutput {
    /// Final answer text.
    pub response: String,
    /// Thinking text.
    pub thinking: String,
    /// Thinking summary, capped.
    pub summary: String,
    /// Last token usage seen, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// The stream-tag state machine.
#[derive(Debug, Clone)]
pub struct TagMachine {
    thinking_phase: bool,
    summary_phase: bool,
    carry: String,
    output: TaggedOutput,
    summary_chars: usize,
    max_summary_chars: usize,
}

impl Default for TagMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TagMachine {
    /// Create a machine in the response phase.
    #[must_use]
    pub fn new() -> Self {
        Self::with_summary_limit(DEFAULT_MAX_SUMMARY_CHARS)
    }

    /// Create a machine with a custom summary cap.
    #[must_use]
    pub fn with_summary_limit(max_summary_chars: usize) -> Self {
        Self {
            thinking_phase: false,
            summary_phase: false,
            carry: String::new(),
            output: TaggedOutput::default(),
            summary_chars: 0,
            max_summary_chars,
        }
    }

    /// Whether the thinking phase is active.
    #[must_use]
    pub fn is_thinking(&self) -> bool {
        self.thinking_phase
    }

    /// Whether the summary sub-phase is active.
    #[must_use]
    pub fn is_summary(&self) -> bool {
        self.summary_phase
    }

    /// Output accumulated so far, excluding withheld carry-over.
    #[must_use]
    pub fn snapshot(&self) -> &TaggedOutput {
        &self.output
    }

    /// Process one logical text chunk.
    ///
    /// Returns the text newly routed to each channel. A suffix that could be
    /// the start of a summary delimiter is withheld until the next call.
    pub fn ingest(&mut self, chunk: &str) -> Vec<ChannelDelta> {
        let text = sanitize(chunk);
        let mut deltas = Vec::new();

        if let Some(rest) = text.strip_prefix(THINKING_PREFIX) {
            self.switch_phase(true, &mut deltas);
            self.extract(rest, &mut deltas);
        } else if text == END_THINKING || text == LEGACY_THINKING_CLOSE {
            self.switch_phase(false, &mut deltas);
        } else if text == LEGACY_THINKING_OPEN {
            self.switch_phase(true, &mut deltas);
        } else if let Some(json) = text.strip_prefix(TOKEN_USAGE_PREFIX) {
            match serde_json::from_str::<TokenUsage>(json) {
                Ok(usage) => self.output.usage = Some(usage.normalized()),
                Err(err) => tracing::warn!(error = %err, "Dropping malformed token usage"),
            }
        } else {
            self.extract(&text, &mut deltas);
        }

        deltas
    }

    /// Release withheld carry-over into the active channel.
    pub fn flush(&mut self) -> Vec<ChannelDelta> {
        let mut deltas = Vec::new();
        let carry = std::mem::take(&mut self.carry);
        if self.summary_phase {
            self.push_summary(&carry, &mut deltas);
        } else {
            self.push_phase(&carry, &mut deltas);
        }
        deltas
    }

    /// Flush, return the accumulated output, and reset.
    pub fn finalize(&mut self) -> TaggedOutput {
        self.flush();
        let output = std::mem::take(&mut self.output);
        self.reset();
        output
    }

    /// Return to the initial state, discarding everything.
    pub fn reset(&mut self) {
        self.thinking_phase = false;
        self.summary_phase = false;
        self.carry.clear();
        self.output = TaggedOutput::default();
        self.summary_chars = 0;
    }

    fn switch_phase(&mut self, thinking: bool, deltas: &mut Vec<ChannelDelta>) {
        if self.thinking_phase == thinking {
            return;
        }
        if !self.summary_phase {
            let carry = std::mem::take(&mut self.carry);
            self.push_phase(&carry, deltas);
        }
        self.thinking_phase = thinking;
    }

    fn extract(&mut self, text: &str, deltas: &mut Vec<ChannelDelta>) {
        self.carry.push_str(text);

        loop {
            let delimiter = if self.summary_phase {
                SUMMARY_CLOSE
            } else {
                SUMMARY_OPEN
            };

            if let Some(pos) = self.carry.find(delimiter) {
                let before: String = self.carry.drain(..pos).collect();
                self.carry.drain(..delimiter.len());
                self.route(&before, deltas);
                self.summary_phase = !self.summary_phase;
                continue;
            }

            let keep = partial_suffix_len(&self.carry, SUMMARY_OPEN)
                .max(partial_suffix_len(&self.carry, SUMMARY_CLOSE));
            let emit_len = self.carry.len() - keep;
            let ready: String = self.carry.drain(..emit_len).collect();
            self.route(&ready, deltas);
            break;
        }
    }

    fn route(&mut self, text: &str, deltas: &mut Vec<ChannelDelta>) {
        if self.summary_phase {
            self.push_summary(text, deltas);
        } else {
            self.push_phase(text, deltas);
        }
    }

    fn push_phase(&mut self, text: &str, deltas: &mut Vec<ChannelDelta>) {
        if text.is_empty() {
            return;
        }
        let (channel, target) = if self.thinking_phase {
            (Channel::Thinking, &mut self.output.thinking)
        } else {
            (Channel::Response, &mut self.output.response)
        };
        target.push_str(text);
        deltas.push(ChannelDelta::new(channel, text));
    }

    fn push_summary(&mut self, text: &str, deltas: &mut Vec<ChannelDelta>) {
        let room = self.max_summary_chars.saturating_sub(self.summary_chars);
        let kept: String = text.chars().take(room).collect();
        if kept.is_empty() {
            return;
        }
        self.summary_chars += kept.chars().count();
        self.output.summary.push_str(&kept);
        deltas.push(ChannelDelta::new(Channel::Summary, kept));
    }
}

/// Length of the longest strict prefix of `tag` that `text` ends with.
fn partial_suffix_len(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&len| text.ends_with(&tag[..len]))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn run(chunks: &[&str]) -> TaggedOutput {
        let mut machine = TagMachine::new();
        for chunk in chunks {
            machine.ingest(chunk);
        }
        machine.finalize()
    }

    #[test]
    fn test_thinking_then_answer() {
        let output = run(&[
            "__THINKING__Let me think. ",
            "__END_THINKING__",
            "The answer is 4.",
        ]);
        assert_eq!(output.thinking, "Let me think. ");
        assert_eq!(output.response, "The answer is 4.");
        assert_eq!(output.summary, "");
    }

    #[test]
    fn test_summary_tag_split_across_chunks() {
        let mut machine = TagMachine::new();
        let first = machine.ingest("<thinking_sum");
        assert!(first.is_empty());
        machine.ingest("mary>hello</thinking_summary>");
        let output = machine.finalize();
        assert_eq!(output.summary, "hello");
        assert_eq!(output.response, "");
    }

    #[test]
    fn test_close_tag_split_across_chunks() {
        let output = run(&["Answer.<thinking_summary>short", " recap</thinking", "_summary> done"]);
        assert_eq!(output.summary, "short recap");
        assert_eq!(output.response, "Answer. done");
    }

    #[test]
    fn test_false_partial_is_released() {
        let output = run(&["a <thinking", " about it"]);
        assert_eq!(output.response, "a <thinking about it");
    }

    #[test]
    fn test_partial_released_on_finalize() {
        let mut machine = TagMachine::new();
        let deltas = machine.ingest("ends with <thin");
        assert_eq!(deltas, vec![ChannelDelta::new(Channel::Response, "ends with ")]);
        assert_eq!(machine.flush(), vec![ChannelDelta::new(Channel::Response, "<thin")]);
    }

    fn routed(deltas: &[ChannelDelta], channel: Channel) -> String {
        deltas
            .iter()
            .filter(|d| d.channel == channel)
            .map(|d| d.text.as_str())
            .collect()
    }

    fn ingest_all<S: AsRef<str>>(machine: &mut TagMachine, chunks: &[S]) -> Vec<ChannelDelta> {
        let mut deltas = Vec::new();
        for chunk in chunks {
            deltas.extend(machine.ingest(chunk.as_ref()));
        }
        deltas.extend(machine.flush());
        deltas
    }

    #[test]
    fn test_channels_partition_input() {
        let chunks = [
            "Intro <", "thinking_summary>sum", "mary</thinking_su", "mmary> body ",
            "<thinking_summary>more</thinking_summary>", " end<", "/p>",
        ];
        let mut machine = TagMachine::new();
        let deltas = ingest_all(&mut machine, &chunks);
        let output = machine.finalize();

        let stripped = chunks
            .concat()
            .replace(SUMMARY_OPEN, "")
            .replace(SUMMARY_CLOSE, "");
        let in_order: String = deltas.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(in_order, stripped);

        assert_eq!(output.thinking, "");
        assert_eq!(output.response, "Intro  body  end</p>");
        assert_eq!(output.summary, "summarymore");
        assert_eq!(routed(&deltas, Channel::Response), output.response);
        assert_eq!(routed(&deltas, Channel::Summary), output.summary);
        assert_eq!(routed(&deltas, Channel::Thinking), "");
    }

    /// Splits `text` at random char boundaries.
    fn random_chunks(text: &str, rng: &mut StdRng) -> Vec<String> {
        let mut cuts: Vec<usize> = (0..rng.gen_range(0..8))
            .map(|_| rng.gen_range(0..=text.len()))
            .filter(|&idx| text.is_char_boundary(idx))
            .collect();
        cuts.push(0);
        cuts.push(text.len());
        cuts.sort_unstable();
        cuts.dedup();
        cuts.windows(2)
            .map(|w| text[w[0]..w[1]].to_string())
            .collect()
    }

    #[test]
    fn test_random_chunking_matches_whole_input() {
        let usage = r#"__TOKEN_USAGE__{"prompt_tokens":3,"completion_tokens":4}"#;
        let thought =
            "Weighing <options> and\u{200B} <thinking_summary>compare\u{0007} both</thinking_summary> then pick.";
        let answer = "Answer: use <b>A</b>\u{FEFF}.<thinking_summary> A wins</thinking_summary> Done </p";

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut chunks = vec![THINKING_PREFIX.to_string()];
            chunks.extend(random_chunks(thought, &mut rng));
            chunks.push(END_THINKING.to_string());
            chunks.extend(random_chunks(answer, &mut rng));
            chunks.push(usage.to_string());
            chunks.extend(random_chunks(" tail", &mut rng));

            let mut machine = TagMachine::new();
            let deltas = ingest_all(&mut machine, &chunks);
            let output = machine.finalize();

            assert_eq!(output.thinking, "Weighing <options> and  then pick.", "seed {seed}");
            assert_eq!(output.summary, "compare both A wins", "seed {seed}");
            assert_eq!(output.response, "Answer: use <b>A</b>. Done </p tail", "seed {seed}");
            assert_eq!(output.usage, Some(TokenUsage::new(3, 4)), "seed {seed}");

            assert_eq!(routed(&deltas, Channel::Thinking), output.thinking);
            assert_eq!(routed(&deltas, Channel::Summary), output.summary);
            assert_eq!(routed(&deltas, Channel::Response), output.response);
            assert!(deltas.iter().all(|d| !d.text.is_empty()
                && !d.text.contains("thinking_summary>")
                && !d.text.contains(&['\u{200B}', '\u{FEFF}', '\u{0007}'][..])));
        }
    }

    #[test]
    fn test_sanitized_text_fully_accounted() {
        let chunks = ["a\u{200B}b", "\u{FEFF}c\u{0007}", "d\u{FFFD}"];
        let output = run(&chunks);
        assert_eq!(output.response, "abcd");
    }

    #[test]
    fn test_last_usage_wins() {
        let output = run(&[
            "hi",
            r#"__TOKEN_USAGE__{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3}"#,
            r#"__TOKEN_USAGE__{"prompt_tokens":10,"completion_tokens":20}"#,
        ]);
        assert_eq!(output.usage, Some(TokenUsage::new(10, 20)));
        assert_eq!(output.response, "hi");
    }

    #[test]
    fn test_malformed_usage_dropped() {
        let output = run(&["__TOKEN_USAGE__{not json", "ok"]);
        assert_eq!(output.usage, None);
        assert_eq!(output.response, "ok");
    }

    #[test]
    fn test_legacy_thinking_tags() {
        let output = run(&["<thinking>", "ponder", "</thinking>", "reply"]);
        assert_eq!(output.thinking, "ponder");
        assert_eq!(output.response, "reply");
    }

    #[test]
    fn test_summary_inside_thinking_phase() {
        let output = run(&[
            "__THINKING__step <thinking_summary>gist</thinking_summary> more",
            "__END_THINKING__",
            "done",
        ]);
        assert_eq!(output.thinking, "step  more");
        assert_eq!(output.summary, "gist");
        assert_eq!(output.response, "done");
    }

    #[test]
    fn test_phase_switch_flushes_withheld_text() {
        let output = run(&["__THINKING__almost <thinking_s", "__END_THINKING__", "answer"]);
        assert_eq!(output.thinking, "almost <thinking_s");
        assert_eq!(output.response, "answer");
    }

    #[test]
    fn test_summary_cap() {
        let mut machine = TagMachine::with_summary_limit(5);
        machine.ingest("<thinking_summary>abcdefgh</thinking_summary>tail");
        let output = machine.finalize();
        assert_eq!(output.summary, "abcde");
        assert_eq!(output.response, "tail");
    }

    #[test]
    fn test_unterminated_summary_flushes_to_summary() {
        let output = run(&["x<thinking_summary>never closed"]);
        assert_eq!(output.response, "x");
        assert_eq!(output.summary, "never closed");
    }

    #[test]
    fn test_finalize_resets() {
        let mut machine = TagMachine::new();
        machine.ingest("__THINKING__deep");
        machine.ingest("<thinking_summary>open");
        let _ = machine.finalize();
        assert!(!machine.is_thinking());
        assert!(!machine.is_summary());
        assert_eq!(machine.finalize(), TaggedOutput::default());
    }

    #[test]
    fn test_partial_suffix_len() {
        assert_eq!(partial_suffix_len("abc<thin", SUMMARY_OPEN), 5);
        assert_eq!(partial_suffix_len("abc", SUMMARY_OPEN), 0);
        assert_eq!(partial_suffix_len("<thinking_summary>", SUMMARY_OPEN), 0);
        assert_eq!(partial_suffix_len("x</", SUMMARY_CLOSE), 2);
    }
}

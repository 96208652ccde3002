//! Incremental reasoning/answer splitting.
//!
//! Models that emit their thinking trace inline wrap it in `<think>` /
//! `</think>` delimiters, and a delimiter pair may straddle chunk
//! boundaries arbitrarily. Rather than carrying parser state across
//! chunks, the caller re-runs `split_reasoning` over the whole
//! accumulated buffer after every chunk; buffers are bounded by model
//! output length, so the re-parse stays cheap.

pub const REASONING_OPEN: &str = "<think>";
pub const REASONING_CLOSE: &str = "</think>";

/// The two channels recovered from a raw buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitOutput {
    pub reasoning: String,
    pub answer: String,
}

/// Split a buffer into its reasoning and answer channels.
///
/// Only the first complete delimiter pair is recognized; any later
/// markers stay in the answer verbatim. An opening delimiter without its
/// close treats everything after it as still-accumulating reasoning, so
/// recomputing on a grown buffer never retracts answer text already
/// shown.
pub fn split_reasoning(buffer: &str) -> SplitOutput {
    let Some(open) = buffer.find(REASONING_OPEN) else {
        return SplitOutput {
            reasoning: String::new(),
            answer: buffer.to_string(),
        };
    };

    let body_start = open + REASONING_OPEN.len();
    match buffer[body_start..].find(REASONING_CLOSE) {
        Some(close) => {
            let reasoning = buffer[body_start..body_start + close].to_string();
            let rest = &buffer[body_start + close + REASONING_CLOSE.len()..];
            let answer = format!("{}{}", &buffer[..open], rest).trim().to_string();
            SplitOutput { reasoning, answer }
        }
        None => SplitOutput {
            reasoning: buffer[body_start..].to_string(),
            answer: buffer[..open].trim().to_string(),
        },
    }
}

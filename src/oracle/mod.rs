// Text-generation oracle: trait, HTTP client, and the continuation protocol

pub mod client;
pub mod retry;
pub mod types;

pub use client::HttpOracle;
pub use types::{OracleReply, OracleRequest};

use anyhow::Result;
use async_trait::async_trait;

/// Marker the oracle is told to emit when it runs out of room mid-answer.
/// A completion ending with it is resumed with a generic follow-up call.
pub const CONTINUATION_MARKER: &str = "<comp>continue...</comp>";

/// Token budget for a single completion call. Responses longer than this
/// arrive in chunks via the continuation protocol.
pub const MAX_TOKENS_PER_CALL: u32 = 2048;

pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Prompt used to resume a completion that stopped at the marker.
const CONTINUE_PROMPT: &str = "go on...";

/// An external text-completion service. Treated as untrusted: callers must
/// tolerate malformed output on every structured exchange.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Issue a single completion call. No chunk reassembly happens here;
    /// use [`complete`] for the full continuation-aware exchange.
    async fn complete_once(&self, request: &OracleRequest) -> Result<OracleReply>;

    fn name(&self) -> &str;
}

/// Run one logical completion, transparently stitching together chunked
/// responses.
///
/// If a reply is truncated at the token budget and ends with the
/// continuation marker, a follow-up call with a generic resume prompt is
/// issued and the texts are concatenated (marker stripped). This repeats
/// until a reply does not end in the marker or the service signals a
/// natural stop.
pub async fn complete(oracle: &dyn Oracle, system: &str, prompt: &str) -> Result<String> {
    let mut full_response = String::new();
    let mut current_prompt = prompt.to_string();

    loop {
        let request = OracleRequest::new(system, current_prompt.as_str());
        let reply = oracle.complete_once(&request).await?;

        let trimmed = reply.text.trim_end();
        let ends_with_marker = trimmed.ends_with(CONTINUATION_MARKER);
        match trimmed.strip_suffix(CONTINUATION_MARKER) {
            Some(head) => full_response.push_str(head),
            None => full_response.push_str(trimmed),
        }

        if reply.natural_stop || !ends_with_marker {
            break;
        }
        current_prompt = CONTINUE_PROMPT.to_string();
    }

    Ok(full_response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed sequence of replies.
    struct SequenceOracle {
        replies: Mutex<Vec<OracleReply>>,
    }

    impl SequenceOracle {
        fn new(replies: Vec<OracleReply>) -> Self {
            Self {
                replies: Mutex::new(replies),
            }
        }
    }

    #[async_trait]
    impl Oracle for SequenceOracle {
        async fn complete_once(&self, _request: &OracleRequest) -> Result<OracleReply> {
            let mut replies = self.replies.lock().unwrap();
            anyhow::ensure!(!replies.is_empty(), "no scripted replies left");
            Ok(replies.remove(0))
        }

        fn name(&self) -> &str {
            "sequence"
        }
    }

    #[tokio::test]
    async fn test_single_chunk_completion() {
        let oracle = SequenceOracle::new(vec![OracleReply {
            text: "hello".to_string(),
            natural_stop: true,
        }]);
        let text = complete(&oracle, "sys", "prompt").await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_chunked_completion_is_concatenated() {
        let oracle = SequenceOracle::new(vec![
            OracleReply {
                text: format!("part one {}", CONTINUATION_MARKER),
                natural_stop: false,
            },
            OracleReply {
                text: "part two".to_string(),
                natural_stop: true,
            },
        ]);
        let text = complete(&oracle, "sys", "prompt").await.unwrap();
        assert_eq!(text, "part one part two");
    }

    #[tokio::test]
    async fn test_marker_without_budget_exhaustion_stops_continuation() {
        // Natural stop wins even when the text happens to end with the marker.
        let oracle = SequenceOracle::new(vec![OracleReply {
            text: format!("done {}", CONTINUATION_MARKER),
            natural_stop: true,
        }]);
        let text = complete(&oracle, "sys", "prompt").await.unwrap();
        assert_eq!(text, "done");
    }

    #[tokio::test]
    async fn test_truncated_reply_without_marker_is_final() {
        let oracle = SequenceOracle::new(vec![OracleReply {
            text: "cut off mid".to_string(),
            natural_stop: false,
        }]);
        let text = complete(&oracle, "sys", "prompt").await.unwrap();
        assert_eq!(text, "cut off mid");
    }
}

//! Conversion of the model's SSE stream into a plain-text byte stream.
//!
//! Gemini's `streamGenerateContent?alt=sse` endpoint emits lines of the
//! form `data: {partial GenerateContentResponse}`. The client contract is
//! `text/plain` with fragments flushed as they arrive, so the SSE framing
//! is stripped here and only candidate text is forwarded.

use crate::models::gemini::GenerateContentResponse;
use axum::body::Bytes;
use futures::stream::{Stream, StreamExt};

/// Incremental SSE decoder. Network chunks do not align with event
/// boundaries, so partial lines are carried over between pushes.
#[derive(Debug, Default)]
pub struct SseTextDecoder {
    buf: String,
}

impl SseTextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the candidate text completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut out = String::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(data) = line.strip_prefix("data: ") {
                if data == "[DONE]" {
                    continue;
                }
                match serde_json::from_str::<GenerateContentResponse>(data) {
                    Ok(partial) => out.push_str(&partial.text()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unparseable stream event");
                    }
                }
            }
        }
        out
    }
}

/// Turn a Gemini SSE response into a stream of plain-text fragments,
/// suitable for `Body::from_stream`. Each yielded item preserves the
/// production order of the upstream stream.
pub fn text_fragment_stream(
    response: reqwest::Response,
) -> impl Stream<Item = Result<Bytes, String>> + Send + 'static {
    let upstream = response.bytes_stream();

    futures::stream::unfold(
        (Box::pin(upstream), SseTextDecoder::new()),
        |(mut upstream, mut decoder)| async move {
            loop {
                match upstream.next().await {
                    Some(Ok(chunk)) => {
                        let text = decoder.push(&chunk);
                        // A chunk may close zero complete events; keep reading
                        if !text.is_empty() {
                            return Some((Ok(Bytes::from(text)), (upstream, decoder)));
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Model stream error");
                        return Some((Err(e.to_string()), (upstream, decoder)));
                    }
                    None => return None,
                }
            }
        },
    )
}

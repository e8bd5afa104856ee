//! Byte-stream tee: one producer, two independently consumable ends.
//!
//! The split backs each end with its own unbounded channel so that
//! backpressure on one branch never propagates to the other. The
//! producer task stops when the upstream terminates, errors, or both
//! receivers have been dropped.

use axum::body::Bytes;
use futures::stream::{Stream, StreamExt};
use std::fmt::Display;
use tokio::sync::mpsc;

/// One consumable end of a tee'd stream.
pub type TeeEnd = futures::stream::BoxStream<'static, Result<Bytes, String>>;

/// Split a fallible byte stream into two ends that each observe the
/// identical byte sequence in the identical order. Errors are carried
/// to both ends as their display text and terminate the stream.
pub fn tee<S, E>(upstream: S) -> (TeeEnd, TeeEnd)
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx_a, rx_a) = mpsc::unbounded_channel::<Result<Bytes, String>>();
    let (tx_b, rx_b) = mpsc::unbounded_channel::<Result<Bytes, String>>();

    tokio::spawn(async move {
        futures::pin_mut!(upstream);

        let mut tx_a = Some(tx_a);
        let mut tx_b = Some(tx_b);

        while let Some(item) = upstream.next().await {
            let item = item.map_err(|e| e.to_string());
            let is_err = item.is_err();

            if let Some(tx) = &tx_a {
                if tx.send(item.clone()).is_err() {
                    tx_a = None;
                }
            }
            if let Some(tx) = &tx_b {
                if tx.send(item).is_err() {
                    tx_b = None;
                }
            }

            // An upstream error ends the stream; with both receivers gone
            // there is nobody left to produce for.
            if is_err || (tx_a.is_none() && tx_b.is_none()) {
                break;
            }
        }
    });

    (receiver_stream(rx_a), receiver_stream(rx_b))
}

fn receiver_stream(rx: mpsc::UnboundedReceiver<Result<Bytes, String>>) -> TeeEnd {
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed()
}

/// Drain one end to completion, concatenating all chunks.
/// Returns an error if the source errored mid-stream.
pub async fn collect_end(mut end: TeeEnd) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    while let Some(item) = end.next().await {
        buf.extend_from_slice(&item?);
    }
    Ok(buf)
}

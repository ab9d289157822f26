//! Lazily produced result records for one submitted query.

use std::collections::VecDeque;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::client::GremlinError;

/// One batch per response frame, or the error that ended the request.
pub(crate) type BatchSender = mpsc::UnboundedSender<Result<Vec<Value>, GremlinError>>;
type BatchReceiver = mpsc::UnboundedReceiver<Result<Vec<Value>, GremlinError>>;

/// Finite stream of records returned by a submitted query.
///
/// Records arrive in the order the server sent them. The stream ends when the
/// sender side is dropped after the final frame, and yields an error if the
/// server reported a failure or the connection closed first.
#[derive(Debug)]
pub struct ResultStream {
    batches: BatchReceiver,
    buffer: VecDeque<Value>,
}

impl ResultStream {
    pub(crate) fn channel() -> (BatchSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                batches: rx,
                buffer: VecDeque::new(),
            },
        )
    }

    /// Build a stream from already-known records, ending at the first error.
    pub fn from_records(records: Vec<Result<Value, GremlinError>>) -> Self {
        let (tx, stream) = Self::channel();
        for record in records {
            let _ = tx.send(record.map(|value| vec![value]));
        }
        stream
    }

    /// Next record, or `None` once the query has completed.
    pub async fn next(&mut self) -> Result<Option<Value>, GremlinError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            match self.batches.recv().await {
                Some(Ok(batch)) => self.buffer.extend(batch),
                Some(Err(e)) => return Err(e),
                None => return Ok(None),
            }
        }
    }

    /// Consume every record, logging each one, and return how many there were.
    pub async fn drain(mut self) -> Result<usize, GremlinError> {
        let mut count = 0;
        while let Some(record) = self.next().await? {
            tracing::debug!(index = count, record = %record, "Gremlin result");
            count += 1;
        }
        Ok(count)
    }
}

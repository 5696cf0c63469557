//! Server-side filtered queries
//!
//! Runs a SQL-like expression against one object's newline-delimited JSON
//! records and writes each result payload to a sink as it arrives.

use std::io::Write;

use crate::error::Result;
use crate::path::ObjectRef;
use crate::traits::{ObjectStore, QueryEvent, QueryStats, RecordStream};

/// Expression used when none is given: count every record
pub const DEFAULT_EXPRESSION: &str = "select count(*) from S3Object s";

/// What a finished query produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySummary {
    /// Number of record payloads received
    pub record_events: usize,

    /// Total payload bytes written to the sink
    pub bytes_returned: u64,

    /// Final statistics, if the remote sent them
    pub stats: Option<QueryStats>,

    /// Whether the remote signalled the end of the stream
    pub completed: bool,
}

/// Closes the wrapped stream exactly once, when dropped
struct StreamGuard(Box<dyn RecordStream>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Run `expression` (or [`DEFAULT_EXPRESSION`]) against `object`
///
/// The event stream is closed on every exit path, including errors from the
/// sink and the future being dropped mid-stream.
pub async fn run_query<W: Write>(
    store: &dyn ObjectStore,
    object: &ObjectRef,
    expression: Option<&str>,
    sink: &mut W,
) -> Result<QuerySummary> {
    object.validate()?;
    let expression = expression
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EXPRESSION);
    tracing::debug!(object = %object, expression, "starting query");

    let mut stream = StreamGuard(store.select_object_content(object, expression).await?);
    let mut summary = QuerySummary::default();

    while let Some(event) = stream.0.next_event().await? {
        match event {
            QueryEvent::Records(payload) => {
                sink.write_all(&payload)?;
                summary.record_events += 1;
                summary.bytes_returned += payload.len() as u64;
            }
            QueryEvent::Stats(stats) => {
                tracing::debug!(
                    scanned = stats.bytes_scanned,
                    processed = stats.bytes_processed,
                    returned = stats.bytes_returned,
                    "query stats"
                );
                summary.stats = Some(stats);
            }
            QueryEvent::Progress(stats) => {
                tracing::trace!(scanned = stats.bytes_scanned, "query progress");
            }
            QueryEvent::Continuation => {}
            QueryEvent::End => {
                summary.completed = true;
                break;
            }
        }
    }

    sink.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::traits::MockObjectStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted event stream counting how often it is closed
    struct ScriptedStream {
        events: VecDeque<Result<Option<QueryEvent>>>,
        closes: Arc<AtomicUsize>,
        stall_when_drained: bool,
    }

    #[async_trait]
    impl RecordStream for ScriptedStream {
        async fn next_event(&mut self) -> Result<Option<QueryEvent>> {
            match self.events.pop_front() {
                Some(event) => event,
                None if self.stall_when_drained => std::future::pending().await,
                None => Ok(None),
            }
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn store_with(
        events: Vec<Result<Option<QueryEvent>>>,
        closes: Arc<AtomicUsize>,
        stall_when_drained: bool,
    ) -> MockObjectStore {
        let mut store = MockObjectStore::new();
        let mut events = Some(events);
        store
            .expect_select_object_content()
            .times(1)
            .returning(move |_, _| {
                Ok(Box::new(ScriptedStream {
                    events: events.take().unwrap_or_default().into(),
                    closes: Arc::clone(&closes),
                    stall_when_drained,
                }))
            });
        store
    }

    fn records(payload: &'static str) -> Result<Option<QueryEvent>> {
        Ok(Some(QueryEvent::Records(Bytes::from_static(payload.as_bytes()))))
    }

    /// Sink failing every write
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_records_are_written_in_order() {
        let closes = Arc::new(AtomicUsize::new(0));
        let stats = QueryStats {
            bytes_scanned: 100,
            bytes_processed: 100,
            bytes_returned: 24,
        };
        let store = store_with(
            vec![
                records("{\"id\":1}\n"),
                Ok(Some(QueryEvent::Continuation)),
                records("{\"id\":2}\n"),
                Ok(Some(QueryEvent::Stats(stats))),
                Ok(Some(QueryEvent::End)),
                records("{\"id\":3}\n"),
            ],
            Arc::clone(&closes),
            false,
        );

        let mut sink = Vec::new();
        let summary = run_query(&store, &ObjectRef::new("b", "k.jsonl"), None, &mut sink)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(sink).unwrap(), "{\"id\":1}\n{\"id\":2}\n");
        assert_eq!(summary.record_events, 2);
        assert_eq!(summary.stats, Some(stats));
        assert!(summary.completed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_expression_is_used() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut store = MockObjectStore::new();
        let counter = Arc::clone(&closes);
        store
            .expect_select_object_content()
            .withf(|_, expression| expression == DEFAULT_EXPRESSION)
            .times(1)
            .returning(move |_, _| {
                Ok(Box::new(ScriptedStream {
                    events: VecDeque::from(vec![records("{\"_1\":3}\n")]),
                    closes: Arc::clone(&counter),
                    stall_when_drained: false,
                }))
            });

        let mut sink = Vec::new();
        let summary = run_query(&store, &ObjectRef::new("b", "k"), Some("  "), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink, b"{\"_1\":3}\n");
        assert!(!summary.completed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mid_stream_error_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let store = store_with(
            vec![
                records("{\"id\":1}\n"),
                Err(Error::Network("stream reset".into())),
            ],
            Arc::clone(&closes),
            false,
        );

        let mut sink = Vec::new();
        let result = run_query(&store, &ObjectRef::new("b", "k"), Some("select * from S3Object"), &mut sink).await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(sink, b"{\"id\":1}\n");
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sink_error_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let store = store_with(vec![records("{\"id\":1}\n")], Arc::clone(&closes), false);

        let result = run_query(&store, &ObjectRef::new("b", "k"), None, &mut BrokenPipe).await;

        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_error_surfaces_immediately() {
        let mut store = MockObjectStore::new();
        store
            .expect_select_object_content()
            .times(1)
            .returning(|_, _| Err(Error::Network("InvalidQuery".into())));

        let mut sink = Vec::new();
        let result = run_query(&store, &ObjectRef::new("b", "k"), Some("select nonsense"), &mut sink).await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_query_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let store = store_with(vec![records("{\"id\":1}\n")], Arc::clone(&closes), true);
        let object = ObjectRef::new("b", "k");
        let mut sink = Vec::new();

        {
            let query = run_query(&store, &object, None, &mut sink);
            futures::pin_mut!(query);
            // The stream stalls after one payload; abandon the query there.
            assert!(futures::poll!(query.as_mut()).is_pending());
        }

        assert_eq!(sink, b"{\"id\":1}\n");
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}

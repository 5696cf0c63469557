//! Select event stream adapter

use async_trait::async_trait;
use aws_sdk_s3::primitives::event_stream::EventReceiver;
use aws_sdk_s3::types::SelectObjectContentEventStream;
use aws_sdk_s3::types::error::SelectObjectContentEventStreamError;
use aws_smithy_types::error::display::DisplayErrorContext;
use bytes::Bytes;

use sc_core::{Error, QueryEvent, QueryStats, RecordStream, Result};

type Receiver = EventReceiver<SelectObjectContentEventStream, SelectObjectContentEventStreamError>;

/// Record stream over a SelectObjectContent response
pub struct SelectEventStream {
    receiver: Option<Receiver>,
    object: String,
}

impl SelectEventStream {
    pub(crate) fn new(receiver: Receiver, object: String) -> Self {
        Self {
            receiver: Some(receiver),
            object,
        }
    }
}

#[async_trait]
impl RecordStream for SelectEventStream {
    async fn next_event(&mut self) -> Result<Option<QueryEvent>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Ok(None);
        };

        let event = receiver
            .recv()
            .await
            .map_err(|e| Error::Network(format!("{}: {}", self.object, DisplayErrorContext(&e))))?;

        Ok(event.map(convert_event))
    }

    fn close(&mut self) {
        // Dropping the receiver releases the underlying connection.
        if self.receiver.take().is_some() {
            tracing::debug!(object = %self.object, "closed select event stream");
        }
    }
}

fn convert_stats(
    scanned: Option<i64>,
    processed: Option<i64>,
    returned: Option<i64>,
) -> QueryStats {
    QueryStats {
        bytes_scanned: scanned.unwrap_or_default(),
        bytes_processed: processed.unwrap_or_default(),
        bytes_returned: returned.unwrap_or_default(),
    }
}

pub(crate) fn convert_event(event: SelectObjectContentEventStream) -> QueryEvent {
    match event {
        SelectObjectContentEventStream::Records(records) => QueryEvent::Records(
            records
                .payload()
                .map(|blob| Bytes::copy_from_slice(blob.as_ref()))
                .unwrap_or_default(),
        ),
        SelectObjectContentEventStream::Stats(stats) => {
            QueryEvent::Stats(stats.details().map_or_else(QueryStats::default, |d| {
                convert_stats(d.bytes_scanned(), d.bytes_processed(), d.bytes_returned())
            }))
        }
        SelectObjectContentEventStream::Progress(progress) => {
            QueryEvent::Progress(progress.details().map_or_else(QueryStats::default, |d| {
                convert_stats(d.bytes_scanned(), d.bytes_processed(), d.bytes_returned())
            }))
        }
        SelectObjectContentEventStream::End(_) => QueryEvent::End,
        // Keep-alives and event types added later carry nothing to write.
        _ => QueryEvent::Continuation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::types::{ContinuationEvent, EndEvent, RecordsEvent, Stats, StatsEvent};
    use aws_smithy_types::Blob;

    #[test]
    fn test_records_payload() {
        let event = SelectObjectContentEventStream::Records(
            RecordsEvent::builder()
                .payload(Blob::new(b"{\"id\":1}\n".to_vec()))
                .build(),
        );
        match convert_event(event) {
            QueryEvent::Records(payload) => assert_eq!(&payload[..], b"{\"id\":1}\n"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_stats_details() {
        let event = SelectObjectContentEventStream::Stats(
            StatsEvent::builder()
                .details(
                    Stats::builder()
                        .bytes_scanned(100)
                        .bytes_processed(90)
                        .bytes_returned(12)
                        .build(),
                )
                .build(),
        );
        assert_eq!(
            convert_event(event),
            QueryEvent::Stats(QueryStats {
                bytes_scanned: 100,
                bytes_processed: 90,
                bytes_returned: 12,
            })
        );
    }

    #[test]
    fn test_end_and_continuation() {
        assert_eq!(
            convert_event(SelectObjectContentEventStream::End(EndEvent::builder().build())),
            QueryEvent::End
        );
        assert_eq!(
            convert_event(SelectObjectContentEventStream::Cont(
                ContinuationEvent::builder().build()
            )),
            QueryEvent::Continuation
        );
    }
}

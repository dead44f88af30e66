//! Asynchronous replay script reader with batch interface
//!
//! Reads `Operation`s from any `futures::io::AsyncRead` with csv-async, a
//! batch at a time. Bad rows are logged at `warn` and skipped, so a batch
//! only ever holds valid operations.

use crate::io::csv_format::{convert_record, OperationRecord};
use crate::types::Operation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use log::warn;

/// Batch reader over a replay script
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read up to `batch_size` valid operations
    ///
    /// An empty batch means the end of the input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<OperationRecord>();

        while batch.len() < batch_size {
            let Some(result) = records.next().await else {
                break;
            };
            self.line_num += 1;

            match result {
                Ok(record) => match convert_record(record) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => warn!("Line {}: skipping row: {}", self.line_num, e),
                },
                Err(e) => warn!("Line {}: CSV parse error: {}", self.line_num, e),
            }
        }

        batch
    }
}

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use jobwatch_common::{JobWatchError, PostingRecord};

use super::backend::PostingStore;

/// Appends records to a CSV file, writing the header when the file is new
/// or empty.
pub struct CsvStore {
    path: PathBuf,
    /// Serializes the header check with the append.
    lock: Mutex<()>,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, record: &PostingRecord) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut out = String::new();
        if file.metadata().await?.len() == 0 {
            out.push_str(&csv_line(PostingRecord::columns().iter().copied()));
        }
        let row = record.to_row();
        out.push_str(&csv_line(row.iter().map(String::as_str)));

        file.write_all(out.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl PostingStore for CsvStore {
    async fn append(&self, record: &PostingRecord) -> Result<(), JobWatchError> {
        self.write(record).await.map_err(|e| {
            JobWatchError::Write(format!("append to {} failed: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), link = %record.link, "Record appended to CSV");
        Ok(())
    }

    fn name(&self) -> &str {
        "csv"
    }
}

fn csv_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut line = fields.map(csv_field).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

/// Quote a field when it holds a delimiter, quote or line break.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

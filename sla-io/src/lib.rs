//! sla-io: simple I/O sources and sinks.
//! - `FileSource`: reads a whole JSON-lines file
//! - `FileSink`: writes the output text to a file or stdout
//! - `StringSource` / `MemorySink`: in-memory counterparts

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sla_core::{metrics, Result, Sink, Source};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};

/// Reads the input file in one go; the pipeline needs the full stream upfront.
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Source for FileSource {
    #[instrument(name = "file_source_read", skip_all, fields(path = %self.path.display()))]
    async fn read(&mut self) -> Result<String> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        debug!(bytes = text.len(), "read input");
        Ok(text)
    }
}

/// Source over text already held in memory.
pub struct StringSource(pub String);

#[async_trait]
impl Source for StringSource {
    async fn read(&mut self) -> Result<String> {
        Ok(std::mem::take(&mut self.0))
    }
}

/// Writes the output text to stdout or to a file (created or truncated).
pub struct FileSink {
    pub path: Option<PathBuf>,
}

impl FileSink {
    pub fn stdout() -> Self {
        Self { path: None }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

/// Writes `output` as-is, with no trailing newline, whatever the destination.
async fn write_output<W>(w: &mut W, output: &str, label: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    w.write_all(output.as_bytes()).await?;
    w.flush().await?;
    metrics::BYTES_WRITTEN
        .with_label_values(&[label])
        .inc_by(output.len() as u64);
    Ok(())
}

#[async_trait]
impl Sink for FileSink {
    async fn write(&mut self, output: &str) -> Result<()> {
        match &self.path {
            Some(p) => {
                let mut f = tokio::fs::File::create(p).await?;
                write_output(&mut f, output, "FileSink").await?;
                debug!(path = %p.display(), bytes = output.len(), "wrote output");
            }
            None => write_output(&mut tokio::io::stdout(), output, "Stdout").await?,
        }
        Ok(())
    }
}

/// Keeps every written output; clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<String>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write(&mut self, output: &str) -> Result<()> {
        self.0.lock().push(output.to_string());
        Ok(())
    }
}

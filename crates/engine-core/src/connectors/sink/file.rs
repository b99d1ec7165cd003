use crate::{connectors::sink::Sink, error::SinkError};
use async_trait::async_trait;
use model::core::value::Value;
use std::path::{Path, PathBuf};
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{debug, warn};

/// Appends one statement per line to a `.sql` file.
///
/// Bound parameters cannot be represented in a script, so a prepared
/// statement is written with its placeholders and the values are dropped.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    warned_params: bool,
}

impl FileSink {
    /// Creates the file, truncating any previous content.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        debug!(path = %path.display(), "Output file created");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            warned_params: false,
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn write(&mut self, fragments: &[String], params: &[Value]) -> Result<(), SinkError> {
        if !params.is_empty() && !self.warned_params {
            warn!(
                path = %self.path.display(),
                "Prepared statements are written with placeholders; bound values are not stored in the file"
            );
            self.warned_params = true;
        }

        for fragment in fragments {
            self.writer.write_all(fragment.as_bytes()).await?;
        }
        self.writer.write_all(b"\n").await?;
        // every statement reaches the file before the next page is read
        self.writer.flush().await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

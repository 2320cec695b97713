//! JSON-lines framing for landmark input and render output.

use ocula_core::{Frame, FrameOutput};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, Lines};

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: invalid frame: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode frame output: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Reads one [`Frame`] per non-blank line.
pub struct FrameReader<R> {
    lines: Lines<BufReader<R>>,
    line_no: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            line_no: 0,
        }
    }

    /// Next frame with its 1-based line number, or `None` at end of input.
    pub async fn next_frame(&mut self) -> Result<Option<(usize, Frame)>, StreamError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let frame = serde_json::from_str(&line).map_err(|source| StreamError::Parse {
                line: self.line_no,
                source,
            })?;
            return Ok(Some((self.line_no, frame)));
        }
        Ok(None)
    }
}

/// Writes one [`FrameOutput`] per line.
pub struct OutputWriter<W: AsyncWrite + Unpin> {
    inner: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> OutputWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: BufWriter::new(writer),
        }
    }

    pub async fn write(&mut self, output: &FrameOutput) -> Result<(), StreamError> {
        let mut line = serde_json::to_vec(output).map_err(StreamError::Encode)?;
        line.push(b'\n');
        self.inner.write_all(&line).await?;
        Ok(())
    }

    /// Flush buffered output and hand back the underlying writer.
    pub async fn finish(mut self) -> Result<W, StreamError> {
        self.inner.flush().await?;
        Ok(self.inner.into_inner())
    }
}

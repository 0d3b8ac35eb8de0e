//! I/O primitives for communicating with the engine subprocess.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::MERGED_CHANNEL_CAPACITY;
use crate::{Error, Result};

/// Reads newline-terminated lines from one or more engine output pipes.
///
/// Each pipe gets a forwarder task that pushes complete lines into a shared
/// channel, so stdout and stderr arrive as one stream in arrival order. The
/// reader reports EOF once every forwarder has finished.
pub struct LineReader {
    rx: mpsc::Receiver<std::io::Result<String>>,
    forwarders: Vec<JoinHandle<()>>,
}

impl LineReader {
    /// Create a reader over a single output pipe.
    pub fn new<R>(pipe: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let pipe: Box<dyn AsyncRead + Unpin + Send> = Box::new(pipe);
        Self::merged(vec![pipe])
    }

    /// Create a reader combining several output pipes.
    pub fn merged(pipes: Vec<Box<dyn AsyncRead + Unpin + Send>>) -> Self {
        let (tx, rx) = mpsc::channel(MERGED_CHANNEL_CAPACITY);
        let forwarders = pipes
            .into_iter()
            .map(|pipe| tokio::spawn(forward_lines(pipe, tx.clone())))
            .collect();

        Self { rx, forwarders }
    }

    /// Read the next line, without its `\n` or `\r\n` terminator.
    ///
    /// Returns `Ok(None)` when every pipe has reached EOF.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        match self.rx.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(Error::io(e)),
            None => Ok(None),
        }
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        for task in &self.forwarders {
            task.abort();
        }
    }
}

/// Forward complete lines from `pipe` until EOF, a read error, or the reader is gone.
async fn forward_lines(
    pipe: Box<dyn AsyncRead + Unpin + Send>,
    tx: mpsc::Sender<std::io::Result<String>>,
) {
    let mut reader = BufReader::new(pipe);
    let mut buffer = Vec::with_capacity(256);

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => return,
            Ok(_) => {
                let line = decode_line(&buffer);
                if tx.send(Ok(line)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }
}

/// Strip the line terminator; invalid UTF-8 is replaced rather than rejected.
fn decode_line(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.trim_end_matches(['\n', '\r']).to_string()
}

/// Writes command lines to the engine stdin.
pub struct LineWriter<W> {
    stdin: W,
}

impl<W> LineWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Create a new writer over the engine stdin.
    pub fn new(stdin: W) -> Self {
        Self { stdin }
    }

    /// Write `line` followed by `\n`, then flush.
    ///
    /// The line is written in one buffer so a concurrent reader of the pipe
    /// never sees a partial command.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');

        self.stdin
            .write_all(framed.as_bytes())
            .await
            .map_err(Error::Write)?;
        self.stdin.flush().await.map_err(Error::Write)
    }
}

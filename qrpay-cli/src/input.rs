//! Line input shared by the scanner and the confirmation prompt.
//!
//! Both read stdin through one buffered reader; clones share the buffer, so a
//! line read ahead by one is still there for the other.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::warn;

pub struct LineInput<R> {
    lines: Arc<Mutex<Lines<R>>>,
}

impl<R> Clone for LineInput<R> {
    fn clone(&self) -> Self {
        Self {
            lines: Arc::clone(&self.lines),
        }
    }
}

impl LineInput<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Arc::new(Mutex::new(reader.lines())),
        }
    }

    /// Next line without its terminator; `None` at end of input or on a read error
    pub async fn next_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}

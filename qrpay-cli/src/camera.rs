//! Line-oriented "camera": each non-empty input line is one scanned QR payload.
//! Lets a phone scanner app, a clipboard paste or a pipe stand in for a camera.

use async_trait::async_trait;
use qrpay_core::{Camera, ScanError};
use tokio::io::AsyncBufRead;
use tracing::debug;

use crate::input::LineInput;

pub struct LineCamera<R> {
    input: LineInput<R>,
    active: bool,
}

impl<R: AsyncBufRead + Unpin + Send> LineCamera<R> {
    pub fn new(input: LineInput<R>) -> Self {
        Self {
            input,
            active: false,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Camera for LineCamera<R> {
    async fn acquire(&mut self) -> Result<(), ScanError> {
        if self.active {
            return Err(ScanError::CameraUnavailable("already scanning".to_string()));
        }
        self.active = true;
        eprintln!(
            "Waiting for a scanned payment request (one JSON payload per line, Ctrl-C to cancel)..."
        );
        Ok(())
    }

    async fn next_payload(&mut self) -> Option<String> {
        while let Some(line) = self.input.next_line().await {
            if !line.trim().is_empty() {
                return Some(line);
            }
        }
        None
    }

    fn release(&mut self) {
        self.active = false;
        debug!("Scanner input released");
    }
}

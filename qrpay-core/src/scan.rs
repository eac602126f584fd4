//! QR scanning sessions
//!
//! A camera is a scarce device: once acquired it must be released on every exit
//! path, including the one where the scanning future is simply dropped. The
//! [`ScanSession`] guard owns that pairing.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::intent::{decode, PaymentIntent};
use crate::{DecodeError, ScanError};

/// A source of decoded QR payloads
#[async_trait]
pub trait Camera: Send {
    async fn acquire(&mut self) -> Result<(), ScanError>;

    /// Next payload seen by the camera, `None` once the stream has ended
    async fn next_payload(&mut self) -> Option<String>;

    fn release(&mut self);
}

/// An acquired camera, released when the session is dropped
pub struct ScanSession<'a, C: Camera + ?Sized> {
    camera: &'a mut C,
}

impl<'a, C: Camera + ?Sized> ScanSession<'a, C> {
    pub async fn start(camera: &'a mut C) -> Result<Self, ScanError> {
        camera.acquire().await?;
        debug!("Camera acquired");
        Ok(Self { camera })
    }

    pub async fn next_payload(&mut self) -> Option<String> {
        self.camera.next_payload().await
    }
}

impl<C: Camera + ?Sized> Drop for ScanSession<'_, C> {
    fn drop(&mut self) {
        self.camera.release();
        debug!("Camera released");
    }
}

/// How a scan ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Intent(PaymentIntent),
    Cancelled,
    /// The camera stopped producing frames
    Closed,
    Unrecognised { raw: String, error: DecodeError },
}

/// Scan until the first payload, cancellation, or end of stream
pub async fn scan_payment<C>(
    camera: &mut C,
    cancel: &CancellationToken,
) -> Result<ScanOutcome, ScanError>
where
    C: Camera + ?Sized,
{
    let mut session = ScanSession::start(camera).await?;

    let payload = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("Scan cancelled");
            return Ok(ScanOutcome::Cancelled);
        }
        payload = session.next_payload() => payload,
    };
    drop(session);

    let Some(raw) = payload else {
        info!("Camera stream closed before a code was read");
        return Ok(ScanOutcome::Closed);
    };

    match decode(&raw) {
        Ok(intent) => {
            info!("Scanned payment request: {}", intent.summary());
            Ok(ScanOutcome::Intent(intent))
        }
        Err(error) => {
            warn!("Unrecognised QR payload ({})", error.reason());
            Ok(ScanOutcome::Unrecognised { raw, error })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedCamera {
        frames: VecDeque<String>,
        acquired: usize,
        released: usize,
    }

    #[async_trait]
    impl Camera for ScriptedCamera {
        async fn acquire(&mut self) -> Result<(), ScanError> {
            self.acquired += 1;
            Ok(())
        }

        async fn next_payload(&mut self) -> Option<String> {
            self.frames.pop_front()
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    #[tokio::test]
    async fn test_closed_stream_releases() {
        let mut camera = ScriptedCamera::default();
        let outcome = scan_payment(&mut camera, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, ScanOutcome::Closed);
        assert_eq!((camera.acquired, camera.released), (1, 1));
    }

    #[tokio::test]
    async fn test_garbage_payload() {
        let mut camera = ScriptedCamera {
            frames: VecDeque::from(["hello".to_string()]),
            ..Default::default()
        };
        let outcome = scan_payment(&mut camera, &CancellationToken::new()).await.unwrap();
        match outcome {
            ScanOutcome::Unrecognised { raw, error } => {
                assert_eq!(raw, "hello");
                assert_eq!(error.user_message(), "Invalid QR code format");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(camera.released, 1);
    }
}

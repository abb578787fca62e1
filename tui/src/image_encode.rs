//! Image resize/encode side channel for composer attachments.
//!
//! The composer never touches image bytes itself: it asks for an encode via
//! [`AppEvent::StartImageEncode`], the app loop forwards the request to
//! [`ImageEncodeManager`], and the result comes back as [`AppEvent::ImageEncoded`] or
//! [`AppEvent::ImageEncodeFailed`]. Failures are reported through `tracing` only.

use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::DynamicImage;
use image::ImageFormat;
use image::imageops::FilterType;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;

/// Bounds every attachment is fitted into before it is encoded.
pub const IMAGE_MAX_WIDTH: u32 = 800;
pub const IMAGE_MAX_HEIGHT: u32 = 800;

#[derive(Debug, thiserror::Error)]
pub enum EncodeImageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("encode task did not complete: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

/// Turns raw image bytes into a size-bounded, self-describing string (usually a data URI).
pub trait ImageResizer: Send + Sync {
    fn resize(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
    ) -> Result<String, EncodeImageError>;
}

/// Default resizer: downscale to fit the bounds (aspect ratio kept, never upscaled) and return a
/// base64 `data:` URI. JPEG input stays JPEG; everything else becomes PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlResizer;

impl ImageResizer for DataUrlResizer {
    fn resize(
        &self,
        bytes: &[u8],
        max_width: u32,
        max_height: u32,
    ) -> Result<String, EncodeImageError> {
        let source_format = image::guess_format(bytes).map_err(EncodeImageError::Decode)?;
        let decoded = image::load_from_memory(bytes).map_err(EncodeImageError::Decode)?;

        let (width, height) = (decoded.width(), decoded.height());
        let fitted = if width > max_width || height > max_height {
            decoded.resize(max_width, max_height, FilterType::Triangle)
        } else {
            decoded
        };
        tracing::debug!(
            "resized image {width}x{height} -> {}x{}",
            fitted.width(),
            fitted.height()
        );

        let (output_format, mime) = match source_format {
            ImageFormat::Jpeg => (ImageFormat::Jpeg, "image/jpeg"),
            _ => (ImageFormat::Png, "image/png"),
        };
        let fitted = match output_format {
            // The JPEG encoder rejects alpha channels.
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(fitted.to_rgb8()),
            _ => fitted,
        };

        let mut encoded = Cursor::new(Vec::new());
        fitted
            .write_to(&mut encoded, output_format)
            .map_err(EncodeImageError::Encode)?;

        let payload = BASE64_STANDARD.encode(encoded.into_inner());
        Ok(format!("data:{mime};base64,{payload}"))
    }
}

/// Read `path` and run it through `resizer` off the UI loop.
pub async fn encode_file(
    resizer: Arc<dyn ImageResizer>,
    path: &Path,
) -> Result<String, EncodeImageError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| EncodeImageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    tokio::task::spawn_blocking(move || {
        resizer.resize(&bytes, IMAGE_MAX_WIDTH, IMAGE_MAX_HEIGHT)
    })
    .await?
}

/// Runs encode requests in background tasks and reports completions to the app loop.
///
/// Requests are never cancelled; if the UI is gone by the time one finishes, the result is
/// dropped by [`AppEventSender::send`].
#[derive(Clone)]
pub struct ImageEncodeManager {
    resizer: Arc<dyn ImageResizer>,
    app_event_tx: AppEventSender,
}

impl ImageEncodeManager {
    pub fn new(resizer: Arc<dyn ImageResizer>, app_event_tx: AppEventSender) -> Self {
        Self {
            resizer,
            app_event_tx,
        }
    }

    pub fn on_request(&self, seq: u64, path: PathBuf) {
        let resizer = Arc::clone(&self.resizer);
        let app_event_tx = self.app_event_tx.clone();
        tokio::spawn(async move {
            match encode_file(resizer, &path).await {
                Ok(data_url) => {
                    tracing::debug!(
                        "encoded image #{seq} from {} ({} bytes)",
                        path.display(),
                        data_url.len()
                    );
                    app_event_tx.send(AppEvent::ImageEncoded { seq, data_url });
                }
                Err(err) => {
                    tracing::warn!("failed to attach image {}: {err}", path.display());
                    app_event_tx.send(AppEvent::ImageEncodeFailed { seq });
                }
            }
        });
    }
}

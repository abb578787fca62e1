//! Application-level events used to coordinate UI actions.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Kick off an asynchronous resize/encode of the image at `path`. `seq` identifies the
    /// request so the composer can tell which completion is the newest.
    StartImageEncode { seq: u64, path: PathBuf },

    /// Result of a completed image encode. `seq` echoes the originating request.
    ImageEncoded { seq: u64, data_url: String },

    /// The encode for `seq` failed. The failure itself has already been logged.
    ImageEncodeFailed { seq: u64 },
}

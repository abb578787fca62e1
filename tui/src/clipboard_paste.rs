use std::path::PathBuf;

use image::ImageFormat;

/// Normalize pasted text that may represent a filesystem path.
///
/// Supports:
/// - `file://` URLs (converted to local paths)
/// - shell-escaped or quoted single paths (via `shlex`)
///
/// Anything spanning several lines or splitting into several shell words is not a path.
pub fn normalize_pasted_path(pasted: &str) -> Option<PathBuf> {
    let pasted = pasted.trim();
    if pasted.is_empty() || pasted.contains('\n') {
        return None;
    }

    if let Ok(url) = url::Url::parse(pasted)
        && url.scheme() == "file"
    {
        return url.to_file_path().ok();
    }

    let mut parts = shlex::Shlex::new(pasted);
    let first = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(PathBuf::from(first))
}

/// If `pasted` names an existing file with an image extension, return its path.
///
/// Only the extension is checked here; decoding happens later in the encode pipeline.
pub fn pasted_image_path(pasted: &str) -> Option<PathBuf> {
    let path = normalize_pasted_path(pasted)?;
    if ImageFormat::from_path(&path).is_err() {
        return None;
    }
    if !path.is_file() {
        tracing::trace!("pasted image path does not exist: {}", path.display());
        return None;
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[cfg(not(windows))]
    #[test]
    fn normalize_file_url() {
        let result = normalize_pasted_path("file:///tmp/example.png").expect("file url");
        assert_eq!(result, PathBuf::from("/tmp/example.png"));
    }

    #[test]
    fn normalize_shell_escaped_and_quoted_paths() {
        assert_eq!(
            normalize_pasted_path("/home/user/My\\ File.png"),
            Some(PathBuf::from("/home/user/My File.png"))
        );
        assert_eq!(
            normalize_pasted_path("'/home/user/My File.png'"),
            Some(PathBuf::from("/home/user/My File.png"))
        );
    }

    #[test]
    fn prose_is_not_a_path() {
        assert_eq!(normalize_pasted_path("look at this picture"), None);
        assert_eq!(normalize_pasted_path("a.png\nb.png"), None);
        assert_eq!(normalize_pasted_path("   "), None);
    }

    #[test]
    fn image_path_requires_existing_image_file() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("shot.png");
        std::fs::write(&png, b"not decoded here").unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"hello").unwrap();

        assert_eq!(pasted_image_path(&png.to_string_lossy()), Some(png.clone()));
        assert_eq!(pasted_image_path(&txt.to_string_lossy()), None);
        assert_eq!(
            pasted_image_path(&dir.path().join("missing.jpg").to_string_lossy()),
            None
        );
    }
}

//! Cover art discovery next to an audio file

use std::path::{Path, PathBuf};

/// Extensions recognised as images (lowercase, without the dot)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// Find the first image file in the same directory as `audio_path`
///
/// Siblings are considered in file-name order; directories are skipped and
/// extensions match case-insensitively. Unreadable directories yield `None`.
pub fn find_cover_image(audio_path: &Path) -> Option<PathBuf> {
    let dir = audio_path.parent()?;
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "Error reading directory: {}", e);
            return None;
        }
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| !t.is_dir()))
        .map(|entry| entry.path())
        .filter(|path| is_image_file(path))
        .collect();
    images.sort();

    let found = images.into_iter().next();
    if let Some(image) = &found {
        tracing::debug!(image = %image.display(), "Found cover image");
    }
    found
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_finds_first_image_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("book.mp3");
        fs::write(&book, b"").unwrap();
        fs::write(dir.path().join("zeta.png"), b"").unwrap();
        fs::write(dir.path().join("alpha.JPG"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        assert_eq!(find_cover_image(&book), Some(dir.path().join("alpha.JPG")));
    }

    #[test]
    fn test_skips_directories_named_like_images() {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("book.mp3");
        fs::write(&book, b"").unwrap();
        fs::create_dir(dir.path().join("art.jpg")).unwrap();
        fs::write(dir.path().join("cover.webp"), b"").unwrap();

        assert_eq!(find_cover_image(&book), Some(dir.path().join("cover.webp")));
    }

    #[test]
    fn test_none_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("book.mp3");
        fs::write(&book, b"").unwrap();

        assert_eq!(find_cover_image(&book), None);
    }

    #[test]
    fn test_none_for_missing_directory() {
        assert_eq!(find_cover_image(Path::new("/nonexistent/dir/book.mp3")), None);
    }
}

//! Source discovery for the images -> video direction.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// File extensions accepted as source images.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Lists the images directly inside `dir`, ordered by file name.
///
/// Sub-directories and files with other extensions are skipped. An empty
/// result is an error.
pub fn scan_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let io_error = |source: std::io::Error| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        entries.push(entry);
    }
    entries.sort_by_key(|e| e.file_name());

    let mut images = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error)?;
        if !file_type.is_file() {
            log::debug!("skipping {}, not a file", path.display());
            continue;
        }
        if !is_image_file(&path) {
            log::info!(
                "skipping {}, ext: '{}'",
                path.display(),
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default()
            );
            continue;
        }
        images.push(path);
    }

    if images.is_empty() {
        return Err(PipelineError::NoSources(dir.to_path_buf()).into());
    }
    log::info!("found {} images in {}", images.len(), dir.display());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt", "c.bmp", "d.JPEG"] {
            touch(dir.path(), name);
        }
        std::fs::create_dir(dir.path().join("e.jpg")).unwrap();

        let found = scan_images(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "d.JPEG"]);
    }

    #[test]
    fn test_no_eligible_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md");
        let err = scan_images(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoSources(_))
        ));
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_images(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Io { .. })
        ));
    }

    #[test]
    fn test_extension_match() {
        assert!(is_image_file(Path::new("frames/0001.jpg")));
        assert!(is_image_file(Path::new("x.Png")));
        assert!(!is_image_file(Path::new("x.gif")));
        assert!(!is_image_file(Path::new("jpg")));
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "heic", "heif", "dng", "cr2", "cr3",
    "nef", "arw", "raf", "orf", "rw2",
];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "m4v", "3gp", "avi", "mkv", "mts", "m2ts", "wmv", "webm",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileKind {
    Photo,
    Video,
    Unsupported,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Photo
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Video
        } else {
            FileKind::Unsupported
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub extension: String,
    pub kind: FileKind,
}

impl FileCandidate {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|v| v.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let kind = if extension.is_empty() {
            FileKind::Unsupported
        } else {
            FileKind::from_extension(&extension)
        };
        Self {
            path,
            extension,
            kind,
        }
    }

    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn original_extension(&self) -> String {
        self.path
            .extension()
            .map(|v| format!(".{}", v.to_string_lossy()))
            .unwrap_or_default()
    }

    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaFilter {
    pub images_only: bool,
    pub videos_only: bool,
    pub extensions: Vec<String>,
}

impl MediaFilter {
    pub fn admits(&self, candidate: &FileCandidate) -> bool {
        match candidate.kind {
            FileKind::Unsupported => return false,
            FileKind::Photo if self.videos_only && !self.images_only => return false,
            FileKind::Video if self.images_only && !self.videos_only => return false,
            _ => {}
        }

        if self.extensions.is_empty() {
            return true;
        }
        self.extensions
            .iter()
            .any(|ext| normalize_extension(ext) == candidate.extension)
    }

    pub fn unknown_extension(&self) -> Option<&str> {
        self.extensions
            .iter()
            .find(|ext| FileKind::from_extension(&normalize_extension(ext)) == FileKind::Unsupported)
            .map(String::as_str)
    }
}

pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

use crate::media::FileCandidate;
use std::fs;
use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    File(FileCandidate),
    Hidden(PathBuf),
    Unknown(PathBuf),
    Failed { path: PathBuf, reason: String },
}

pub fn walk(root: &Path, recursive: bool, include_hidden: bool) -> io::Result<Vec<WalkEntry>> {
    if recursive {
        Ok(walk_recursive(root, include_hidden))
    } else {
        walk_flat(root, include_hidden)
    }
}

fn walk_recursive(root: &Path, include_hidden: bool) -> Vec<WalkEntry> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            include_hidden || !entry.file_type().is_dir() || !is_hidden(entry.path())
        });

    for entry in walker {
        match entry {
            Ok(entry) => {
                if let Some(item) = classify(entry.path(), entry.file_type(), include_hidden) {
                    out.push(item);
                }
            }
            Err(err) => out.push(WalkEntry::Failed {
                path: err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                reason: err.to_string(),
            }),
        }
    }
    out
}

fn walk_flat(root: &Path, include_hidden: bool) -> io::Result<Vec<WalkEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        entries.push((entry.path(), entry.file_type()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let out = entries
        .into_iter()
        .filter_map(|(path, file_type)| match file_type {
            Ok(file_type) => classify(&path, file_type, include_hidden),
            Err(err) => Some(WalkEntry::Failed {
                path,
                reason: err.to_string(),
            }),
        })
        .collect();
    Ok(out)
}

fn classify(path: &Path, file_type: FileType, include_hidden: bool) -> Option<WalkEntry> {
    if file_type.is_dir() {
        return None;
    }
    if !file_type.is_file() {
        return Some(WalkEntry::Unknown(path.to_path_buf()));
    }
    if !include_hidden && is_hidden(path) {
        return Some(WalkEntry::Hidden(path.to_path_buf()));
    }
    Some(WalkEntry::File(FileCandidate::from_path(path)))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

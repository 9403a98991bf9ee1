use std::fs;
use std::path::{Path, PathBuf};

/// File-name component of a texture reference, accepting either separator.
pub fn reference_file_name(reference: &str) -> &str {
    reference
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(reference)
}

/// Depth-first search under `dir` for a file named `file_name`
/// (case-insensitive). Entries are visited in lexicographic order and the
/// first match wins. Symlinked directories are not followed.
pub fn find_file_recursive(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let mut entries: Vec<_> = match fs::read_dir(dir) {
        Ok(iter) => iter.filter_map(|e| e.ok()).collect(),
        Err(e) => {
            log::debug!("cannot scan {}: {}", dir.display(), e);
            return None;
        }
    };
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if let Some(found) = find_file_recursive(&entry.path(), file_name) {
                return Some(found);
            }
        } else if entry
            .file_name()
            .to_string_lossy()
            .eq_ignore_ascii_case(file_name)
        {
            return Some(entry.path());
        }
    }
    None
}

/// Resolve a material's texture reference to a file on disk.
///
/// With `recursive` set, the file name is first searched for anywhere under
/// `base_dir`; otherwise (or when that finds nothing) `base_dir` joined with
/// the reference is used if it exists.
pub fn resolve_texture_path(base_dir: &Path, reference: &str, recursive: bool) -> Option<PathBuf> {
    let file_name = reference_file_name(reference);
    if file_name.is_empty() {
        return None;
    }

    if recursive {
        if let Some(found) = find_file_recursive(base_dir, file_name) {
            return Some(found);
        }
    }

    let direct = base_dir.join(reference.replace('\\', "/"));
    if direct.is_file() {
        return Some(direct);
    }
    log::debug!("texture '{}' not found under {}", reference, base_dir.display());
    None
}

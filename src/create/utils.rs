// Purpose: Path and file helpers for materializing templates.

use std::{
    fs, io,
    io::Write,
    path::{Component, Path, PathBuf},
};

use tempfile::NamedTempFile;

use super::registry::Mode;

/// Normalizes a template path so it stays beneath the project root.
///
/// `.` segments are dropped. Returns `None` for absolute paths, drive
/// prefixes, any `..` segment, or a path that names the root itself.
pub fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if normalized.as_os_str().is_empty() {
        return None;
    }
    Some(normalized)
}

pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

// Dangling symlinks count as present.
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Whether writing `target` would pass through a symlink that resolves
/// outside `root`. The deepest existing ancestor of the target's parent is
/// resolved and compared with the resolved root; a dangling link counts as
/// leaving it.
pub fn leaves_root(root: &Path, target: &Path) -> io::Result<bool> {
    if !exists(root) {
        return Ok(false);
    }
    let root = fs::canonicalize(root)?;
    let Some(parent) = target.parent() else {
        return Ok(false);
    };
    let Some(ancestor) = parent.ancestors().find(|p| exists(p)) else {
        return Ok(false);
    };
    match fs::canonicalize(ancestor) {
        Ok(resolved) => Ok(!resolved.starts_with(&root)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: Mode) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode.bits()))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: Mode) -> io::Result<()> {
    Ok(())
}

/// Writes `content` to `target` through a temporary file in the same
/// directory, so readers only ever see the old file or the complete new one.
/// With `replace` unset an existing target is left alone and the call fails.
pub fn write_atomic(target: &Path, content: &str, mode: Mode, replace: bool) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    set_mode(tmp.path(), mode)?;

    if replace {
        tmp.persist(target).map_err(|e| e.error)?;
    } else {
        tmp.persist_noclobber(target).map_err(|e| e.error)?;
    }
    Ok(())
}

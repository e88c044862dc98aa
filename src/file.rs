//! Config file discovery and loading.
//!
//! Each [`SearchPath`] resolves to one or more directories, listed in
//! **priority-ascending** order (last = highest). `Ancestors` expands to every
//! directory from the boundary down to the working directory, shallowest first,
//! so the config closest to the project wins.
//!
//! Every directory is then checked for `{dir}/{file_name}`:
//!
//! - [`SearchMode::Merge`] returns every file found, in priority order.
//! - [`SearchMode::FirstMatch`] returns only the highest-priority file found.
//!
//! Missing files are skipped in both modes. Other I/O errors propagate.

use std::path::{Path, PathBuf};

use crate::error::RulefigError;
use crate::types::{Boundary, SearchMode, SearchPath};

/// Expand the ancestors of `start` up to `boundary`, shallowest first.
///
/// With [`Boundary::Marker`] the walk stops (inclusive) at the first directory
/// containing the marker, falling back to the root when none does.
pub fn expand_ancestors_from(start: &Path, boundary: &Boundary) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut current = start;

    loop {
        dirs.push(current.to_path_buf());

        if let Boundary::Marker(name) = boundary
            && current.join(name).exists()
        {
            break;
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    dirs.reverse();
    dirs
}

/// Expand search paths into concrete directories (priority-ascending).
///
/// `cwd` anchors `Cwd` and `Ancestors`; when it is `None` those entries are
/// skipped.
pub fn expand_search_paths(search_paths: &[SearchPath], cwd: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for sp in search_paths {
        match (sp, cwd) {
            (SearchPath::Path(p), _) => dirs.push(p.clone()),
            (SearchPath::Cwd, Some(cwd)) => dirs.push(cwd.to_path_buf()),
            (SearchPath::Ancestors(boundary), Some(cwd)) => {
                dirs.extend(expand_ancestors_from(cwd, boundary));
            }
            (_, None) => {
                tracing::debug!(search_path = ?sp, "no working directory; search path skipped");
            }
        }
    }
    dirs
}

/// Load config files from the search paths, respecting [`SearchMode`].
pub fn load_config_files(
    search_paths: &[SearchPath],
    file_name: &str,
    mode: SearchMode,
) -> Result<Vec<(PathBuf, String)>, RulefigError> {
    let cwd = std::env::current_dir().ok();
    let dirs = expand_search_paths(search_paths, cwd.as_deref());

    match mode {
        SearchMode::Merge => load_all(&dirs, file_name),
        SearchMode::FirstMatch => load_first_match(&dirs, file_name),
    }
}

fn load_all(dirs: &[PathBuf], file_name: &str) -> Result<Vec<(PathBuf, String)>, RulefigError> {
    let mut results = Vec::new();
    for dir in dirs {
        if let Some(found) = read_if_present(&dir.join(file_name))? {
            results.push(found);
        }
    }
    Ok(results)
}

fn load_first_match(
    dirs: &[PathBuf],
    file_name: &str,
) -> Result<Vec<(PathBuf, String)>, RulefigError> {
    for dir in dirs.iter().rev() {
        if let Some(found) = read_if_present(&dir.join(file_name))? {
            return Ok(vec![found]);
        }
    }
    Ok(vec![])
}

/// Read one explicitly named config file. Unlike search paths, a missing file
/// is an error.
pub fn load_file(path: &Path) -> Result<(PathBuf, String), RulefigError> {
    std::fs::read_to_string(path)
        .map(|content| (path.to_path_buf(), content))
        .map_err(|e| RulefigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
}

fn read_if_present(file_path: &Path) -> Result<Option<(PathBuf, String)>, RulefigError> {
    match std::fs::read_to_string(file_path) {
        Ok(content) => {
            tracing::debug!(path = %file_path.display(), "loaded config file");
            Ok(Some((file_path.to_path_buf(), content)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RulefigError::IoError {
            path: file_path.to_path_buf(),
            source: e,
        }),
    }
}

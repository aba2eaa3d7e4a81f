use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::LoaderConfig;
use crate::models::Document;

/// Recursively load text files under `repo_path` whose names end with one
/// of the configured extensions.
///
/// Undecodable bytes are replaced rather than failing the file, and a
/// single unreadable file is logged and skipped — it never aborts the
/// walk. An empty result is a valid outcome, not an error.
///
/// Traversal order follows the filesystem and is not guaranteed to be
/// stable across platforms.
pub fn load_documents(repo_path: &Path, loader: &LoaderConfig) -> Result<Vec<Document>> {
    if repo_path.as_os_str().is_empty() {
        bail!("Repository path is not set");
    }
    if !repo_path.exists() {
        bail!("Repository path does not exist: {}", repo_path.display());
    }

    let mut exclude_patterns = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    exclude_patterns.extend(loader.exclude_globs.clone());
    let exclude_set = build_globset(&exclude_patterns)?;

    let mut docs = Vec::new();

    for entry in WalkDir::new(repo_path) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(repo_path).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !loader.extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            continue;
        }

        match std::fs::read(path) {
            Ok(bytes) => docs.push(Document {
                path: path.to_path_buf(),
                content: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(e) => {
                warn!("failed to read {}: {}", path.display(), e);
            }
        }
    }

    Ok(docs)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn default_loader() -> LoaderConfig {
        LoaderConfig::default()
    }

    #[test]
    fn test_load_single_matching_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.py"), "def f(): pass").unwrap();

        let docs = load_documents(tmp.path(), &default_loader()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "def f(): pass");
        assert!(docs[0].path.ends_with("a.py"));
    }

    #[test]
    fn test_non_matching_extensions_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("binary.bin"), [0u8, 1, 2]).unwrap();
        fs::write(tmp.path().join("notes.md"), "# notes").unwrap();

        let docs = load_documents(tmp.path(), &default_loader()).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].path.ends_with("notes.md"));
    }

    #[test]
    fn test_empty_directory_is_ok() {
        let tmp = TempDir::new().unwrap();
        let docs = load_documents(tmp.path(), &default_loader()).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_missing_path_is_error() {
        let result = load_documents(Path::new("/nonexistent/repo"), &default_loader());
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_path_is_error() {
        let result = load_documents(Path::new(""), &default_loader());
        assert!(result.is_err());
    }

    #[test]
    fn test_recurses_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("mod.py"), "x = 1").unwrap();

        let docs = load_documents(tmp.path(), &default_loader()).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_default_excludes_skip_git_dir() {
        let tmp = TempDir::new().unwrap();
        let git = tmp.path().join(".git").join("info");
        fs::create_dir_all(&git).unwrap();
        fs::write(git.join("notes.txt"), "internal").unwrap();
        fs::write(tmp.path().join("readme.txt"), "visible").unwrap();

        let docs = load_documents(tmp.path(), &default_loader()).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].path.ends_with("readme.txt"));
    }

    #[test]
    fn test_invalid_utf8_replaced_not_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.txt"), [b'h', b'i', 0xFF, 0xFE]).unwrap();

        let docs = load_documents(tmp.path(), &default_loader()).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.starts_with("hi"));
    }
}

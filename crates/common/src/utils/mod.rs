use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// SHA-256 of `text`, base64 URL-safe encoded with padding.
///
/// Used both for the text we issue and the text the server echoes back, so
/// the two must always go through this one function.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    URL_SAFE.encode(digest)
}

/// Files directly or transitively under `root` with extension `ext`, sorted.
pub fn paths_with_ext(root: &Path, ext: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|e| e == ext))
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn hash_is_stable_and_url_safe() {
        let a = content_hash("CREATE STREAM S (a STRING);");
        let b = content_hash("CREATE STREAM S (a STRING);");
        assert_eq!(a, b);
        assert_eq!(a.len(), 44);
        assert!(a.ends_with('='));
        assert!(!a.contains('+') && !a.contains('/'));
        assert_ne!(a, content_hash("CREATE STREAM T (a STRING);"));
    }

    #[test]
    fn hash_of_empty_text() {
        assert_eq!(
            content_hash(""),
            "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn finds_yaml_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.yml"), "").unwrap();
        fs::write(dir.path().join("nested/a.yml"), "").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();

        let found = paths_with_ext(dir.path(), "yml");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().unwrap() == "yml"));
    }
}

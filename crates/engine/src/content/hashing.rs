use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::types::ContentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PackFingerprint {
    pub json_file_count: usize,
    pub hash_hex: String,
}

/// SHA-256 over every `.json` file under `config_dir`. Each file is keyed by
/// its `/`-joined path relative to `config_dir`, so a rename changes the
/// fingerprint as well.
pub(crate) fn fingerprint_config_dir(config_dir: &Path) -> Result<PackFingerprint, ContentError> {
    let mut files = json_files_under(config_dir)?;
    files.sort();

    let mut hasher = Sha256::new();
    for (key, path) in &files {
        let bytes = fs::read(path).map_err(|source| ContentError::ReadFile {
            path: path.clone(),
            source,
        })?;
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(&bytes);
    }

    Ok(PackFingerprint {
        json_file_count: files.len(),
        hash_hex: format!("{:x}", hasher.finalize()),
    })
}

fn json_files_under(root: &Path) -> Result<Vec<(String, PathBuf)>, ContentError> {
    let mut pending = vec![root.to_path_buf()];
    let mut found = Vec::new();
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| ContentError::ReadDir {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let path = entry
                .map_err(|source| ContentError::ReadDirEntry {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                if let Ok(rel) = path.strip_prefix(root) {
                    let key = rel
                        .components()
                        .map(|part| part.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    found.push((key, path));
                }
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn fingerprint_ignores_non_json_and_changes_on_edit_or_add() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path();
        fs::write(dir.join("scene.config.json"), "{}").expect("write config");
        fs::write(dir.join("notes.md"), "ignore me").expect("write notes");

        let first = fingerprint_config_dir(dir).expect("hash");
        assert_eq!(first.json_file_count, 1);

        fs::write(dir.join("scene.config.json"), r#"{"groundY": 1}"#).expect("edit");
        let second = fingerprint_config_dir(dir).expect("hash");
        assert_ne!(first.hash_hex, second.hash_hex);

        fs::write(dir.join("triggers.json"), "[]").expect("add");
        let third = fingerprint_config_dir(dir).expect("hash");
        assert_eq!(third.json_file_count, 2);
        assert_ne!(second.hash_hex, third.hash_hex);
    }

    #[test]
    fn nested_files_count_and_renames_change_the_hash() {
        let temp = TempDir::new().expect("tempdir");
        let nested = temp.path().join("stations");
        fs::create_dir_all(&nested).expect("mkdir");
        fs::write(nested.join("safa.json"), "{}").expect("write");

        let before = fingerprint_config_dir(temp.path()).expect("hash");
        assert_eq!(before.json_file_count, 1);

        fs::rename(nested.join("safa.json"), nested.join("marwah.json")).expect("rename");
        let after = fingerprint_config_dir(temp.path()).expect("hash");
        assert_eq!(after.json_file_count, 1);
        assert_ne!(before.hash_hex, after.hash_hex);
    }

    #[test]
    fn fingerprint_is_stable_for_unchanged_files() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("triggers.json"), "[]").expect("write");

        let first = fingerprint_config_dir(temp.path()).expect("hash");
        let second = fingerprint_config_dir(temp.path()).expect("hash");
        assert_eq!(first, second);
        assert_eq!(first.hash_hex.len(), 64);
    }
}

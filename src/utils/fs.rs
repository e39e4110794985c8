use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Create `path` and any missing parents. An existing path is accepted
/// as-is, even when it is not a directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    debug!("Creating directory: {}", path.display());
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;

    Ok(())
}

/// Byte-for-byte copy of a single file. Creates the destination's parent
/// directory when missing.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    debug!("Copying file: {} -> {}", from.display(), to.display());

    if !from.exists() {
        return Err(anyhow::anyhow!(
            "Source file does not exist: {}",
            from.display()
        ));
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;
    }

    fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))
}

/// Recursively copy a directory tree, preserving file and directory names.
pub fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)
        .with_context(|| format!("Failed to create directory: {}", to.display()))?;

    for entry in fs::read_dir(from)
        .with_context(|| format!("Failed to read directory: {}", from.display()))?
    {
        let entry = entry?;
        let source_path = entry.path();
        let dest_path = to.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_tree(&source_path, &dest_path)?;
        } else {
            copy_file(&source_path, &dest_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_directory_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a/b/c");

        ensure_directory(&target).unwrap();
        assert!(target.is_dir());

        // Second call on the now-existing path must be a clean no-op.
        ensure_directory(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn ensure_directory_accepts_existing_non_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("occupied");
        fs::write(&target, b"plain file").unwrap();

        ensure_directory(&target).unwrap();
        assert!(target.is_file());
    }

    #[test]
    fn copy_file_rejects_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let err = copy_file(&tmp.path().join("absent"), &tmp.path().join("out")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn copy_tree_preserves_hierarchy() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("EFI/BOOT")).unwrap();
        fs::write(src.join("BOOT.CFG"), b"bootstate=0").unwrap();
        fs::write(src.join("EFI/BOOT/BOOTX64.EFI"), b"mz").unwrap();

        let dst = tmp.path().join("dst");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read(dst.join("BOOT.CFG")).unwrap(), b"bootstate=0");
        assert_eq!(fs::read(dst.join("EFI/BOOT/BOOTX64.EFI")).unwrap(), b"mz");
    }
}

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::utils::fs;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("ISO file does not exist: {0}")]
    MissingImage(PathBuf),

    #[error("failed to copy ISO contents: {0}")]
    Copy(String),

    #[error("no usable extraction tool succeeded: {0}")]
    Unpack(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Populates a directory with the file tree of an ISO image. Decoding the
/// image is delegated to the platform: a read-only loop mount where
/// available, otherwise `bsdtar`/`7z`, which both understand ISO 9660.
pub struct IsoExtractor {
    temp_dir: PathBuf,
}

impl IsoExtractor {
    pub fn new() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("pxeserve-extract"),
        }
    }

    /// Extract `iso_path` into `extract_path`, preserving the image's
    /// internal names and hierarchy. A failed extraction may leave the
    /// destination partially populated.
    pub fn extract(&self, iso_path: &Path, extract_path: &Path) -> Result<(), ExtractError> {
        info!(
            "Extracting ISO: {} to {}",
            iso_path.display(),
            extract_path.display()
        );

        if !iso_path.exists() {
            return Err(ExtractError::MissingImage(iso_path.to_path_buf()));
        }

        std::fs::create_dir_all(extract_path)?;

        #[cfg(unix)]
        {
            self.extract_unix(iso_path, extract_path)
        }

        #[cfg(windows)]
        {
            self.extract_windows(iso_path, extract_path)
        }
    }

    #[cfg(unix)]
    fn extract_unix(&self, iso_path: &Path, extract_path: &Path) -> Result<(), ExtractError> {
        let mount_point = self.temp_dir.join("iso_mount");
        std::fs::create_dir_all(&mount_point)?;

        let mount_output = Command::new("mount")
            .args(["-o", "loop,ro"])
            .arg(iso_path)
            .arg(&mount_point)
            .output();

        match mount_output {
            Ok(output) if output.status.success() => {
                let copied = fs::copy_tree(&mount_point, extract_path);

                // Always unmount, even when the copy failed.
                if let Err(e) = Command::new("umount").arg(&mount_point).output() {
                    debug!("Failed to unmount ISO: {}", e);
                }

                copied.map_err(|e| ExtractError::Copy(e.to_string()))?;
                info!("Extracted ISO via loop mount");
                Ok(())
            }
            _ => {
                debug!("Loop mount unavailable, falling back to archive tools");
                self.extract_with_tools(iso_path, extract_path)
            }
        }
    }

    #[cfg(windows)]
    fn extract_windows(&self, iso_path: &Path, extract_path: &Path) -> Result<(), ExtractError> {
        if let Ok(output) = Command::new("7z")
            .arg("x")
            .arg(iso_path)
            .arg(format!("-o{}", extract_path.display()))
            .arg("-y")
            .output()
        {
            if output.status.success() {
                info!("Extracted ISO using 7zip");
                return Ok(());
            }
        }

        let ps_script = format!(
            r#"
            $iso = Mount-DiskImage -ImagePath '{}' -PassThru
            $drive = ($iso | Get-Volume).DriveLetter
            Copy-Item -Path "${{drive}}:\*" -Destination '{}' -Recurse -Force
            Dismount-DiskImage -ImagePath '{}'
            "#,
            iso_path.display(),
            extract_path.display(),
            iso_path.display()
        );

        let ps_output = Command::new("powershell")
            .args(["-Command", &ps_script])
            .output()?;

        if ps_output.status.success() {
            info!("Extracted ISO using PowerShell");
            return Ok(());
        }

        Err(ExtractError::Unpack(
            String::from_utf8_lossy(&ps_output.stderr).into_owned(),
        ))
    }

    #[cfg(unix)]
    fn extract_with_tools(&self, iso_path: &Path, extract_path: &Path) -> Result<(), ExtractError> {
        if let Ok(output) = Command::new("bsdtar")
            .arg("-xf")
            .arg(iso_path)
            .arg("-C")
            .arg(extract_path)
            .output()
        {
            if output.status.success() {
                info!("Extracted ISO using bsdtar");
                return Ok(());
            }
        }

        match Command::new("7z")
            .arg("x")
            .arg(iso_path)
            .arg(format!("-o{}", extract_path.display()))
            .arg("-y")
            .output()
        {
            Ok(output) if output.status.success() => {
                info!("Extracted ISO using 7zip");
                Ok(())
            }
            Ok(output) => Err(ExtractError::Unpack(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )),
            Err(e) => Err(ExtractError::Unpack(e.to_string())),
        }
    }

    /// Check the extracted tree for the files the netboot flow relies on.
    /// Missing files are worth a warning but never fail the run; the media
    /// layout varies across installer builds.
    pub fn verify_installer_tree(&self, extract_path: &Path) {
        let expected = [
            extract_path.join(super::BOOT_CFG_NAME),
            extract_path.join("EFI").join("BOOT").join("BOOTX64.EFI"),
        ];

        for path in &expected {
            if !path.exists() {
                warn!("Expected installer file not found: {}", path.display());
            }
        }
    }
}

impl Default for IsoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_is_reported_as_such() {
        let tmp = tempfile::tempdir().unwrap();
        let err = IsoExtractor::new()
            .extract(&tmp.path().join("absent.iso"), &tmp.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingImage(_)));
    }
}

use anyhow::Result;
use std::path::Path;

use crate::utils::fs;

pub mod extractor;

pub use extractor::{ExtractError, IsoExtractor};

/// Name of the boot config at the root of ESXi installer media. The ISO
/// spells it in upper case.
pub const BOOT_CFG_NAME: &str = "BOOT.CFG";

/// Copy the EFI bootstrap binary out of the extracted tree into the server
/// root as `mboot.efi`, the name PXE firmware is pointed at.
pub fn copy_efi_boot_file(source_dir: &Path, dest_dir: &Path) -> Result<()> {
    let source = source_dir.join("EFI").join("BOOT").join("BOOTX64.EFI");
    fs::copy_file(&source, &dest_dir.join("mboot.efi"))?;
    Ok(())
}

/// Copy the media's boot config into the server root as `boot.cfg`, where
/// the rewrite pass then edits it.
pub fn copy_boot_cfg(source_dir: &Path, dest_dir: &Path) -> Result<()> {
    fs::copy_file(&source_dir.join(BOOT_CFG_NAME), &dest_dir.join("boot.cfg"))?;
    Ok(())
}

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Minimal unattended-install template. The root password is a placeholder
/// to be replaced before a real deployment.
pub const KS_SAMPLE: [&str; 4] = [
    "vmaccepteula",
    "rootpw !PassW0rd",
    "install --firstdisk --overwritevmfs",
    "network --bootproto=dhcp --device=vmnic0",
];

/// Write the sample kickstart file unless one already exists. An existing
/// file is left untouched, whatever its content. Returns whether a file was
/// written.
pub fn write_sample_if_absent(lines: &[&str], output_path: &Path) -> Result<bool> {
    if output_path.exists() {
        warn!(
            "Kickstart file already exists, leaving it alone: {}",
            output_path.display()
        );
        return Ok(false);
    }

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create kickstart file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line)
            .with_context(|| format!("Failed to write kickstart file: {}", output_path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush kickstart file: {}", output_path.display()))?;

    info!("Wrote sample kickstart file: {}", output_path.display());
    Ok(true)
}

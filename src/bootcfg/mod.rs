use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Substitutions applied to an ESXi `boot.cfg` so the installer loads its
/// modules over HTTP instead of from the mounted media.
pub struct BootConfigRewrite<'a> {
    /// `host:port/<dir>/<name>` without a scheme; `http://` is prepended
    /// when the prefix line is rewritten.
    pub http_prefix: &'a str,
    pub kernel_option: &'a str,
    pub title: &'a str,
    /// Full URL of the served kickstart file; `Some` switches the kernel
    /// options to an unattended install.
    pub kickstart_url: Option<&'a str>,
}

impl BootConfigRewrite<'_> {
    /// Rewrite one line of boot.cfg.
    ///
    /// Every `/` is removed from the line first, wherever it appears — the
    /// stock file spells module paths with slashes that mboot must not see
    /// once a prefix is in play, and the key matching below depends on the
    /// stripped form. Keep this transform as-is; it is deliberately not
    /// path-aware.
    pub fn rewrite_line(&self, line: &str) -> String {
        let line: String = line.chars().filter(|&c| c != '/').collect();

        if line.starts_with("prefix=") {
            // Appended after whatever survived slash removal, matching the
            // stock file's empty prefix line.
            debug!("Setting prefix to: http://{}", self.http_prefix);
            format!("{}http://{}", line, self.http_prefix)
        } else if line.starts_with("kernelopt=") {
            match line.split_once('=') {
                Some((key, _)) => match self.kickstart_url {
                    Some(url) => {
                        debug!("Setting kernelopt to: ks={}", url);
                        format!("{}=ks={}", key, url)
                    }
                    None => {
                        debug!("Setting kernelopt to: {}", self.kernel_option);
                        format!("{}={}", key, self.kernel_option)
                    }
                },
                None => line,
            }
        } else if line.starts_with("title=") {
            match line.split_once('=') {
                Some((key, _)) => {
                    debug!("Setting title to: {}", self.title);
                    format!("{}={}", key, self.title)
                }
                None => line,
            }
        } else {
            line
        }
    }

    /// Rewrite the file at `path` in place: the whole file is read,
    /// transformed line by line, then truncated and written back.
    pub fn apply(&self, path: &Path) -> Result<()> {
        info!("Rewriting boot config: {}", path.display());

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read boot config: {}", path.display()))?;

        let lines: Vec<String> = contents.lines().map(|l| self.rewrite_line(l)).collect();

        let file = File::create(path)
            .with_context(|| format!("Failed to open boot config for writing: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for line in &lines {
            writeln!(writer, "{}", line)
                .with_context(|| format!("Failed to write boot config: {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush boot config: {}", path.display()))?;

        Ok(())
    }
}

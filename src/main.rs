use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing::{error, info, warn};

use pxeserve::bootcfg::BootConfigRewrite;
use pxeserve::cli::Args;
use pxeserve::config::StageConfig;
use pxeserve::iso::{copy_boot_cfg, copy_efi_boot_file, IsoExtractor};
use pxeserve::kickstart;
use pxeserve::server;
use pxeserve::utils::fs;

/// Kernel options handed to mboot when no kickstart file is injected.
const KERNEL_OPTION: &str = "runweasel";
const BOOT_TITLE: &str = "Loading ESXi installer from HTTP Server";

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("pxeserve={},warn", log_level))
        .init();

    info!("pxeserve v{} starting", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(()) => info!("✓ Shut down cleanly"),
        Err(e) => {
            error!("✗ {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = StageConfig::from_args(&args)?;

    println!(
        "{} {}",
        style("Staging installer media:").green(),
        config.image.iso_path.display()
    );

    stage(&config)?;

    println!(
        "{} http://{}",
        style("Running webserver on:").green(),
        config.endpoint.authority()
    );

    server::serve(&config.image.root_path, config.endpoint, config.expose_health).await
}

/// The sequential setup pass: directories, kickstart sample, extraction,
/// well-known copies, boot config rewrite. Everything here is fatal except
/// the rewrite, which leaves a stale-but-servable boot.cfg behind on
/// failure.
fn stage(config: &StageConfig) -> Result<()> {
    let image = &config.image;

    fs::ensure_directory(&image.root_path.join(&image.extract_dir))?;
    fs::ensure_directory(&image.ks_dir())?;

    kickstart::write_sample_if_absent(&kickstart::KS_SAMPLE, &image.ks_cfg())?;

    let media_dir = image.media_dir();
    let extractor = IsoExtractor::new();
    extractor
        .extract(&image.iso_path, &media_dir)
        .with_context(|| format!("Failed to extract {}", image.iso_path.display()))?;
    extractor.verify_installer_tree(&media_dir);

    copy_boot_cfg(&media_dir, &image.root_path)
        .context("Failed to copy BOOT.CFG into the server root")?;

    let http_prefix = config.http_prefix();
    let kickstart_url = config.kickstart.then(|| config.endpoint.kickstart_url());
    let rewrite = BootConfigRewrite {
        http_prefix: &http_prefix,
        kernel_option: KERNEL_OPTION,
        title: BOOT_TITLE,
        kickstart_url: kickstart_url.as_deref(),
    };
    if let Err(e) = rewrite.apply(&image.boot_cfg()) {
        warn!("Boot config rewrite failed, serving the copied file as-is: {:#}", e);
    }

    copy_efi_boot_file(&media_dir, &image.root_path)
        .context("Failed to copy the EFI boot binary into the server root")?;

    Ok(())
}

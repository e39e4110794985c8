use clap::Parser;
use std::path::PathBuf;

/// Stage ESXi installer media for network boot and serve it over HTTP.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "pxeserve")]
pub struct Args {
    /// Port the HTTP server listens on
    #[arg(long, default_value_t = 8081)]
    pub port: u16,

    /// Full path to the hypervisor installer media (ISO)
    #[arg(long)]
    pub iso: PathBuf,

    /// Subfolder name the ISO contents are extracted into
    #[arg(long, default_value = "")]
    pub name: String,

    /// Point kernelopt at the served kickstart file
    #[arg(long)]
    pub ks: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

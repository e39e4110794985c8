use anyhow::{Context, Result};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::cli::Args;
use crate::utils::net;

/// Directory the HTTP server is rooted at.
pub const DEFAULT_ROOT: &str = "http";
/// Subdirectory of the server root that holds extracted installer trees.
pub const DEFAULT_EXTRACT_DIR: &str = "default_media";

/// Where the installer media lives and where its extracted tree goes,
/// relative to the server root. Built once from CLI input, immutable after.
#[derive(Debug, Clone)]
pub struct Image {
    pub root_path: PathBuf,
    pub iso_path: PathBuf,
    pub extract_dir: String,
    pub extract_name: String,
}

impl Image {
    /// `<root>/<extract dir>/<name>` — the extracted installer tree.
    pub fn media_dir(&self) -> PathBuf {
        self.root_path.join(&self.extract_dir).join(&self.extract_name)
    }

    pub fn ks_dir(&self) -> PathBuf {
        self.root_path.join("ks")
    }

    pub fn ks_cfg(&self) -> PathBuf {
        self.ks_dir().join("ks.cfg")
    }

    pub fn boot_cfg(&self) -> PathBuf {
        self.root_path.join("boot.cfg")
    }
}

/// Listen port plus the address booting hosts can reach this machine on.
#[derive(Debug, Clone, Copy)]
pub struct ServerEndpoint {
    pub address: IpAddr,
    pub port: u16,
}

impl ServerEndpoint {
    /// The address is discovered from the host routing table, not configured.
    pub fn discover(port: u16) -> Result<Self> {
        let address = net::outbound_address()
            .context("failed to discover the outbound network address")?;
        Ok(Self { address, port })
    }

    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// URL the installer fetches the kickstart file from.
    pub fn kickstart_url(&self) -> String {
        format!("http://{}/ks/ks.cfg", self.authority())
    }
}

/// Everything the staging pass and the server need, assembled once at
/// startup. Toggles live here instead of in process-wide globals.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub image: Image,
    pub endpoint: ServerEndpoint,
    pub kickstart: bool,
    /// Whether the readiness probe route is registered on the router.
    pub expose_health: bool,
}

impl StageConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            image: Image {
                root_path: PathBuf::from(DEFAULT_ROOT),
                iso_path: args.iso.clone(),
                extract_dir: DEFAULT_EXTRACT_DIR.to_string(),
                extract_name: args.name.clone(),
            },
            endpoint: ServerEndpoint::discover(args.port)?,
            kickstart: args.ks,
            expose_health: true,
        })
    }

    /// `host:port/<extract dir>/<name>` — the scheme is prepended by the
    /// boot.cfg rewrite.
    pub fn http_prefix(&self) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.authority(),
            self.image.extract_dir,
            self.image.extract_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn endpoint() -> ServerEndpoint {
        ServerEndpoint {
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            port: 8081,
        }
    }

    #[test]
    fn kickstart_url_includes_authority() {
        assert_eq!(endpoint().kickstart_url(), "http://10.0.0.5:8081/ks/ks.cfg");
    }

    #[test]
    fn http_prefix_spans_root_relative_media_path() {
        let config = StageConfig {
            image: Image {
                root_path: PathBuf::from("http"),
                iso_path: PathBuf::from("/tmp/esxi.iso"),
                extract_dir: "default_media".to_string(),
                extract_name: "esxi8".to_string(),
            },
            endpoint: endpoint(),
            kickstart: false,
            expose_health: true,
        };
        assert_eq!(config.http_prefix(), "10.0.0.5:8081/default_media/esxi8");
    }

    #[test]
    fn image_paths_stay_inside_the_root() {
        let image = Image {
            root_path: PathBuf::from("http"),
            iso_path: PathBuf::from("/tmp/esxi.iso"),
            extract_dir: "default_media".to_string(),
            extract_name: "esxi8".to_string(),
        };
        assert_eq!(image.media_dir(), PathBuf::from("http/default_media/esxi8"));
        assert_eq!(image.ks_cfg(), PathBuf::from("http/ks/ks.cfg"));
        assert_eq!(image.boot_cfg(), PathBuf::from("http/boot.cfg"));
    }
}

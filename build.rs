use std::env;
use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_else(|_| "unknown".to_string());

    if target_os == "windows" {
        check_windows_tools();
    } else {
        check_unix_tools();
    }
}

fn check_windows_tools() {
    let seven_zip_paths = [
        "C:\\Program Files\\7-Zip\\7z.exe",
        "C:\\Program Files (x86)\\7-Zip\\7z.exe",
    ];

    let has_7zip = seven_zip_paths.iter().any(|path| Path::new(path).exists());
    if !has_7zip {
        println!("cargo:warning=7-Zip not found. ISO extraction will use PowerShell mount/dismount instead.");
    }
}

fn check_unix_tools() {
    let has_tool = |tool: &str| {
        Command::new("which")
            .arg(tool)
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    };

    if !has_tool("bsdtar") && !has_tool("7z") {
        println!("cargo:warning=Neither bsdtar nor 7z found. ISO extraction will require loop-mount privileges.");
    }
}

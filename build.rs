//! Puts `memory.x` on the linker search path, adds the cortex-m-rt and
//! defmt linker scripts, and checks that the CYW43439 blobs are in place.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Blobs embedded by `task::wifi`
const CYW43_BLOBS: [&str; 2] = ["cyw43-firmware/43439A0.bin", "cyw43-firmware/43439A0_clm.bin"];

fn main() {
    check_cyw43_blobs();

    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");

    // network settings are baked in with env!()
    for var in ["WIFI_SSID", "WIFI_PASSWORD", "AGENT_IP", "AGENT_PORT", "MQTT_USERNAME", "MQTT_PASSWORD"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

fn check_cyw43_blobs() {
    let missing: Vec<&str> = CYW43_BLOBS.into_iter().filter(|blob| !Path::new(blob).is_file()).collect();
    for blob in CYW43_BLOBS {
        println!("cargo:rerun-if-changed={blob}");
    }
    if !missing.is_empty() {
        panic!(
            "missing Wi-Fi firmware: {}. Copy them from the cyw43-firmware/ directory of \
             https://github.com/embassy-rs/embassy (see cyw43-firmware/README.md).",
            missing.join(", ")
        );
    }
}

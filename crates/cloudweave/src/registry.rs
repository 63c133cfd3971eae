//! Drivers compiled into the CLI

use cloudweave_cloud::CloudDriver;
use cloudweave_cloud_cloudit::{ClouditDriver, DRIVER_NAME as CLOUDIT};

pub const DRIVERS: &[&str] = &[CLOUDIT];

/// Look up a driver by name, case-insensitively
pub fn driver(name: &str) -> anyhow::Result<Box<dyn CloudDriver>> {
    if name.eq_ignore_ascii_case(CLOUDIT) {
        return Ok(Box::new(ClouditDriver::new()));
    }
    anyhow::bail!(
        "unknown driver '{}' (available: {})",
        name,
        DRIVERS.join(", ")
    )
}

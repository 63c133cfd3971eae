use super::print_json;
use crate::registry;
use colored::Colorize;

pub fn handle(driver_name: &str) -> anyhow::Result<()> {
    let driver = registry::driver(driver_name)?;
    let capability = driver.capability();

    let kinds: Vec<String> = capability
        .supported_kinds()
        .iter()
        .map(|k| k.to_string())
        .collect();
    eprintln!("{} {}", driver.name().green().bold(), kinds.join(" ").dimmed());

    print_json(&capability)
}

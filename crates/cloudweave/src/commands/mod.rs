pub mod capability;
pub mod compute;
pub mod keypair;
pub mod network;
pub mod store;

use serde::Serialize;

/// Pretty JSON on stdout; status lines go to stderr
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

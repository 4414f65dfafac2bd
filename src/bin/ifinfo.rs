//! Interface Info
//!
//! Prints the local IPv4 interfaces and the hardware address of the
//! configured default interface, as the protocol engines see them at startup.

use anyhow::{Context, Result};
use std::path::PathBuf;

use tcn_sock::{
    byte_order::ip_dotted, config::StackConfig, list_interfaces, logging,
    platform::HW_ADDR_QUERY, SockContext,
};

fn main() -> Result<()> {
    // Optional config path as first argument
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            StackConfig::load(&path)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => StackConfig::load_or_default().context("loading default config")?,
    };

    logging::init(&config.log_filter);
    tracing::info!("Starting interface query");

    let ctx = SockContext::from_config(&config);
    ctx.init();

    println!("\n=== Local IPv4 Interfaces ===");
    let interfaces = list_interfaces(config.max_interfaces);
    if interfaces.is_empty() {
        println!("  (none)");
    }
    for record in &interfaces {
        println!("  {:<16} {}", record.name, ip_dotted(record.ip_addr));
    }

    println!("\n=== Hardware Address ===");
    if !HW_ADDR_QUERY {
        println!("  not supported on this platform");
        return Ok(());
    }
    match ctx.get_mac() {
        Ok(mac) => println!("  {}: {}", ctx.default_iface(), mac),
        Err(e) => {
            tracing::warn!("MAC lookup on {} failed: {}", ctx.default_iface(), e);
            println!("  {}: unavailable ({})", ctx.default_iface(), e);
        }
    }
    println!();

    Ok(())
}

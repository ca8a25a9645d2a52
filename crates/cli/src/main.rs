//! zspace-hid CLI: inspect ZSP UPS devices and the subdriver tables.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use zspace_hid_core::config::DriverOptions;
use zspace_hid_core::device::{DeviceIdentity, DeviceInfo, SupportVerdict};
use zspace_hid_core::subdriver::Subdriver;
use zspace_hid_core::zspace::ZspaceSubdriver;

#[derive(Parser)]
#[command(
    name = "zspace-hid",
    version,
    about = "HID subdriver tools for ZSP uninterruptible power supplies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected HID devices the ZSP subdriver recognizes.
    ListDevices {
        /// Show every HID device, not only ZSP ones.
        #[arg(long)]
        all: bool,
        /// Accept possibly supported devices (same as the `productid` option).
        #[arg(long)]
        productid: Option<String>,
    },
    /// Classify a vendor/product pair, e.g. `classify 36AA 0101`.
    Classify {
        /// Vendor ID in hex.
        vid: String,
        /// Product ID in hex.
        pid: String,
        /// Accept possibly supported devices.
        #[arg(long)]
        productid: Option<String>,
    },
    /// Resolve a usage code to its name, or a name to its code.
    Usage {
        /// Hex code (0x00840030) or usage name (Voltage), or a dotted path.
        query: String,
    },
    /// Print the HID-to-variable mapping table.
    Table {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn parse_hex_u16(s: &str) -> Result<u16> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).with_context(|| format!("invalid hex ID: {s}"))
}

fn verdict_label(verdict: SupportVerdict) -> &'static str {
    match verdict {
        SupportVerdict::Supported => "supported",
        SupportVerdict::PossiblySupported => "possibly supported",
        SupportVerdict::NotSupported => "not supported",
    }
}

fn options_with(productid: Option<String>) -> DriverOptions {
    DriverOptions {
        productid,
        ..DriverOptions::default()
    }
}

fn list_devices(all: bool, options: &DriverOptions) -> Result<()> {
    let zsp = ZspaceSubdriver;
    let api = hidapi::HidApi::new().map_err(|e| anyhow::anyhow!("hidapi init: {e}"))?;

    let mut found = 0usize;
    for dev in api.device_list() {
        let mut info = DeviceInfo::new(dev.vendor_id(), dev.product_id());
        if let Some(s) = dev.manufacturer_string() {
            info = info.with_manufacturer(s);
        }
        if let Some(s) = dev.product_string() {
            info = info.with_product(s);
        }
        if let Some(s) = dev.serial_number() {
            info = info.with_serial(s);
        }

        let identity = info.identity();
        let verdict = zsp.classify(identity);
        if verdict == SupportVerdict::NotSupported && !all {
            continue;
        }
        found += 1;

        let claimed = verdict != SupportVerdict::NotSupported && zsp.claim(identity, options);
        println!(
            "{identity} {} / {} (serial: {}, path: {}) - {}{}",
            zsp.format_mfr(&info),
            zsp.format_model(&info).unwrap_or("unknown model"),
            zsp.format_serial(&info).unwrap_or("none"),
            dev.path().to_string_lossy(),
            verdict_label(verdict),
            if claimed { ", claimed" } else { "" },
        );
    }

    debug!(found, "HID enumeration finished");
    if found == 0 {
        println!("No ZSP devices found.");
        println!("Ensure the UPS is connected and udev permissions are set up.");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let zsp = ZspaceSubdriver;

    match cli.command {
        Commands::ListDevices { all, productid } => {
            list_devices(all, &options_with(productid))?;
        }
        Commands::Classify {
            vid,
            pid,
            productid,
        } => {
            let identity = DeviceIdentity::new(parse_hex_u16(&vid)?, parse_hex_u16(&pid)?);
            let verdict = zsp.classify(identity);
            let claimed = zsp.claim(identity, &options_with(productid));
            println!("{identity}: {}", verdict_label(verdict));
            println!("claimed: {}", if claimed { "yes" } else { "no" });
        }
        Commands::Usage { query } => {
            let chain = zsp.usage_chain();
            if let Some(hex) = query.strip_prefix("0x").or_else(|| query.strip_prefix("0X")) {
                let code = u32::from_str_radix(hex, 16)
                    .with_context(|| format!("invalid usage code: {query}"))?;
                match chain.resolve(code) {
                    Some(name) => println!("0x{code:08x} = {name}"),
                    None => bail!("unknown usage code 0x{code:08x}"),
                }
            } else if query.contains('.') {
                let codes = chain.resolve_path(&query)?;
                let hex: Vec<String> = codes.iter().map(|c| format!("0x{c:08x}")).collect();
                println!("{query} = {}", hex.join("."));
            } else {
                match chain.resolve_reverse(&query) {
                    Some(code) => println!("{query} = 0x{code:08x}"),
                    None => bail!("unknown usage name {query}"),
                }
            }
        }
        Commands::Table { json } => {
            let table = zsp.mapping_table();
            if json {
                println!("{}", serde_json::to_string_pretty(table.entries())?);
            } else {
                println!("{}", zsp.version());
                for entry in table.iter() {
                    let kind = if entry.is_command() {
                        "cmd"
                    } else if entry.is_writable() {
                        "rw"
                    } else {
                        "ro"
                    };
                    println!("{:<4} {:<28} {}", kind, entry.name, entry.path);
                }
            }
        }
    }

    Ok(())
}

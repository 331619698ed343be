//! Audio device listing command.

use clap::Args;
use tonegrid_io::list_devices;

#[derive(Args)]
pub struct DevicesArgs {
    /// Show only the default output device
    #[arg(long)]
    default: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    if args.default {
        match devices.iter().find(|d| d.is_default) {
            Some(device) => {
                println!("Default Output:");
                println!("  Name: {}", device.name);
                println!("  Channels: {}", device.channels);
                println!("  Sample Rate: {} Hz", device.default_sample_rate);
            }
            None => println!("Default Output: None"),
        }
        return Ok(());
    }

    println!("Output Devices");
    println!("==============\n");
    for device in &devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!(
            "  [{}] {} ({} ch, {} Hz){}",
            device.index, device.name, device.channels, device.default_sample_rate, marker
        );
    }
    println!();
    println!("Tip: select a device by index or partial name:");
    println!("  tonegrid play --output 0");
    println!("  tonegrid play --output \"USB\"");

    Ok(())
}

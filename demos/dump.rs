use std::{env, fs, process::ExitCode};

use uac_topology::{Configuration, Parser};

fn main() -> ExitCode {
    env_logger::init();
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: dump <config-descriptor.bin> [control interface]");
        return ExitCode::FAILURE;
    };
    let control_interface = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    match Parser::new(control_interface)
        .dump_descriptors(true)
        .parse(&bytes)
    {
        Ok(config) => {
            print_config(&config);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to parse {path}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_config(config: &Configuration) {
    println!("Configuration {}", config.configuration_value());
    for control in config.control_interfaces() {
        println!(
            "  Control interface {} ({:?}, bcdADC {:04x})",
            control.interface_number(),
            control.version(),
            control.adc_version()
        );
        for unit in control.units() {
            println!("    {} {:02x}", unit.kind_name(), unit.id());
        }
    }

    for stream in config.stream_interfaces() {
        println!(
            "  Interface {}, alt setting {}: format {:04x}, {} channels, {} bits, rates {:?}",
            stream.interface_number(),
            stream.alternate_setting(),
            stream.format_tag(),
            stream.num_channels(),
            stream.bit_resolution(),
            stream.sample_rates().to_vec()
        );
        for ep in stream.endpoints() {
            println!(
                "    Endpoint {:02x} {:?} {:?} max packet {}",
                ep.address(),
                ep.direction(),
                ep.sync_type(),
                ep.max_packet_size()
            );
        }
    }

    if !config.midi_interfaces().is_empty() {
        println!("  MIDI interfaces skipped: {:?}", config.midi_interfaces());
    }
    for d in config.diagnostics() {
        println!("  warning: {d}");
    }
}

//! Temperature readout simulation binary.
//!
//! Runs the board headless at the configured rates and prints each
//! completed reading, or serves the simulation over MCP.

use std::process;

use sense_core::{MasterClock, Tickable};
use tempsense::mcp::McpServer;
use tempsense::{TempSense, TempSenseConfig, decode};

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    mcp: bool,
    readings: u64,
    temperature: f64,
    clock_hz: u64,
    bus_hz: u64,
    trigger_hz: u64,
    no_sensor: bool,
    stretch: u32,
}

fn usage() -> ! {
    eprintln!("Usage: tempsense [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --mcp               Serve the simulation over MCP (JSON-RPC on stdio)");
    eprintln!("  --readings <n>      Number of readings to collect (default 3)");
    eprintln!("  --temp <celsius>    Sensor temperature (default 25.0)");
    eprintln!("  --clock-hz <hz>     System clock frequency (default 50000000)");
    eprintln!("  --bus-hz <hz>       Two-wire bus bit rate (default 100000)");
    eprintln!("  --trigger-hz <hz>   Readout trigger rate (default 4)");
    eprintln!("  --no-sensor         Leave the bus empty (ack-failure path)");
    eprintln!("  --stretch <ticks>   Sensor clock stretching per frame (default 0)");
    process::exit(1);
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        mcp: false,
        readings: 3,
        temperature: 25.0,
        clock_hz: 50_000_000,
        bus_hz: 100_000,
        trigger_hz: 4,
        no_sensor: false,
        stretch: 0,
    };

    fn value<T: std::str::FromStr>(args: &[String], i: usize) -> T {
        args.get(i)
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| usage())
    }

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mcp" => cli.mcp = true,
            "--readings" => {
                cli.readings = value(&args, i + 1);
                i += 1;
            }
            "--temp" => {
                cli.temperature = value(&args, i + 1);
                i += 1;
            }
            "--clock-hz" => {
                cli.clock_hz = value(&args, i + 1);
                i += 1;
            }
            "--bus-hz" => {
                cli.bus_hz = value(&args, i + 1);
                i += 1;
            }
            "--trigger-hz" => {
                cli.trigger_hz = value(&args, i + 1);
                i += 1;
            }
            "--no-sensor" => cli.no_sensor = true,
            "--stretch" => {
                cli.stretch = value(&args, i + 1);
                i += 1;
            }
            _ => usage(),
        }
        i += 1;
    }
    cli
}

fn main() {
    env_logger::init();
    let args = parse_args();

    if args.mcp {
        McpServer::new().run();
        return;
    }

    let config = TempSenseConfig {
        clock: MasterClock::new(args.clock_hz),
        bus_hz: args.bus_hz,
        trigger_hz: args.trigger_hz,
        sensor_present: !args.no_sensor,
        sensor_stretch: args.stretch,
        ..TempSenseConfig::default()
    };

    let mut board = match TempSense::new(&config) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("tempsense: {e}");
            process::exit(1);
        }
    };
    if let Some(sensor) = board.sensor_mut() {
        sensor.set_temperature(args.temperature);
    }

    println!(
        "clock {} Hz, bus {} Hz, trigger {} Hz, sensor {}",
        args.clock_hz,
        args.bus_hz,
        args.trigger_hz,
        if args.no_sensor { "absent" } else { "present" },
    );

    while board.cycle_count() < args.readings {
        board.tick();
        if board.cycle_done() {
            let raw = board.reading();
            let flag = if board.ack_failed() { "  [ack failure]" } else { "" };
            println!(
                "t={:>12}  raw {:#06X}  {}{}",
                board.master_clock(),
                raw,
                decode::format(raw),
                flag,
            );
        }
    }
}

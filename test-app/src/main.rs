// lobot test application -- CLI tool for exercising Lobot bus servos
// against real hardware or a mock transport.
//
// Usage:
//   lobot-test-app --port /dev/ttyUSB0 move 1 500 --time 1000
//   lobot-test-app --port /dev/ttyUSB0 position 1
//   lobot-test-app --port /dev/ttyUSB0 mode 3 motor --speed 400
//   lobot-test-app --port /dev/ttyUSB0 teach
//   lobot-test-app --mock vin 1
//
// Set RUST_LOG=lobot_bus=debug to see protocol decisions, or =trace for
// raw bytes.

mod teach;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lobot::transport::DEFAULT_BAUD_RATE;
use lobot::{MAX_SERVO_ID, POSITION_READ_FAILED, ServoBus, ServoBusBuilder, ServoMode, VIN_READ_FAILED};
use lobot_test_harness::MockTransport;

use crate::teach::{Input, Mode, TeachPlayback};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// lobot test application -- drives Lobot bus servos from the command line.
#[derive(Parser)]
#[command(name = "lobot-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Baud rate of the servo bus.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// How long a read waits for the first reply byte, in milliseconds.
    #[arg(long, default_value_t = 20)]
    timeout_ms: u64,

    /// Use a mock transport instead of a real serial port.
    /// Writes are accepted and reads report a timeout.
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Move a servo to a position (0-1000).
    Move {
        id: u8,
        position: i16,
        /// Travel time in milliseconds.
        #[arg(long, default_value_t = 1000)]
        time: u16,
    },

    /// Stop a servo where it is.
    Stop { id: u8 },

    /// Change a servo's address.
    SetId { old_id: u8, new_id: u8 },

    /// Switch between position and motor mode.
    Mode {
        id: u8,
        /// position (servo) or motor.
        mode: ServoMode,
        /// Motor speed, -1000 to 1000. Ignored in position mode.
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        speed: i16,
    },

    /// Spin a servo continuously (motor mode).
    Run {
        id: u8,
        #[arg(allow_hyphen_values = true)]
        speed: i16,
    },

    /// Energize the motor so the servo holds position.
    Load { id: u8 },

    /// Release the motor so the servo can be turned by hand.
    Unload { id: u8 },

    /// Read the current position.
    Position { id: u8 },

    /// Read the supply voltage.
    Vin { id: u8 },

    /// Interactive teach/playback demo on servos 1 and 2.
    ///
    /// Type `t` + Enter to toggle teach mode, `r` + Enter to record a pose
    /// (teach) or start playback, `q` + Enter to quit.
    Teach {
        /// Interval between replayed poses, in milliseconds.
        #[arg(long, default_value_t = 1000)]
        tick_ms: u64,
    },
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn validate_command(command: &Command) -> Result<()> {
    match command {
        Command::Move { position, .. } if !(0..=1000).contains(position) => {
            eprintln!("note: position {position} will be clamped to 0..=1000");
        }
        Command::SetId { new_id, .. } if *new_id > MAX_SERVO_ID => {
            bail!("new id must be 0..={MAX_SERVO_ID}, got {new_id}");
        }
        Command::Mode { speed, .. } | Command::Run { speed, .. } if !(-1000..=1000).contains(speed) => {
            bail!("speed must be -1000..=1000, got {speed}");
        }
        _ => {}
    }
    Ok(())
}

async fn create_bus(cli: &Cli) -> Result<ServoBus> {
    let builder = ServoBusBuilder::new()
        .baud_rate(cli.baud)
        .response_timeout(Duration::from_millis(cli.timeout_ms));

    if cli.mock {
        let bus = builder
            .build_with_transport(Box::new(MockTransport::lenient()))
            .context("failed to build ServoBus with mock transport")?;
        println!("Connected (mock transport)");
        return Ok(bus);
    }

    let port = cli
        .port
        .as_deref()
        .context("--port is required when not using --mock")?;
    let bus = builder
        .serial_port(port)
        .build()
        .await
        .with_context(|| format!("failed to open servo bus on {port}"))?;
    info!(port, baud = cli.baud, "servo bus open");
    Ok(bus)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_position(bus: &mut ServoBus, id: u8) -> Result<()> {
    let position = bus.read_position(id).await;
    if position == POSITION_READ_FAILED {
        bail!("servo {id} did not report its position");
    }
    println!("servo {id}: position {position}");
    Ok(())
}

async fn cmd_vin(bus: &mut ServoBus, id: u8) -> Result<()> {
    let vin = bus.read_vin(id).await;
    if vin == VIN_READ_FAILED {
        bail!("servo {id} did not report its voltage");
    }
    println!("servo {id}: {:.2} V ({vin} mV)", f64::from(vin) / 1000.0);
    Ok(())
}

enum Key {
    Input(Input),
    Quit,
    Unknown,
}

fn parse_key(line: &str) -> Key {
    match line.trim() {
        "r" | "record" => Key::Input(Input::Record),
        "t" | "toggle" => Key::Input(Input::Toggle),
        "q" | "quit" => Key::Quit,
        _ => Key::Unknown,
    }
}

async fn cmd_teach(bus: &mut ServoBus, tick_ms: u64) -> Result<()> {
    println!("Teach/playback on servos 1 and 2");
    println!("  t = toggle teach mode, r = record / play, q = quit");

    let mut state = TeachPlayback::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        let input = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_key(&line) {
                    Key::Input(input) => input,
                    Key::Quit => break,
                    Key::Unknown => {
                        println!("unknown key {:?}", line.trim());
                        continue;
                    }
                }
            }
            _ = tick.tick() => Input::Tick,
        };

        let before = state.mode;
        state = teach::drive(bus, state, input).await?;
        if state.mode != before {
            match state.mode {
                Mode::Teach => println!("teach mode: pose the servos by hand, r to record"),
                Mode::Playback => println!("playback mode: r to replay"),
            }
        }
        if input == Input::Record && state.mode == Mode::Teach {
            let slot = (state.step + teach::SLOTS - 1) % teach::SLOTS;
            println!("slot {slot}: {:?}", state.poses[slot]);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    validate_command(&cli.command)?;
    let mut bus = create_bus(&cli).await?;

    let result: Result<()> = match &cli.command {
        Command::Move { id, position, time } => bus.move_to(*id, *position, *time).await.map_err(Into::into),
        Command::Stop { id } => bus.stop_move(*id).await.map_err(Into::into),
        Command::SetId { old_id, new_id } => bus.set_id(*old_id, *new_id).await.map_err(Into::into),
        Command::Mode { id, mode, speed } => bus.set_mode(*id, mode.as_byte(), *speed).await.map_err(Into::into),
        Command::Run { id, speed } => bus.run(*id, *speed).await.map_err(Into::into),
        Command::Load { id } => bus.load(*id).await.map_err(Into::into),
        Command::Unload { id } => bus.unload(*id).await.map_err(Into::into),
        Command::Position { id } => cmd_position(&mut bus, *id).await,
        Command::Vin { id } => cmd_vin(&mut bus, *id).await,
        Command::Teach { tick_ms } => cmd_teach(&mut bus, *tick_ms).await,
    };

    bus.close().await.ok();
    result
}

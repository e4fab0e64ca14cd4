use std::{error::Error, path::PathBuf};

use clap::Parser;
use env_logger::Env;
use log::{info, LevelFilter};
use oscope_scpi::{
    load_settings_or_default, AnnotationColor, Background, Channel, Oscilloscope,
};

/// Measurements printed by the demo, a blank name prints an empty line.
const MEASUREMENTS: [&str; 26] = [
    "Bit Rate",
    "Burst Width",
    "Counter Freq",
    "Frequency",
    "Period",
    "Duty",
    "Neg Duty",
    "+ Width",
    "- Width",
    "Rise Time",
    "Num Rising",
    "Num Pos Pulses",
    "Fall Time",
    "Num Falling",
    "Num Neg Pulses",
    "Overshoot",
    "Preshoot",
    "",
    "Amplitude",
    "Pk-Pk",
    "Top",
    "Base",
    "Maximum",
    "Minimum",
    "Average - Full Screen",
    "RMS - Full Screen",
];

/// Access and control a MSO-X/DSO-X 3000, UXR or MXR oscilloscope
#[derive(Parser, Debug)]
#[command(name = "oscope-demo")]
struct Args {
    /// Channel to access/control (starts at 1)
    #[arg(default_value_t = 1)]
    chan: u8,

    /// Settings file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model name, detected with *IDN? when omitted
    #[arg(short, long)]
    model: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

fn initialize_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => {
            eprintln!("Warning: Invalid log level '{}', using 'info'", log_level);
            LevelFilter::Info
        }
    };
    env_logger::Builder::from_env(Env::default())
        .filter_level(level)
        .format_timestamp_millis()
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    let mut settings = load_settings_or_default(args.config.as_deref());
    if args.model.is_some() {
        settings.model = args.model;
    }

    let mut scope = Oscilloscope::open(&settings)?;
    info!("{}", scope.identify()?);

    // the channel set here is the default for every call below
    let channel = Channel::from(args.chan);
    scope.set_channel(channel)?;

    if !scope.is_output_on(None)? {
        scope.output_on(None)?;
    }

    // install into the statistics display and read back
    println!(
        "Ch. {} Settings: {:6.4e} V  PW {:6.4e} s\n",
        channel,
        scope.measure_volt_average(None, true)?,
        scope.measure_pos_pulse_width(None, true)?
    );

    scope.annotate(
        &format!("Example of Annotation\\nfor Channel {}", channel),
        AnnotationColor::of(channel),
        Background::Transparent,
    )?;
    scope.set_label(None, "MySig")?;
    scope.label_display(true)?;

    if scope.variant().statistics_menu {
        scope.write("SYSTem:MENU MEASure")?;
        scope.write("MEASure:STATistics:DISPlay ON")?;
    }

    scope.hardcopy("outfile.png")?;

    scope.set_label(None, &channel.to_string())?;
    scope.label_display(false)?;
    scope.annotate_off()?;

    println!("\nMeasurements for Ch. {}:", channel);
    for name in MEASUREMENTS {
        if name.is_empty() {
            println!();
            continue;
        }
        let value = scope.measure(name, None, false)?;
        println!("{: <24} {:>12.6}", name, scope.polish(value, Some(name)));
    }

    for error in scope.errors()? {
        eprintln!("{}", error);
    }

    scope.output_off(None)?;
    scope.set_local()?;
    scope.close()?;
    Ok(())
}

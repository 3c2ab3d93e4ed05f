#[macro_use]
extern crate rust_i18n;

mod device;

use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use mensacard::nfc::Platform;
use mensacard::{read_card_information, CardReading, Config};

i18n!("locales");

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Error occurred on communicating with PC/SC: {0}")]
    Pcsc(#[from] mensacard::pcsc::Error),

    #[error("Error occurred on prompting: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialise the reading: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    NoReader(String),

    #[error("{0}")]
    NoReading(String),
}

type Result<T> = std::result::Result<T, Error>;

/// Read the balance and the last transaction from your Mensa card.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Locale of the messages
    #[arg(long, global = true, default_value = "en")]
    locale: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Reads the balance and the last transaction (default)
    Read(ReadArgs),

    /// Lists the readers attached to PC/SC
    Readers,
}

#[derive(Args, Default)]
struct ReadArgs {
    /// Name of the reader; prompted for if several are attached
    #[arg(short, long)]
    reader: Option<String>,

    /// Platform whose technology and exchange mechanism are used
    #[arg(long, value_enum, default_value_t)]
    platform: PlatformArg,

    /// Gives up waiting for a card after the seconds
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Prints the reading as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum PlatformArg {
    #[default]
    Android,
    Ios,
}

impl std::fmt::Display for PlatformArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Android => Platform::Android,
            PlatformArg::Ios => Platform::Ios,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    rust_i18n::set_locale(&cli.locale);

    let result = match cli.command {
        Some(Command::Readers) => list_readers(),
        Some(Command::Read(args)) => read(args),
        None => read(ReadArgs::default()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn list_readers() -> Result<()> {
    let readers = device::readers()?;
    if readers.is_empty() {
        return Err(Error::NoReader(t!("reader.none")));
    }

    for reader in readers {
        println!("{}", reader);
    }

    Ok(())
}

fn read(args: ReadArgs) -> Result<()> {
    let device = device::open(
        args.reader.as_deref(),
        args.timeout.map(Duration::from_secs),
    )?;
    tracing::debug!(reader = ?device.name(), platform = %args.platform, "Opened the reader");

    let config =
        Config::new(args.platform.into()).with_alert_message(t!("cardInformation.iosPlaceCard"));

    let reading = read_card_information((), &device, &config)
        .ok_or_else(|| Error::NoReading(t!("reading.failed")))?;

    match args.json {
        true => println!("{}", serde_json::to_string_pretty(&reading)?),
        _ => print_reading(&reading),
    }

    Ok(())
}

fn print_reading(reading: &CardReading) {
    println!("{}", t!("reading.balance", balance = reading.current_balance));

    match reading.is_complete() {
        true => println!(
            "{}",
            t!("reading.lastTransaction", amount = reading.last_transaction)
        ),
        _ => eprintln!("{}", t!("reading.partial")),
    }
}

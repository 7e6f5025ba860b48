use std::io;
use std::process;

use clap::Parser;
use colored::Colorize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use symcalc::cli::{execute_command, Cli, CliResult};
use symcalc::config::Settings;
use symcalc::exitcode;

fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(e) if !e.use_stderr() => e.exit(),
    Err(e) => {
      let _ = e.print();
      process::exit(exitcode::USAGE);
    }
  };

  setup_logging(cli.debug);

  match run(&cli) {
    Ok(output) => println!("{output}"),
    Err(e) => {
      eprintln!("{}", format!("Error: {e}").red());
      process::exit(e.exit_code());
    }
  }
}

fn run(cli: &Cli) -> CliResult<String> {
  let settings = Settings::load(cli.config.as_deref())?;
  execute_command(cli, &settings, &mut io::stdin().lock())
}

fn setup_logging(verbosity: u8) {
  let level = match verbosity {
    0 => LevelFilter::WARN,
    1 => LevelFilter::INFO,
    2 => LevelFilter::DEBUG,
    _ => LevelFilter::TRACE,
  };

  // RUST_LOG narrows further, e.g. RUST_LOG=symcalc::functions=trace
  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let fmt_layer = fmt::layer()
    .with_writer(io::stderr)
    .with_target(true)
    .without_time();

  tracing_subscriber::registry()
    .with(fmt_layer.with_filter(level).with_filter(env_filter))
    .init();

  if level > LevelFilter::WARN {
    tracing::info!("debug level: {level}");
  }
}

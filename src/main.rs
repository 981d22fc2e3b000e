use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use streamdash::config::{self, AppConfig};
use streamdash::error::AppError;
use streamdash::state::{run_event_loop, Session};

#[derive(Parser, Debug)]
#[command(name = "streamdash", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SQLite database to read (overrides the configured path).
    #[arg(long, global = true)]
    db: Option<String>,

    /// Use the bundled demo data instead of a database file.
    #[arg(long, global = true)]
    demo: bool,

    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Configuration override, e.g. `--set timeFrame=quarter`.
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Print the page description: title, badges, panels and their controls.
    Layout,
    /// Print every figure of the initial page, one JSON line per slot.
    Render,
    /// Render the initial page, then answer control events read from stdin.
    Serve,
}

fn main() {
    let args = Args::parse();
    simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    })
    .unwrap();

    if let Err(e) = run(&args) {
        log::error!("Failed: {}", e);
        std::process::exit(1);
    }
}

fn build_config(args: &Args) -> Result<AppConfig, AppError> {
    let mut config = config::load_config(args.config.as_deref())?;
    for raw in &args.overrides {
        let (key, value) = config::parse_override(raw)?;
        config::apply_override(&mut config, &key, &value);
    }
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), AppError> {
    let config = build_config(args)?;
    let mut session = {
        let conn = streamdash::open_connection(&config, args.demo)?;
        streamdash::open_session(&conn, &config)?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.command.unwrap_or(Command::Serve) {
        Command::Layout => {
            serde_json::to_writer_pretty(&mut out, session.layout())?;
            writeln!(out)?;
        }
        Command::Render => write_initial(&mut session, &mut out)?,
        Command::Serve => {
            write_initial(&mut session, &mut out)?;
            log::info!("Waiting for control events on stdin");
            run_event_loop(&mut session, io::stdin().lock(), &mut out)?;
        }
    }
    Ok(())
}

fn write_initial<W: Write>(session: &mut Session, out: &mut W) -> Result<(), AppError> {
    for update in session.initial_figures()? {
        serde_json::to_writer(&mut *out, &update)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "streamdash", "render", "--demo", "--set", "timeFrame=quarter", "--set", "gauge.max=50", "-v",
        ])
        .unwrap();
        assert!(args.demo && args.verbose);
        assert!(matches!(args.command, Some(Command::Render)));
        assert_eq!(args.overrides, vec!["timeFrame=quarter", "gauge.max=50"]);

        let config = build_config(&args).unwrap();
        assert_eq!(config.gauge.max, 50.0);
    }
}

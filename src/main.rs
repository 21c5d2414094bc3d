//! printlog CLI entry point.

use clap::Parser;
use printlog::cli::commands;
use printlog::cli::{Cli, Commands, OutputFormat};
use printlog::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.silent {
        printlog::SILENT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.dry_run {
        printlog::DRY_RUN.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.format == OutputFormat::Csv {
        printlog::CSV_OUTPUT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR --format json OR non-TTY stdout.
    // An explicit CSV request wins over the non-TTY fallback.
    let json = cli.json
        || cli.format == OutputFormat::Json
        || (cli.format != OutputFormat::Csv
            && !std::io::IsTerminal::is_terminal(&std::io::stdout()));

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let data = cli.data.as_ref();

    match &cli.command {
        Commands::Init { force } => commands::init::execute(data, *force, json),
        Commands::Version => commands::version::execute(json),
        Commands::Status => commands::status::execute(data, json),

        // Jobs
        Commands::List => commands::job::list(data, json),
        Commands::Get { id } => commands::job::get(id, data, json),
        Commands::Create(args) => commands::job::create(args, data, json),
        Commands::Update { id, fields } => commands::job::update(id, fields, data, json),
        Commands::Delete { id } => commands::job::delete(id, data, json),
        Commands::Clear { yes } => commands::job::clear(*yes, data, json),

        // Backups
        Commands::Backup { command } => commands::backup::execute(command, data, json),

        // Shell completions
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::scanner::Scanner;
use rox::{Lox, LoxError};

#[derive(ClapParser, Debug)]
#[command(version, about = "rox scripting language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to rox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print one JSON object per token instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Runs a script file
    Run { filename: PathBuf },

    /// Starts an interactive prompt; each line runs in one persistent session
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let text = String::from_utf8(buf).map_err(LoxError::from)?;
    Ok(text)
}

/// Like [`read_file`], but reports failure and exits with the I/O status (74).
fn read_source(filename: PathBuf) -> String {
    match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            debug!("Failed to read input, exiting with code 74");
            std::process::exit(74);
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rox.log").context("Failed to create rox.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to rox.log");
    Ok(())
}

fn report(errors: &[LoxError]) {
    for e in errors {
        debug!("Reporting: {}", e);
        eprintln!("{}", e);
    }
}

/// Exit status for a failed run; all errors of one run share a kind.
fn exit_code(errors: &[LoxError]) -> i32 {
    errors.iter().map(LoxError::exit_code).max().unwrap_or(0)
}

fn run_prompt() -> Result<()> {
    info!("Starting interactive prompt");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        match lines.next() {
            Some(line) => {
                let line = line.context("Failed to read from stdin")?;
                if let Err(errors) = lox.run(&line) {
                    report(&errors);
                }
            }
            None => {
                println!();
                info!("End of input, leaving prompt");
                return Ok(());
            }
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");
                let source = read_source(filename);
                let mut tokenized = true;

                for token in Scanner::new(&source) {
                    match token {
                        Ok(token) => {
                            if json {
                                println!("{}", serde_json::to_string(&token)?);
                            } else {
                                println!("{}", token);
                            }
                        }

                        Err(e) => {
                            tokenized = false;
                            eprintln!("{}", e);
                        }
                    }
                }

                if !tokenized {
                    debug!("Tokenization failed, exiting with code 65");
                    std::process::exit(65);
                }

                info!("Tokenization completed successfully");
            }
            None => {
                info!("No filepath provided for Tokenize");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source = read_source(filename);
            let mut lox = Lox::new();

            if let Err(errors) = lox.run(&source) {
                report(&errors);
                let code = exit_code(&errors);
                debug!("Run failed, exiting with code {}", code);
                std::process::exit(code);
            }

            info!("Program executed successfully");
        }

        Commands::Repl => run_prompt()?,
    }

    Ok(())
}

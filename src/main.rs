//! extmark - command-line front end
//!
//! Usage:
//!   extmark tokens `<file>` [--config `<path>`]
//!   extmark format `<file>` --format `<name>` --from N --to N [--tag T] [--remove] [--raw]

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;

use extmark::config::{load_config, load_config_from};
use extmark::{Format, FormatRequest, Result, Selection, Session, Settings, Token};

const APP_NAME: &str = "extmark";

#[derive(Parser)]
#[command(name = "extmark")]
#[command(version, about = "Inspect and format extended Markdown markup")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the inline and block tokens of a file as JSON
    Tokens {
        /// Path to the Markdown file
        file: PathBuf,

        /// Settings file to use instead of the user configuration
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Apply a formatting command to a range and print the result
    Format {
        /// Path to the Markdown file
        file: PathBuf,

        /// Format name (underline, spoiler, superscript, subscript,
        /// highlight, custom_span, fenced_block)
        #[arg(long, short)]
        format: String,

        /// Selection anchor (byte offset)
        #[arg(long)]
        from: usize,

        /// Selection head (byte offset)
        #[arg(long)]
        to: usize,

        /// Tag to apply
        #[arg(long)]
        tag: Option<String>,

        /// Remove the format from everything the range touches
        #[arg(long)]
        remove: bool,

        /// Toggle delimiters as plain text, ignoring tokens
        #[arg(long)]
        raw: bool,

        /// Settings file to use instead of the user configuration
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct TokenDump<'a> {
    inline: &'a [Token],
    block: &'a [Token],
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    debug!("Starting {}", APP_NAME);

    let args = Args::parse();
    let result = match args.command {
        Command::Tokens { file, config } => handle_tokens_command(&file, config.as_deref()),
        Command::Format {
            file,
            format,
            from,
            to,
            tag,
            remove,
            raw,
            config,
        } => {
            let Some(format) = Format::from_name(&format) else {
                eprintln!("Unknown format '{}'", format);
                eprintln!("Available formats:");
                for format in Format::ALL {
                    eprintln!("  {}", format.name());
                }
                std::process::exit(2);
            };
            let mut request = FormatRequest::new(format);
            request.tag = tag;
            request.force_remove = remove;
            handle_format_command(&file, config.as_deref(), request, (from, to), raw)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn settings_for(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => load_config_from(path),
        None => Ok(load_config()),
    }
}

/// Handle the tokens command
fn handle_tokens_command(file: &Path, config: Option<&Path>) -> Result<()> {
    let settings = settings_for(config)?;
    let text = fs::read_to_string(file)?;
    let session = Session::new(text, settings);

    let dump = TokenDump {
        inline: session.inline_tokens(),
        block: session.block_tokens(),
    };
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}

/// Handle the format command
fn handle_format_command(
    file: &Path,
    config: Option<&Path>,
    request: FormatRequest,
    (anchor, head): (usize, usize),
    raw: bool,
) -> Result<()> {
    let mut settings = settings_for(config)?;
    if raw {
        settings.tidy_formatting = false;
    }
    let text = fs::read_to_string(file)?;
    let mut session = Session::new(text, settings);
    session.set_selection(Selection::single(anchor, head));

    let outcome = session.format(&request)?;
    if outcome.actions.is_empty() {
        info!("Nothing to format in {}", file.display());
    } else {
        info!("Applied {:?} to {}", outcome.actions, file.display());
    }
    print!("{}", session.text());
    Ok(())
}

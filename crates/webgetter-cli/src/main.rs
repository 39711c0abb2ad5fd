//! WebGetter console host.
//!
//! Loads a trigger configuration file and runs the module against messages
//! typed on the command line, printing replies to the terminal instead of
//! sending them to IRC.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webgetter::{MODULE_NAME, WebGetter};
use webgetter_config::{FlatParams, ModuleConfig, loader};
use webgetter_core::{Locale, TextMessage};

mod console;
mod theme;

use console::ConsoleHost;
use theme::Theme;

/// WebGetter - fetch web pages from chat triggers
#[derive(Parser)]
#[command(name = "webgetter")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the trigger configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "WEBGETTER_CONFIG",
        default_value = "webgetter.toml"
    )]
    config: PathBuf,

    /// Locale of the console formatter
    #[arg(long, global = true, default_value = "en_US")]
    locale: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one message, as if typed in a channel
    Run {
        /// Channel the message is sent to; private message when omitted
        #[arg(long)]
        channel: Option<String>,

        /// Nickname of the sender
        #[arg(long, default_value = "console")]
        nick: String,

        /// Message text, starting with the trigger word
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List the configured triggers
    Triggers,

    /// Show help for the module or one of its triggers
    Help {
        /// Help words; defaults to the module name
        words: Vec<String>,
    },

    /// Print the parsed configuration as TOML
    Show,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,webgetter=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_params(path: &Path) -> Result<FlatParams> {
    loader::load_params(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn load_module(host: &Arc<ConsoleHost>, path: &Path) -> Result<WebGetter> {
    let params = load_params(path)?;
    let module = WebGetter::new(Arc::<ConsoleHost>::clone(host), Arc::<ConsoleHost>::clone(host), Arc::<ConsoleHost>::clone(host));
    module
        .reload(&params)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(module)
}

/// Arguments of a `help` command, the module name when none are given.
fn help_words(words: &[String]) -> Vec<&str> {
    if words.is_empty() {
        vec![MODULE_NAME]
    } else {
        words.iter().map(String::as_str).collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ansi = colored::control::SHOULD_COLORIZE.should_colorize();
    let host = Arc::new(ConsoleHost::new(Locale::parse(&cli.locale), ansi));

    match cli.command {
        Commands::Run {
            channel,
            nick,
            text,
        } => {
            let module = load_module(&host, &cli.config)?;
            let text = text.join(" ");
            let message = match channel {
                Some(channel) => TextMessage::channel(nick, channel, text),
                None => TextMessage::private(nick, text),
            };
            if !module.matches(&message.text) {
                eprintln!(
                    "{}",
                    Theme::warning(&format!("no trigger matches \"{}\"", message.text))
                );
                return Ok(());
            }
            module.handle_request(&message).await?;
        },
        Commands::Triggers => {
            let module = load_module(&host, &cli.config)?;
            println!("{}", Theme::header("Triggers"));
            let triggers = module.triggers();
            if triggers.is_empty() {
                println!("{}", Theme::dimmed("  (none)"));
            }
            for trigger in triggers {
                println!("{}", Theme::item(&trigger));
            }
        },
        Commands::Help { words } => {
            let module = load_module(&host, &cli.config)?;
            let message = TextMessage::private("console", format!("help {}", words.join(" ")));
            if !module.help(&message, &help_words(&words)).await? {
                eprintln!("{}", Theme::error("no help available"));
            }
        },
        Commands::Show => {
            let params = load_params(&cli.config)?;
            let config = ModuleConfig::from_params(&params)
                .with_context(|| format!("invalid configuration in {}", cli.config.display()))?;
            print!("{}", toml::to_string_pretty(&config)?);
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    const CONFIG: &str = r#"
[webgetter]
timeout = 5

[webgetter.1]
trigger = "weather"
url = "http://weather.test/?c=$(0)"
format = "$(vars.1) degrees"
vars = ["//span[@class='temp']"]
"#;

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "webgetter",
            "--config",
            "bot.toml",
            "run",
            "--channel",
            "#chan",
            "weather",
            "paris",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("bot.toml"));
        assert_eq!(cli.locale, "en_US");
        match cli.command {
            Commands::Run { channel, text, .. } => {
                assert_eq!(channel.as_deref(), Some("#chan"));
                assert_eq!(text, vec!["weather", "paris"]);
            },
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_requires_text() {
        assert!(Cli::try_parse_from(["webgetter", "run"]).is_err());
    }

    #[test]
    fn test_help_words_default_to_module() {
        assert_eq!(help_words(&[]), vec![MODULE_NAME]);
        let words = vec!["webgetter".to_owned(), "weather".to_owned()];
        assert_eq!(help_words(&words), vec!["webgetter", "weather"]);
    }

    #[test]
    fn test_load_module_registers_triggers() {
        let file = config_file(CONFIG);
        let host = Arc::new(ConsoleHost::new(Locale::default(), false));
        let module = load_module(&host, file.path()).unwrap();
        assert_eq!(module.triggers(), vec!["weather"]);
        assert!(module.matches("weather paris"));
    }

    #[test]
    fn test_load_module_reports_path() {
        let file = config_file("[webgetter.1]\ntrigger = \"broken\"\n");
        let host = Arc::new(ConsoleHost::new(Locale::default(), false));
        let err = load_module(&host, file.path()).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration in"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_params(Path::new("/nonexistent/webgetter.toml")).unwrap_err();
        assert!(err.to_string().starts_with("failed to load configuration"));
    }
}

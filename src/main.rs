use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use spellmark::cli::output::{self, OutputFormat, PromptChoice};
use spellmark::cli::terminal::TerminalEditor;
use spellmark::popup::{Rect, Viewport};
use spellmark::{CheckApplied, Config, EditorAdapter, MarkerAttrs, SpellCheckSession};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terminal geometry handed to the popup; placement is irrelevant on a terminal.
const TERMINAL_VIEWPORT: Viewport = Viewport {
    width: 800.0,
    height: 600.0,
};

#[derive(Parser, Debug)]
#[command(name = "spellmark")]
#[command(version, about = "Spell and grammar checking against a LanguageTool-compatible server", long_about = None)]
struct Cli {
    /// Files to check
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Apply the top suggestion for every issue
    #[arg(short, long)]
    fix: bool,

    /// Interactive mode for selecting corrections
    #[arg(short, long, requires = "fix")]
    interactive: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if issues are found
    #[arg(long)]
    no_fail: bool,

    /// Language to check in (BCP-47 tag or "auto")
    #[arg(short, long, env = "SPELLMARK_LANGUAGE")]
    language: Option<String>,

    /// Checking service endpoint
    #[arg(long, env = "SPELLMARK_SERVER")]
    server: Option<String>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Parser, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the global configuration file path
    Path,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "spellmark=debug"
    } else {
        "spellmark=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "spellmark", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(cli.language.clone(), cli.server.clone())?;

    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    if cli.files.is_empty() {
        anyhow::bail!("No files specified. Use --help for usage information.");
    }

    if cli.no_color {
        colored::control::set_override(false);
    }

    let client = config.client();
    let mut total_matches = 0;
    let mut total_fixed = 0;

    for file_path in &cli.files {
        if !file_path.exists() {
            eprintln!("Error: File not found: {}", file_path.display());
            continue;
        }

        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read file: {}", file_path.display()))?;
        let editor = TerminalEditor::new(content, file_path.display().to_string());
        let mut session = SpellCheckSession::attach(editor, &config.session_options(), Instant::now());

        if let Some(CheckApplied::Failed) = session.check_now(&client, Instant::now()).await {
            eprintln!(
                "Warning: could not check {} (see log for details)",
                file_path.display()
            );
        }

        if cli.fix {
            let fixed = if cli.interactive {
                fix_interactive(&mut session)?
            } else {
                fix_auto(&mut session)?
            };
            if fixed > 0 {
                let editor = session.dispose();
                write_back(file_path, &editor.text())?;
            }
            total_fixed += fixed;
        } else {
            let text = session.editor().text();
            output::print_matches(file_path, &text, session.matches(), cli.format);
            total_matches += session.matches().len();
        }
    }

    if cli.fix {
        output::print_fix_summary(total_fixed, cli.files.len());
    } else if matches!(cli.format, OutputFormat::Text) {
        output::print_check_summary(total_matches, cli.files.len());
    }

    if total_matches > 0 && !cli.no_fail && !cli.fix {
        std::process::exit(1);
    }

    Ok(())
}

/// Accept the top suggestion of every match, front to back.
fn fix_auto(session: &mut SpellCheckSession<TerminalEditor>) -> Result<usize> {
    let mut fixed = 0;
    let mut cursor = 0;
    while let Some(m) = session.matches().get(cursor).cloned() {
        if m.replacements.is_empty() {
            cursor += 1;
            continue;
        }
        let marker = MarkerAttrs::for_match(&m);
        session.activate_marker(&marker, Rect::default(), TERMINAL_VIEWPORT)?;
        session.accept_suggestion(0, Instant::now())?;
        fixed += 1;
    }
    Ok(fixed)
}

fn fix_interactive(session: &mut SpellCheckSession<TerminalEditor>) -> Result<usize> {
    let mut fixed = 0;
    let mut cursor = 0;
    while let Some(m) = session.matches().get(cursor).cloned() {
        let marker = MarkerAttrs::for_match(&m);
        let choices = session
            .activate_marker(&marker, Rect::default(), TERMINAL_VIEWPORT)?
            .choices
            .clone();
        let text = session.editor().text();

        match output::prompt_choice(&text, &m, &choices)? {
            PromptChoice::Replace(index) => {
                session.accept_suggestion(index, Instant::now())?;
                fixed += 1;
            }
            PromptChoice::Skip => {
                session.close_popup();
                cursor += 1;
            }
            PromptChoice::Quit => {
                session.close_popup();
                break;
            }
        }
    }
    Ok(fixed)
}

fn write_back(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("Failed to write file: {}", path.display()))
}

fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Config { action } => match action {
            ConfigCommands::Show => {
                print!("{}", config.to_toml()?);
            }
            ConfigCommands::Path => match Config::global_config_path() {
                Some(path) => println!("{}", path.display()),
                None => anyhow::bail!("Could not determine the configuration directory"),
            },
        },
    }
    Ok(())
}

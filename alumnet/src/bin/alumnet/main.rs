mod commands;
mod examples;
mod output;
mod theme;
mod views;

use std::{fmt::Write, path::PathBuf};

use alumnet::{
    PersistenceService, StoreConfig,
    config::{ENV_ENVIRONMENT, ENV_KEY_PREFIX, ENV_RECONNECT_BACKOFF_MS, ENV_STORE_URL},
};
use anyhow::{Context, Result};
use clap::{ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};

use commands::{
    communities::{CommunityCommands, handle_community_commands},
    events::{EventCommands, handle_event_commands},
    jobs::{JobCommands, handle_job_commands},
    messages::{MessageCommands, handle_message_commands},
    ping::handle_ping,
    users::{UserCommands, handle_user_commands},
};
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    (ENV_STORE_URL, "Redis connection URL (overrides store.url)"),
    (ENV_KEY_PREFIX, "Key namespace prefix (default: alumnet)"),
    (ENV_RECONNECT_BACKOFF_MS, "Initial reconnect backoff in ms; 0 disables"),
    (ENV_ENVIRONMENT, "Set to 'production' to require an explicit store URL"),
    ("RUST_LOG", "Log filter, e.g. alumnet=debug"),
];

#[derive(Parser)]
#[command(name = "alumnet")]
#[command(version)]
#[command(
    about = "Operator CLI for the alumni network store",
    long_about = r#"Operator CLI for the alumni network document store.

Reads and writes users, events, communities, messages and job postings
stored as RedisJSON documents. Filters are exact-match FIELD=VALUE pairs on
the stored (camelCase) field names.
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (default: ./alumnet.toml when present)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parses with the per-command examples and environment appendix attached to `--help`.
    fn parse_with_examples() -> Self {
        let matches = build_cli_command().get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn build_cli_command() -> Command {
    let use_color = detect_color_support();
    let appendix = render_top_level_appendix(use_color);
    let mut command = Cli::command().after_long_help(appendix);
    command = command.color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });
    attach_command_examples(&mut command, use_color);
    command
}

fn attach_command_examples(command: &mut Command, use_color: bool) {
    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            let help_text = render_examples(example.groups, use_color);
            *subcommand = subcommand.clone().after_long_help(help_text);
        }
    }
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let heading = stylize("Examples:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{heading}");

    for (index, group) in groups.iter().enumerate() {
        let title = stylize(group.title, theme.primary, true, use_color);
        let _ = writeln!(buffer, "  {title}");

        for command in group.commands {
            let arrow = stylize(ICONS.arrow, theme.secondary, false, use_color);
            let command_text = stylize(command, theme.secondary, false, use_color);
            let _ = writeln!(buffer, "    {arrow} {command_text}");
        }

        if index + 1 < groups.len() {
            buffer.push('\n');
        }
    }

    buffer
}

fn render_top_level_appendix(use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let env_heading = stylize("Environment Variables:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{env_heading}");
    for (key, description) in ENVIRONMENT_VARIABLES {
        let key_text = stylize(key, theme.key, true, use_color);
        let value_text = stylize(description, theme.value, false, use_color);
        let _ = writeln!(buffer, "  {key_text}  {value_text}");
    }

    buffer.push('\n');

    let tip_heading = stylize("Tip:", theme.highlight, true, use_color);
    let tip_text = stylize(
        "Use 'alumnet <command> --help' to view examples for each command.",
        theme.secondary,
        false,
        use_color,
    );
    let _ = writeln!(buffer, "{tip_heading} {tip_text}");

    buffer
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    if use_color {
        let styled = text.color(color);
        if bold { styled.bold().to_string() } else { styled.to_string() }
    } else {
        text.to_string()
    }
}

fn detect_color_support() -> bool {
    ShouldColorize::from_env().should_colorize()
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the document store and check it answers
    Ping,

    /// Alumni profiles
    #[command(subcommand)]
    Users(UserCommands),

    /// Events and reunions
    #[command(subcommand)]
    Events(EventCommands),

    /// Interest and chapter groups
    #[command(subcommand)]
    Communities(CommunityCommands),

    /// Messages between alumni
    #[command(subcommand)]
    Messages(MessageCommands),

    /// Job postings
    #[command(subcommand)]
    Jobs(JobCommands),
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_with_examples();
    init_logging(&cli);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let global_options = GlobalOptions {
        output_format: cli.output.clone(),
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    let output = OutputManager::new(global_options);

    if let Err(err) = execute(cli, &output).await {
        output.error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    let config = StoreConfig::load(cli.config.as_deref()).context("failed to load store configuration")?;
    output.verbose(&format!("{config:?}"));
    let service = PersistenceService::from_config(&config);

    match cli.command {
        Commands::Ping => handle_ping(&config, &service, output).await?,
        Commands::Users(command) => handle_user_commands(command, &service, output).await?,
        Commands::Events(command) => handle_event_commands(command, &service, output).await?,
        Commands::Communities(command) => handle_community_commands(command, &service, output).await?,
        Commands::Messages(command) => handle_message_commands(command, &service, output).await?,
        Commands::Jobs(command) => handle_job_commands(command, &service, output).await?,
    }

    Ok(())
}

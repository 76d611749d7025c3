//! Command-line surface: typed commands, the command catalog, and dispatch.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;

use crate::app::extract::ExtractMode;
use crate::app::render::RenderStyle;
use crate::app::workflow::{Applied, SmartGrabOptions, Workflow};
use crate::infra::clipboard::Transport;
use crate::infra::config::Config;
use crate::infra::prompt::TerminalPrompter;
use crate::infra::service::ExternalCommandService;
use crate::infra::staging::StagingArea;

/// Assemble source-code context for language-model reasoning.
#[derive(Debug, Parser)]
#[command(name = "ctxgrab", version)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Answer yes to every size confirmation.
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Print the command catalog as JSON and exit.
    #[arg(long)]
    pub list_commands: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the directory tree and copy it to the clipboard.
    Tree(TreeArgs),
    /// Print the directory tree with Go functions and copy it to the clipboard.
    TreeFunc(TreeFuncArgs),
    /// Copy files, a directory, or a file found by name to the clipboard.
    Grab(GrabArgs),
    /// Print exported functions and their descriptions.
    GrabPublic(PathArgs),
    /// Summarize Go symbols (functions, structs, interfaces) of a folder.
    Summary(SummaryArgs),
    /// Ask the reasoning service which files a feature needs and grab them.
    Smartgrab(SmartGrabArgs),
    /// Prepare or apply an implementation round trip.
    Implement(ImplementArgs),
    /// Print the available commands.
    Commands,
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct PathArgs {
    /// Directory to inspect.
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    #[command(flatten)]
    pub target: PathArgs,
    #[arg(long, value_enum, default_value_t = RenderStyle::Plain)]
    pub style: RenderStyle,
    /// Print only, leave the clipboard alone.
    #[arg(long)]
    pub no_copy: bool,
}

#[derive(Debug, Args)]
pub struct TreeFuncArgs {
    #[command(flatten)]
    pub tree: TreeArgs,
    /// Symbol extraction strategy.
    #[arg(long, value_enum, default_value_t = ExtractMode::Lexical)]
    pub mode: ExtractMode,
}

#[derive(Debug, Args)]
pub struct GrabArgs {
    /// Files or directories; a missing single path is searched by file name.
    pub paths: Vec<PathBuf>,
    /// Write the payload to a file instead of the clipboard.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub target: PathArgs,
    #[arg(long)]
    pub no_copy: bool,
}

#[derive(Debug, Args)]
pub struct SmartGrabArgs {
    #[command(flatten)]
    pub target: PathArgs,
    /// Feature name; defaults to the current git branch.
    #[arg(long)]
    pub feature: Option<String>,
    /// Feature description; asked interactively when omitted.
    #[arg(long)]
    pub description: Option<String>,
    /// Parse the staged reply instead of calling the reasoning service.
    #[arg(long)]
    pub reuse_output: bool,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImplementArgs {
    #[command(subcommand)]
    pub action: ImplementAction,
}

#[derive(Debug, Subcommand)]
pub enum ImplementAction {
    /// Stage a prompt built from the tree with functions.
    Prepare(PathArgs),
    /// Write the first script of the staged reply to its file.
    Apply,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// One row of the command catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
}

/// Name-sorted command list, built once from the clap definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCatalog {
    entries: Vec<CommandInfo>,
}

impl CommandCatalog {
    pub fn from_command(command: &clap::Command) -> Self {
        let mut entries: Vec<CommandInfo> = command
            .get_subcommands()
            .filter(|sub| sub.get_name() != "help")
            .map(|sub| CommandInfo {
                name: sub.get_name().to_owned(),
                description: sub.get_about().map(ToString::to_string).unwrap_or_default(),
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn entries(&self) -> &[CommandInfo] {
        &self.entries
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn to_table(&self) -> String {
        let width = self.entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
        self.entries
            .iter()
            .map(|entry| format!("  {:<width$}  {}\n", entry.name, entry.description))
            .collect()
    }
}

/// Shared state handed to every command.
struct Context<'a> {
    config: &'a Config,
    prompter: &'a TerminalPrompter,
    catalog: &'a CommandCatalog,
}

impl Context<'_> {
    fn workflow(&self) -> Workflow<'_> {
        Workflow::new(self.config, self.prompter)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let catalog = CommandCatalog::from_command(&Cli::command());
    if cli.list_commands {
        println!("{}", catalog.to_json()?);
        return Ok(());
    }
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = Config::load()?;
    let prompter = TerminalPrompter::new().assume_yes(cli.yes);
    let context = Context {
        config: &config,
        prompter: &prompter,
        catalog: &catalog,
    };
    dispatch(command, &context)
}

fn dispatch(command: Command, cx: &Context<'_>) -> Result<()> {
    match command {
        Command::Tree(args) => {
            let workflow = cx.workflow();
            let path = &args.target.path;
            show_and_copy(args.style, args.no_copy, |style| workflow.tree(path, style))
        }
        Command::TreeFunc(args) => {
            let workflow = cx.workflow();
            let path = &args.tree.target.path;
            show_and_copy(args.tree.style, args.tree.no_copy, |style| {
                workflow.tree_with_symbols(path, args.mode, style)
            })
        }
        Command::Grab(args) => {
            let text = cx.workflow().grab(args.paths)?;
            deliver(&text, args.output)
        }
        Command::GrabPublic(args) => {
            print!("{}", cx.workflow().public_catalog(&args.path)?);
            Ok(())
        }
        Command::Summary(args) => {
            let text = cx.workflow().summary(&args.target.path)?;
            print!("{text}");
            if !args.no_copy {
                deliver(&text, None)?;
            }
            Ok(())
        }
        Command::Smartgrab(args) => {
            let staging = StagingArea::from_config(cx.config, Path::new("."));
            let service = ExternalCommandService::new(&cx.config.service, cx.prompter);
            let options = SmartGrabOptions {
                feature: args.feature,
                description: args.description,
                reuse_output: args.reuse_output,
            };
            let payload =
                cx.workflow()
                    .smartgrab(&args.target.path, options, &service, &staging)?;
            eprintln!("Collected {} file(s).", payload.len());
            deliver(&payload.render(), args.output)
        }
        Command::Implement(args) => {
            let staging = StagingArea::from_config(cx.config, Path::new("."));
            match args.action {
                ImplementAction::Prepare(target) => {
                    cx.workflow().prepare_implementation(&target.path, &staging)?;
                    eprintln!(
                        "Prompt prepared in {}. Review or edit it before sending.",
                        staging.input_path().display()
                    );
                }
                ImplementAction::Apply => match cx.workflow().apply_implementation(&staging)? {
                    Applied::Written(path) => eprintln!("Wrote {}.", path.display()),
                    Applied::NoScripts => eprintln!("The reply contains no scripts."),
                },
            }
            Ok(())
        }
        Command::Commands => {
            println!("Available commands:");
            print!("{}", cx.catalog.to_table());
            Ok(())
        }
        Command::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "ctxgrab", &mut io::stdout());
            Ok(())
        }
    }
}

/// Print in the requested style and copy the plain rendering.
fn show_and_copy(
    style: RenderStyle,
    no_copy: bool,
    render: impl Fn(RenderStyle) -> Result<String>,
) -> Result<()> {
    let shown = render(style)?;
    print!("{shown}");
    if no_copy {
        return Ok(());
    }
    let plain = if style == RenderStyle::Plain {
        shown
    } else {
        render(RenderStyle::Plain)?
    };
    deliver(&plain, None)
}

fn deliver(text: &str, output: Option<PathBuf>) -> Result<()> {
    let destination = Transport::from_output(output).deliver(text)?;
    eprintln!("Copied {} bytes to {destination}.", text.len());
    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use runpad::config::Config;
use runpad::executor::ProcessBackend;
use runpad::protocol::RunOutcome;
use runpad::run::RunController;
use runpad::settings::SettingsStore;
use runpad::shell::{BufferKind, SessionShell, ShellCommand, ShellView};
use runpad::snippets::SnippetStore;
use runpad::tutorial::load_tutorial;

use crate::terminal_view::TerminalView;

/// How long to wait for a cancelled run to wind down, on top of the kill grace
const CANCEL_SETTLE: Duration = Duration::from_secs(5);

/// Exit code for a run stopped by `--timeout-secs`
const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "runpad",
    version,
    about = "Script scratchpad: run code, keep snippets, work through tutorials"
)]
pub struct Cli {
    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a script file, streaming its output to stdout
    Run {
        file: PathBuf,

        /// File whose contents are fed to the script's stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Interpreter program, overriding the configured one
        #[arg(long)]
        interpreter: Option<String>,

        /// Cancel the run after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Manage the snippet database
    Snippets {
        #[command(subcommand)]
        action: SnippetAction,
    },

    /// List a tutorial's questions, or mark a solution
    Tutorial {
        file: PathBuf,

        /// Question number to mark (1-based)
        #[arg(long, requires = "code")]
        mark: Option<usize>,

        /// Solution to run against the question
        #[arg(long)]
        code: Option<PathBuf>,
    },

    /// Print config and data locations
    Paths,
}

#[derive(Debug, Subcommand)]
pub enum SnippetAction {
    List,
    Show { name: String },
    /// Store the contents of FILE under NAME
    Add { name: String, file: PathBuf },
    Remove { name: String },
}

pub fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    match cli.command {
        Command::Run {
            file,
            input,
            interpreter,
            timeout_secs,
        } => {
            let mut config = config;
            if let Some(program) = interpreter {
                config.interpreter.program = program;
            }
            run_script(
                &config,
                &file,
                input.as_deref(),
                timeout_secs.map(Duration::from_secs),
                cli.yes,
            )
        }
        Command::Snippets { action } => snippets(&config, action, cli.yes),
        Command::Tutorial { file, mark, code } => match (mark, code) {
            (Some(number), Some(code)) => mark_solution(&config, &file, number, &code, cli.yes),
            _ => list_questions(&file),
        },
        Command::Paths => {
            print_paths(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// A shell over in-memory stores, so headless runs leave the saved session alone
fn headless_shell(config: &Config, view: TerminalView) -> Result<SessionShell<TerminalView>> {
    let snippets = SnippetStore::open_in_memory()?;
    let controller = RunController::spawn(Box::new(ProcessBackend::from_config(config)))?;
    Ok(SessionShell::new(
        config,
        SettingsStore::in_memory(),
        snippets,
        controller,
        view,
    ))
}

/// Pump events until the active run ends, cancelling after `timeout`
fn wait_for_run<V: ShellView>(
    shell: &mut SessionShell<V>,
    config: &Config,
    timeout: Option<Duration>,
) -> Result<()> {
    match timeout {
        Some(limit) => {
            if !shell.run_until_idle(limit) {
                warn!(timeout_secs = limit.as_secs(), "Run timed out, cancelling");
                shell.handle(ShellCommand::Stop);
                if !shell.run_until_idle(config.kill_grace() + CANCEL_SETTLE) {
                    bail!("run did not stop after cancel");
                }
            }
        }
        None => while !shell.run_until_idle(Duration::from_secs(60)) {},
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run_script(
    config: &Config,
    file: &Path,
    input: Option<&Path>,
    timeout: Option<Duration>,
    yes: bool,
) -> Result<ExitCode> {
    let code = read_file(file)?;
    let input = input.map(read_file).transpose()?.unwrap_or_default();

    let mut shell = headless_shell(config, TerminalView::new(yes))?;
    shell.handle(ShellCommand::Edit {
        kind: BufferKind::Code,
        text: code,
    });
    shell.handle(ShellCommand::Edit {
        kind: BufferKind::Input,
        text: input,
    });
    shell.handle(ShellCommand::Run);
    if !shell.is_running() {
        bail!("run was not accepted");
    }
    wait_for_run(&mut shell, config, timeout)?;

    let code = match shell.last_outcome() {
        Some(RunOutcome::Completed) => ExitCode::SUCCESS,
        Some(RunOutcome::Cancelled) => ExitCode::from(EXIT_CANCELLED),
        Some(RunOutcome::Failed { .. }) | None => ExitCode::FAILURE,
    };
    info!(outcome = shell.last_outcome().map(|o| o.as_str()), "Headless run finished");
    shell.shutdown();
    Ok(code)
}

fn snippets(config: &Config, action: SnippetAction, yes: bool) -> Result<ExitCode> {
    let mut store = SnippetStore::open(&config.snippets_db_path())?;
    match action {
        SnippetAction::List => {
            for name in store.list()? {
                println!("{}", name);
            }
        }
        SnippetAction::Show { name } => match store.get(&name)? {
            Some(body) => print!("{}", body),
            None => bail!("no snippet named '{}'", name),
        },
        SnippetAction::Add { name, file } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("snippet name must not be empty");
            }
            let body = read_file(&file)?;
            if store.exists_conflict(name)? {
                let mut view = TerminalView::new(yes);
                if !view.confirm("This snippet already exists, do you want to overwrite ?") {
                    return Ok(ExitCode::FAILURE);
                }
            }
            store.upsert(name, &body)?;
            store.flush()?;
            eprintln!("Snippet added.");
        }
        SnippetAction::Remove { name } => {
            if !store.remove(&name)? {
                bail!("no snippet named '{}'", name);
            }
            store.flush()?;
            eprintln!("Snippet removed.");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn list_questions(file: &Path) -> Result<ExitCode> {
    let set = load_tutorial(file)?;
    if let Some(title) = &set.title {
        println!("{}", title);
    }
    for (i, question) in set.questions.iter().enumerate() {
        println!(
            "{:>3}. {} ({})",
            i + 1,
            question.title,
            question.expected.kind()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn mark_solution(
    config: &Config,
    file: &Path,
    number: usize,
    code: &Path,
    yes: bool,
) -> Result<ExitCode> {
    let solution = read_file(code)?;
    let mut shell = headless_shell(config, TerminalView::new(yes))?;
    if !shell.open_tutorial_path(file) {
        return Ok(ExitCode::FAILURE);
    }
    let total = shell.tutorial().set().map(|s| s.len()).unwrap_or(0);
    if number == 0 || number > total {
        bail!("question {} does not exist (tutorial has {})", number, total);
    }
    let index = number - 1;

    shell.handle(ShellCommand::SelectQuestion(Some(index)));
    shell.handle(ShellCommand::Edit {
        kind: BufferKind::Code,
        text: solution,
    });
    shell.handle(ShellCommand::MarkQuestion);
    if !shell.is_running() {
        bail!("marking run was not accepted");
    }
    wait_for_run(&mut shell, config, None)?;

    let passed = shell
        .tutorial()
        .progress()
        .and_then(|p| p.get(index))
        .is_some_and(|q| q.passed);
    println!("score: {}/{}", shell.tutorial().score(), total);
    shell.shutdown();
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_paths(config: &Config) {
    let config_path = shellexpand::tilde(runpad::config::DEFAULT_CONFIG_PATH).to_string();
    println!("config:   {}", config_path);
    println!("data:     {}", config.data_dir().display());
    println!("settings: {}", config.settings_path().display());
    println!("snippets: {}", config.snippets_db_path().display());
    println!(
        "log:      {}",
        runpad::logging::log_path(&config.log_dir()).display()
    );
}

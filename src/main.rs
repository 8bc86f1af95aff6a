use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use release_cycle::commit_message::{CommitMessageGenerator, OllamaGenerator, StaticMessage};
use release_cycle::config;
use release_cycle::orchestrator::{CycleResult, Orchestrator, PipelineSettings};
use release_cycle::preflight;
use release_cycle::runner::{CommandRunner, SystemRunner};
use release_cycle::scheduler::{CycleRunner, Scheduler};
use release_cycle::ui::{self, AlwaysYes, ConfirmationPolicy, PromptUser};

/// Exit status after a second interrupt
const FORCED_EXIT_CODE: i32 = 130;

#[derive(clap::Parser)]
#[command(
    name = "release-cycle",
    version,
    about = "Pull, build, test, commit and release a Cargo project, once or periodically"
)]
struct Args {
    #[arg(long, help = "Keep running cycles until interrupted")]
    daemon: bool,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Pause between the end of one cycle and the start of the next"
    )]
    interval: u64,

    #[arg(short = 'y', long, help = "Skip confirmation prompts")]
    yes: bool,

    #[arg(long, help = "Generate commit messages with Ollama")]
    use_ollama: bool,

    #[arg(short, long, value_name = "PATH", help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        short = 'C',
        long,
        value_name = "PATH",
        default_value = ".",
        help = "Directory of the Cargo project to build"
    )]
    project_dir: PathBuf,

    #[arg(long, help = "Never run the release steps")]
    skip_release: bool,
}

/// Prints the summary of every cycle it runs
struct Reporting<R: CommandRunner>(Orchestrator<R>);

impl<R: CommandRunner> CycleRunner for Reporting<R> {
    fn run_cycle(&mut self) -> CycleResult {
        ui::display_status(&format!(
            "Starting release cycle in {}",
            self.0.settings().project_dir.display()
        ));
        let result = self.0.run_cycle();
        ui::display_cycle_result(&result);
        result
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so they don't interleave with the cycle summaries
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = config::load_config(args.config.as_deref(), &args.project_dir)
        .context("Failed to load configuration")?;

    let runner = SystemRunner::new();
    let workspace = preflight::run(&runner, &args.project_dir, &config)?;

    let artifact_dir = std::env::current_dir().context("Cannot determine current directory")?;
    let settings = PipelineSettings::new(&workspace.project_dir, artifact_dir, &config)
        .skip_release(args.skip_release);

    let confirmation: Box<dyn ConfirmationPolicy> = if args.yes {
        Box::new(AlwaysYes)
    } else {
        Box::new(PromptUser)
    };

    let generator: Box<dyn CommitMessageGenerator> =
        if args.use_ollama || config.commit_message.use_generator {
            Box::new(OllamaGenerator::new(&config.commit_message)?)
        } else {
            Box::new(StaticMessage::default())
        };
    info!(generator = generator.name(), "commit message generator selected");

    let orchestrator = Orchestrator::new(runner, settings, confirmation, generator)?;
    let mut scheduler = Scheduler::new(Reporting(orchestrator));

    if args.daemon {
        let stop = install_interrupt_handler()?;
        scheduler.run_daemon(Duration::from_secs(args.interval), &stop);
        return Ok(ExitCode::SUCCESS);
    }

    if scheduler.run_once() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// First Ctrl-C asks the daemon to stop after the current cycle; the second exits at once.
fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start signal listener")?;

    thread::Builder::new()
        .name("interrupt-listener".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                loop {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "cannot listen for interrupts");
                        return;
                    }
                    if flag.swap(true, Ordering::SeqCst) {
                        warn!("second interrupt, exiting");
                        std::process::exit(FORCED_EXIT_CODE);
                    }
                    info!("interrupt received, stopping after the current cycle (Ctrl-C again to force)");
                }
            });
        })
        .context("Failed to spawn signal listener")?;

    Ok(stop)
}

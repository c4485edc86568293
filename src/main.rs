//! devterm - run commands, render the prompt, and drive timers from the command line

use anyhow::Result;
use clap::{Parser, Subcommand};
use devterm::clock::{ClockEngine, CompletionSignal};
use devterm::config::Config;
use devterm::session::CommandSession;
use devterm::timestamp::timestamp;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "devterm")]
#[command(about = "Shell session core with a git-aware prompt and a timer engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run commands one after another in a single session
    Run {
        /// Commands to run, e.g. "cd src" "ls"
        #[arg(required = true)]
        commands: Vec<String>,

        /// Don't print failure messages
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the prompt for the current directory
    Prompt {
        /// Show the whole path instead of the last segment
        #[arg(short, long)]
        whole_path: bool,
    },
    /// Count down and exit when done
    Timer {
        /// Length in seconds
        seconds: u64,
    },
    /// Count up for a while
    Stopwatch {
        /// Seconds between ticks (defaults to the configured period)
        #[arg(short, long)]
        period: Option<u64>,

        /// Stop after this many seconds
        #[arg(short, long, default_value_t = 10)]
        duration: u64,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the current timestamp
    Timestamp,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Run { commands, quiet } => {
            let session = CommandSession::from_config(&config)?;
            let report_errors = config.general.report_errors && !quiet;
            for command in commands {
                println!("{}{}", session.prompt(), command);
                // Failures were already reported (or deliberately silenced)
                let _ = session.execute(command, report_errors).wait().await;
            }
            Ok(())
        }
        Commands::Prompt { whole_path } => {
            let session = CommandSession::from_config(&config)?;
            let whole_path = whole_path || config.prompt.display_whole_path;
            println!("{}", session.render_prompt(whole_path));
            Ok(())
        }
        Commands::Timer { seconds } => run_timer(seconds).await,
        Commands::Stopwatch {
            period,
            duration,
            json,
        } => {
            let period = period.unwrap_or(config.clock.stopwatch_period_seconds);
            run_stopwatch(period, duration, json).await
        }
        Commands::Timestamp => {
            println!("{}", timestamp());
            Ok(())
        }
    }
}

async fn run_timer(seconds: u64) -> Result<()> {
    let signal = CompletionSignal::new();
    let timer = ClockEngine::timer(Some(signal.clone()));
    let done = signal.wait();
    timer.start(seconds);

    let mut display = tokio::time::interval(Duration::from_secs(1));
    tokio::pin!(done);
    loop {
        tokio::select! {
            _ = &mut done => break,
            _ = display.tick() => println!("{}", timer.formatted_time()),
        }
    }

    println!("{} - timer done", timestamp());
    Ok(())
}

async fn run_stopwatch(period: u64, duration: u64, json: bool) -> Result<()> {
    let stopwatch = ClockEngine::stopwatch();
    stopwatch.start(period);

    let mut display = tokio::time::interval(Duration::from_secs(1));
    for _ in 0..duration {
        display.tick().await;
        println!("{}", stopwatch.formatted_time());
    }
    stopwatch.stop();

    if json {
        println!("{}", serde_json::to_string_pretty(&stopwatch.snapshot())?);
    } else {
        println!("{}", stopwatch.formatted_time());
    }
    Ok(())
}

use clap::{Parser, Subcommand};
use loadgen::core::config::{Config, RunPlan};
use loadgen::core::profile::Profile;
use loadgen::core::rate::{Ticker, Unpaced};
use loadgen::core::traits::{EventSink, Pacer};
use loadgen::publisher::{
    watch_interrupts, Interrupt, Progress, Publisher, RunSummary, StopSignal,
};
use loadgen::sinks::{connect, SinkKind};
use loadgen::sources::synth::Synthesizer;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "loadgen")]
#[command(about = "Synthetic application log load generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Publish events to a sink at a fixed rate.
    Gen {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Events per second.
        #[arg(long, allow_negative_numbers = true)]
        rps: Option<i64>,
        /// Run length in seconds.
        #[arg(long, allow_negative_numbers = true)]
        seconds: Option<i64>,
        /// normal, error_burst, latency_spike or new_signature.
        #[arg(long)]
        profile: Option<String>,
        /// http(s):// endpoint, file:// directory, or a directory path.
        #[arg(long)]
        sink: Option<String>,
        /// Skip the sink and print a preview line per event.
        #[arg(long)]
        dry_run: bool,
        /// Print preview lines even when dry-run was not requested.
        #[arg(long, conflicts_with = "no_echo")]
        echo: bool,
        /// Keep a dry run silent.
        #[arg(long)]
        no_echo: bool,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        deploy_id: Option<String>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Publish as fast as the sink accepts.
        #[arg(long)]
        no_throttle: bool,
        /// Suppress progress lines.
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print synthesized events as JSON lines without publishing.
    Sample {
        #[arg(long, default_value = "normal")]
        profile: String,
        #[arg(short = 'n', long, default_value_t = 10)]
        count: u64,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Gen {
            config,
            rps,
            seconds,
            profile,
            sink,
            dry_run,
            echo,
            no_echo,
            seed,
            deploy_id,
            timeout_ms,
            no_throttle,
            quiet,
        } => {
            let mut loaded = match &config {
                Some(path) => Config::from_path(path)?,
                None => Config::default(),
            };

            if rps.is_some() {
                loaded.run.rps = rps;
            }
            if seconds.is_some() {
                loaded.run.seconds = seconds;
            }
            if profile.is_some() {
                loaded.run.profile = profile;
            }
            if seed.is_some() {
                loaded.run.seed = seed;
            }
            if deploy_id.is_some() {
                loaded.run.deploy_id = deploy_id;
            }
            if no_throttle {
                loaded.run.no_throttle = Some(true);
            }
            if sink.is_some() {
                loaded.sink.target = sink;
            }
            if dry_run {
                loaded.sink.dry_run = Some(true);
            }
            if echo {
                loaded.sink.echo = Some(true);
            }
            if no_echo {
                loaded.sink.echo = Some(false);
            }
            if timeout_ms.is_some() {
                loaded.sink.timeout_ms = timeout_ms;
            }

            // Everything that can be rejected is rejected before a sink exists.
            let plan = loaded.resolve()?;
            let kind = SinkKind::from_config(&loaded.sink)?;

            let stop = StopSignal::new();
            spawn_interrupt_watcher(stop.clone())?;

            let synthesizer = match loaded.run.deploy_id.clone() {
                Some(deploy_id) => Synthesizer::with_deploy_id(loaded.run.seed, deploy_id),
                None => Synthesizer::new(loaded.run.seed),
            };
            let sink = connect(kind);

            let summary = if loaded.run.no_throttle.unwrap_or(false) {
                execute(sink, synthesizer, Unpaced, stop, &plan, quiet)?
            } else {
                let ticker = Ticker::new(plan.interval());
                execute(sink, synthesizer, ticker, stop, &plan, quiet)?
            };
            print_summary(&summary);
        }
        Commands::Sample {
            profile,
            count,
            seed,
        } => {
            let profile: Profile = profile.parse()?;
            let mut synthesizer = Synthesizer::new(seed);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for _ in 0..count {
                let event = synthesizer.synthesize(profile);
                serde_json::to_writer(&mut out, &event)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
    }

    Ok(())
}

fn execute<S: EventSink, P: Pacer>(
    sink: S,
    synthesizer: Synthesizer,
    pacer: P,
    stop: StopSignal,
    plan: &RunPlan,
    quiet: bool,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let mut publisher = Publisher::new(sink, synthesizer, pacer, stop);
    print_banner(plan, publisher.deploy_id(), publisher.sink().name());
    let summary = publisher.run(plan, |progress| {
        if !quiet {
            print_progress(progress);
        }
    })?;
    Ok(summary)
}

/// Sets the stop signal on Ctrl-C. The run notices it between events.
/// A second Ctrl-C exits with status 130 without printing a summary.
fn spawn_interrupt_watcher(stop: StopSignal) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("interrupt-watcher".to_string())
        .spawn(move || {
            let outcome = runtime.block_on(watch_interrupts(&stop, tokio::signal::ctrl_c));
            if outcome == Interrupt::Forced {
                warn!("second interrupt, exiting immediately");
                std::process::exit(130);
            }
        })?;
    Ok(())
}

fn rule() -> String {
    "=".repeat(60)
}

fn print_banner(plan: &RunPlan, deploy_id: &str, sink: &str) {
    println!("\n{}", rule());
    println!("Starting log generation");
    println!("  Profile: {}", plan.profile);
    println!("  Rate: {} logs/sec", plan.events_per_second);
    println!("  Duration: {} seconds", plan.seconds);
    println!("  Total logs: {}", plan.total_events());
    println!("  Deploy ID: {deploy_id}");
    println!("  Sink: {sink}");
    println!("{}\n", rule());
}

fn print_progress(progress: &Progress) {
    println!(
        "Progress: {}/{} logs ({}%) | failed: {} | Actual RPS: {:.1}",
        progress.sent,
        progress.total,
        progress.percent(),
        progress.failed,
        progress.rate
    );
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", rule());
    if summary.interrupted() {
        println!("Generation interrupted");
    } else {
        println!("Generation complete");
    }
    println!("  Logs sent: {}", summary.succeeded);
    println!("  Errors: {}", summary.failed);
    println!("  Attempted: {}/{}", summary.attempted, summary.total);
    println!("  Duration: {:.1} seconds", summary.elapsed.as_secs_f64());
    println!("  Actual RPS: {:.1}", summary.achieved_rate());
    println!("{}", rule());
}

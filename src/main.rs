use anyhow::Context;
use clap::{Parser, Subcommand};
use smabot::api::BybitClient;
use smabot::clock::ClockSynchronizer;
use smabot::{CycleScheduler, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smabot")]
#[command(about = "Minute-synchronized SMA band trading bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading loop until interrupted
    Run {
        /// Log orders instead of submitting them
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a single cycle now and exit
    Once {
        /// Log orders instead of submitting them
        #[arg(long)]
        dry_run: bool,
    },
    /// Load and validate the configuration, then print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;

    match cli.command.unwrap_or(Commands::Run { dry_run: false }) {
        Commands::Run { dry_run } => run(settings, dry_run).await,
        Commands::Once { dry_run } => once(settings, dry_run).await,
        Commands::CheckConfig => {
            println!("{:#?}", settings);
            Ok(())
        }
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smabot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_scheduler(
    mut settings: Settings,
    dry_run: bool,
) -> anyhow::Result<CycleScheduler<BybitClient>> {
    settings.bot.dry_run |= dry_run;

    let client = BybitClient::new(&settings.exchange).context("Failed to build HTTP client")?;
    if !client.has_credentials() {
        tracing::warn!("BYBIT_API_KEY / BYBIT_API_SECRET not set, signed requests will be rejected");
    }
    if settings.bot.dry_run {
        tracing::warn!("Running in DRY RUN mode - no orders will be submitted");
    }

    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Symbol: {}", settings.bot.symbol);
    tracing::info!("  Order size: {}", settings.bot.order_size);
    tracing::info!("  Interval: {}m", settings.bot.interval);
    tracing::info!("  SMA period: {}", settings.bot.period);
    tracing::info!("  Threshold range: {}", settings.bot.threshold_range);
    tracing::info!("  Close truncation: {:?}", settings.bot.close_truncation);
    tracing::info!("  Exchange: {}", settings.exchange.base_url);

    Ok(CycleScheduler::new(settings.bot, client))
}

async fn run(settings: Settings, dry_run: bool) -> anyhow::Result<()> {
    tracing::info!("🚀 smabot starting");
    let mut scheduler = build_scheduler(settings, dry_run)?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
        }
        _ = scheduler.run() => {
            tracing::error!("Cycle scheduler exited unexpectedly");
        }
    }

    tracing::info!("👋 smabot stopped");
    Ok(())
}

async fn once(settings: Settings, dry_run: bool) -> anyhow::Result<()> {
    let scheduler = build_scheduler(settings, dry_run)?;

    let remote = ClockSynchronizer::new(scheduler.exchange())
        .remote_time()
        .await?;
    let report = scheduler.run_cycle(&remote).await?;

    println!("Signal:   {:?}", report.evaluation.signal);
    println!("SMA:      {:.4}", report.evaluation.sma);
    println!(
        "Band:     [{:.4}, {:.4}]",
        report.evaluation.thresholds.buy, report.evaluation.thresholds.sell
    );
    println!("Close:    {:.4}", report.evaluation.previous_close);
    println!("Decision: {}", report.decision.reason);
    for ack in &report.submitted {
        println!("Order:    {}", ack.order_id);
    }

    Ok(())
}

use anyhow::Result;
use beacon::api::analytics::{inject_repeated_visitors, AnalyticsQueryParams};
use beacon::config::Config;
use beacon::storage;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "beacon-admin")]
#[command(about = "Beacon storage management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the visitors table (and aggregation procedure) if missing
    Init,
    /// List stored visitors, newest first
    Visitors {
        /// Maximum number of rows to print
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Print the filtered aggregation as JSON
    Stats(StatsArgs),
}

#[derive(Args)]
struct StatsArgs {
    #[arg(long)]
    country: Option<String>,
    /// Lower bound on first_seen (any date/time format)
    #[arg(long)]
    start: Option<String>,
    /// Upper bound on first_seen
    #[arg(long)]
    end: Option<String>,
    /// `new` or `returning`
    #[arg(long)]
    visitor_type: Option<String>,
    #[arg(long)]
    device: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    browser: Option<String>,
    #[arg(long)]
    ip: Option<String>,
    #[arg(long)]
    isp: Option<String>,
    #[arg(long)]
    region: Option<String>,
}

impl From<StatsArgs> for AnalyticsQueryParams {
    fn from(args: StatsArgs) -> Self {
        AnalyticsQueryParams {
            country_filter: args.country,
            start_date_filter: args.start,
            end_date_filter: args.end,
            visitor_type_filter: args.visitor_type,
            device_filter: args.device,
            url_filter: args.url,
            browser_filter: args.browser,
            ip_filter: args.ip,
            isp_filter: args.isp,
            region_filter: args.region,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let storage = storage::connect(&config.storage).await?;

    match cli.command {
        Commands::Init => {
            storage.init().await?;
            println!("✓ Storage initialized");
        }
        Commands::Visitors { limit } => {
            let visitors = storage.list_visitors(limit.clamp(1, 1000)).await?;
            if visitors.is_empty() {
                println!("No visitors recorded yet.");
            } else {
                println!(
                    "{:<38} {:<16} {:<4} {:<8} {:<12} {:<22} {}",
                    "Session", "IP", "CC", "Device", "Browser", "First seen", "Time (s)"
                );
                println!("{}", "-".repeat(112));
                for v in visitors {
                    println!(
                        "{:<38} {:<16} {:<4} {:<8} {:<12} {:<22} {}",
                        v.session_id,
                        v.public_ip.as_deref().unwrap_or("-"),
                        v.country_code.as_deref().unwrap_or("-"),
                        v.device_type.as_deref().unwrap_or("-"),
                        v.browser.as_deref().unwrap_or("-"),
                        v.first_seen.as_deref().unwrap_or("-"),
                        v.time_spent_seconds
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
            }
        }
        Commands::Stats(args) => {
            let filters = AnalyticsQueryParams::from(args).into_filters();
            let mut data = storage.filtered_analytics(&filters).await?;
            inject_repeated_visitors(&mut data);
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}

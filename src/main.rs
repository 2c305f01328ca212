use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod config;
mod crawl;
mod espn;
mod extract;
mod fetch;
mod output;
mod progress;
mod sink;
mod telemetry;
mod ufcstats;

#[derive(Parser)]
#[command(name = "mma", about = "MMA events, fighters and fights scraped to JSON lines")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// ESPN schedules, event fight centers and fighter pages
    Espn(crawl::espn::EspnCmd),
    /// UFC Stats fighters, fights and events
    Ufc(crawl::ufcstats::UfcCmd),
    /// Run one page builder over a saved HTML file
    Parse(crawl::parse::ParseCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // stderr logging; respects RUST_LOG and MMA_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Espn(args) => crawl::espn::run(args).await?,
        Commands::Ufc(args) => crawl::ufcstats::run(args).await?,
        Commands::Parse(args) => crawl::parse::run(args).await?,
    }

    Ok(())
}

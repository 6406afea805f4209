use clap::Parser;
use procurement_etl::utils::error::ErrorSeverity;
use procurement_etl::utils::{logger, validation::Validate};
use procurement_etl::{CrawlPipeline, EtlEngine, LocalStorage, ScraperConfig};

#[derive(Parser, Debug)]
#[command(name = "procurement-etl")]
#[command(about = "Collects public procurement contracts by keyword and district into a CSV report")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "scraper-config.toml")]
    config: String,

    /// Override the report path from the config
    #[arg(short, long)]
    output: Option<String>,

    /// Enable debug logging for this crate
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Validate the configuration and show the search space without crawling
    #[arg(long)]
    dry_run: bool,
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Loading configuration from: {}", args.config);

    let mut config = match ScraperConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config file '{}': {}", args.config, e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(e.severity()).max(1));
        }
    };

    if let Some(output) = args.output {
        tracing::info!("Report path overridden to: {}", output);
        config.output.path = output;
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!(
        "{} keywords x {} districts = {} discovery pairs, report: {}",
        config.search.keywords.len(),
        config.districts.len(),
        config.search_space_size(),
        config.output_path()
    );

    if args.dry_run {
        tracing::info!("Dry run - no requests will be made");
        return Ok(());
    }

    let storage = LocalStorage::new(String::new());
    let pipeline = CrawlPipeline::new(storage, config)?;
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("Crawl completed, report saved to: {}", output_path);
            println!("✅ Report saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "Crawl failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let code = exit_code(e.severity());
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

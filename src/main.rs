use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::Parser;
use s1_acquire::asf::Provider;
use s1_acquire::catalog::{search_products, SearchQuery, DEFAULT_MAX_RESULTS};
use s1_acquire::config::{Config, Credentials, DEFAULT_CONFIG_PATH};
use s1_acquire::date_range::DateRange;
use s1_acquire::download_plan::DownloadPlan;
use s1_acquire::netrc;
use s1_acquire::pair_selection::{select_cross_month_pair, select_pair, Selection};
use s1_acquire::scene::{format_file_size, render_table, SceneRecord};
use std::path::PathBuf;

/// Sentinel-1 SLC search, InSAR pair selection and download
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Settings file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Start date (YYYY-MM-DD), defaults to the configured range
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive, defaults to the configured range
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Maximum number of search results per query
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Download the products after searching
    #[arg(long)]
    download: bool,

    /// Maximum number of products to download (default: all)
    #[arg(long)]
    max_products: Option<usize>,

    /// Select an InSAR pair instead of listing every result
    #[arg(long)]
    pair: bool,

    /// Target temporal baseline in days for pair selection
    #[arg(long, default_value_t = 12, allow_negative_numbers = true)]
    temporal_baseline: i64,

    /// Select a pair with the reference in the first month and the secondary in the second
    #[arg(long, num_args = 2, value_names = ["YYYY-MM", "YYYY-MM"])]
    month_pair: Option<Vec<String>>,

    /// Also write the download plan as JSON
    #[arg(long)]
    plan_out: Option<PathBuf>,

    /// Write the Earthdata login from the credentials file to ~/.netrc and exit
    #[arg(long)]
    write_netrc: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    if args.write_netrc {
        return write_netrc(&config);
    }

    println!("====================================");
    println!("Sentinel-1 data search");
    println!("====================================");

    let provider = Provider::from_config(&config)?;

    let scenes = match &args.month_pair {
        Some(months) => month_pair_search(&provider, &config, &args, months).await?,
        None if args.pair => pair_search(&provider, &config, &args).await,
        None => {
            let range = date_range(&config, &args);
            println!("Search period: {}\n", range);
            let query = SearchQuery::new(&config, range, args.max_results);
            let scenes = search_products(&provider, &query).await;
            display(&scenes);
            scenes
        }
    };

    let plan = DownloadPlan::from_scenes(&scenes, &config.raw_data_dir(), args.max_products);
    if let Some(path) = &args.plan_out {
        plan.write(path)?;
        log::info!("Download plan written to {}", path.display());
    }

    if scenes.is_empty() {
        return Ok(());
    }

    if !args.download {
        println!("\nTip: add --download to fetch the products");
        println!("  e.g. s1-acquire --download --max-products 2");
        return Ok(());
    }

    if !provider.can_download() {
        log::error!("ASF session is not initialised");
        log::error!(
            "Set the ASF login in {}",
            config.credentials_path().display()
        );
        return Ok(());
    }

    println!("\nStarting download...");
    let downloaded = plan.execute(&provider).await;
    println!("\nDownload complete: {} file(s)", downloaded.len());
    Ok(())
}

fn date_range(config: &Config, args: &Args) -> DateRange {
    let defaults = config.date_range();
    DateRange::new(
        args.start_date.unwrap_or(defaults.start),
        args.end_date.unwrap_or(defaults.end),
    )
}

fn display(scenes: &[SceneRecord]) {
    if scenes.is_empty() {
        println!("No products found.");
        return;
    }
    println!("{}", render_table("Sentinel-1 search results (ASF)", scenes));
}

/// Prints the outcome and returns the scenes worth downloading: both halves of a pair, or
/// nothing.
fn report(selection: &Selection) -> Vec<SceneRecord> {
    match selection {
        Selection::Pair(pair) => {
            display(&pair.scenes());
            println!(
                "\nTemporal baseline: {} days (acquisition time {} UTC)",
                pair.temporal_baseline_days, pair.frame_time
            );
            println!(
                "Reference: {} ({})",
                pair.reference.title,
                format_file_size(pair.reference.size_bytes)
            );
            println!(
                "Secondary: {} ({})",
                pair.secondary.title,
                format_file_size(pair.secondary.size_bytes)
            );
            pair.scenes()
        }
        Selection::Empty => {
            println!("No products found.");
            vec![]
        }
        Selection::NoSuitableFrame { frame_time, scenes } => {
            println!(
                "Only {} scene(s) acquired at {} UTC, no pair available",
                scenes.len(),
                frame_time
            );
            display(scenes);
            vec![]
        }
        Selection::NoMatchingPair { frame_time, scenes } => {
            println!(
                "No admissible pair among {} scene(s) acquired at {} UTC",
                scenes.len(),
                frame_time
            );
            display(scenes);
            vec![]
        }
    }
}

async fn pair_search(provider: &Provider, config: &Config, args: &Args) -> Vec<SceneRecord> {
    let range = date_range(config, args);
    println!(
        "Pair search: {} (target baseline {} days)\n",
        range, args.temporal_baseline
    );
    let query = SearchQuery::new(config, range, args.max_results);
    let scenes = search_products(provider, &query).await;
    report(&select_pair(&scenes, args.temporal_baseline))
}

async fn month_pair_search(
    provider: &Provider,
    config: &Config,
    args: &Args,
    months: &[String],
) -> Result<Vec<SceneRecord>> {
    let [first, second] = months else {
        return Err(anyhow!("--month-pair takes exactly two months"));
    };
    let first = DateRange::month(first)?;
    let second = DateRange::month(second)?;
    println!(
        "Month pair search: {} / {} (target baseline {} days)\n",
        first.label(),
        second.label(),
        args.temporal_baseline
    );

    let mut scenes = vec![];
    for range in [first, second] {
        let query = SearchQuery::new(config, range, args.max_results);
        scenes.extend(search_products(provider, &query).await);
    }

    let selection = select_cross_month_pair(&scenes, args.temporal_baseline, &first, &second);
    Ok(report(&selection))
}

fn write_netrc(config: &Config) -> Result<()> {
    let login = Credentials::read(config.credentials_path())?.asf_login()?;
    let path = netrc::default_netrc_path()?;
    netrc::write_netrc(&path, &login)?;
    println!("{} written for user {}", path.display(), login.username);
    Ok(())
}

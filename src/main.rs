use clap::{Parser, Subcommand};
use sat_cities::config::{self, Credentials};
use sat_cities::map::MapboxClient;
use sat_cities::run::{self, RunOptions};
use sat_cities::selection::{
    FileUsedIdStore, MemoryUsedIdStore, SelectionError, UsedIdStore, remaining,
};
use sat_cities::twitter::TwitterClient;
use sat_cities::{dataset, imaging, output};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sat-cities")]
#[command(about = "Post a satellite view of a random, not yet posted city")]
#[command(long_about = "\
Post a satellite view of a random, not yet posted city

Each run picks an unused city from the dataset, downloads a Mapbox satellite
tile, derives a primary image and a closer zoom image, marks the city as used
and posts both to X/Twitter as a post and a threaded reply.

Files:

  bot.toml     # Optional settings; 'sat-cities gen-config' prints all keys
  cities.csv   # id,latitude,longitude,name,state,county
  used.txt     # Append-only list of posted ids
  .env         # Credentials (optional; the environment works too)

Credentials:
  MAPBOX_TOKEN                          map tiles (every command that fetches)
  API_KEY, API_KEY_SECRET,
  ACCESS_TOKEN, ACCESS_TOKEN_SECRET,
  BEARER_TOKEN                          posting (run without --dry-run)

Log verbosity follows RUST_LOG (default: info).")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "bot.toml", global = true)]
    config: PathBuf,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Derive images but neither mark the city as used nor post
    #[arg(long)]
    dry_run: bool,

    /// Also write primary.jpg and zoom.jpg to this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Pick a city, derive its images and post them
    Run(RunArgs),
    /// Validate config and dataset, report how many cities remain
    Check,
    /// Run the image pipeline on a local file
    Preview {
        /// Raw satellite image (JPEG, PNG or WebP)
        input: PathBuf,
        /// Directory for primary.jpg and zoom.jpg
        output_dir: PathBuf,
    },
    /// Print a stock bot.toml with all options documented
    GenConfig,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = execute(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Run(args) => {
            config::load_env_file(cli.env_file.as_deref())?;
            if args.dry_run {
                let token = config::mapbox_token_from_env()?;
                let bot_config = config::load_config(&cli.config)?;
                let candidates = dataset::load_dataset(&bot_config.data.dataset)?;
                let store = MemoryUsedIdStore::snapshot_of(&FileUsedIdStore::new(
                    &bot_config.data.used_ids,
                ))?;
                let map = MapboxClient::new(bot_config.map.clone(), token)?;
                let options = run_options(&bot_config, args.save_dir);

                info!("Dry run: nothing will be marked or posted");
                let report =
                    run::run_once(&candidates, &store, &map, None, &options, &mut rand::rng())?;
                output::print_run_report(&report);
            } else {
                let credentials = Credentials::from_env()?;
                let bot_config = config::load_config(&cli.config)?;
                let candidates = dataset::load_dataset(&bot_config.data.dataset)?;
                let store = FileUsedIdStore::new(&bot_config.data.used_ids);
                let map = MapboxClient::new(bot_config.map.clone(), credentials.mapbox_token)?;
                let social = TwitterClient::new(&bot_config.post, credentials.twitter)?;
                let options = run_options(&bot_config, args.save_dir);

                let report = run::run_once(
                    &candidates,
                    &store,
                    &map,
                    Some(&social),
                    &options,
                    &mut rand::rng(),
                )?;
                output::print_run_report(&report);
            }
        }
        Command::Check => {
            let bot_config = config::load_config(&cli.config)?;
            let candidates = dataset::load_dataset(&bot_config.data.dataset)?;
            let used = FileUsedIdStore::new(&bot_config.data.used_ids).load()?;
            let left = remaining(&candidates, &used);
            output::print_check(
                &bot_config.data.dataset,
                candidates.len(),
                &bot_config.data.used_ids,
                used.len(),
                left,
            );
            if left == 0 {
                return Err(SelectionError::Exhausted {
                    total: candidates.len(),
                }
                .into());
            }
        }
        Command::Preview { input, output_dir } => {
            let bot_config = config::load_config(&cli.config)?;
            let raw = std::fs::read(&input)?;
            let pair = imaging::derive_pair(&raw, &bot_config.imaging.to_params())?;
            let (primary_path, zoom_path) = pair.save_to(&output_dir)?;
            output::print_preview(&pair, &primary_path, &zoom_path);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_options(bot_config: &config::BotConfig, save_dir: Option<PathBuf>) -> RunOptions {
    RunOptions {
        params: bot_config.imaging.to_params(),
        caption_prefix: bot_config.post.caption_prefix.clone(),
        save_dir,
    }
}

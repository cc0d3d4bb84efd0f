use std::{
    error::Error,
    io,
    path::{Path, PathBuf},
    process,
};

use clap::{command, Parser, ValueHint};
use log::{debug, error, info, warn, LevelFilter};
use url::Url;

use downpour::{
    client_id::{self, ClientId},
    config::Config,
    download::DownloadOptions,
    entity::Kind,
    error::Error as DownpourError,
    gateway::Gateway,
    http, scrape,
    set::Set,
    track::Track,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Track or set URL to download
    #[arg(value_name = "URL", value_hint = ValueHint::Url)]
    url: String,

    /// Directory to write downloaded audio into
    #[arg(short, long, value_name = "DIR", value_hint = ValueHint::DirPath, default_value = ".")]
    output: PathBuf,

    /// Secrets file
    ///
    /// Stores the client id used against the API. The file is created
    /// automatically the first time an id is scraped.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, default_value_t = String::from("secrets.toml"))]
    secrets_file: String,

    /// Skip writing title, artist and cover art into the audio
    #[arg(long, default_value_t = false)]
    no_metadata: bool,

    /// Print the stream URL instead of downloading
    #[arg(long, default_value_t = false)]
    stream_url: bool,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Parameters
///
/// - `config`: a `&Args` with the command line arguments.
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            0 => {
                // Quiet and verbose are mutually exclusive, and `verbose` is 0
                // by default. So this arm means: quiet mode.
                LevelFilter::Warn
            }
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

/// Loads the stored client id, scraping a fresh one on first run.
async fn obtain_client_id(
    http_client: &http::Client,
    secrets_file: &str,
) -> Result<ClientId, Box<dyn Error>> {
    match client_id::load(secrets_file) {
        Ok(client_id) => Ok(client_id),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("no client id stored yet, scraping one from the web app");
            let client_id = scrape::scrape_client_id(http_client, &Gateway::probe_url()).await?;
            store_client_id(secrets_file, &client_id);
            Ok(client_id)
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Persists `client_id` for the next run.
fn store_client_id(secrets_file: &str, client_id: &ClientId) {
    // A failed write only costs a re-scrape on the next run.
    if let Err(e) = client_id::store(secrets_file, client_id) {
        warn!("could not store client id in {secrets_file}: {e}");
    }
}

/// Downloads every track of the set at `sc_url`, in listing order.
async fn download_set(
    gateway: &Gateway,
    sc_url: Url,
    output: &Path,
    options: &DownloadOptions,
) -> Result<(), Box<dyn Error>> {
    let mut set = Set::new(gateway, sc_url)?;
    let tracks = set.tracks().await?;
    info!("downloading {set}");

    for mut track in tracks {
        match track.download(options).await {
            Ok(downloaded) => {
                let path = downloaded.write_to_file(output)?;
                info!("saved {downloaded} to {}", path.display());
            }
            // Keep going; the rest of the set may still download fine.
            Err(e) => error!("skipping {track}: {e}"),
        }
    }

    Ok(())
}

/// Main application flow.
///
/// # Errors
///
/// This function returns an error when the URL does not parse, the client
/// id cannot be obtained, or the download fails.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let sc_url = args.url.parse::<Url>()?;
    let config = Config::new();
    let http_client = http::Client::new(&config)?;

    let client_id = obtain_client_id(&http_client, &args.secrets_file).await?;
    let mut gateway = Gateway::new(&config, client_id)?;

    if !gateway.verify().await? {
        info!("stored client id no longer accepted, scraping a fresh one");
        let client_id = scrape::scrape_client_id(&http_client, &Gateway::probe_url()).await?;
        store_client_id(&args.secrets_file, &client_id);
        gateway = Gateway::new(&config, client_id)?;
    }

    if args.stream_url {
        let mut track = Track::new(&gateway, sc_url)?;
        println!("{}", track.stream_url().await?);
        return Ok(());
    }

    let options = DownloadOptions {
        metadata: !args.no_metadata,
    };

    match Track::new(&gateway, sc_url.clone()) {
        Ok(mut track) => {
            let downloaded = track.download(&options).await?;
            let path = downloaded.write_to_file(&args.output)?;
            info!("saved {downloaded} to {}", path.display());
            Ok(())
        }
        Err(DownpourError::WrongEntityKind {
            actual: Kind::Set, ..
        }) => download_set(&gateway, sc_url, &args.output, &options).await,
        Err(e) => Err(Box::new(e)),
    }
}

/// Main entry point of the application.
///
/// This function initializes the logger facade, parses the command line
/// arguments, and starts the main application flow.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}

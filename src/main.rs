/// Site cache probe tool
///
/// Runs the full Installing -> Active lifecycle against the configured
/// origin, then pushes the given URLs through the interception path
/// and reports what came back and where it came from.
///
/// Usage: sitecache --url https://tokensite.io/ [--navigate] [--config sitecache.json]

use clap::{ Arg, ArgAction, Command };
use std::process;
use std::sync::Arc;
use url::Url;

use sitecache::cache::MemoryStore;
use sitecache::core::SiteConfig;
use sitecache::fetch::{ FetchRequest, HttpBackend };
use sitecache::lifecycle::LifecycleController;

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = Command::new("sitecache")
        .version("0.1.0")
        .about("Request cache probe for the token site")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG_PATH")
                .help("Path to a JSON config file (defaults apply without one)")
                .required(false)
        )
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("URL to fetch through the cache (repeatable)")
                .action(ArgAction::Append)
                .required(true)
        )
        .arg(
            Arg::new("navigate")
                .short('n')
                .long("navigate")
                .help("Treat the URLs as navigations (offline page fallback applies)")
                .action(ArgAction::SetTrue)
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let config = match SiteConfig::load_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config: {}", e);
            process::exit(1);
        }
    };

    let backend = match HttpBackend::new(config.network.request_timeout_secs) {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("Failed to initialize HTTP backend: {}", e);
            process::exit(1);
        }
    };

    let controller = LifecycleController::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(backend)
    );

    if let Err(e) = controller.install().await {
        log::error!("Install failed: {}", e);
        process::exit(1);
    }
    if let Err(e) = controller.activate().await {
        log::error!("Activate failed: {}", e);
        process::exit(1);
    }

    let navigate = matches.get_flag("navigate");
    let mut failures = 0;
    for raw in matches.get_many::<String>("url").unwrap() {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                log::error!("Invalid URL {}: {}", raw, e);
                failures += 1;
                continue;
            }
        };

        let mut request = FetchRequest::get(url);
        if navigate {
            request = request.navigate();
        }

        match controller.handle_fetch(&request).await {
            Ok(response) => {
                let source = if response.from_cache { "cache" } else { "network" };
                println!(
                    "{} {} {} ({} bytes, {})",
                    response.status,
                    response.status_text,
                    raw,
                    response.body.len(),
                    source
                );
            }
            Err(e) => {
                log::error!("Fetch failed for {}: {}", raw, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        process::exit(1);
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use rsswatch::app::{App, AppEvent};
use rsswatch::config::Config;
use rsswatch::feed::{PollScheduler, ProxyClient};
use rsswatch::i18n::Locale;
use rsswatch::ui::{self, Renderer};

/// Get the default config file path (~/.config/rsswatch/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("rsswatch")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "rsswatch", about = "Terminal RSS/Atom aggregator with live polling")]
struct Args {
    /// Feed URLs to subscribe to at startup
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Config file (defaults to ~/.config/rsswatch/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CORS proxy endpoint, overrides `proxy_url`
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Poll delay in milliseconds, overrides `poll_interval_ms`
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Display language, overrides `locale`
    #[arg(long, value_enum)]
    locale: Option<Locale>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is the presentation surface.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config
        .apply_overrides(args.proxy, args.interval_ms, args.locale)
        .context("Invalid command-line option")?;

    let client = ProxyClient::new(config.proxy_base()?, config.request_timeout())
        .context("Failed to create HTTP client")?
        .max_response_bytes(config.max_response_bytes);

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(64);
    let mut app = App::new(client.clone(), event_tx.clone());
    app.locale = config.locale;

    let renderer = Renderer::for_stdout();
    let mut stdout = std::io::stdout();

    for url in &args.urls {
        let changes = app.submit_and_wait(url).await;
        renderer.render(&mut stdout, app.state(), app.locale, changes)?;
    }

    let poller = PollScheduler::new(client, config.poll_interval())
        .concurrency(config.max_concurrent_fetches)
        .spawn(app.watch_feeds(), event_tx);

    let stdin = BufReader::new(tokio::io::stdin());
    let result = ui::run(&mut app, event_rx, stdin, &renderer, &mut stdout).await;

    poller.stop().await;
    result
}

use anyhow::Context;
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;
use wikipath::commands::command_argument_builder;
use wikipath::handlers::{read_endpoints, render_links, render_response, service_config_from_args};
use wikipath_core::gateway::Gateway;
use wikipath_core::{Service, client, startup};
use wikipath_scanner::Grabber;

const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let chosen_command = command_argument_builder().get_matches();

    let outcome = match chosen_command.subcommand() {
        Some(("serve", primary_command)) => handle_serve(primary_command).await,
        Some(("find", primary_command)) => handle_find(primary_command).await,
        Some(("links", primary_command)) => handle_links(primary_command).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// Handler functions
async fn handle_serve(args: &ArgMatches) -> anyhow::Result<()> {
    let config = service_config_from_args(args).map_err(anyhow::Error::msg)?;
    let fetch_timeout = Duration::from_secs(*args.get_one::<u64>("fetch-timeout").unwrap_or(&10));

    if let Some(endpoint) = &config.wait_for {
        startup::wait_for(endpoint, config.startup_timeout, STARTUP_POLL_INTERVAL)
            .await
            .context("Dependency never became reachable")?;
    }

    let grabber = Grabber::with_timeout(fetch_timeout).context("Could not build HTTP client")?;
    let service = Service::start(&config, Arc::new(grabber));

    let listener = match TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            service.shutdown().await;
            return Err(e).with_context(|| format!("Could not bind {}", config.listen_addr));
        }
    };
    info!(
        "Serving searches on {} ({} listeners, {} workers)",
        config.listen_addr, config.reply_listeners, config.crawl_workers
    );

    let gateway = Arc::new(Gateway::new(Arc::clone(service.pathfinder())));
    let served = tokio::select! {
        result = gateway.serve(listener) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    service.shutdown().await;
    if let Err(e) = &served {
        error!("Gateway stopped: {}", e);
    }
    served.context("Search gateway failed")
}

async fn handle_find(args: &ArgMatches) -> anyhow::Result<()> {
    let (source, target) = read_endpoints(
        args.get_one::<String>("SOURCE"),
        args.get_one::<String>("TARGET"),
        io::stdin().lock(),
    )
    .map_err(anyhow::Error::msg)?;
    let server = args
        .get_one::<String>("server")
        .context("Missing --server")?;
    let as_json = args.get_flag("json");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Searching {} -> {}", source, target));

    let response = client::find(server.as_str(), &source, &target).await;
    spinner.finish_and_clear();
    let response = response.with_context(|| format!("Could not query {}", server))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_response(&response));
    }
    Ok(())
}

async fn handle_links(args: &ArgMatches) -> anyhow::Result<()> {
    let url = args.get_one::<Url>("URL").context("Missing URL")?;
    let fetch_timeout = Duration::from_secs(*args.get_one::<u64>("fetch-timeout").unwrap_or(&10));

    let grabber = Grabber::with_timeout(fetch_timeout).context("Could not build HTTP client")?;
    let page = grabber
        .fetch_links(url.as_str())
        .await
        .with_context(|| format!("Could not fetch {}", url))?;

    print!("{}", render_links(&page));
    Ok(())
}

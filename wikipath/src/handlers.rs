use clap::ArgMatches;
use colored::Colorize;
use std::io::BufRead;
use std::time::Duration;
use wikipath_core::ServiceConfig;
use wikipath_core::config::{BrokerConfig, OverflowPolicy};
use wikipath_core::gateway::FindResponse;
use wikipath_scanner::PageLinks;

// Helper functions for the serve handler

/// Build the service configuration from `serve` arguments
pub fn service_config_from_args(args: &ArgMatches) -> Result<ServiceConfig, String> {
    let secs = |name: &str| {
        args.get_one::<u64>(name)
            .copied()
            .map(Duration::from_secs)
            .ok_or_else(|| format!("Missing --{}", name))
    };
    let overflow = args
        .get_one::<String>("overflow")
        .map(|policy| policy.parse::<OverflowPolicy>())
        .transpose()?
        .unwrap_or_default();

    let mut config = ServiceConfig::default()
        .with_search_deadline(secs("deadline")?)
        .with_discovery_timeout(secs("discovery-timeout")?)
        .with_startup_timeout(secs("startup-timeout")?)
        .with_wait_for(args.get_one::<String>("wait-for").cloned());

    if let Some(listen) = args.get_one::<String>("listen") {
        config = config.with_listen_addr(listen.clone());
    }
    if let Some(listeners) = args.get_one::<usize>("listeners") {
        config = config.with_reply_listeners(*listeners);
    }
    if let Some(workers) = args.get_one::<usize>("workers") {
        config = config.with_crawl_workers(*workers);
    }
    if let Some(attempts) = args.get_one::<u32>("max-attempts") {
        config = config.with_max_crawl_attempts(*attempts);
    }
    if let Some(domain) = args.get_one::<String>("allowed-domain") {
        config = config.with_allowed_domain(domain.clone());
    }

    let mut broker = BrokerConfig::default();
    if let Some(capacity) = args.get_one::<usize>("queue-capacity") {
        broker.queue_capacity = *capacity;
    }
    broker.overflow = overflow;

    Ok(config.with_broker(broker))
}

// Helper functions for the find handler

/// Take source and target from the arguments, reading any missing one from `input`
pub fn read_endpoints<R: BufRead>(
    source: Option<&String>,
    target: Option<&String>,
    mut input: R,
) -> Result<(String, String), String> {
    let mut next_line = |what: &str| -> Result<String, String> {
        let mut line = String::new();
        input
            .read_line(&mut line)
            .map_err(|e| format!("Could not read {} URL: {}", what, e))?;
        let line = line.trim();
        if line.is_empty() {
            return Err(format!("No {} URL given", what));
        }
        Ok(line.to_string())
    };

    let source = match source {
        Some(source) => source.clone(),
        None => next_line("source")?,
    };
    let target = match target {
        Some(target) => target.clone(),
        None => next_line("target")?,
    };
    Ok((source, target))
}

/// Render a search response for the terminal
pub fn render_response(response: &FindResponse) -> String {
    let mut report = String::new();
    match response {
        FindResponse::Found { path, length } => {
            report.push_str(&format!(
                "{} Found a path of length {}\n\n",
                "✓".green(),
                length
            ));
            for (hop, page) in path.iter().enumerate() {
                report.push_str(&format!("  {:>2} {}\n", hop.to_string().cyan(), page));
            }
        }
        FindResponse::Failed { error } => {
            report.push_str(&format!(
                "{} {} {}\n",
                "✗".red(),
                format!("[{}]", error.kind).yellow(),
                error.message
            ));
        }
    }
    report
}

/// Render the links a worker would report for a page
pub fn render_links(page: &PageLinks) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "{} {} ({} links, {:?})\n\n",
        page.status_code.to_string().green(),
        page.url,
        page.links.len(),
        page.response_time
    ));
    for link in &page.links {
        report.push_str(&format!("  {}\n", link));
    }
    report
}

use crate::CLAP_STYLING;
use clap::{arg, command};
use wikipath_core::config::{DEFAULT_ALLOWED_DOMAIN, DEFAULT_LISTEN_ADDR, DEFAULT_SERVER_ADDR};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikipath")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikipath")
        .styles(CLAP_STYLING)
        .subcommand_required(true)
        .subcommand(
            command!("serve")
                .about(
                    "Run the pathfinder service: reply listeners, crawl workers and the search \
                gateway.",
                )
                .arg(
                    arg!(-l --"listen" <ADDR>)
                        .required(false)
                        .help("Address the search gateway listens on")
                        .env("WIKIPATH_LISTEN")
                        .default_value(DEFAULT_LISTEN_ADDR),
                )
                .arg(
                    arg!(--"listeners" <NUM_LISTENERS>)
                        .required(false)
                        .help("Number of reply-listener tasks draining the results queue")
                        .env("WIKIPATH_LISTENERS")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("32"),
                )
                .arg(
                    arg!(-t --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("Number of crawl workers fetching pages")
                        .env("WIKIPATH_CRAWL_WORKERS")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("8"),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help("Overall deadline for a single search")
                        .env("WIKIPATH_DEADLINE_SECS")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("120"),
                )
                .arg(
                    arg!(--"discovery-timeout" <SECONDS>)
                        .required(false)
                        .help("How long a search waits for one page's links")
                        .env("WIKIPATH_DISCOVERY_TIMEOUT_SECS")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"max-attempts" <NUM>)
                        .required(false)
                        .help("Fetch attempts per page before the failure is reported")
                        .env("WIKIPATH_MAX_ATTEMPTS")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"queue-capacity" <NUM>)
                        .required(false)
                        .help("Capacity of each broker queue")
                        .env("WIKIPATH_QUEUE_CAPACITY")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("100000"),
                )
                .arg(
                    arg!(--"overflow" <POLICY>)
                        .required(false)
                        .help("What publishers do when a queue is full")
                        .env("WIKIPATH_OVERFLOW")
                        .value_parser(["block", "reject"])
                        .default_value("block"),
                )
                .arg(
                    arg!(-d --"allowed-domain" <DOMAIN>)
                        .required(false)
                        .help("Only URLs on this domain (or its subdomains) are accepted")
                        .env("WIKIPATH_ALLOWED_DOMAIN")
                        .default_value(DEFAULT_ALLOWED_DOMAIN),
                )
                .arg(
                    arg!(--"wait-for" <URL>)
                        .required(false)
                        .help("Endpoint that must accept connections before serving")
                        .env("WIKIPATH_WAIT_FOR"),
                )
                .arg(
                    arg!(--"startup-timeout" <SECONDS>)
                        .required(false)
                        .help("How long to wait for --wait-for before giving up")
                        .env("WIKIPATH_STARTUP_TIMEOUT_SECS")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"fetch-timeout" <SECONDS>)
                        .required(false)
                        .help("HTTP timeout for a single page fetch")
                        .env("WIKIPATH_FETCH_TIMEOUT_SECS")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
        .subcommand(
            command!("find")
                .about(
                    "Ask a running service for the shortest path between two pages. Reads the \
                URLs from stdin, one per line, when they are not given.",
                )
                .arg(arg!([SOURCE]).required(false).help("The page to start from"))
                .arg(arg!([TARGET]).required(false).help("The page to reach"))
                .arg(
                    arg!(-s --"server" <ADDR>)
                        .required(false)
                        .help("Address of the wikipath service")
                        .env("WIKIPATH_SERVER_ADDR")
                        .default_value(DEFAULT_SERVER_ADDR),
                )
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Print the raw JSON response")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("links")
                .about("Fetch a page and list the links a crawl worker would report for it")
                .arg(
                    arg!(<URL>)
                        .required(true)
                        .help("The page to fetch")
                        .value_parser(clap::value_parser!(url::Url)),
                )
                .arg(
                    arg!(--"fetch-timeout" <SECONDS>)
                        .required(false)
                        .help("HTTP timeout for the page fetch")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
}

use std::io::Cursor;
use std::time::Duration;
use wikipath::commands::command_argument_builder;
use wikipath::handlers::*;
use wikipath_core::config::OverflowPolicy;
use wikipath_core::gateway::{ErrorBody, FindResponse};
use wikipath_scanner::PageLinks;

fn serve_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["wikipath", "serve"];
    argv.extend_from_slice(args);
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .expect("serve arguments should parse");
    let (_, serve) = matches.subcommand().expect("serve subcommand");
    serve.clone()
}

#[test]
fn test_service_config_defaults() {
    let config = service_config_from_args(&serve_matches(&[])).unwrap();

    assert_eq!(config.reply_listeners, 32);
    assert_eq!(config.crawl_workers, 8);
    assert_eq!(config.search_deadline, Duration::from_secs(120));
    assert_eq!(config.discovery_timeout, Duration::from_secs(30));
    assert_eq!(config.max_crawl_attempts, 3);
    assert_eq!(config.broker.queue_capacity, 100_000);
    assert_eq!(config.broker.overflow, OverflowPolicy::Block);
    assert_eq!(config.wait_for, None);
}

#[test]
fn test_service_config_from_flags() {
    let config = service_config_from_args(&serve_matches(&[
        "--listen",
        "127.0.0.1:9000",
        "--listeners",
        "4",
        "-t",
        "2",
        "--deadline",
        "15",
        "--overflow",
        "reject",
        "-d",
        "example.org",
        "--wait-for",
        "amqp://broker",
    ]))
    .unwrap();

    assert_eq!(config.listen_addr, "127.0.0.1:9000");
    assert_eq!(config.reply_listeners, 4);
    assert_eq!(config.crawl_workers, 2);
    assert_eq!(config.search_deadline, Duration::from_secs(15));
    assert_eq!(config.broker.overflow, OverflowPolicy::Reject);
    assert_eq!(config.allowed_domain, "example.org");
    assert_eq!(config.wait_for.as_deref(), Some("amqp://broker"));
}

#[test]
fn test_zero_counts_clamped() {
    let config =
        service_config_from_args(&serve_matches(&["--listeners", "0", "--workers", "0"])).unwrap();
    assert_eq!(config.reply_listeners, 1);
    assert_eq!(config.crawl_workers, 1);
}

#[test]
fn test_unknown_overflow_policy_rejected_by_parser() {
    let result =
        command_argument_builder().try_get_matches_from(["wikipath", "serve", "--overflow", "drop"]);
    assert!(result.is_err());
}

#[test]
fn test_subcommand_required() {
    let result = command_argument_builder().try_get_matches_from(["wikipath"]);
    assert!(result.is_err());
}

#[test]
fn test_read_endpoints_from_args() {
    let source = "https://en.wikipedia.org/wiki/A".to_string();
    let target = "https://en.wikipedia.org/wiki/B".to_string();

    let (s, t) = read_endpoints(Some(&source), Some(&target), Cursor::new("")).unwrap();
    assert_eq!(s, source);
    assert_eq!(t, target);
}

#[test]
fn test_read_endpoints_from_input() {
    let input = Cursor::new("  https://en.wikipedia.org/wiki/A \nhttps://en.wikipedia.org/wiki/B\n");

    let (s, t) = read_endpoints(None, None, input).unwrap();
    assert_eq!(s, "https://en.wikipedia.org/wiki/A");
    assert_eq!(t, "https://en.wikipedia.org/wiki/B");
}

#[test]
fn test_read_endpoints_mixed() {
    let source = "https://en.wikipedia.org/wiki/A".to_string();
    let input = Cursor::new("https://en.wikipedia.org/wiki/B\n");

    let (s, t) = read_endpoints(Some(&source), None, input).unwrap();
    assert_eq!(s, source);
    assert_eq!(t, "https://en.wikipedia.org/wiki/B");
}

#[test]
fn test_read_endpoints_missing_target() {
    let input = Cursor::new("https://en.wikipedia.org/wiki/A\n");

    let err = read_endpoints(None, None, input).unwrap_err();
    assert!(err.contains("target"));
}

#[test]
fn test_render_found_response() {
    colored::control::set_override(false);
    let response = FindResponse::Found {
        path: vec![
            "https://en.wikipedia.org/wiki/A".to_string(),
            "https://en.wikipedia.org/wiki/B".to_string(),
        ],
        length: 2,
    };

    let report = render_response(&response);
    assert!(report.contains("length 2"));
    assert!(report.contains(" 0 https://en.wikipedia.org/wiki/A"));
    assert!(report.contains(" 1 https://en.wikipedia.org/wiki/B"));
}

#[test]
fn test_render_failed_response() {
    colored::control::set_override(false);
    let response = FindResponse::Failed {
        error: ErrorBody {
            kind: "no_path".to_string(),
            message: "no path exists".to_string(),
        },
    };

    let report = render_response(&response);
    assert!(report.contains("[no_path]"));
    assert!(report.contains("no path exists"));
}

#[test]
fn test_render_links() {
    colored::control::set_override(false);
    let mut page = PageLinks::new("https://en.wikipedia.org/wiki/A".to_string());
    page.status_code = 200;
    page.response_time = Duration::from_millis(12);
    page.links = vec!["https://en.wikipedia.org/wiki/B".to_string()];

    let report = render_links(&page);
    assert!(report.contains("200 https://en.wikipedia.org/wiki/A (1 links"));
    assert!(report.contains("  https://en.wikipedia.org/wiki/B\n"));
}

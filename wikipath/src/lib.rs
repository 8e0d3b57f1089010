// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;
pub mod commands;

// Re-export commonly used handler functions for convenience
pub use handlers::{read_endpoints, render_links, render_response, service_config_from_args};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub mod broker;
pub mod client;
pub mod config;
pub mod correlation;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod graph;
pub mod pathfinder;
pub mod protocol;
pub mod service;
pub mod startup;
pub mod validate;
pub mod visited;
pub mod worker;

pub use config::ServiceConfig;
pub use error::{DiscoveryError, SearchError};
pub use pathfinder::{Pathfinder, SearchPath};
pub use service::Service;

pub mod error;
pub mod filter;
pub mod grabber;
pub mod result;

pub use error::ScanError;
pub use filter::LinkFilter;
pub use grabber::Grabber;
pub use result::PageLinks;

//! Configuration module

mod site;

pub use site::FeedConfig;
pub use site::SearchConfig;
pub use site::ServerConfig;
pub use site::SiteConfig;

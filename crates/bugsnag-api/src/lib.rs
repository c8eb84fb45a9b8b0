pub mod client;
pub mod fetcher;
pub mod link;
pub mod paginate;
pub mod types;

pub use client::{BugsnagClient, ErrorSource};
pub use fetcher::{HttpFetcher, Page, PageFetcher, PageRequest};
pub use link::parse_next_link;
pub use paginate::Paginator;
pub use types::{ErrorRecord, Organization, Project};

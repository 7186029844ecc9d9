//! Purchase-history portal: crawl, parse, and month selection.

pub mod config;
pub mod fetch;
pub mod months;
pub mod parser;
pub mod walker;

pub use config::{Credentials, DEFAULT_LOGIN_URL, PortalConfig};
pub use fetch::{ReservationFetcher, RetryPolicy};
pub use months::{MONTH_CURRENT, MONTH_NEXT, filter_months, is_recent_month};
pub use parser::parse_listing_page;
pub use walker::walk_listing_pages;

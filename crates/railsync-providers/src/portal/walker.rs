//! Pagination walker for one queried month.
//!
//! Parses the current listing page, then follows the `#next` link until it
//! disappears. Termination is driven purely by link absence so arbitrarily
//! long histories walk to the end.

use std::time::Duration;

use tracing::debug;
use url::Url;

use railsync_core::ReservationRecord;

use crate::browser::BrowserSession;
use crate::error::{ProviderError, ProviderResult};
use crate::portal::parser::parse_listing_page;

/// CSS id of the next-page link on the listing.
const NEXT_LINK: &str = "#next";

/// Walks all listing pages reachable from the current one, concatenating
/// parsed records in page order.
pub async fn walk_listing_pages(
    session: &dyn BrowserSession,
    page_settle: Duration,
) -> ProviderResult<Vec<ReservationRecord>> {
    let mut records = Vec::new();

    loop {
        let html = session.page_source().await?;
        let page_records = parse_listing_page(&html);
        debug!(count = page_records.len(), "listing page parsed");
        records.extend(page_records);

        let Some(next) = session.find(NEXT_LINK).await? else {
            break;
        };
        let Some(href) = session.attribute(&next, "href").await? else {
            break;
        };

        let current = session.current_url().await?;
        let base = Url::parse(&current).map_err(|e| {
            ProviderError::invalid_response(format!("current url `{}` unparseable", current))
                .with_source(e)
        })?;
        let next_url = base.join(&href).map_err(|e| {
            ProviderError::invalid_response(format!("next link `{}` unresolvable", href))
                .with_source(e)
        })?;

        session.navigate(next_url.as_str()).await?;
        tokio::time::sleep(page_settle).await;
    }

    Ok(records)
}

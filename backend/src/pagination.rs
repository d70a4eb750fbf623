//! # Keyset pagination over the payment collection
//!
//! Pages are addressed by a cursor (the last id of the previous page) rather
//! than an offset. One extra summary is fetched beyond the page size; its
//! presence is the only evidence that a further page exists.

use shared::{PageLinks, PaymentsPage};
use tracing::debug;

use crate::config::Config;
use crate::db::{PaymentStore, StorageResult};
use crate::id::{IdError, PaymentId};
use crate::mappers::PaymentMapper;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A normalized listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub count: usize,
    /// The cursor exactly as the caller sent it, echoed back in `self`.
    pub after: Option<String>,
    /// `after` decoded; present exactly when `after` is.
    pub cursor: Option<PaymentId>,
}

impl PageQuery {
    /// Absent, non-numeric, zero or negative counts all mean the default page
    /// size. An empty cursor means "from the beginning"; any other cursor must
    /// be a well-formed identifier.
    pub fn new(count: Option<&str>, after: Option<&str>) -> Result<Self, IdError> {
        let count = count
            .and_then(|c| c.trim().parse::<i64>().ok())
            .filter(|&c| c > 0)
            .and_then(|c| usize::try_from(c).ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let after = after.filter(|a| !a.is_empty()).map(str::to_string);
        let cursor = after.as_deref().map(PaymentId::parse).transpose()?;

        Ok(Self { count, after, cursor })
    }
}

/// Fetch one page and render it with its navigation links.
pub async fn fetch_page(
    store: &dyn PaymentStore,
    config: &Config,
    query: &PageQuery,
) -> StorageResult<PaymentsPage> {
    let mut summaries = store.list(query.count.saturating_add(1), query.cursor).await?;

    let has_more = summaries.len() > query.count;
    summaries.truncate(query.count);

    // The next cursor is the last summary on this page, not the lookahead.
    let next = match summaries.last() {
        Some(last) if has_more => Some(list_link(config, query.count, Some(&last.id.to_hex()))),
        _ => None,
    };

    debug!(
        "Listing page of {} payments (requested {}), has_more: {}",
        summaries.len(),
        query.count,
        has_more
    );

    Ok(PaymentsPage {
        data: summaries
            .into_iter()
            .map(|summary| PaymentMapper::to_summary_resource(config, summary))
            .collect(),
        links: PageLinks {
            self_link: list_link(config, query.count, query.after.as_deref()),
            next,
        },
    })
}

fn list_link(config: &Config, count: usize, after: Option<&str>) -> String {
    match after {
        Some(after) => format!("{}/v1/payments/?count={}&after={}", config.host, count, after),
        None => format!("{}/v1/payments/?count={}", config.host, count),
    }
}

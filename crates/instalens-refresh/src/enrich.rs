//! Fan-out of per-item enrichment calls.
//!
//! Every item with a media reference gets exactly one concurrent call. A
//! failed call leaves its item untouched; the rest of the batch is unaffected.
//! Output order always equals input order.

use futures::future::join_all;
use instalens_core::Enrichable;

use crate::collaborators::MediaEnricher;

/// Per-batch counts, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub enriched: usize,
    pub failed: usize,
    /// Items with no media reference, passed through without a call.
    pub skipped: usize,
}

impl EnrichmentSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.enriched + self.failed + self.skipped
    }
}

enum ItemOutcome {
    Enriched,
    Failed,
    Skipped,
}

/// Enrich `items` concurrently, one attempt per item.
pub async fn enrich_items<T>(
    enricher: &dyn MediaEnricher,
    items: Vec<T>,
) -> (Vec<T>, EnrichmentSummary)
where
    T: Enrichable + Send,
{
    let results = join_all(items.into_iter().map(|mut item| async move {
        let Some(url) = item.media_url().map(str::to_owned) else {
            return (item, ItemOutcome::Skipped);
        };
        match enricher.enrich(&url).await {
            Ok(enrichment) => {
                item.set_enrichment(enrichment);
                (item, ItemOutcome::Enriched)
            }
            Err(e) => {
                tracing::warn!(
                    item_id = item.id(),
                    error = %e,
                    "media enrichment failed; keeping item unenriched"
                );
                (item, ItemOutcome::Failed)
            }
        }
    }))
    .await;

    let mut summary = EnrichmentSummary::default();
    let items = results
        .into_iter()
        .map(|(item, outcome)| {
            match outcome {
                ItemOutcome::Enriched => summary.enriched += 1,
                ItemOutcome::Failed => summary.failed += 1,
                ItemOutcome::Skipped => summary.skipped += 1,
            }
            item
        })
        .collect();

    (items, summary)
}

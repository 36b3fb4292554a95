//! The profile refresh pipeline.
//!
//! [`Refresher`] decides whether a stored record can be served, and otherwise
//! drives acquisition, per-item enrichment, analytics, demographics and
//! persistence for one handle. Concurrent refreshes of the same handle share a
//! single run. [`run_sweep_tick`] refreshes the least recently updated record.
//!
//! External systems sit behind the traits in [`collaborators`]; [`adapters`]
//! wires the Instagram, Gemini and Postgres implementations.

pub mod adapters;
pub mod collaborators;
pub mod enrich;
pub mod error;
pub mod memory_store;
pub mod orchestrator;
pub mod sweep;

mod inflight;

pub use adapters::{build_refresher, BuildError, PgProfileStore};
pub use collaborators::{
    AcquireError, Collaborators, DemographicsInferrer, EnrichError, MediaEnricher, ProfileSnapshot,
    ProfileSource, ProfileStore, StoreError,
};
pub use enrich::{enrich_items, EnrichmentSummary};
pub use error::RefreshError;
pub use memory_store::InMemoryProfileStore;
pub use orchestrator::{RefreshSettings, Refresher, ServeOrigin, Served};
pub use sweep::{run_sweep_tick, SweepOutcome};

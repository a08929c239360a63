//! Catalog index: memoized per-project lookups and outcome bookkeeping
//!
//! Every project moves from "not attempted" to exactly one terminal outcome
//! per attempt: a resolved timestamp, an HTTP error status, a fetch/parse
//! error, or "empty" (metadata without any usable upload time). Lookups are
//! memoized per name, so a project is fetched at most once unless it is
//! explicitly retried.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use indexmap::IndexSet;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use tally_core::error::TallyError;
use tally_core::types::Timestamp;
use tally_registry::{earliest_timestamp, parse_metadata, CatalogSource, RegistryUrl, Transport};

use crate::limiter::ConcurrencyLimiter;
use crate::report::Report;
use crate::IndexResult;

/// Number of lookups allowed in flight at once unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Outcome of a single project lookup.
///
/// `Ok(None)` covers the non-failing "no timestamp" outcomes (HTTP error,
/// empty metadata). `Err` is a fetch or parse failure; every caller waiting
/// on the same in-flight lookup observes the same error.
pub type Lookup = Result<Option<Timestamp>, Arc<TallyError>>;

type PendingLookup = Shared<BoxFuture<'static, Lookup>>;

enum Slot {
    InFlight(PendingLookup),
    Done(Option<Timestamp>),
}

/// Counts of per-project outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    /// Projects in the catalog
    pub total: usize,
    /// Projects with a resolved timestamp
    pub resolved: usize,
    /// Projects whose metadata request returned a non-success status
    pub http_errors: usize,
    /// Projects whose lookup failed to fetch or parse
    pub parse_errors: usize,
    /// Projects whose metadata had no usable upload time
    pub empty: usize,
    /// Projects without a finished lookup
    pub unattempted: usize,
}

struct IndexState {
    transport: Arc<dyn Transport>,
    registry: RegistryUrl,
    slots: DashMap<String, Slot>,
    http_errors: DashMap<String, u16>,
    parse_errors: DashMap<String, Arc<TallyError>>,
    empties: Mutex<IndexSet<String>>,
}

impl IndexState {
    async fn lookup(self: Arc<Self>, name: String) -> Lookup {
        let outcome = self.resolve(&name).await.map_err(Arc::new);

        let resolved = match &outcome {
            Ok(resolved) => *resolved,
            Err(error) => {
                self.parse_errors.insert(name.clone(), Arc::clone(error));
                None
            }
        };
        self.slots.insert(name, Slot::Done(resolved));

        outcome
    }

    async fn resolve(&self, name: &str) -> IndexResult<Option<Timestamp>> {
        let url = self.registry.metadata_url(name);
        let response = self.transport.get(&url).await?;

        if !response.is_success() {
            debug!(name, status = response.status, "metadata request rejected");
            self.http_errors.insert(name.to_string(), response.status);
            return Ok(None);
        }

        let metadata = parse_metadata(name, &response.body)?;
        match earliest_timestamp(&metadata) {
            Some(timestamp) => Ok(Some(timestamp)),
            None => {
                debug!(name, "no release carries an upload time");
                self.empties.lock().insert(name.to_string());
                Ok(None)
            }
        }
    }
}

/// Index over a fixed catalog of project names
pub struct CatalogIndex {
    names: Vec<String>,
    limiter: ConcurrencyLimiter,
    state: Arc<IndexState>,
}

impl CatalogIndex {
    /// Create an index with the default concurrency cap
    pub fn new(names: Vec<String>, transport: Arc<dyn Transport>, registry: RegistryUrl) -> Self {
        Self::with_concurrency(names, transport, registry, DEFAULT_CONCURRENCY)
    }

    /// Create an index allowing `concurrency` lookups in flight across all batches
    pub fn with_concurrency(
        names: Vec<String>,
        transport: Arc<dyn Transport>,
        registry: RegistryUrl,
        concurrency: usize,
    ) -> Self {
        Self {
            names,
            limiter: ConcurrencyLimiter::new(concurrency),
            state: Arc::new(IndexState {
                transport,
                registry,
                slots: DashMap::new(),
                http_errors: DashMap::new(),
                parse_errors: DashMap::new(),
                empties: Mutex::new(IndexSet::new()),
            }),
        }
    }

    /// List the catalog from `source` and build an index over it.
    ///
    /// Failing to list the catalog is fatal and propagated.
    pub async fn discover(
        source: &dyn CatalogSource,
        transport: Arc<dyn Transport>,
        registry: RegistryUrl,
        concurrency: usize,
    ) -> IndexResult<Self> {
        let names = source.list_names().await?;
        info!(count = names.len(), "discovered catalog");
        Ok(Self::with_concurrency(names, transport, registry, concurrency))
    }

    /// Project names in catalog order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Concurrency cap shared by every batch on this index
    pub fn concurrency(&self) -> usize {
        self.limiter.limit()
    }

    /// Earliest upload time of `name`, fetched at most once.
    ///
    /// A lookup already in flight or finished is returned as-is, so
    /// concurrent callers for the same name share one request.
    pub async fn ctime(&self, name: &str) -> Lookup {
        let pending = match self.state.slots.entry(name.to_string()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Done(resolved) => return Ok(*resolved),
                Slot::InFlight(pending) => pending.clone(),
            },
            Entry::Vacant(entry) => {
                debug!(name, "fetching ctime");
                let pending = Arc::clone(&self.state)
                    .lookup(name.to_string())
                    .boxed()
                    .shared();
                entry.insert(Slot::InFlight(pending.clone()));
                pending
            }
        };

        pending.await
    }

    /// Positional form of [`CatalogIndex::ctime`]
    pub async fn ctime_at(&self, index: usize) -> Lookup {
        match self.names.get(index) {
            Some(name) => self.ctime(name).await,
            None => Err(Arc::new(TallyError::UnknownPackageIndex {
                index,
                len: self.names.len(),
            })),
        }
    }

    /// Look up every project in the catalog.
    ///
    /// Per-project failures are logged and reported as `None`; the result is
    /// aligned with [`CatalogIndex::names`].
    pub async fn fetch_all(&self) -> Vec<Option<Timestamp>> {
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        info!(count = names.len(), concurrency = self.concurrency(), "fetching catalog");
        self.fetch_batch(names).await
    }

    /// Look up again every project without a resolved timestamp.
    ///
    /// This covers projects never attempted as well as those that finished
    /// with an HTTP error, a parse error or empty metadata. Earlier error
    /// records are kept even if the new attempt succeeds.
    pub async fn retry(&self) -> Vec<Option<Timestamp>> {
        let names: Vec<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .filter(|name| self.reset_unresolved(name))
            .collect();
        info!(count = names.len(), "retrying unresolved packages");
        self.fetch_batch(names).await
    }

    /// Day-bucketed growth report over every resolved timestamp.
    ///
    /// Lookups still in flight are awaited; nothing new is fetched.
    pub async fn report(&self) -> Report {
        let resolved = join_all(self.names.iter().map(|name| self.cached(name))).await;
        Report::from_timestamps(resolved.into_iter().flatten())
    }

    /// Status codes of rejected metadata requests, in catalog order
    pub fn http_errors(&self) -> Vec<(String, u16)> {
        self.names
            .iter()
            .filter_map(|name| {
                let status = *self.state.http_errors.get(name)?;
                Some((name.clone(), status))
            })
            .collect()
    }

    /// Fetch and parse failures, in catalog order
    pub fn parse_errors(&self) -> Vec<(String, Arc<TallyError>)> {
        self.names
            .iter()
            .filter_map(|name| {
                let error = Arc::clone(&*self.state.parse_errors.get(name)?);
                Some((name.clone(), error))
            })
            .collect()
    }

    /// Projects whose metadata had no usable upload time, in discovery order
    pub fn empties(&self) -> Vec<String> {
        self.state.empties.lock().iter().cloned().collect()
    }

    /// Number of catalog projects with a resolved timestamp
    pub fn resolved_count(&self) -> usize {
        self.names
            .iter()
            .filter(|name| {
                self.state
                    .slots
                    .get(name.as_str())
                    .is_some_and(|slot| matches!(slot.value(), Slot::Done(Some(_))))
            })
            .count()
    }

    /// Outcome counts over the catalog names only; direct lookups of other
    /// names are not included.
    pub fn summary(&self) -> IndexSummary {
        let finished = self
            .names
            .iter()
            .filter(|name| {
                self.state
                    .slots
                    .get(name.as_str())
                    .is_some_and(|slot| matches!(slot.value(), Slot::Done(_)))
            })
            .count();
        let empty = {
            let empties = self.state.empties.lock();
            self.names.iter().filter(|name| empties.contains(name.as_str())).count()
        };

        IndexSummary {
            total: self.names.len(),
            resolved: self.resolved_count(),
            http_errors: self.http_errors().len(),
            parse_errors: self.parse_errors().len(),
            empty,
            unattempted: self.names.len() - finished,
        }
    }

    async fn fetch_batch(&self, names: Vec<&str>) -> Vec<Option<Timestamp>> {
        let results = self
            .limiter
            .run(names, |name| async move {
                match self.ctime(name).await {
                    Ok(resolved) => resolved,
                    Err(error) => {
                        warn!(name, error = %error, "lookup failed");
                        None
                    }
                }
            })
            .await;

        let resolved = results.iter().filter(|r| r.is_some()).count();
        info!(attempted = results.len(), resolved, "batch finished");
        results
    }

    /// Clear a finished "no timestamp" slot so the next lookup refetches it.
    /// Returns whether `name` is due for another attempt.
    fn reset_unresolved(&self, name: &str) -> bool {
        match self.state.slots.entry(name.to_string()) {
            Entry::Vacant(_) => true,
            Entry::Occupied(entry) => {
                if matches!(entry.get(), Slot::Done(None)) {
                    entry.remove();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Resolved value of `name` without starting a lookup
    async fn cached(&self, name: &str) -> Option<Timestamp> {
        let pending = match self.state.slots.get(name)?.value() {
            Slot::Done(resolved) => return *resolved,
            Slot::InFlight(pending) => pending.clone(),
        };
        pending.await.ok().flatten()
    }
}

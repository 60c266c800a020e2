//! Table controller

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::Weak;

use futures::FutureExt;
use tokio::sync::watch;

use super::Debounced;
use super::Debouncer;
use super::FetchOrchestrator;
use super::SortCycle;
use super::TableConfig;
use crate::error::ConfigError;
use crate::model::Columns;
use crate::model::QueryState;
use crate::model::ViewState;
use crate::schedule::Scheduler;
use crate::schedule::TokioScheduler;
use crate::transport::HttpTransport;

/// Drives one remote paginated table.
///
/// The controller turns UI commands into query changes, fetches through the
/// injected [`HttpTransport`] and publishes a [`ViewState`] after each step.
/// Commands never fail: fetch errors land in [`ViewState::error`].
///
/// This handle is cheap to clone (uses `Arc` internally). Pending search
/// commits hold only a weak reference, so dropping every handle also drops
/// the table.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use datatable_lib::ReqwestTransport;
/// use datatable_lib::table::{TableConfig, TableController};
///
/// let config = TableConfig::from_json(include_str!("users.json"))?;
/// let transport = ReqwestTransport::builder().base_url("http://localhost:3000").build()?;
/// let table = TableController::with_tokio(config, Arc::new(transport))?;
///
/// let view = table.load().await;
/// let view = table.activate_sort("Name").await;
/// table.set_search_input("jo").await;
/// ```
#[derive(Clone)]
pub struct TableController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    orchestrator: FetchOrchestrator,
    debouncer: Debouncer,
    slot: Mutex<QuerySlot>,
    search_enabled: bool,
}

struct QuerySlot {
    query: QueryState,
    sort: SortCycle,
    /// Set while the view still shows the initial data.
    seeded: bool,
}

impl TableController {
    /// Creates a controller.
    ///
    /// Validates the configuration and maps the initial data, if any. No
    /// request is made until [`load`](Self::load) or another command.
    pub fn new(
        config: TableConfig,
        transport: Arc<dyn HttpTransport>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, ConfigError> {
        let columns = config.validate()?;
        let query = QueryState::new(config.rows_per_page);
        let orchestrator = FetchOrchestrator::new(config.api, columns, transport, &query);

        let seeded = match &config.initial_data {
            Some(data) => {
                orchestrator
                    .seed(&query, data)
                    .map_err(ConfigError::InitialData)?;
                true
            }
            None => false,
        };

        let debouncer = Debouncer::new(scheduler, config.search_debounce_ms.delay());
        log::debug!(
            "[table] created for {} (debounce {:?}, search {})",
            orchestrator.descriptor().endpoint,
            debouncer.delay(),
            if config.search_enabled { "on" } else { "off" }
        );

        Ok(Self {
            inner: Arc::new(ControllerInner {
                orchestrator,
                debouncer,
                slot: Mutex::new(QuerySlot {
                    query,
                    sort: SortCycle::new(),
                    seeded,
                }),
                search_enabled: config.search_enabled,
            }),
        })
    }

    /// Creates a controller that schedules search commits on tokio.
    pub fn with_tokio(
        config: TableConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ConfigError> {
        Self::new(config, transport, Arc::new(TokioScheduler::new()))
    }

    /// Loads the first page.
    ///
    /// When initial data was supplied, returns it without a request.
    pub async fn load(&self) -> ViewState {
        if self.inner.lock().seeded {
            return self.view();
        }
        self.refresh().await
    }

    /// Re-fetches the current query.
    pub async fn refresh(&self) -> ViewState {
        self.update(|_| true).await
    }

    /// Moves to page `page`.
    ///
    /// Pages start at 1. When the backend reports a total the page is also
    /// kept within the known page count.
    pub async fn go_to_page(&self, page: u64) -> ViewState {
        let limit = self.page_limit();
        self.update(|slot| {
            let page = page.clamp(1, limit);
            if slot.query.page == page {
                return false;
            }
            slot.query.page = page;
            true
        })
        .await
    }

    /// Moves to the next page.
    pub async fn next_page(&self) -> ViewState {
        let page = self.inner.lock().query.page;
        self.go_to_page(page.saturating_add(1)).await
    }

    /// Moves to the previous page.
    pub async fn previous_page(&self) -> ViewState {
        let page = self.inner.lock().query.page;
        self.go_to_page(page.saturating_sub(1)).await
    }

    /// Changes the page size and returns to the first page.
    pub async fn set_rows_per_page(&self, rows: u64) -> ViewState {
        let rows = if rows == 0 {
            log::warn!("[table] rows per page must be positive, using 1");
            1
        } else {
            rows
        };

        self.update(|slot| {
            if slot.query.rows_per_page == rows {
                return false;
            }
            slot.query.rows_per_page = rows;
            slot.query.page = 1;
            true
        })
        .await
    }

    /// Activates the sort on a column and returns to the first page.
    ///
    /// Repeated activation cycles ascending, descending and unsorted.
    /// Columns that are unknown or not sortable are ignored.
    pub async fn activate_sort(&self, column: &str) -> ViewState {
        if self.columns().sortable(column).is_none() {
            log::warn!("[table] column '{}' is not sortable", column);
            return self.view();
        }

        self.update(|slot| {
            slot.query.sort = slot.sort.activate(column).cloned();
            slot.query.page = 1;
            true
        })
        .await
    }

    /// Records search input.
    ///
    /// The term is committed once the input has been quiet for the debounce
    /// interval, or right away when debouncing is off. Committing a term
    /// different from the current one returns to the first page and
    /// fetches.
    pub async fn set_search_input(&self, text: impl Into<String>) -> ViewState {
        if !self.inner.search_enabled {
            log::debug!("[table] search is disabled, input ignored");
            return self.view();
        }
        if self.inner.orchestrator.is_closed() {
            return self.view();
        }

        let text = text.into();
        self.inner.lock().query.raw_search = text.clone();

        let weak = Arc::downgrade(&self.inner);
        let outcome = self.inner.debouncer.input(text, move |term| {
            async move {
                if let Some(controller) = Self::upgrade(&weak) {
                    controller.commit_search(term).await;
                }
            }
            .boxed()
        });

        match outcome {
            Debounced::Scheduled(timer) => {
                log::trace!("[table] search commit scheduled as {}", timer);
                self.view()
            }
            Debounced::Immediate(term) => self.commit_search(term).await,
        }
    }

    async fn commit_search(&self, term: String) -> ViewState {
        self.update(|slot| {
            if slot.query.committed_search == term {
                return false;
            }
            log::debug!("[table] search committed: '{}'", term);
            slot.query.committed_search = term;
            slot.query.page = 1;
            true
        })
        .await
    }

    /// Returns the current view.
    pub fn view(&self) -> ViewState {
        self.inner.orchestrator.view()
    }

    /// Returns the current query.
    pub fn query(&self) -> QueryState {
        self.inner.lock().query.clone()
    }

    /// Subscribes to view updates.
    ///
    /// The receiver sees every published state, including the `loading`
    /// state at the start of each fetch.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.orchestrator.subscribe()
    }

    /// Returns the validated columns.
    pub fn columns(&self) -> &Columns {
        self.inner.orchestrator.columns()
    }

    /// Returns `true` while a search commit is waiting on its timer.
    pub fn search_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Stops the table.
    ///
    /// Cancels the pending search commit and any in-flight fetch. Every
    /// later command returns the final view without changing it.
    pub fn teardown(&self) -> ViewState {
        self.inner.debouncer.cancel();
        self.inner.orchestrator.close();
        log::debug!("[table] torn down");
        self.view()
    }

    /// Returns `true` once [`teardown`](Self::teardown) has been called.
    pub fn is_torn_down(&self) -> bool {
        self.inner.orchestrator.is_closed()
    }

    /// Applies `change` to the query and fetches if it reports a change.
    async fn update<F>(&self, change: F) -> ViewState
    where
        F: FnOnce(&mut QuerySlot) -> bool,
    {
        let started = {
            let mut slot = self.inner.lock();
            if self.inner.orchestrator.is_closed() || !change(&mut slot) {
                None
            } else {
                slot.seeded = false;
                let query = slot.query.clone();
                self.inner.orchestrator.start(&query).map(|seq| (seq, query))
            }
        };

        match started {
            Some((seq, query)) => self.inner.orchestrator.finish(seq, &query).await,
            None => self.view(),
        }
    }

    fn page_limit(&self) -> u64 {
        if self.total_wired() {
            self.view().total_pages
        } else {
            u64::MAX
        }
    }

    fn total_wired(&self) -> bool {
        self.inner.orchestrator.descriptor().field_names.has_total()
    }

    fn upgrade(weak: &Weak<ControllerInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

impl ControllerInner {
    fn lock(&self) -> MutexGuard<'_, QuerySlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TableController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableController")
            .field("orchestrator", &self.inner.orchestrator)
            .field("debouncer", &self.inner.debouncer)
            .field("query", &self.query())
            .finish_non_exhaustive()
    }
}

//! Fetch orchestration: request, map, publish.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::RequestBuilder;
use crate::api::local;
use crate::api::map_response;
use crate::error::ApiError;
use crate::error::MappingError;
use crate::model::ApiDescriptor;
use crate::model::Columns;
use crate::model::FetchResult;
use crate::model::QueryState;
use crate::model::ViewState;
use crate::transport::HttpRequest;
use crate::transport::HttpTransport;

struct FetchState {
    view: ViewState,
    /// Sequence number of the latest fetch started.
    seq: u64,
}

/// Runs fetches for one table and owns its [`ViewState`].
///
/// Every [`refresh`](Self::refresh) is tagged with a sequence number. A
/// response that arrives after a newer fetch has started is discarded, so
/// the view always reflects the latest query no matter the order in which
/// responses complete.
///
/// Failed fetches keep the previous rows and total and only set
/// [`ViewState::error`].
pub struct FetchOrchestrator {
    descriptor: ApiDescriptor,
    columns: Columns,
    transport: Arc<dyn HttpTransport>,
    state: Mutex<FetchState>,
    views: watch::Sender<ViewState>,
    cancel: CancellationToken,
}

impl FetchOrchestrator {
    /// Creates an orchestrator with an empty view for `query`.
    pub fn new(
        descriptor: ApiDescriptor,
        columns: Columns,
        transport: Arc<dyn HttpTransport>,
        query: &QueryState,
    ) -> Self {
        let mut view = ViewState::new(query);
        view.total_known = descriptor.field_names.has_total();
        let (views, _) = watch::channel(view.clone());

        Self {
            descriptor,
            columns,
            transport,
            state: Mutex::new(FetchState { view, seq: 0 }),
            views,
            cancel: CancellationToken::new(),
        }
    }

    /// Maps a pre-fetched response into the view without any request.
    pub fn seed(&self, query: &QueryState, response: &Value) -> Result<ViewState, MappingError> {
        let mut result = map_response(&self.columns, &self.descriptor.field_names, response)?;
        self.refine(query, &mut result);

        let mut state = self.lock();
        state.view.sync_query(query);
        state.view.apply(result);
        log::debug!(
            "[fetch] seeded {} rows from initial data",
            state.view.rows.len()
        );
        self.publish(&state.view);
        Ok(state.view.clone())
    }

    /// Fetches `query` and returns the resulting view.
    ///
    /// If a newer refresh started while this one was in flight, the
    /// response is dropped and the current view is returned unchanged.
    pub async fn refresh(&self, query: &QueryState) -> ViewState {
        match self.start(query) {
            Some(seq) => self.finish(seq, query).await,
            None => self.view(),
        }
    }

    /// Marks a fetch as started and returns its sequence number.
    ///
    /// Returns `None` once closed. Callers that derive `query` under their
    /// own lock call this before releasing it, so sequence numbers follow
    /// the order in which queries were formed.
    pub(crate) fn start(&self, query: &QueryState) -> Option<u64> {
        let mut state = self.lock();
        if self.cancel.is_cancelled() {
            return None;
        }
        state.seq += 1;
        state.view.sync_query(query);
        state.view.loading = true;
        state.view.error = None;
        self.publish(&state.view);
        Some(state.seq)
    }

    /// Runs the fetch started as `seq` and applies it if still the latest.
    pub(crate) async fn finish(&self, seq: u64, query: &QueryState) -> ViewState {
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => {
                log::debug!("[fetch] #{} cancelled", seq);
                return self.view();
            }
            result = self.fetch(seq, query) => result,
        };

        let mut state = self.lock();
        if seq != state.seq || self.cancel.is_cancelled() {
            log::debug!("[fetch] #{} discarded, latest is #{}", seq, state.seq);
            return state.view.clone();
        }

        match outcome {
            Ok(result) => {
                log::debug!(
                    "[fetch] #{} applied {} rows, {} total",
                    seq,
                    result.rows.len(),
                    result.total_items
                );
                state.view.apply(result);
            }
            Err(err) => {
                log::warn!("[fetch] #{} failed: {}", seq, err);
                state.view.error = Some(err.to_string());
            }
        }
        state.view.loading = false;
        self.publish(&state.view);
        state.view.clone()
    }

    async fn fetch(&self, seq: u64, query: &QueryState) -> Result<FetchResult, ApiError> {
        let request = RequestBuilder::new(&self.descriptor, &self.columns).build(query);
        log::debug!(
            "[fetch] #{} {} {}",
            seq,
            request.method.as_str(),
            request.full_url()
        );

        let response = self.transport.send(HttpRequest::from(&request)).await?;
        if !response.is_success() {
            return Err(ApiError::http_from_body(response.status, &response.body));
        }

        let body = response.json()?;
        let mut result = map_response(&self.columns, &self.descriptor.field_names, &body)?;
        self.refine(query, &mut result);
        Ok(result)
    }

    /// Applies search and sort locally when the backend does not take them.
    fn refine(&self, query: &QueryState, result: &mut FetchResult) {
        let names = &self.descriptor.field_names;
        if !names.has_search()
            && let Some(term) = query.search_term()
        {
            local::filter_rows(&mut result.rows, term);
        }
        if !names.has_sort()
            && let Some(key) = &query.sort
        {
            local::sort_rows(&mut result.rows, key);
        }
    }

    /// Returns the current view.
    pub fn view(&self) -> ViewState {
        self.lock().view.clone()
    }

    /// Subscribes to view updates.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.views.subscribe()
    }

    /// Returns the table's columns.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Returns the backend description.
    pub fn descriptor(&self) -> &ApiDescriptor {
        &self.descriptor
    }

    /// Cancels in-flight fetches and freezes the view.
    pub fn close(&self) {
        let mut state = self.lock();
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        state.view.loading = false;
        self.publish(&state.view);
        log::debug!("[fetch] closed after #{}", state.seq);
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn publish(&self, view: &ViewState) {
        self.views.send_replace(view.clone());
    }

    fn lock(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("endpoint", &self.descriptor.endpoint)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

//! Load-state tracking for metadata requests.
//!
//! A selection change starts a new request; resolutions carry the id of the
//! request they answer so that a late answer to an older selection cannot
//! overwrite the current state.

use tracing::{debug, warn};

use crate::api::DataCommonsApi;
use crate::config::EnrichmentConfig;
use crate::locale::{LocaleContext, MessageId};
use crate::metadata::fetch_facets_with_metadata;
use crate::types::FacetResponse;

/// Identifier of one fetch, increasing per session.
pub type RequestId = u64;

/// State of an asynchronously loaded value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading {
        request: RequestId,
    },
    Loaded(T),
    /// Localized message describing the failure.
    Error(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Input to [`MetadataSession::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent<T> {
    /// The selection changed; a new request begins.
    SelectionChanged,
    FetchResolved { request: RequestId, value: T },
    FetchFailed { request: RequestId, message: String },
}

/// Tracks the enriched facets of the current selection.
#[derive(Debug, Default)]
pub struct MetadataSession {
    state: LoadState<FacetResponse>,
    next_request: RequestId,
}

impl MetadataSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoadState<FacetResponse> {
        &self.state
    }

    fn current_request(&self) -> Option<RequestId> {
        match self.state {
            LoadState::Loading { request } => Some(request),
            _ => None,
        }
    }

    /// Apply an event. Returns the id of the new request for
    /// `SelectionChanged`. Resolutions of any request other than the one in
    /// flight are ignored.
    pub fn apply(&mut self, event: LoadEvent<FacetResponse>) -> Option<RequestId> {
        match event {
            LoadEvent::SelectionChanged => {
                let request = self.next_request;
                self.next_request += 1;
                self.state = LoadState::Loading { request };
                Some(request)
            }
            LoadEvent::FetchResolved { request, value } => {
                if self.current_request() == Some(request) {
                    self.state = LoadState::Loaded(value);
                } else {
                    debug!(request, "ignoring stale metadata response");
                }
                None
            }
            LoadEvent::FetchFailed { request, message } => {
                if self.current_request() == Some(request) {
                    self.state = LoadState::Error(message);
                } else {
                    debug!(request, "ignoring stale metadata failure");
                }
                None
            }
        }
    }

    /// Start a request for `facets` and drive it to completion.
    ///
    /// Failures are logged and surface as the localized load error message.
    pub async fn load(
        &mut self,
        api: &dyn DataCommonsApi,
        facets: &FacetResponse,
        config: &EnrichmentConfig,
        locale: &LocaleContext,
    ) -> &LoadState<FacetResponse> {
        let Some(request) = self.apply(LoadEvent::SelectionChanged) else {
            return &self.state;
        };
        let event = match fetch_facets_with_metadata(api, facets, config).await {
            Ok(value) => LoadEvent::FetchResolved { request, value },
            Err(e) => {
                warn!(error = %e, "failed to load facet metadata");
                LoadEvent::FetchFailed {
                    request,
                    message: locale.message(MessageId::MetadataLoadError).to_string(),
                }
            }
        };
        self.apply(event);
        &self.state
    }
}

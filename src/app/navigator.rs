//! Next/previous navigation over a random image feed.
//!
//! Images already visited are kept in a [`HistoryChain`], so stepping back and
//! then forward again never touches the network. Only stepping past the end
//! of the known chain (or before its start) fetches.

use super::history::{ChainError, DisplaySize, HistoryChain, ImageNode, NodeId};
use super::settings::{HeadReset, NavigatorSettings};
use crate::net::source::{FetchError, ImageSource};
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("History error: {0}")]
    Chain(#[from] ChainError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    /// The last fetch failed. Accepts new calls like `Idle`.
    Error(String),
}

/// What a navigation call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to a freshly fetched image.
    Fetched,
    /// Moved to an image already in the history.
    Cached,
    /// Nothing happened.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is in flight.
    Busy,
    NoCurrent,
    /// The display index already passed the catalog size.
    PastEnd,
    AlreadyInitialized,
}

/// Read-only view of the navigator for whoever draws it.
#[derive(Debug, Clone)]
pub struct NavSnapshot {
    pub current: Option<(NodeId, ImageNode)>,
    pub display_index: u32,
    pub total_images: u32,
    pub loading: bool,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct NavState {
    chain: HistoryChain,
    current: Option<NodeId>,
    display_index: u32,
    phase: Phase,
}

/// Where a fetched image goes once it arrives.
#[derive(Debug, Clone, Copy)]
enum Placement {
    Initial,
    After(NodeId),
    BeforeHead,
}

pub struct Navigator {
    source: Arc<dyn ImageSource>,
    settings: NavigatorSettings,
    state: Mutex<NavState>,
}

impl Navigator {
    pub fn new(source: Arc<dyn ImageSource>, settings: NavigatorSettings) -> Self {
        Self {
            source,
            settings,
            state: Mutex::new(NavState {
                chain: HistoryChain::new(),
                current: None,
                display_index: 0,
                phase: Phase::Idle,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &NavigatorSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> NavSnapshot {
        let state = self.lock();
        NavSnapshot {
            current: state
                .current
                .and_then(|id| state.chain.get(id).map(|node| (id, node.clone()))),
            display_index: state.display_index,
            total_images: self.settings.total_images,
            loading: state.phase == Phase::Fetching,
            last_error: match &state.phase {
                Phase::Error(message) => Some(message.clone()),
                _ => None,
            },
        }
    }

    pub fn current(&self) -> Option<(NodeId, ImageNode)> {
        let state = self.lock();
        state
            .current
            .and_then(|id| state.chain.get(id).map(|node| (id, node.clone())))
    }

    pub fn current_url(&self) -> Option<String> {
        self.current().map(|(_, node)| node.url)
    }

    pub fn node(&self, id: NodeId) -> Option<ImageNode> {
        self.lock().chain.get(id).cloned()
    }

    pub fn display_index(&self) -> u32 {
        self.lock().display_index
    }

    pub fn is_loading(&self) -> bool {
        self.lock().phase == Phase::Fetching
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase.clone()
    }

    pub fn history_len(&self) -> usize {
        self.lock().chain.len()
    }

    pub fn history_is_consistent(&self) -> bool {
        self.lock().chain.is_consistent()
    }

    /// Fetch the first image. Does nothing once anything has been shown.
    pub async fn initialize(&self) -> Result<Step, NavError> {
        {
            let mut state = self.lock();
            if state.phase == Phase::Fetching {
                return Ok(Step::Skipped(SkipReason::Busy));
            }
            if state.current.is_some() {
                return Ok(Step::Skipped(SkipReason::AlreadyInitialized));
            }
            state.phase = Phase::Fetching;
        }

        self.fetch_into(Placement::Initial).await
    }

    pub async fn advance(&self) -> Result<Step, NavError> {
        let from = {
            let mut state = self.lock();
            if state.phase == Phase::Fetching {
                return Ok(Step::Skipped(SkipReason::Busy));
            }
            let Some(current) = state.current else {
                return Ok(Step::Skipped(SkipReason::NoCurrent));
            };
            let total = self.settings.total_images;
            if total == 0 || state.display_index > total {
                return Ok(Step::Skipped(SkipReason::PastEnd));
            }

            if let Some(next) = state.chain.next_of(current) {
                state.current = Some(next);
                state.display_index += 1;
                log::debug!("Advanced to cached node {:?}", next);
                return Ok(Step::Cached);
            }

            state.phase = Phase::Fetching;
            current
        };

        self.fetch_into(Placement::After(from)).await
    }

    pub async fn retreat(&self) -> Result<Step, NavError> {
        {
            let mut state = self.lock();
            if state.phase == Phase::Fetching {
                return Ok(Step::Skipped(SkipReason::Busy));
            }
            let Some(current) = state.current else {
                return Ok(Step::Skipped(SkipReason::NoCurrent));
            };

            if let Some(previous) = state.chain.previous_of(current) {
                state.current = Some(previous);
                state.display_index = state.display_index.saturating_sub(1);
                log::debug!("Retreated to cached node {:?}", previous);
                return Ok(Step::Cached);
            }

            state.phase = Phase::Fetching;
        }

        self.fetch_into(Placement::BeforeHead).await
    }

    /// Runs with the phase already set to `Fetching`.
    async fn fetch_into(&self, placement: Placement) -> Result<Step, NavError> {
        let guard = FetchGuard::new(&self.state);

        let url = match self.fetch_image().await {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Image fetch failed: {}", e);
                guard.fail(&e);
                return Err(e.into());
            }
        };

        let (display_size, head_index) = {
            let mut rng = rand::rng();
            let head_index = match self.settings.head_reset {
                HeadReset::Random => rng.random_range(0..10),
                HeadReset::Fixed(n) => n,
            };
            (DisplaySize::random(&mut rng), head_index)
        };

        let mut state = guard.finish();
        let id = match placement {
            Placement::Initial => {
                let id = state.chain.push_root(url, display_size);
                state.display_index = 1;
                id
            }
            Placement::After(from) => {
                let id = state.chain.link_next(from, url, display_size)?;
                state.display_index += 1;
                id
            }
            Placement::BeforeHead => {
                let id = state.chain.push_root(url, display_size);
                state.display_index = head_index;
                id
            }
        };
        state.current = Some(id);

        log::info!(
            "Showing fetched node {:?} ({:?}), index {}",
            id,
            placement,
            state.display_index
        );
        Ok(Step::Fetched)
    }

    /// One image from the source as a `data:` URL, after the settle delay.
    async fn fetch_image(&self) -> Result<String, FetchError> {
        let payload = self.source.fetch_random().await?;
        let url = payload.into_data_url();

        if let Some(pause) = self.settle_delay() {
            tokio::time::sleep(pause).await;
        }
        Ok(url)
    }

    fn settle_delay(&self) -> Option<Duration> {
        let range = self.settings.settle_delay.clone()?;
        if range.is_empty() {
            return Some(range.start);
        }
        Some(rand::rng().random_range(range))
    }
}

/// Puts the phase back when a fetch ends, including when the future doing
/// the fetch is dropped halfway.
struct FetchGuard<'a> {
    state: &'a Mutex<NavState>,
    armed: bool,
}

impl<'a> FetchGuard<'a> {
    fn new(state: &'a Mutex<NavState>) -> Self {
        Self { state, armed: true }
    }

    fn lock(&self) -> MutexGuard<'a, NavState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(mut self) -> MutexGuard<'a, NavState> {
        self.armed = false;
        let mut state = self.lock();
        state.phase = Phase::Idle;
        state
    }

    fn fail(mut self, error: &FetchError) {
        self.armed = false;
        self.lock().phase = Phase::Error(error.to_string());
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.lock();
            if state.phase == Phase::Fetching {
                state.phase = Phase::Idle;
            }
        }
    }
}

//! Multi-context, multi-strategy element discovery.
//!
//! Every reachable document — the top document and each same-origin frame,
//! recursively — offers the same query capability, addressed by a frame
//! path. `locate` searches them in order: the top document with the full
//! element budget, then a breadth-first scan of frames with a shorter
//! per-frame budget. Deep mode additionally pierces shadow roots inside
//! each document. Matches are stamped with a marker attribute so later
//! interaction re-resolves the element in the context it was found in.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::element::Element;
use chromiumoxide::Page;
use tracing::{debug, trace};

use super::{eval_bool, eval_json, poll_true, scripts};
use crate::error::{CaptureError, Result};

/// Which document a search ran against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchContext {
    Top,
    /// Path of same-origin frame indices from the top window.
    Frame(Vec<usize>),
}

impl SearchContext {
    pub fn frame_path(&self) -> &[usize] {
        match self {
            SearchContext::Top => &[],
            SearchContext::Frame(path) => path,
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, SearchContext::Top)
    }
}

impl std::fmt::Display for SearchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchContext::Top => write!(f, "top document"),
            SearchContext::Frame(path) => write!(f, "frame {}", scripts::js_path(path)),
        }
    }
}

/// A discovered element: its context plus the marker that re-resolves it.
#[derive(Debug, Clone)]
pub struct Located {
    context: SearchContext,
    description: String,
    mark: u64,
}

impl Located {
    pub(crate) fn new(context: SearchContext, description: impl Into<String>, mark: u64) -> Self {
        Self {
            context,
            description: description.into(),
            mark,
        }
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn frame_path(&self) -> &[usize] {
        self.context.frame_path()
    }

    pub(crate) fn mark(&self) -> u64 {
        self.mark
    }

    fn mark_selector(&self) -> String {
        format!("[{}=\"{}\"]", scripts::MARK_ATTR, self.mark)
    }
}

/// Activation strategies, tried in order until the success probe holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStrategy {
    NativeClick,
    ScriptClick,
    SyntheticMouse,
    KeyboardEnter,
}

impl ActivationStrategy {
    const ORDERED: [ActivationStrategy; 4] = [
        ActivationStrategy::NativeClick,
        ActivationStrategy::ScriptClick,
        ActivationStrategy::SyntheticMouse,
        ActivationStrategy::KeyboardEnter,
    ];
}

impl std::fmt::Display for ActivationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActivationStrategy::NativeClick => "native click",
            ActivationStrategy::ScriptClick => "script click",
            ActivationStrategy::SyntheticMouse => "synthetic mouse events",
            ActivationStrategy::KeyboardEnter => "keyboard enter",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct LocatorTimeouts {
    /// Budget for the top-document search.
    pub element_wait: Duration,
    /// Budget per frame during the iframe scan.
    pub frame_wait: Duration,
    /// Pause between query retries.
    pub poll_interval: Duration,
    /// Pause between an activation attempt and its success probe.
    pub activation_settle: Duration,
}

impl Default for LocatorTimeouts {
    fn default() -> Self {
        Self {
            element_wait: Duration::from_secs(10),
            frame_wait: Duration::from_secs(2),
            poll_interval: Duration::from_millis(200),
            activation_settle: Duration::from_millis(150),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SearchDepth {
    LightDom,
    PierceShadow,
}

#[derive(Clone)]
pub struct ElementLocator {
    page: Page,
    timeouts: LocatorTimeouts,
    next_mark: Arc<AtomicU64>,
}

impl ElementLocator {
    pub fn new(page: Page, timeouts: LocatorTimeouts) -> Self {
        Self {
            page,
            timeouts,
            next_mark: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn timeouts(&self) -> &LocatorTimeouts {
        &self.timeouts
    }

    pub(crate) fn alloc_mark(&self) -> u64 {
        self.next_mark.fetch_add(1, Ordering::Relaxed)
    }

    /// Find the first element matching `selector`: top document first, then
    /// a breadth-first scan of same-origin frames.
    pub async fn locate(&self, selector: &str) -> Result<Located> {
        self.locate_with(selector, SearchDepth::LightDom).await
    }

    /// Like [`locate`](Self::locate), but each document walk also descends
    /// into shadow roots. Used when the target is dynamically inserted into
    /// a shadow tree and the ordinary query misses it.
    pub async fn locate_deep(&self, selector: &str) -> Result<Located> {
        self.locate_with(selector, SearchDepth::PierceShadow).await
    }

    async fn locate_with(&self, selector: &str, depth: SearchDepth) -> Result<Located> {
        if let Some(found) = self
            .try_context(SearchContext::Top, selector, depth, self.timeouts.element_wait)
            .await
        {
            return Ok(found);
        }

        let mut scanned = 0usize;
        let mut queue: VecDeque<Vec<usize>> = VecDeque::new();
        for i in 0..self.frame_count(&[]).await {
            queue.push_back(vec![i]);
        }

        while let Some(path) = queue.pop_front() {
            scanned += 1;
            let context = SearchContext::Frame(path.clone());
            if let Some(found) = self
                .try_context(context, selector, depth, self.timeouts.frame_wait)
                .await
            {
                return Ok(found);
            }
            for i in 0..self.frame_count(&path).await {
                let mut child = path.clone();
                child.push(i);
                queue.push_back(child);
            }
        }

        Err(CaptureError::NotFound(format!(
            "selector `{selector}` (searched top document and {scanned} frames)"
        )))
    }

    async fn try_context(
        &self,
        context: SearchContext,
        selector: &str,
        depth: SearchDepth,
        budget: Duration,
    ) -> Option<Located> {
        let mark = self.alloc_mark();
        let script = match depth {
            SearchDepth::LightDom => scripts::query_in_context(context.frame_path(), selector, mark),
            SearchDepth::PierceShadow => {
                scripts::query_deep_in_context(context.frame_path(), selector, mark)
            }
        };

        trace!(%context, selector, "searching");
        if poll_true(&self.page, &script, budget, self.timeouts.poll_interval).await {
            debug!(%context, selector, "element found");
            Some(Located::new(context, selector, mark))
        } else {
            None
        }
    }

    async fn frame_count(&self, path: &[usize]) -> usize {
        eval_json::<usize>(&self.page, &scripts::frame_count(path))
            .await
            .unwrap_or(0)
    }

    /// Resolve a native element handle; only top-document matches have one.
    pub async fn element_of(&self, located: &Located) -> Option<Element> {
        if !located.context().is_top() {
            return None;
        }
        self.page.find_element(located.mark_selector()).await.ok()
    }

    /// Best-effort scroll of the element toward the viewport center.
    pub async fn scroll_into_view(&self, located: &Located) {
        let _ = eval_bool(
            &self.page,
            &scripts::scroll_center(located.frame_path(), located.mark()),
        )
        .await;
    }

    /// Evaluate a success probe once.
    pub async fn probe(&self, probe_script: &str) -> bool {
        eval_bool(&self.page, probe_script).await
    }

    /// Poll the element's computed visibility until it renders.
    pub async fn wait_visible(&self, located: &Located, timeout: Duration) -> Result<()> {
        let script = scripts::visible_probe(located.frame_path(), located.mark());
        if poll_true(&self.page, &script, timeout, self.timeouts.poll_interval).await {
            Ok(())
        } else {
            Err(CaptureError::Interaction(format!(
                "{} never became visible in {}",
                located.description(),
                located.context()
            )))
        }
    }

    /// Try each activation strategy in order until `probe_script` holds.
    ///
    /// Every attempt is followed by a short settle delay and the probe.
    /// Exhausting all strategies is an interaction failure, distinct from
    /// the element not existing at all.
    pub async fn activate(
        &self,
        located: &Located,
        probe_script: &str,
    ) -> Result<ActivationStrategy> {
        self.scroll_into_view(located).await;

        for strategy in ActivationStrategy::ORDERED {
            let attempted = self.attempt(located, strategy).await;
            if !attempted {
                trace!(%strategy, "strategy not applicable");
                continue;
            }
            tokio::time::sleep(self.timeouts.activation_settle).await;
            if self.probe(probe_script).await {
                debug!(%strategy, target = located.description(), "activation succeeded");
                return Ok(strategy);
            }
        }

        Err(CaptureError::Interaction(format!(
            "all activation strategies exhausted for {} in {}",
            located.description(),
            located.context()
        )))
    }

    async fn attempt(&self, located: &Located, strategy: ActivationStrategy) -> bool {
        match strategy {
            ActivationStrategy::NativeClick => match self.element_of(located).await {
                Some(element) => match element.click().await {
                    Ok(_) => true,
                    Err(e) => {
                        trace!("native click failed: {e}");
                        false
                    }
                },
                None => false,
            },
            ActivationStrategy::ScriptClick => {
                eval_bool(
                    &self.page,
                    &scripts::script_click(located.frame_path(), located.mark()),
                )
                .await
            }
            ActivationStrategy::SyntheticMouse => {
                eval_bool(
                    &self.page,
                    &scripts::dispatch_mouse(located.frame_path(), located.mark()),
                )
                .await
            }
            ActivationStrategy::KeyboardEnter => {
                eval_bool(
                    &self.page,
                    &scripts::keyboard_enter(located.frame_path(), located.mark()),
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_context_display_names_frames() {
        assert_eq!(SearchContext::Top.to_string(), "top document");
        assert_eq!(SearchContext::Frame(vec![0, 2]).to_string(), "frame [0,2]");
    }

    #[test]
    fn located_mark_selector_uses_mark_attribute() {
        let located = Located::new(SearchContext::Top, "div.x", 42);
        assert_eq!(located.mark_selector(), "[data-cap-mark=\"42\"]");
        assert!(located.context().is_top());
    }

    #[test]
    fn strategies_are_ordered_native_first_keyboard_last() {
        assert_eq!(
            ActivationStrategy::ORDERED.first(),
            Some(&ActivationStrategy::NativeClick)
        );
        assert_eq!(
            ActivationStrategy::ORDERED.last(),
            Some(&ActivationStrategy::KeyboardEnter)
        );
        assert_eq!(ActivationStrategy::ORDERED.len(), 4);
    }

    #[test]
    fn default_timeouts_scope_frame_scan_below_element_wait() {
        let timeouts = LocatorTimeouts::default();
        assert!(timeouts.frame_wait < timeouts.element_wait);
        assert_eq!(timeouts.activation_settle, Duration::from_millis(150));
    }
}

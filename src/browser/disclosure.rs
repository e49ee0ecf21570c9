//! Accordion (disclosure widget) control.
//!
//! A widget is addressed by the visible text of its title link. Structure
//! is discovered by relationship, not by id: the content pane is the
//! nearest following sibling of the title's ancestor row that matches the
//! pane selector. The row's indicator class tells whether the widget is
//! already open; `open` is idempotent and performs zero interactions when
//! the indicator is present.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::locator::{ElementLocator, Located, SearchContext};
use super::{eval_json, poll_true, scripts};
use crate::error::{CaptureError, Result};

/// Structural selectors for disclosure widgets. The defaults match the
/// accordion markup the pipeline was built against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisclosureSelectors {
    pub title_row: String,
    pub title_link: String,
    pub content_pane: String,
    pub indicator_class: String,
}

impl Default for DisclosureSelectors {
    fn default() -> Self {
        Self {
            title_row: "div.ac-title".to_string(),
            title_link: "a".to_string(),
            content_pane: "div.ac-detail".to_string(),
            indicator_class: "active".to_string(),
        }
    }
}

/// One located accordion section.
#[derive(Debug, Clone)]
pub struct DisclosureWidget {
    pub title: String,
    pub link: Located,
    pub row: Located,
    pub pane: Located,
}

#[derive(Debug, Deserialize)]
struct FoundDisclosure {
    active: bool,
}

pub struct DisclosureController {
    locator: ElementLocator,
    selectors: DisclosureSelectors,
    locate_timeout: Duration,
    visibility_timeout: Duration,
}

impl DisclosureController {
    pub fn new(
        locator: ElementLocator,
        selectors: DisclosureSelectors,
        locate_timeout: Duration,
        visibility_timeout: Duration,
    ) -> Self {
        Self {
            locator,
            selectors,
            locate_timeout,
            visibility_timeout,
        }
    }

    /// Ensure the widget titled `title` is open and return it with its
    /// content pane located. Idempotent: an already-open widget is returned
    /// without any click interaction.
    pub async fn open(&self, title: &str) -> Result<DisclosureWidget> {
        let (widget, active) = self.find(title).await?;

        if active {
            debug!(title, "disclosure already open");
            return Ok(widget);
        }

        let probe = scripts::class_probe(
            widget.row.frame_path(),
            widget.row.mark(),
            &self.selectors.indicator_class,
        );
        self.locator.activate(&widget.link, &probe).await?;
        self.locator
            .wait_visible(&widget.pane, self.visibility_timeout)
            .await?;

        debug!(title, "disclosure opened");
        Ok(widget)
    }

    /// Whether the widget currently shows its open indicator.
    pub async fn is_open(&self, widget: &DisclosureWidget) -> bool {
        let probe = scripts::class_probe(
            widget.row.frame_path(),
            widget.row.mark(),
            &self.selectors.indicator_class,
        );
        self.locator.probe(&probe).await
    }

    async fn find(&self, title: &str) -> Result<(DisclosureWidget, bool)> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(CaptureError::Config("disclosure title is empty".to_string()));
        }

        let link_mark = self.locator.alloc_mark();
        let row_mark = self.locator.alloc_mark();
        let pane_mark = self.locator.alloc_mark();
        let script = scripts::find_disclosure(
            &self.selectors.title_row,
            &self.selectors.title_link,
            &self.selectors.content_pane,
            &self.selectors.indicator_class,
            trimmed,
            link_mark,
            row_mark,
            pane_mark,
        );

        // The page may still be building the accordion; poll for it.
        let deadline = tokio::time::Instant::now() + self.locate_timeout;
        loop {
            match eval_json::<Option<FoundDisclosure>>(self.locator.page(), &script).await {
                Ok(Some(found)) => {
                    let widget = DisclosureWidget {
                        title: trimmed.to_string(),
                        link: Located::new(
                            SearchContext::Top,
                            format!("disclosure title link \"{trimmed}\""),
                            link_mark,
                        ),
                        row: Located::new(
                            SearchContext::Top,
                            format!("disclosure title row \"{trimmed}\""),
                            row_mark,
                        ),
                        pane: Located::new(
                            SearchContext::Top,
                            format!("disclosure content pane \"{trimmed}\""),
                            pane_mark,
                        ),
                    };
                    return Ok((widget, found.active));
                }
                Ok(None) => {}
                Err(e) => debug!("disclosure lookup failed: {e}"),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CaptureError::NotFound(format!(
                    "disclosure title \"{trimmed}\" (accordion not found)"
                )));
            }
            tokio::time::sleep(self.locator.timeouts().poll_interval).await;
        }
    }

    /// Poll until the pane of an (externally opened) widget is rendered.
    pub async fn wait_pane_visible(&self, widget: &DisclosureWidget) -> bool {
        let script = scripts::visible_probe(widget.pane.frame_path(), widget.pane.mark());
        poll_true(
            self.locator.page(),
            &script,
            self.visibility_timeout,
            self.locator.timeouts().poll_interval,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selectors_match_accordion_markup() {
        let sel = DisclosureSelectors::default();
        assert_eq!(sel.title_row, "div.ac-title");
        assert_eq!(sel.title_link, "a");
        assert_eq!(sel.content_pane, "div.ac-detail");
        assert_eq!(sel.indicator_class, "active");
    }

    #[test]
    fn selectors_deserialize_with_partial_overrides() {
        let sel: DisclosureSelectors = toml::from_str(
            r#"
            title_row = "section.acc-head"
            "#,
        )
        .expect("parse selectors");
        assert_eq!(sel.title_row, "section.acc-head");
        assert_eq!(sel.content_pane, "div.ac-detail");
    }
}

//! The view surface the navigator reads positions from and scrolls.

use super::ScrollRequest;
use crate::manuscript::{Chapter, Section};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Viewports narrower than this have the fixed mobile header.
    pub mobile_breakpoint: f64,
    pub mobile_header_height: f64,
    pub retry_delay_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768.0,
            mobile_header_height: 64.0,
            retry_delay_ms: 100,
        }
    }
}

impl ScrollConfig {
    pub fn header_offset(&self, viewport_width: f64) -> f64 {
        if viewport_width < self.mobile_breakpoint {
            self.mobile_header_height
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    pub width: f64,
    pub height: f64,
    pub scroll_top: f64,
}

/// Section box in viewport coordinates (0 is the top edge of the visible area).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionRect {
    pub top: f64,
    pub bottom: f64,
}

impl SectionRect {
    pub fn contains(&self, y: f64) -> bool {
        self.top <= y && self.bottom >= y
    }
}

pub trait Viewport {
    fn metrics(&self) -> ViewportMetrics;

    /// `None` while the section is not laid out yet.
    fn section_rect(&self, section_id: &str) -> Option<SectionRect>;

    fn smooth_scroll_to(&mut self, top: f64);

    fn now_ms(&self) -> u64;
}

/// First shown section, in document order, covering the viewport's vertical midpoint.
pub fn section_at_midpoint<'a, V: Viewport + ?Sized>(
    chapters: &'a [Chapter],
    viewport: &V,
) -> Option<(&'a Chapter, &'a Section)> {
    let midpoint = viewport.metrics().height / 2.0;
    chapters
        .iter()
        .flat_map(|chapter| chapter.rendered_sections().map(move |section| (chapter, section)))
        .find(|(_, section)| {
            viewport
                .section_rect(&section.id)
                .is_some_and(|rect| rect.contains(midpoint))
        })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollOutcome {
    Scrolled { section_id: String, top: f64 },
    /// Target not laid out yet; one retry is scheduled.
    Deferred { section_id: String },
    /// Target still missing after the retry.
    Dropped { section_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingScroll {
    section_id: String,
    retry_at_ms: u64,
}

/// Runs scroll requests against a [`Viewport`]. At most one request is in flight.
#[derive(Debug, Clone, Default)]
pub struct ScrollDispatcher {
    config: ScrollConfig,
    pending: Option<PendingScroll>,
}

impl ScrollDispatcher {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn dispatch<V: Viewport + ?Sized>(
        &mut self,
        request: ScrollRequest,
        viewport: &mut V,
    ) -> ScrollOutcome {
        self.pending = None;

        if let Some(top) = self.scroll_to(&request.section_id, viewport) {
            return ScrollOutcome::Scrolled {
                section_id: request.section_id,
                top,
            };
        }

        debug!(section = %request.section_id, "scroll target not rendered yet, retrying later");
        self.pending = Some(PendingScroll {
            section_id: request.section_id.clone(),
            retry_at_ms: viewport.now_ms() + self.config.retry_delay_ms,
        });
        ScrollOutcome::Deferred {
            section_id: request.section_id,
        }
    }

    /// Retries a deferred request once its delay has passed.
    pub fn poll<V: Viewport + ?Sized>(&mut self, viewport: &mut V) -> Option<ScrollOutcome> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| viewport.now_ms() >= pending.retry_at_ms);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;

        match self.scroll_to(&pending.section_id, viewport) {
            Some(top) => Some(ScrollOutcome::Scrolled {
                section_id: pending.section_id,
                top,
            }),
            None => {
                warn!(section = %pending.section_id, "scroll target never rendered, skipping");
                Some(ScrollOutcome::Dropped {
                    section_id: pending.section_id,
                })
            }
        }
    }

    fn scroll_to<V: Viewport + ?Sized>(&self, section_id: &str, viewport: &mut V) -> Option<f64> {
        let rect = viewport.section_rect(section_id)?;
        let metrics = viewport.metrics();
        let top = (metrics.scroll_top + rect.top - self.config.header_offset(metrics.width)).max(0.0);
        viewport.smooth_scroll_to(top);
        Some(top)
    }
}

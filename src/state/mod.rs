mod layout;
mod navigator;
mod viewport;

pub use layout::{Page, TocEntry, TocSection, render_pages, table_of_contents};
pub use navigator::Navigator;
pub use viewport::{
    ScrollConfig, ScrollDispatcher, ScrollOutcome, SectionRect, Viewport, ViewportMetrics,
    section_at_midpoint,
};

use crate::manuscript::{Chapter, Manuscript, Section};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Command for the view to bring a section into sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub section_id: String,
}

/// Reading position and table-of-contents state for one open manuscript.
///
/// Only sections with visible text can become current. Transitions that should
/// move the view leave a [`ScrollRequest`] behind; a newer one replaces an older one.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReaderState {
    pub active_manuscript: Option<Manuscript>,
    pub current_chapter: Option<String>,
    pub current_section: Option<String>,
    pub expanded_chapters: BTreeMap<String, bool>,
    #[serde(skip)]
    scroll_request: Option<ScrollRequest>,
}

impl ReaderState {
    pub fn set_active_manuscript(&mut self, manuscript: Manuscript) {
        let first = manuscript.chapters.first();
        self.current_chapter = first.map(|chapter| chapter.id.clone());
        self.current_section = first
            .and_then(|chapter| chapter.rendered_sections().next())
            .map(|section| section.id.clone());
        self.expanded_chapters.clear();
        self.scroll_request = None;
        self.active_manuscript = Some(manuscript);
    }

    pub fn chapters(&self) -> &[Chapter] {
        self.active_manuscript
            .as_ref()
            .map(|manuscript| manuscript.chapters.as_slice())
            .unwrap_or(&[])
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters().len()
    }

    pub fn current_chapter(&self) -> Option<(&Chapter, usize)> {
        let id = self.current_chapter.as_deref()?;
        self.chapters()
            .iter()
            .enumerate()
            .find(|(_, chapter)| chapter.id == id)
            .map(|(index, chapter)| (chapter, index))
    }

    pub fn current_section(&self) -> Option<&Section> {
        let (chapter, _) = self.current_chapter()?;
        chapter.section(self.current_section.as_deref()?)
    }

    pub fn is_expanded(&self, chapter_id: &str) -> bool {
        self.expanded_chapters
            .get(chapter_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.scroll_request.take()
    }

    fn request_scroll(&mut self, section_id: &str) {
        self.scroll_request = Some(ScrollRequest {
            section_id: section_id.to_string(),
        });
    }

    /// Makes a chapter current, landing on its first shown section if it has one.
    pub fn select_chapter(&mut self, chapter_id: &str) -> bool {
        let Some(chapter) = self.chapters().iter().find(|chapter| chapter.id == chapter_id) else {
            debug!(chapter = %chapter_id, "ignoring selection of unknown chapter");
            return false;
        };
        let first_section = chapter.rendered_sections().next().map(|s| s.id.clone());

        self.current_chapter = Some(chapter_id.to_string());
        self.expanded_chapters.insert(chapter_id.to_string(), true);
        self.current_section = first_section.clone();

        match first_section {
            Some(section_id) => {
                debug!(chapter = %chapter_id, section = %section_id, "selected chapter");
                self.request_scroll(&section_id);
            }
            None => debug!(chapter = %chapter_id, "selected chapter has nothing to show"),
        }
        true
    }

    pub fn select_section(&mut self, chapter_id: &str, section_id: &str) -> bool {
        let shown = self
            .chapters()
            .iter()
            .find(|chapter| chapter.id == chapter_id)
            .is_some_and(|chapter| {
                chapter
                    .rendered_sections()
                    .any(|section| section.id == section_id)
            });
        if !shown {
            debug!(chapter = %chapter_id, section = %section_id, "ignoring selection of hidden section");
            return false;
        }

        self.current_chapter = Some(chapter_id.to_string());
        self.current_section = Some(section_id.to_string());
        self.request_scroll(section_id);
        true
    }

    /// Passive update from the view's scroll position. Never requests a scroll.
    pub fn observe_visible_section(&mut self, chapter_id: &str, section_id: &str) -> bool {
        if self.current_chapter.as_deref() == Some(chapter_id)
            && self.current_section.as_deref() == Some(section_id)
        {
            return false;
        }
        let shown = self
            .chapters()
            .iter()
            .find(|chapter| chapter.id == chapter_id)
            .is_some_and(|chapter| {
                chapter
                    .rendered_sections()
                    .any(|section| section.id == section_id)
            });
        if !shown {
            return false;
        }

        debug!(chapter = %chapter_id, section = %section_id, "visible section changed");
        self.current_chapter = Some(chapter_id.to_string());
        self.current_section = Some(section_id.to_string());
        true
    }

    /// Flips a chapter's expansion in the table of contents; returns the new value.
    pub fn toggle_chapter(&mut self, chapter_id: &str) -> Option<bool> {
        if !self.chapters().iter().any(|chapter| chapter.id == chapter_id) {
            return None;
        }
        let expanded = !self.is_expanded(chapter_id);
        self.expanded_chapters
            .insert(chapter_id.to_string(), expanded);
        Some(expanded)
    }

    pub fn next_chapter(&mut self) -> bool {
        let total = self.chapter_count();
        let Some((_, current)) = self.current_chapter() else {
            return false;
        };

        if current + 1 < total {
            let id = self.chapters()[current + 1].id.clone();
            self.select_chapter(&id)
        } else {
            false
        }
    }

    pub fn previous_chapter(&mut self) -> bool {
        let Some((_, current)) = self.current_chapter() else {
            return false;
        };

        if current > 0 {
            let id = self.chapters()[current - 1].id.clone();
            self.select_chapter(&id)
        } else {
            false
        }
    }
}

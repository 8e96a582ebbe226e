use crate::config::AppConfig;
use crate::manuscript::{
    Manuscript, ManuscriptService, ReadingStats, preview, reading_stats, to_text,
};
use crate::state::{Navigator, ReaderState, Viewport};
use crate::ui::UiRuntime;
use anyhow::{Context, Result, bail};
use std::path::Path;

/// High-level application orchestrator that wires parsing, state, and UI.
pub struct ReaderApp<U: UiRuntime> {
    service: ManuscriptService,
    config: AppConfig,
    state: ReaderState,
    ui: U,
}

impl<U: UiRuntime> ReaderApp<U> {
    pub fn new(ui: U, config: AppConfig) -> Self {
        Self {
            service: ManuscriptService::new(config.parser.clone()),
            config,
            state: ReaderState::default(),
            ui,
        }
    }

    pub fn open_manuscript(&mut self, path: &Path) -> Result<()> {
        let manuscript = self
            .service
            .open_manuscript(path)
            .with_context(|| format!("opening {}", path.display()))?;
        self.state.set_active_manuscript(manuscript);
        Ok(())
    }

    pub fn load_content(&mut self, raw: &str) {
        let manuscript = self.service.normalize_content(raw);
        self.state.set_active_manuscript(manuscript);
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    fn manuscript(&self) -> Result<&Manuscript> {
        self.state
            .active_manuscript
            .as_ref()
            .context("no story loaded")
    }

    /// Jumps to a chapter, or to one of its sections when `section_id` is given.
    pub fn select(&mut self, chapter_id: &str, section_id: Option<&str>) -> Result<()> {
        let found = match section_id {
            Some(section_id) => self.state.select_section(chapter_id, section_id),
            None => self.state.select_chapter(chapter_id),
        };
        if !found {
            bail!(
                "nothing to show at {chapter_id}{}",
                section_id.map(|id| format!(" / {id}")).unwrap_or_default()
            );
        }
        // The console has no viewport to scroll.
        self.state.take_scroll_request();
        Ok(())
    }

    /// Hands the current position to a scrolling view, using the configured scroll settings.
    pub fn attach_viewport<V: Viewport>(&self, viewport: V) -> Navigator<V> {
        Navigator::new(self.state.clone(), viewport, self.config.viewport)
    }

    pub fn toggle_chapter(&mut self, chapter_id: &str) -> Result<()> {
        self.state
            .toggle_chapter(chapter_id)
            .with_context(|| format!("no chapter with id {chapter_id}"))?;
        Ok(())
    }

    pub fn stats(&self) -> Result<(ReadingStats, Option<String>)> {
        let manuscript = self.manuscript()?;
        let stats = reading_stats(&manuscript.chapters, &self.config.reading);
        let excerpt = preview(&manuscript.chapters, self.config.reading.preview_chars);
        Ok((stats, excerpt))
    }

    pub fn export_json(&self) -> Result<String> {
        let stored = self.manuscript()?.to_stored();
        serde_json::to_string_pretty(&stored).context("serializing story")
    }

    pub fn export_text(&self) -> Result<String> {
        Ok(to_text(&self.manuscript()?.chapters))
    }

    pub fn run(self) -> Result<()> {
        self.ui.run(self.state)
    }
}

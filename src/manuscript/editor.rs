//! Structural edits on a chapter tree, as performed by the manual editor.
//!
//! A tree always keeps at least one chapter and each chapter at least one section.
//! Rejected operations leave the tree untouched.

use super::ids::{IdAllocator, SectionCounter, chapter_base_id, section_ordinal};
use super::service::ManuscriptService;
use super::{Chapter, Section, SectionContent};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("a story needs at least one chapter")]
    LastChapter,
    #[error("chapter {chapter_id} needs at least one section")]
    LastSection { chapter_id: String },
    #[error("no chapter with id {0}")]
    UnknownChapter(String),
    #[error("no section {section_id} in chapter {chapter_id}")]
    UnknownSection {
        chapter_id: String,
        section_id: String,
    },
    #[error("position {position} is out of range for {len} items")]
    PositionOutOfRange { position: usize, len: usize },
}

#[derive(Debug, Clone)]
pub struct ManuscriptEditor {
    chapters: Vec<Chapter>,
    chapter_ids: IdAllocator,
    section_counters: HashMap<String, SectionCounter>,
    next_ordinal: usize,
}

impl ManuscriptEditor {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        let chapters = ManuscriptService::normalize_chapters(chapters);
        let mut editor = Self {
            chapters: Vec::new(),
            chapter_ids: IdAllocator::new(),
            section_counters: HashMap::new(),
            next_ordinal: chapters.len() + 1,
        };

        for chapter in &chapters {
            editor.chapter_ids.claim(&chapter.id);
            let next = chapter
                .sections
                .iter()
                .filter_map(|section| section_ordinal(&chapter.id, &section.id))
                .max()
                .map_or(chapter.sections.len(), |max| max + 1);
            editor
                .section_counters
                .insert(chapter.id.clone(), SectionCounter::starting_at(next));
        }
        editor.chapters = chapters;

        for index in 0..editor.chapters.len() {
            if editor.chapters[index].sections.is_empty() {
                let id = editor.chapters[index].id.clone();
                let section_id = editor.next_section_id(&id);
                editor.chapters[index]
                    .sections
                    .push(Section::new(section_id, "", ""));
            }
        }

        if editor.chapters.is_empty() {
            editor.add_chapter("");
        }
        editor
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn into_chapters(self) -> Vec<Chapter> {
        self.chapters
    }

    fn next_section_id(&mut self, chapter_id: &str) -> String {
        self.section_counters
            .entry(chapter_id.to_string())
            .or_default()
            .next_id(chapter_id)
    }

    fn chapter_index(&self, chapter_id: &str) -> Result<usize, EditorError> {
        self.chapters
            .iter()
            .position(|chapter| chapter.id == chapter_id)
            .ok_or_else(|| EditorError::UnknownChapter(chapter_id.to_string()))
    }

    fn section_index(&self, chapter_id: &str, section_id: &str) -> Result<(usize, usize), EditorError> {
        let chapter = self.chapter_index(chapter_id)?;
        let section = self.chapters[chapter]
            .sections
            .iter()
            .position(|section| section.id == section_id)
            .ok_or_else(|| EditorError::UnknownSection {
                chapter_id: chapter_id.to_string(),
                section_id: section_id.to_string(),
            })?;
        Ok((chapter, section))
    }

    /// Appends a chapter with one empty section and returns its id.
    pub fn add_chapter(&mut self, title: impl Into<String>) -> String {
        let id = self.chapter_ids.claim(&chapter_base_id(self.next_ordinal));
        self.next_ordinal += 1;

        let mut chapter = Chapter::new(id.clone(), title);
        let section_id = self.next_section_id(&id);
        chapter.sections.push(Section::new(section_id, "", ""));
        self.chapters.push(chapter);

        debug!(chapter = %id, "added chapter");
        id
    }

    /// Appends an empty section to a chapter and returns its id.
    pub fn add_section(
        &mut self,
        chapter_id: &str,
        title: impl Into<String>,
    ) -> Result<String, EditorError> {
        let index = self.chapter_index(chapter_id)?;
        let section_id = self.next_section_id(chapter_id);
        self.chapters[index]
            .sections
            .push(Section::new(section_id.clone(), title, ""));

        debug!(chapter = %chapter_id, section = %section_id, "added section");
        Ok(section_id)
    }

    pub fn delete_chapter(&mut self, chapter_id: &str) -> Result<Chapter, EditorError> {
        let index = self.chapter_index(chapter_id)?;
        if self.chapters.len() == 1 {
            return Err(EditorError::LastChapter);
        }
        Ok(self.chapters.remove(index))
    }

    pub fn delete_section(
        &mut self,
        chapter_id: &str,
        section_id: &str,
    ) -> Result<Section, EditorError> {
        let (chapter, section) = self.section_index(chapter_id, section_id)?;
        if self.chapters[chapter].sections.len() == 1 {
            return Err(EditorError::LastSection {
                chapter_id: chapter_id.to_string(),
            });
        }
        Ok(self.chapters[chapter].sections.remove(section))
    }

    pub fn move_chapter(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        Self::reorder(&mut self.chapters, from, to)
    }

    pub fn move_section(&mut self, chapter_id: &str, from: usize, to: usize) -> Result<(), EditorError> {
        let index = self.chapter_index(chapter_id)?;
        Self::reorder(&mut self.chapters[index].sections, from, to)
    }

    fn reorder<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), EditorError> {
        let len = items.len();
        for position in [from, to] {
            if position >= len {
                return Err(EditorError::PositionOutOfRange { position, len });
            }
        }
        let item = items.remove(from);
        items.insert(to, item);
        Ok(())
    }

    pub fn rename_chapter(&mut self, chapter_id: &str, title: impl Into<String>) -> Result<(), EditorError> {
        let index = self.chapter_index(chapter_id)?;
        self.chapters[index].title = title.into();
        Ok(())
    }

    pub fn rename_section(
        &mut self,
        chapter_id: &str,
        section_id: &str,
        title: impl Into<String>,
    ) -> Result<(), EditorError> {
        let (chapter, section) = self.section_index(chapter_id, section_id)?;
        self.chapters[chapter].sections[section].title = title.into();
        Ok(())
    }

    pub fn set_section_content(
        &mut self,
        chapter_id: &str,
        section_id: &str,
        content: impl Into<SectionContent>,
    ) -> Result<(), EditorError> {
        let (chapter, section) = self.section_index(chapter_id, section_id)?;
        self.chapters[chapter].sections[section].content = content.into();
        Ok(())
    }

    pub fn set_quote(&mut self, chapter_id: &str, section_id: &str, is_quote: bool) -> Result<(), EditorError> {
        let (chapter, section) = self.section_index(chapter_id, section_id)?;
        self.chapters[chapter].sections[section].is_quote = is_quote;
        Ok(())
    }
}

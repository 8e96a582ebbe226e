use super::ids::{IdAllocator, SectionCounter, chapter_base_id, section_id, section_ordinal};
use super::parser::{ParseOptions, parse_with_options};
use super::{Chapter, ContentSource, Manuscript, ManuscriptId, StoredContent};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ManuscriptError {
    #[error("failed to read manuscript at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode structured manuscript at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Normalizes both stored encodings (plain text and `{chapters}` JSON) into one tree shape.
#[derive(Debug, Default, Clone)]
pub struct ManuscriptService {
    options: ParseOptions,
}

impl ManuscriptService {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn open_manuscript(&self, path: &Path) -> Result<Manuscript> {
        let raw = fs::read_to_string(path).map_err(|source| ManuscriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut manuscript = if is_json {
            let stored: StoredContent =
                serde_json::from_str(&raw).map_err(|source| ManuscriptError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            Self::from_stored(stored)
        } else {
            self.normalize_content(&raw)
        };

        if manuscript.title.is_none() {
            manuscript.title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string());
        }
        manuscript.source_path = Some(path.to_path_buf());

        info!(
            path = %path.display(),
            source = ?manuscript.source,
            chapters = manuscript.chapters.len(),
            "opened manuscript"
        );
        Ok(manuscript)
    }

    /// Accepts a story `content` field in either legacy encoding.
    pub fn normalize_content(&self, raw: &str) -> Manuscript {
        if raw.trim_start().starts_with('{') {
            match serde_json::from_str::<StoredContent>(raw) {
                Ok(stored) => return Self::from_stored(stored),
                Err(err) => debug!("content looks like JSON but is not a chapter document: {err}"),
            }
        }

        let mut manuscript = Manuscript::empty();
        manuscript.id = ManuscriptId(Uuid::new_v4().to_string());
        manuscript.source = ContentSource::PlainText;
        manuscript.chapters = parse_with_options(raw, &self.options);
        manuscript
    }

    pub fn from_stored(stored: StoredContent) -> Manuscript {
        let id = stored
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut manuscript = Manuscript::empty();
        manuscript.id = ManuscriptId(id);
        manuscript.title = stored.title;
        manuscript.source = ContentSource::Structured;
        manuscript.chapters = Self::normalize_chapters(stored.chapters);
        manuscript
    }

    /// Fills in missing ids and disambiguates collisions, keeping document order.
    ///
    /// A chapter that gets a new id carries its scheme-shaped section ids over to it,
    /// and section ids stay unique across the whole tree.
    pub fn normalize_chapters(mut chapters: Vec<Chapter>) -> Vec<Chapter> {
        let mut chapter_ids = IdAllocator::new();
        let mut section_ids = IdAllocator::new();

        for (index, chapter) in chapters.iter_mut().enumerate() {
            let base = if chapter.id.trim().is_empty() {
                chapter_base_id(index + 1)
            } else {
                chapter.id.clone()
            };
            let id = chapter_ids.claim(&base);
            if id != chapter.id {
                debug!(from = %chapter.id, to = %id, "reassigned chapter id");
                let old_id = std::mem::replace(&mut chapter.id, id);
                Self::rebase_sections(chapter, &old_id);
            }
            Self::normalize_sections(chapter, &mut section_ids);
        }

        chapters
    }

    fn rebase_sections(chapter: &mut Chapter, old_id: &str) {
        if old_id.trim().is_empty() {
            return;
        }
        for section in &mut chapter.sections {
            if let Some(ordinal) = section_ordinal(old_id, &section.id) {
                section.id = section_id(&chapter.id, ordinal);
            }
        }
    }

    fn normalize_sections(chapter: &mut Chapter, section_ids: &mut IdAllocator) {
        let next = chapter
            .sections
            .iter()
            .filter_map(|section| section_ordinal(&chapter.id, &section.id))
            .max()
            .map_or(0, |max| max + 1);
        let mut counter = SectionCounter::starting_at(next);

        for section in &mut chapter.sections {
            let id = if section.id.trim().is_empty() || section_ids.contains(&section.id) {
                section_ids.claim(&counter.next_id(&chapter.id))
            } else {
                section_ids.claim(&section.id)
            };
            section.id = id;
        }
    }
}

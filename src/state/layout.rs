use super::ReaderState;
use crate::manuscript::{Chapter, Section};
use serde::Serialize;

/// One entry of the scrolling page sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page<'a> {
    ChapterTitle { chapter: &'a Chapter, number: usize },
    Section { chapter: &'a Chapter, section: &'a Section },
}

/// Every chapter gets a title page; only sections with visible text get pages.
pub fn render_pages(chapters: &[Chapter]) -> Vec<Page<'_>> {
    let mut pages = Vec::new();
    for (index, chapter) in chapters.iter().enumerate() {
        pages.push(Page::ChapterTitle {
            chapter,
            number: index + 1,
        });
        pages.extend(
            chapter
                .rendered_sections()
                .map(|section| Page::Section { chapter, section }),
        );
    }
    pages
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocSection {
    pub section_id: String,
    pub title: String,
    pub is_quote: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub chapter_id: String,
    pub title: String,
    pub expanded: bool,
    pub active: bool,
    pub sections: Vec<TocSection>,
}

pub fn table_of_contents(state: &ReaderState) -> Vec<TocEntry> {
    let current_chapter = state.current_chapter.as_deref();
    let current_section = state.current_section.as_deref();

    state
        .chapters()
        .iter()
        .map(|chapter| {
            let active = current_chapter == Some(chapter.id.as_str());
            TocEntry {
                chapter_id: chapter.id.clone(),
                title: chapter.title.clone(),
                expanded: state.is_expanded(&chapter.id),
                active,
                sections: chapter
                    .rendered_sections()
                    .map(|section| TocSection {
                        section_id: section.id.clone(),
                        title: section.heading().unwrap_or_default().to_string(),
                        is_quote: section.is_quote,
                        active: active && current_section == Some(section.id.as_str()),
                    })
                    .collect(),
            }
        })
        .collect()
}

//! Identifier scheme shared by the parser, the editor and stored-content normalization.
//!
//! Chapters are `chapter-<n>`; a repeated base gets `-1`, `-2`, ... appended.
//! Sections are `<chapterId>-section-<k>` with `k` drawn from a per-chapter counter.

use std::collections::HashSet;

pub const CHAPTER_PREFIX: &str = "chapter-";
const SECTION_INFIX: &str = "-section-";

pub fn chapter_base_id(ordinal: impl std::fmt::Display) -> String {
    format!("{CHAPTER_PREFIX}{ordinal}")
}

pub fn section_id(chapter_id: &str, ordinal: usize) -> String {
    format!("{chapter_id}{SECTION_INFIX}{ordinal}")
}

/// Counter value encoded in `section_id`, if it follows the scheme for `chapter_id`.
pub fn section_ordinal(chapter_id: &str, section_id: &str) -> Option<usize> {
    section_id
        .strip_prefix(chapter_id)?
        .strip_prefix(SECTION_INFIX)?
        .parse()
        .ok()
}

/// Hands out ids that are unique across everything it has seen.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `base` if unused, otherwise the first free `base-1`, `base-2`, ...
    pub fn claim(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }

        let mut suffix = 1usize;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.used.contains(id)
    }
}

/// Monotonic per-chapter section counter. Values are never handed out twice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionCounter {
    next: usize,
}

impl SectionCounter {
    pub fn starting_at(next: usize) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self, chapter_id: &str) -> String {
        let id = section_id(chapter_id, self.next);
        self.next += 1;
        id
    }

    pub fn peek(&self) -> usize {
        self.next
    }
}

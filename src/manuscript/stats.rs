use super::Chapter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub chars_per_minute: usize,
    pub preview_chars: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            chars_per_minute: 500,
            preview_chars: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct ReadingStats {
    pub chapters: usize,
    pub sections: usize,
    pub rendered_sections: usize,
    pub characters: usize,
    pub minutes: usize,
}

/// Counts non-whitespace characters of rendered sections; any text reads for at least a minute.
pub fn reading_stats(chapters: &[Chapter], config: &ReadingConfig) -> ReadingStats {
    let mut stats = ReadingStats {
        chapters: chapters.len(),
        ..ReadingStats::default()
    };

    for chapter in chapters {
        stats.sections += chapter.sections.len();
        for section in chapter.rendered_sections() {
            stats.rendered_sections += 1;
            stats.characters += section.content.char_count();
        }
    }

    if stats.characters > 0 {
        stats.minutes = stats.characters.div_ceil(config.chars_per_minute.max(1));
    }
    stats
}

/// Opening text of the first rendered non-quote section, whitespace-folded.
pub fn preview(chapters: &[Chapter], max_chars: usize) -> Option<String> {
    let section = chapters
        .iter()
        .flat_map(|chapter| chapter.rendered_sections())
        .find(|section| !section.is_quote)?;

    let folded = section
        .content
        .to_plain_text()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if folded.chars().count() <= max_chars {
        return Some(folded);
    }
    let mut cut: String = folded.chars().take(max_chars).collect();
    cut.push('…');
    Some(cut)
}

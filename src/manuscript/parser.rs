//! Line-oriented structuring of generated or legacy story text.
//!
//! Recognized lines:
//!
//! * `# [제]N장[:] title` opens a chapter (and its implicit lead-in section),
//! * `## title` opens a section inside the current chapter,
//! * `> text` emits a standalone quote section,
//! * everything else is section body, with runs of blank lines folded to one.
//!
//! Unmatched heading-like lines are body text. Parsing never fails.

use super::ids::{IdAllocator, SectionCounter, chapter_base_id};
use super::model::{Chapter, Section};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

static CHAPTER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s+(?:제)?([0-9]+)장:?\s+(.+)$").expect("chapter heading pattern is valid")
});
static SECTION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(.+)$").expect("section heading pattern is valid"));
static QUOTE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>\s+(.+)$").expect("quote pattern is valid"));

/// Title given to a body section that directly follows a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "title", rename_all = "snake_case")]
pub enum QuoteFollowTitle {
    #[default]
    Blank,
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub quote_title: String,
    pub fallback_chapter_title: String,
    pub quote_follow_title: QuoteFollowTitle,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            quote_title: "인용".to_string(),
            fallback_chapter_title: "자서전".to_string(),
            quote_follow_title: QuoteFollowTitle::Blank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    ChapterHeading { ordinal: &'a str, title: &'a str },
    SectionHeading { title: &'a str },
    Quote { text: &'a str },
    Blank,
    Text(&'a str),
}

pub fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim_end();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    if let Some(caps) = CHAPTER_HEADING.captures(trimmed) {
        if let (Some(ordinal), Some(title)) = (caps.get(1), caps.get(2)) {
            return LineKind::ChapterHeading {
                ordinal: ordinal.as_str(),
                title: title.as_str().trim(),
            };
        }
    }

    if let Some(title) = SECTION_HEADING.captures(trimmed).and_then(|caps| caps.get(1)) {
        return LineKind::SectionHeading {
            title: title.as_str().trim(),
        };
    }

    if let Some(text) = QUOTE_LINE.captures(trimmed).and_then(|caps| caps.get(1)) {
        return LineKind::Quote {
            text: text.as_str().trim(),
        };
    }

    LineKind::Text(line)
}

/// Body lines of the section currently being accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBuffer {
    id: String,
    title: String,
    lines: Vec<String>,
}

impl SectionBuffer {
    fn new(id: String, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn push_blank(&mut self) {
        if self.lines.last().is_some_and(|last| last.is_empty()) {
            return;
        }
        self.lines.push(String::new());
    }

    /// Trims surrounding blank lines; `None` when nothing is left.
    fn commit(self) -> Option<Section> {
        let start = self.lines.iter().position(|line| !line.trim().is_empty())?;
        let end = self.lines.iter().rposition(|line| !line.trim().is_empty())?;
        let body = self.lines[start..=end].join("\n");
        Some(Section::new(self.id, self.title, body))
    }
}

/// Counters and committed output threaded through one parse pass.
#[derive(Debug, Default)]
pub struct ParserContext {
    chapter_ids: IdAllocator,
    sections: SectionCounter,
    chapters: Vec<Chapter>,
}

impl ParserContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn open_chapter(&mut self, ordinal: &str, title: &str) -> (Chapter, SectionBuffer) {
        let id = self.chapter_ids.claim(&chapter_base_id(ordinal));
        self.sections = SectionCounter::default();
        let lead_in = SectionBuffer::new(self.sections.next_id(&id), "");
        (Chapter::new(id, format!("{ordinal}장: {title}")), lead_in)
    }

    fn open_section(&mut self, chapter: &Chapter, title: impl Into<String>) -> SectionBuffer {
        SectionBuffer::new(self.sections.next_id(&chapter.id), title)
    }

    fn commit_chapter(&mut self, chapter: Chapter) {
        if chapter.sections.is_empty() {
            debug!(chapter = %chapter.id, "dropping chapter without content");
            return;
        }
        debug!(
            chapter = %chapter.id,
            sections = chapter.sections.len(),
            "committed chapter"
        );
        self.chapters.push(chapter);
    }
}

fn flush(chapter: &mut Chapter, buffer: SectionBuffer) {
    let id = buffer.id.clone();
    match buffer.commit() {
        Some(section) => chapter.sections.push(section),
        None => debug!(section = %id, "discarding empty section"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParserState {
    /// No chapter has been opened yet; lines are dropped.
    #[default]
    None,
    /// A chapter is open but no body section is accumulating (right after a quote).
    InChapter(Chapter),
    InSection(Chapter, SectionBuffer),
}

impl ParserState {
    pub fn step(self, ctx: &mut ParserContext, line: LineKind<'_>, options: &ParseOptions) -> Self {
        match line {
            LineKind::ChapterHeading { ordinal, title } => {
                self.finish(ctx);
                let (chapter, lead_in) = ctx.open_chapter(ordinal, title);
                ParserState::InSection(chapter, lead_in)
            }
            LineKind::SectionHeading { title } => match self {
                ParserState::None => ParserState::None,
                ParserState::InChapter(chapter) => {
                    let buffer = ctx.open_section(&chapter, title);
                    ParserState::InSection(chapter, buffer)
                }
                ParserState::InSection(mut chapter, buffer) => {
                    flush(&mut chapter, buffer);
                    let buffer = ctx.open_section(&chapter, title);
                    ParserState::InSection(chapter, buffer)
                }
            },
            LineKind::Quote { text } => {
                let mut chapter = match self {
                    ParserState::None => return ParserState::None,
                    ParserState::InChapter(chapter) => chapter,
                    ParserState::InSection(mut chapter, buffer) => {
                        flush(&mut chapter, buffer);
                        chapter
                    }
                };
                let id = ctx.sections.next_id(&chapter.id);
                chapter
                    .sections
                    .push(Section::quote(id, options.quote_title.clone(), text));
                ParserState::InChapter(chapter)
            }
            LineKind::Blank => match self {
                ParserState::InSection(chapter, mut buffer) => {
                    buffer.push_blank();
                    ParserState::InSection(chapter, buffer)
                }
                other => other,
            },
            LineKind::Text(text) => match self {
                ParserState::None => ParserState::None,
                ParserState::InChapter(chapter) => {
                    let title = match &options.quote_follow_title {
                        QuoteFollowTitle::Blank => String::new(),
                        QuoteFollowTitle::Placeholder(title) => title.clone(),
                    };
                    let mut buffer = ctx.open_section(&chapter, title);
                    buffer.push_line(text);
                    ParserState::InSection(chapter, buffer)
                }
                ParserState::InSection(chapter, mut buffer) => {
                    buffer.push_line(text);
                    ParserState::InSection(chapter, buffer)
                }
            },
        }
    }

    /// Commits whatever is still open.
    pub fn finish(self, ctx: &mut ParserContext) {
        match self {
            ParserState::None => {}
            ParserState::InChapter(chapter) => ctx.commit_chapter(chapter),
            ParserState::InSection(mut chapter, buffer) => {
                flush(&mut chapter, buffer);
                ctx.commit_chapter(chapter);
            }
        }
    }
}

pub fn parse(raw: &str) -> Vec<Chapter> {
    parse_with_options(raw, &ParseOptions::default())
}

pub fn parse_with_options(raw: &str, options: &ParseOptions) -> Vec<Chapter> {
    let mut ctx = ParserContext::new();
    let state = raw.lines().map(classify).fold(ParserState::None, |state, line| {
        state.step(&mut ctx, line, options)
    });
    state.finish(&mut ctx);

    if ctx.chapters.is_empty() && !raw.trim().is_empty() {
        debug!("no chapter headings found, wrapping the whole text");
        return vec![fallback_chapter(raw, options)];
    }
    ctx.chapters
}

fn fallback_chapter(raw: &str, options: &ParseOptions) -> Chapter {
    let id = chapter_base_id(1);
    let mut sections = SectionCounter::default();
    let mut chapter = Chapter::new(id.clone(), options.fallback_chapter_title.clone());
    chapter
        .sections
        .push(Section::new(sections.next_id(&id), "", raw));
    chapter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manuscript::SectionContent;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn text(section: &Section) -> String {
        section.content.to_plain_text()
    }

    #[test]
    fn parses_chapter_with_lead_in_and_titled_section() {
        let chapters = parse("# 1장: 시작\n\n본문 첫줄.\n\n## 추억\n\n내용입니다.");

        assert_eq!(chapters.len(), 1);
        let chapter = &chapters[0];
        assert_eq!(chapter.id, "chapter-1");
        assert_eq!(chapter.title, "1장: 시작");
        assert_eq!(chapter.sections.len(), 2);

        assert_eq!(chapter.sections[0].id, "chapter-1-section-0");
        assert_eq!(chapter.sections[0].title, "");
        assert_eq!(text(&chapter.sections[0]), "본문 첫줄.");

        assert_eq!(chapter.sections[1].id, "chapter-1-section-1");
        assert_eq!(chapter.sections[1].title, "추억");
        assert_eq!(text(&chapter.sections[1]), "내용입니다.");
    }

    #[test]
    fn duplicate_ordinals_get_distinct_ids_and_keep_titles() {
        let chapters = parse("# 1장: 처음\n하나\n# 1장: 다시\n둘");

        let ids: Vec<_> = chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["chapter-1", "chapter-1-1"]);
        assert_eq!(chapters[0].title, "1장: 처음");
        assert_eq!(chapters[1].title, "1장: 다시");
        assert_eq!(chapters[1].sections[0].id, "chapter-1-1-section-0");
    }

    #[test]
    fn chapter_numbers_must_be_ascii_digits() {
        assert_eq!(classify("# １장: 전각"), LineKind::Text("# １장: 전각"));

        let chapters = parse("# 1장: 시작\n본문\n# １장: 전각\n계속");
        assert_eq!(chapters.len(), 1);
        assert_eq!(text(&chapters[0].sections[0]), "본문\n# １장: 전각\n계속");
    }

    #[test]
    fn headingless_text_becomes_single_fallback_chapter() {
        let chapters = parse("그냥 평범한 문장입니다.");

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].id, "chapter-1");
        assert_eq!(chapters[0].title, "자서전");
        assert_eq!(chapters[0].sections.len(), 1);
        assert_eq!(
            chapters[0].sections[0].content,
            SectionContent::PlainText("그냥 평범한 문장입니다.".into())
        );
    }

    #[test]
    fn quote_splits_surrounding_paragraph() {
        let chapters = parse("# 2장: 청춘\n앞 문단.\n> 인생은 짧다\n뒤 문단.");
        let sections = &chapters[0].sections;

        assert_eq!(sections.len(), 3);
        assert_eq!(text(&sections[0]), "앞 문단.");
        assert!(!sections[0].is_quote);

        assert!(sections[1].is_quote);
        assert_eq!(sections[1].title, "인용");
        assert_eq!(text(&sections[1]), "인생은 짧다");

        assert!(!sections[2].is_quote);
        assert_eq!(sections[2].title, "");
        assert_eq!(text(&sections[2]), "뒤 문단.");
        assert_eq!(sections[2].id, "chapter-2-section-2");
    }

    #[test]
    fn placeholder_policy_titles_text_after_quote() {
        let options = ParseOptions {
            quote_follow_title: QuoteFollowTitle::Placeholder("이어서".into()),
            ..ParseOptions::default()
        };
        let chapters = parse_with_options("# 1장: 시작\n> 인용\n\n다음 내용", &options);
        let sections = &chapters[0].sections;

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "이어서");
        assert_eq!(text(&sections[1]), "다음 내용");
    }

    #[test]
    fn placeholder_policy_does_not_override_explicit_heading() {
        let options = ParseOptions {
            quote_follow_title: QuoteFollowTitle::Placeholder("이어서".into()),
            ..ParseOptions::default()
        };
        let chapters = parse_with_options("# 1장: 시작\n> 인용\n## 진짜 제목\n내용", &options);
        assert_eq!(chapters[0].sections[1].title, "진짜 제목");
    }

    #[test]
    fn blank_runs_collapse_and_edges_are_trimmed() {
        let chapters = parse("# 1장: 시작\n\n\n첫 문단\n\n\n\n둘째 문단\n\n\n");
        assert_eq!(text(&chapters[0].sections[0]), "첫 문단\n\n둘째 문단");
    }

    #[test]
    fn section_heading_before_any_chapter_is_ignored() {
        let chapters = parse("## 떠도는 제목\n서문\n# 1장: 시작\n본문");

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].sections.len(), 1);
        assert_eq!(text(&chapters[0].sections[0]), "본문");
    }

    #[test]
    fn malformed_headings_are_body_text() {
        let chapters = parse("# 1장: 시작\n# 장: 번호 없음\n#2장: 공백 없음\n### 깊은 제목");
        assert_eq!(chapters.len(), 1);
        assert_eq!(
            text(&chapters[0].sections[0]),
            "# 장: 번호 없음\n#2장: 공백 없음\n### 깊은 제목"
        );
    }

    #[test]
    fn heading_accepts_je_prefix_and_missing_colon() {
        let chapters = parse("# 제3장 어린 시절\n내용");
        assert_eq!(chapters[0].id, "chapter-3");
        assert_eq!(chapters[0].title, "3장: 어린 시절");
    }

    #[test]
    fn empty_sections_are_discarded_but_keep_their_counter_slot() {
        let chapters = parse("# 1장: 시작\n## 빈 섹션\n\n## 찬 섹션\n내용");
        let sections = &chapters[0].sections;
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "찬 섹션");
        assert_eq!(sections[0].id, "chapter-1-section-2");
    }

    #[test]
    fn chapters_without_content_are_dropped() {
        let chapters = parse("# 1장: 비어 있음\n\n# 2장: 내용 있음\n본문");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].id, "chapter-2");
    }

    #[test]
    fn empty_input_yields_no_chapters() {
        assert!(parse("").is_empty());
        assert!(parse("\n  \n\t\n").is_empty());
    }

    #[test]
    fn windows_line_endings_are_tolerated() {
        let chapters = parse("# 1장: 시작\r\n본문\r\n> 인용\r\n");
        assert_eq!(chapters[0].title, "1장: 시작");
        assert_eq!(text(&chapters[0].sections[0]), "본문");
        assert_eq!(text(&chapters[0].sections[1]), "인용");
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("# 1장: 시작".to_string()),
            Just("# 2장: 성장".to_string()),
            Just("# 제2장 다시".to_string()),
            Just("## 소제목".to_string()),
            Just("> 인생은 짧다".to_string()),
            Just(String::new()),
            Just("   ".to_string()),
            "[가-힣a-z .]{1,16}",
        ]
    }

    fn document_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec(line_strategy(), 0..40).prop_map(|lines| lines.join("\n"))
    }

    fn has_surrounding_blank_line(body: &str) -> bool {
        let lines: Vec<_> = body.split('\n').collect();
        lines.first().is_some_and(|line| line.trim().is_empty())
            || lines.last().is_some_and(|line| line.trim().is_empty())
    }

    proptest! {
        #[test]
        fn parsing_is_deterministic(doc in document_strategy()) {
            prop_assert_eq!(parse(&doc), parse(&doc));
        }

        #[test]
        fn ids_are_unique(doc in document_strategy()) {
            let chapters = parse(&doc);
            let chapter_ids: HashSet<_> = chapters.iter().map(|c| c.id.clone()).collect();
            prop_assert_eq!(chapter_ids.len(), chapters.len());
            for chapter in &chapters {
                let section_ids: HashSet<_> = chapter.sections.iter().map(|s| s.id.clone()).collect();
                prop_assert_eq!(section_ids.len(), chapter.sections.len());
            }
        }

        #[test]
        fn committed_sections_are_trimmed_and_non_empty(doc in document_strategy()) {
            let chapters = parse(&doc);
            let fallback = chapters.len() == 1
                && chapters[0].title == ParseOptions::default().fallback_chapter_title;
            for chapter in &chapters {
                prop_assert!(!chapter.sections.is_empty());
                if fallback {
                    continue;
                }
                for section in &chapter.sections {
                    let body = section.content.to_plain_text();
                    prop_assert!(!body.trim().is_empty());
                    prop_assert!(!has_surrounding_blank_line(&body));
                }
            }
        }

        #[test]
        fn chapter_order_follows_headings(doc in document_strategy()) {
            let chapters = parse(&doc);
            let heading_titles: Vec<String> = doc
                .lines()
                .filter_map(|line| match classify(line) {
                    LineKind::ChapterHeading { ordinal, title } => Some(format!("{ordinal}장: {title}")),
                    _ => None,
                })
                .collect();
            let fallback_title = ParseOptions::default().fallback_chapter_title;
            let mut remaining = heading_titles.iter();
            for chapter in chapters.iter().filter(|c| c.title != fallback_title) {
                prop_assert!(remaining.any(|title| *title == chapter.title));
            }
        }

        #[test]
        fn headingless_text_is_kept_verbatim(lines in proptest::collection::vec("[가-힣a-z >#.]{0,16}", 1..12)) {
            let doc = lines.join("\n");
            prop_assume!(!doc.trim().is_empty());
            prop_assume!(!doc.lines().any(|line| matches!(classify(line), LineKind::ChapterHeading { .. })));

            let chapters = parse(&doc);
            prop_assert_eq!(chapters.len(), 1);
            prop_assert_eq!(chapters[0].sections.len(), 1);
            prop_assert_eq!(chapters[0].sections[0].content.to_plain_text(), doc);
        }

        #[test]
        fn quote_lines_become_isolated_quote_sections(before in "[가-힣]{1,8}", quote in "[가-힣]{1,8}", after in "[가-힣]{1,8}") {
            let doc = format!("# 1장: 시작\n{before}\n> {quote}\n{after}");
            let chapters = parse(&doc);
            let quotes: Vec<_> = chapters[0].sections.iter().filter(|s| s.is_quote).collect();
            prop_assert_eq!(quotes.len(), 1);
            prop_assert_eq!(quotes[0].content.to_plain_text(), quote);
            prop_assert_eq!(chapters[0].sections.len(), 3);
        }
    }
}

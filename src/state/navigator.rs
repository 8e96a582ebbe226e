use super::viewport::{ScrollConfig, ScrollDispatcher, ScrollOutcome, Viewport, section_at_midpoint};
use super::ReaderState;

/// Keeps the reading position, the table of contents and a scrolling view in step.
///
/// User selections move the view; scroll ticks only move the position.
pub struct Navigator<V: Viewport> {
    state: ReaderState,
    scroller: ScrollDispatcher,
    viewport: V,
}

impl<V: Viewport> Navigator<V> {
    pub fn new(state: ReaderState, viewport: V, config: ScrollConfig) -> Self {
        Self {
            state,
            scroller: ScrollDispatcher::new(config),
            viewport,
        }
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn into_state(self) -> ReaderState {
        self.state
    }

    pub fn select_chapter(&mut self, chapter_id: &str) -> bool {
        let found = self.state.select_chapter(chapter_id);
        self.dispatch_requested_scroll();
        found
    }

    pub fn select_section(&mut self, chapter_id: &str, section_id: &str) -> bool {
        let found = self.state.select_section(chapter_id, section_id);
        self.dispatch_requested_scroll();
        found
    }

    pub fn next_chapter(&mut self) -> bool {
        let moved = self.state.next_chapter();
        self.dispatch_requested_scroll();
        moved
    }

    pub fn previous_chapter(&mut self) -> bool {
        let moved = self.state.previous_chapter();
        self.dispatch_requested_scroll();
        moved
    }

    pub fn toggle_chapter(&mut self, chapter_id: &str) -> Option<bool> {
        self.state.toggle_chapter(chapter_id)
    }

    /// Call on every scroll or resize event.
    pub fn on_scroll(&mut self) -> bool {
        let visible = section_at_midpoint(self.state.chapters(), &self.viewport)
            .map(|(chapter, section)| (chapter.id.clone(), section.id.clone()));
        let Some((chapter_id, section_id)) = visible else {
            return false;
        };
        self.state.observe_visible_section(&chapter_id, &section_id)
    }

    /// Call once per frame so deferred scrolls get their retry.
    pub fn tick(&mut self) -> Option<ScrollOutcome> {
        self.scroller.poll(&mut self.viewport)
    }

    pub fn has_pending_scroll(&self) -> bool {
        self.scroller.has_pending()
    }

    fn dispatch_requested_scroll(&mut self) -> Option<ScrollOutcome> {
        let request = self.state.take_scroll_request()?;
        Some(self.scroller.dispatch(request, &mut self.viewport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manuscript::{Chapter, ManuscriptService, Section, StoredContent};
    use crate::state::{SectionRect, ViewportMetrics};
    use std::collections::{HashMap, HashSet};

    /// Stacked sections in document coordinates; scrolling is instantaneous.
    struct FakeViewport {
        width: f64,
        height: f64,
        scroll_top: f64,
        layout: HashMap<String, (f64, f64)>,
        unmounted: HashSet<String>,
        now: u64,
        scrolls: Vec<f64>,
    }

    impl FakeViewport {
        fn new(width: f64, sections: &[(&str, f64)]) -> Self {
            let mut layout = HashMap::new();
            let mut y = 0.0;
            for (id, height) in sections {
                layout.insert(id.to_string(), (y, y + height));
                y += height;
            }
            Self {
                width,
                height: 800.0,
                scroll_top: 0.0,
                layout,
                unmounted: HashSet::new(),
                now: 0,
                scrolls: Vec::new(),
            }
        }
    }

    impl Viewport for FakeViewport {
        fn metrics(&self) -> ViewportMetrics {
            ViewportMetrics {
                width: self.width,
                height: self.height,
                scroll_top: self.scroll_top,
            }
        }

        fn section_rect(&self, section_id: &str) -> Option<SectionRect> {
            if self.unmounted.contains(section_id) {
                return None;
            }
            let (top, bottom) = self.layout.get(section_id)?;
            Some(SectionRect {
                top: top - self.scroll_top,
                bottom: bottom - self.scroll_top,
            })
        }

        fn smooth_scroll_to(&mut self, top: f64) {
            self.scroll_top = top;
            self.scrolls.push(top);
        }

        fn now_ms(&self) -> u64 {
            self.now
        }
    }

    const TEXT: &str = "# 1장: 시작\n본문\n## 추억\n내용\n# 2장: 청춘\n둘째\n> 인용\n셋째";

    fn layout() -> Vec<(&'static str, f64)> {
        vec![
            ("chapter-1-section-0", 500.0),
            ("chapter-1-section-1", 500.0),
            ("chapter-2-section-0", 1000.0),
            ("chapter-2-section-1", 100.0),
            ("chapter-2-section-2", 1000.0),
        ]
    }

    fn navigator(width: f64) -> Navigator<FakeViewport> {
        let mut state = ReaderState::default();
        state.set_active_manuscript(ManuscriptService::default().normalize_content(TEXT));
        Navigator::new(
            state,
            FakeViewport::new(width, &layout()),
            ScrollConfig::default(),
        )
    }

    #[test]
    fn selecting_a_chapter_scrolls_below_the_mobile_header() {
        let mut nav = navigator(375.0);
        assert!(nav.select_chapter("chapter-2"));

        assert_eq!(nav.viewport().scrolls, vec![1000.0 - 64.0]);
        assert_eq!(
            nav.state().current_section.as_deref(),
            Some("chapter-2-section-0")
        );
    }

    #[test]
    fn desktop_scroll_has_no_header_offset() {
        let mut nav = navigator(1280.0);
        nav.select_section("chapter-1", "chapter-1-section-1");
        assert_eq!(nav.viewport().scrolls, vec![500.0]);
    }

    #[test]
    fn scroll_offset_never_goes_negative() {
        let mut nav = navigator(375.0);
        nav.select_chapter("chapter-1");
        assert_eq!(nav.viewport().scrolls, vec![0.0]);
    }

    #[test]
    fn scrolling_updates_position_passively() {
        let mut nav = navigator(1280.0);
        nav.viewport_mut().scroll_top = 1400.0;

        assert!(nav.on_scroll());
        assert_eq!(nav.state().current_chapter.as_deref(), Some("chapter-2"));
        assert_eq!(
            nav.state().current_section.as_deref(),
            Some("chapter-2-section-0")
        );
        assert!(nav.viewport().scrolls.is_empty());
        assert!(!nav.on_scroll());
    }

    #[test]
    fn midpoint_ties_go_to_the_earlier_section() {
        let mut nav = navigator(1280.0);
        // Midpoint (400) sits exactly on the boundary between the first two sections.
        nav.viewport_mut().scroll_top = 100.0;
        nav.select_section("chapter-1", "chapter-1-section-1");
        nav.viewport_mut().scroll_top = 100.0;

        assert!(nav.on_scroll());
        assert_eq!(
            nav.state().current_section.as_deref(),
            Some("chapter-1-section-0")
        );
    }

    #[test]
    fn missing_target_is_retried_once_after_delay() {
        let mut nav = navigator(1280.0);
        nav.viewport_mut()
            .unmounted
            .insert("chapter-2-section-0".to_string());

        nav.select_chapter("chapter-2");
        assert!(nav.has_pending_scroll());
        assert!(nav.viewport().scrolls.is_empty());

        nav.viewport_mut().now = 50;
        assert_eq!(nav.tick(), None);

        nav.viewport_mut().unmounted.clear();
        nav.viewport_mut().now = 100;
        assert_eq!(
            nav.tick(),
            Some(ScrollOutcome::Scrolled {
                section_id: "chapter-2-section-0".into(),
                top: 1000.0
            })
        );
        assert!(!nav.has_pending_scroll());
    }

    #[test]
    fn target_that_never_appears_is_dropped() {
        let mut nav = navigator(1280.0);
        nav.viewport_mut()
            .unmounted
            .insert("chapter-2-section-0".to_string());

        nav.select_chapter("chapter-2");
        nav.viewport_mut().now = 500;
        assert!(matches!(nav.tick(), Some(ScrollOutcome::Dropped { .. })));
        assert_eq!(nav.tick(), None);
        assert_eq!(nav.state().current_chapter.as_deref(), Some("chapter-2"));
    }

    #[test]
    fn newer_scroll_replaces_pending_one() {
        let mut nav = navigator(1280.0);
        nav.viewport_mut()
            .unmounted
            .insert("chapter-2-section-0".to_string());

        nav.select_chapter("chapter-2");
        nav.select_section("chapter-1", "chapter-1-section-1");

        assert_eq!(nav.viewport().scrolls, vec![500.0]);
        nav.viewport_mut().unmounted.clear();
        nav.viewport_mut().now = 1000;
        assert_eq!(nav.tick(), None);
    }

    #[test]
    fn chapter_with_only_blank_sections_selects_without_scrolling() {
        let mut blank = Chapter::new("chapter-1", "1장: 작성 중");
        blank.sections.push(Section::new("chapter-1-section-0", "", " "));
        let mut written = Chapter::new("chapter-2", "2장: 완성");
        written
            .sections
            .push(Section::new("chapter-2-section-0", "", "내용"));

        let mut state = ReaderState::default();
        state.set_active_manuscript(ManuscriptService::from_stored(StoredContent {
            id: None,
            title: None,
            chapters: vec![blank, written],
        }));
        let mut nav = Navigator::new(
            state,
            FakeViewport::new(1280.0, &[("chapter-2-section-0", 300.0)]),
            ScrollConfig::default(),
        );

        assert!(nav.select_chapter("chapter-1"));
        assert_eq!(nav.state().current_section, None);
        assert!(nav.viewport().scrolls.is_empty());
        assert!(!nav.has_pending_scroll());
    }

    fn stored_navigator(chapters: Vec<Chapter>, layout: &[(&str, f64)]) -> Navigator<FakeViewport> {
        let mut state = ReaderState::default();
        state.set_active_manuscript(ManuscriptService::from_stored(StoredContent {
            id: None,
            title: None,
            chapters,
        }));
        Navigator::new(state, FakeViewport::new(1280.0, layout), ScrollConfig::default())
    }

    #[test]
    fn blank_section_under_the_midpoint_is_not_observed() {
        let mut chapter = Chapter::new("chapter-1", "1장: 시작");
        chapter.sections.push(Section::new("chapter-1-section-0", "", "가"));
        chapter.sections.push(Section::new("chapter-1-section-1", "비어 있음", " \n\t "));
        let mut nav = stored_navigator(
            vec![chapter],
            &[("chapter-1-section-0", 300.0), ("chapter-1-section-1", 600.0)],
        );

        assert!(!nav.on_scroll());
        assert_eq!(
            nav.state().current_section.as_deref(),
            Some("chapter-1-section-0")
        );
    }

    #[test]
    fn scrolling_back_into_a_chapter_with_a_reassigned_id_is_noticed() {
        let mut first = Chapter::new("chapter-1", "1장: 하나");
        first.sections.push(Section::new("chapter-1-section-0", "", "가"));
        let mut second = Chapter::new("chapter-1", "1장: 둘");
        second.sections.push(Section::new("chapter-1-section-0", "", "나"));
        let mut nav = stored_navigator(
            vec![first, second],
            &[("chapter-1-section-0", 1000.0), ("chapter-1-1-section-0", 1000.0)],
        );

        assert!(nav.select_section("chapter-1-1", "chapter-1-1-section-0"));
        assert_eq!(nav.viewport().scrolls, vec![1000.0]);

        nav.viewport_mut().scroll_top = 0.0;
        assert!(nav.on_scroll());
        assert_eq!(nav.state().current_chapter.as_deref(), Some("chapter-1"));
        assert_eq!(
            nav.state().current_section.as_deref(),
            Some("chapter-1-section-0")
        );
    }

    #[test]
    fn next_chapter_scrolls_to_its_first_section() {
        let mut nav = navigator(1280.0);
        assert!(nav.next_chapter());
        assert_eq!(nav.viewport().scrolls, vec![1000.0]);
        assert!(nav.previous_chapter());
        assert_eq!(nav.viewport().scrolls, vec![1000.0, 0.0]);
    }
}

mod editor;
mod export;
mod ids;
mod model;
mod parser;
mod service;
mod stats;

pub use editor::{EditorError, ManuscriptEditor};
pub use export::{UNTITLED_HEADING, to_text};
pub use ids::{IdAllocator, SectionCounter, chapter_base_id, section_id};
pub use model::{
    Chapter, ContentSource, Manuscript, ManuscriptId, RichNode, Section, SectionContent,
    StoredContent,
};
pub use parser::{
    LineKind, ParseOptions, ParserContext, ParserState, QuoteFollowTitle, classify, parse,
    parse_with_options,
};
pub use service::{ManuscriptError, ManuscriptService};
pub use stats::{ReadingConfig, ReadingStats, preview, reading_stats};

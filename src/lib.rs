//! memoir - structures generated autobiography text into chapters and sections
//! and keeps a scrolling reader's table of contents in step with it.

pub mod app;
pub mod config;
pub mod manuscript;
pub mod state;
pub mod ui;

pub use app::ReaderApp;
pub use config::AppConfig;
pub use manuscript::{Chapter, Manuscript, ManuscriptService, Section, SectionContent, parse};
pub use state::{Navigator, ReaderState};

use crate::state::{Page, ReaderState, TocEntry, render_pages, table_of_contents};
use anyhow::Result;
use std::io::{self, Write};

pub trait UiRuntime {
    fn run(self, initial_state: ReaderState) -> Result<()>;
}

/// Prints the table of contents and the page sequence as plain text.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleRuntime {
    pub show_toc: bool,
    pub show_pages: bool,
}

impl Default for ConsoleRuntime {
    fn default() -> Self {
        Self {
            show_toc: true,
            show_pages: true,
        }
    }
}

impl ConsoleRuntime {
    pub fn render<W: Write>(&self, state: &ReaderState, out: &mut W) -> io::Result<()> {
        let Some(manuscript) = state.active_manuscript.as_ref() else {
            writeln!(out, "No story loaded")?;
            writeln!(out, "Run with a story file (.txt or .json) to read it.")?;
            return Ok(());
        };

        let title = manuscript.title.as_deref().unwrap_or("Untitled");
        writeln!(out, "{title}")?;
        writeln!(out, "{}", "=".repeat(title.chars().count().max(8)))?;

        if manuscript.chapters.is_empty() {
            writeln!(out, "This story has no visible text.")?;
            return Ok(());
        }

        if self.show_toc {
            writeln!(out)?;
            Self::render_toc(&table_of_contents(state), out)?;
        }

        if self.show_pages {
            for page in render_pages(&manuscript.chapters) {
                writeln!(out)?;
                Self::render_page(&page, out)?;
            }
        }
        Ok(())
    }

    fn render_toc<W: Write>(toc: &[TocEntry], out: &mut W) -> io::Result<()> {
        writeln!(out, "Contents")?;
        for entry in toc {
            let marker = if entry.active { '>' } else { ' ' };
            let fold = if entry.expanded { 'v' } else { '+' };
            writeln!(out, "{marker} {fold} {}", entry.title)?;

            if !entry.expanded {
                continue;
            }
            for section in entry
                .sections
                .iter()
                .filter(|section| !section.is_quote && !section.title.is_empty())
            {
                let marker = if section.active { '>' } else { ' ' };
                writeln!(out, "{marker}     {}", section.title)?;
            }
        }
        Ok(())
    }

    fn render_page<W: Write>(page: &Page<'_>, out: &mut W) -> io::Result<()> {
        match page {
            Page::ChapterTitle { chapter, number } => {
                writeln!(out, "[Chapter {number}] {}", chapter.title)?;
            }
            Page::Section { section, .. } => {
                if section.is_quote {
                    let text = section.content.paragraphs().join(" ");
                    writeln!(out, "    \u{201c}{text}\u{201d}")?;
                    return Ok(());
                }
                if let Some(heading) = section.heading() {
                    writeln!(out, "## {heading}")?;
                }
                let paragraphs = section.content.paragraphs();
                for (index, paragraph) in paragraphs.iter().enumerate() {
                    if index > 0 {
                        writeln!(out)?;
                    }
                    writeln!(out, "{paragraph}")?;
                }
            }
        }
        Ok(())
    }
}

impl UiRuntime for ConsoleRuntime {
    fn run(self, initial_state: ReaderState) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.render(&initial_state, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

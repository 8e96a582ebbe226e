use anyhow::Result;
use clap::Parser;
use memoir::config::AppConfig;
use memoir::manuscript::QuoteFollowTitle;
use memoir::ui::ConsoleRuntime;
use memoir::ReaderApp;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "memoir")]
#[command(version, about = "Read structured autobiography text", long_about = None)]
#[command(after_help = "EXAMPLES:
    memoir story.txt                         Print contents and pages
    memoir story.json --chapter chapter-2    Open at chapter 2
    memoir story.txt --stats                 Show length and reading time")]
struct Cli {
    /// Story file: pseudo-Markdown text, or JSON with a `chapters` array
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Chapter to open at
    #[arg(long, value_name = "CHAPTER_ID")]
    chapter: Option<String>,

    /// Section to open at (requires --chapter)
    #[arg(long, value_name = "SECTION_ID", requires = "chapter")]
    section: Option<String>,

    /// Title untitled text that follows a quote
    #[arg(long, value_name = "TITLE")]
    quote_placeholder: Option<String>,

    /// Print the normalized chapter tree as JSON
    #[arg(long, conflicts_with_all = ["text", "stats"])]
    json: bool,

    /// Print the tree back in heading/quote text form
    #[arg(long, conflicts_with = "stats")]
    text: bool,

    /// Print length and reading time
    #[arg(long)]
    stats: bool,

    /// Hide the table of contents
    #[arg(long)]
    no_toc: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(title) = cli.quote_placeholder.clone() {
        config.parser.quote_follow_title = QuoteFollowTitle::Placeholder(title);
    }

    let ui = ConsoleRuntime {
        show_toc: !cli.no_toc,
        show_pages: true,
    };
    let mut app = ReaderApp::new(ui, config);

    if let Some(path) = &cli.input {
        app.open_manuscript(path)?;
    }

    if let Some(chapter) = &cli.chapter {
        app.select(chapter, cli.section.as_deref())?;
    }

    if cli.json {
        println!("{}", app.export_json()?);
        return Ok(());
    }
    if cli.text {
        println!("{}", app.export_text()?);
        return Ok(());
    }
    if cli.stats {
        let (stats, excerpt) = app.stats()?;
        println!("Chapters: {}", stats.chapters);
        println!("Sections: {} ({} shown)", stats.sections, stats.rendered_sections);
        println!("Characters: {}", stats.characters);
        println!("Reading time: {} min", stats.minutes);
        if let Some(excerpt) = excerpt {
            println!("Preview: {excerpt}");
        }
        return Ok(());
    }

    app.run()
}

use super::Chapter;

/// Heading written for an untitled section that would otherwise run into the one before it.
pub const UNTITLED_HEADING: &str = "이어서";

/// Writes a tree back out in the heading/quote text format the parser reads.
///
/// Chapter titles are emitted as-is after `# `, so only titles shaped like
/// `N장: text` come back as chapters when the output is parsed again.
/// Sections without visible text are left out, as in the reader. An untitled
/// section directly after another body section gets [`UNTITLED_HEADING`] so it
/// stays separate, which means it comes back titled.
pub fn to_text(chapters: &[Chapter]) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for chapter in chapters {
        blocks.push(format!("# {}", chapter.title));
        let mut after_body = false;
        for section in chapter.rendered_sections() {
            let body = section.content.to_plain_text();
            let body = body.trim();
            if section.is_quote {
                let line = body.lines().map(str::trim).collect::<Vec<_>>().join(" ");
                blocks.push(format!("> {line}"));
                after_body = false;
                continue;
            }
            match section.heading() {
                Some(heading) => blocks.push(format!("## {heading}")),
                None if after_body => blocks.push(format!("## {UNTITLED_HEADING}")),
                None => {}
            }
            blocks.push(body.to_string());
            after_body = true;
        }
    }

    blocks.join("\n\n")
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ManuscriptId(pub String);

/// Which encoding the manuscript was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    #[default]
    PlainText,
    Structured,
}

/// A node of the editor's rich-text document (`{"type": "doc", "content": [...]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RichNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<RichNode>,
}

impl RichNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            content: Vec::new(),
        }
    }

    pub fn block(kind: impl Into<String>, content: Vec<RichNode>) -> Self {
        Self {
            kind: kind.into(),
            text: None,
            content,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::block("paragraph", vec![Self::text(text)])
    }

    pub fn doc(content: Vec<RichNode>) -> Self {
        Self::block("doc", content)
    }

    fn is_inline(&self) -> bool {
        self.text.is_some() || self.kind == "hardBreak"
    }

    fn write_plain_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
            return;
        }
        if self.kind == "hardBreak" {
            out.push('\n');
            return;
        }

        if self.content.iter().all(RichNode::is_inline) {
            for child in &self.content {
                child.write_plain_text(out);
            }
            return;
        }

        let mut first = true;
        for child in &self.content {
            let mut block = String::new();
            child.write_plain_text(&mut block);
            if block.trim().is_empty() {
                continue;
            }
            if !first {
                out.push_str("\n\n");
            }
            out.push_str(&block);
            first = false;
        }
    }
}

/// Section body: plain paragraphs from the parser, or a rich-text tree from the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionContent {
    PlainText(String),
    RichDoc(RichNode),
}

impl Default for SectionContent {
    fn default() -> Self {
        SectionContent::PlainText(String::new())
    }
}

impl SectionContent {
    /// Single extraction point for previews, reading time and blank checks.
    pub fn to_plain_text(&self) -> String {
        match self {
            SectionContent::PlainText(text) => text.clone(),
            SectionContent::RichDoc(root) => {
                let mut out = String::new();
                root.write_plain_text(&mut out);
                out
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            SectionContent::PlainText(text) => text.trim().is_empty(),
            SectionContent::RichDoc(_) => self.to_plain_text().trim().is_empty(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.to_plain_text()
            .chars()
            .filter(|c| !c.is_whitespace())
            .count()
    }

    /// Blank-line-delimited paragraphs, each with inner line breaks folded to spaces.
    pub fn paragraphs(&self) -> Vec<String> {
        self.to_plain_text()
            .split("\n\n")
            .map(|block| block.trim())
            .filter(|block| !block.is_empty())
            .map(|block| {
                block
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl From<&str> for SectionContent {
    fn from(text: &str) -> Self {
        SectionContent::PlainText(text.to_string())
    }
}

impl From<String> for SectionContent {
    fn from(text: String) -> Self {
        SectionContent::PlainText(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: SectionContent,
    #[serde(default)]
    pub is_quote: bool,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<SectionContent>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            is_quote: false,
        }
    }

    pub fn quote(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: SectionContent::PlainText(text.into()),
            is_quote: true,
        }
    }

    /// Only sections with visible text are shown to the reader.
    pub fn is_rendered(&self) -> bool {
        !self.content.is_blank()
    }

    /// Heading to display, if any. Quotes never show one.
    pub fn heading(&self) -> Option<&str> {
        if self.is_quote || self.title.trim().is_empty() {
            None
        } else {
            Some(self.title.as_str())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Chapter {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn rendered_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|section| section.is_rendered())
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == section_id)
    }
}

/// Persisted JSON encoding of a story's `content` field.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoredContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Manuscript {
    pub id: ManuscriptId,
    pub title: Option<String>,
    pub source: ContentSource,
    pub chapters: Vec<Chapter>,
    pub source_path: Option<PathBuf>,
}

impl Manuscript {
    pub fn empty() -> Self {
        Self {
            id: ManuscriptId("unknown".to_string()),
            title: None,
            source: ContentSource::default(),
            chapters: Vec::new(),
            source_path: None,
        }
    }

    pub fn chapter(&self, chapter_id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.id == chapter_id)
    }

    pub fn to_stored(&self) -> StoredContent {
        StoredContent {
            id: Some(self.id.0.clone()),
            title: self.title.clone(),
            chapters: self.chapters.clone(),
        }
    }
}

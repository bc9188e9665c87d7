//! Markdown structure: paragraphs, ATX headings, and the open heading path.
//!
//! Only the structure the chunkers need is recognized:
//!
//! - Paragraphs are runs of non-blank lines separated by blank lines.
//! - Headings are ATX headings: up to three spaces of indent, one to six `#`,
//!   whitespace, then the title. Closing hashes (`## Title ##`) are stripped.
//!   Four spaces or a tab of indent make an indented code line instead.
//! - Fenced code blocks are tracked so a `# comment` inside a shell snippet is
//!   not mistaken for a heading. A fence opens with three or more backticks or
//!   tildes and closes only on a run of the same character at least as long.
//!
//! The heading path is a stack keyed by level. Entering a heading pops every
//! open heading at the same or deeper level, so skipped levels behave:
//!
//! ```text
//! # A          [A]
//! ### C        [A, C]
//! ## B         [A, B]      <- C (level 3) closed by B (level 2)
//! # D          [D]
//! ```

use crate::chunk::SECTION_SEPARATOR;

/// An ATX markdown heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Nesting level, 1 through 6.
    pub level: usize,
    /// Heading title without markers.
    pub text: String,
}

/// Parse a line as an ATX heading.
///
/// ```rust
/// use ragprep::parse_heading;
///
/// let h = parse_heading("## Getting Started ##").unwrap();
/// assert_eq!((h.level, h.text.as_str()), (2, "Getting Started"));
///
/// assert!(parse_heading("#hashtag").is_none());
/// assert!(parse_heading("    # indented code").is_none());
/// assert!(parse_heading("####### too deep").is_none());
/// ```
#[must_use]
pub fn parse_heading(line: &str) -> Option<Heading> {
    let trimmed = block_content(line)?.trim_end();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }

    let rest = &trimmed[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let text = rest.trim().trim_end_matches('#').trim();
    if text.is_empty() {
        return None;
    }

    Some(Heading {
        level,
        text: text.to_string(),
    })
}

/// The line without its indent, or `None` for indented code.
///
/// Up to three leading spaces are block indent. More, or any tab in the
/// indent, is an indented code line.
fn block_content(line: &str) -> Option<&str> {
    let spaces = line.bytes().take_while(|&b| b == b' ').count();
    let rest = &line[spaces..];
    (spaces <= 3 && !rest.starts_with('\t')).then_some(rest)
}

/// The opening line of a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    /// `` ` `` or `~`.
    pub marker: char,
    /// Length of the marker run, at least 3.
    pub len: usize,
}

impl Fence {
    /// Whether `line` closes the block this fence opened.
    ///
    /// ```rust
    /// use ragprep::parse_fence;
    ///
    /// let fence = parse_fence("````markdown").unwrap();
    /// assert!(!fence.is_closed_by("~~~"));
    /// assert!(!fence.is_closed_by("```"));
    /// assert!(fence.is_closed_by("`````"));
    /// ```
    #[must_use]
    pub fn is_closed_by(self, line: &str) -> bool {
        let Some(rest) = block_content(line) else {
            return false;
        };
        let len = rest.chars().take_while(|&c| c == self.marker).count();
        len >= self.len && rest[len..].trim().is_empty()
    }
}

/// Parse `line` as the opening of a fenced code block.
///
/// ```rust
/// use ragprep::parse_fence;
///
/// assert_eq!(parse_fence("```rust").map(|f| (f.marker, f.len)), Some(('`', 3)));
/// assert_eq!(parse_fence("  ~~~~").map(|f| f.len), Some(4));
/// assert!(parse_fence("``inline``").is_none());
/// ```
#[must_use]
pub fn parse_fence(line: &str) -> Option<Fence> {
    let rest = block_content(line)?;
    let marker = rest.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = rest.chars().take_while(|&c| c == marker).count();
    if len < 3 {
        return None;
    }
    // A backtick info string cannot contain backticks
    if marker == '`' && rest[len..].contains('`') {
        return None;
    }
    Some(Fence { marker, len })
}

/// Split text into paragraphs on blank lines.
///
/// Each paragraph is trimmed; line breaks inside a paragraph are kept.
///
/// ```rust
/// use ragprep::split_paragraphs;
///
/// let paras = split_paragraphs("# Title\n\nFirst line\nsecond line.\n\n\n  \nLast.");
/// assert_eq!(paras, ["# Title", "First line\nsecond line.", "Last."]);
/// ```
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                paragraphs.push(text[s..end].trim());
            }
        } else {
            start.get_or_insert(line_start);
            end = offset;
        }
    }

    if let Some(s) = start {
        paragraphs.push(text[s..end].trim());
    }

    paragraphs
}

/// The first-line heading of a paragraph, if it starts with one.
#[must_use]
pub fn paragraph_heading(paragraph: &str) -> Option<Heading> {
    paragraph.lines().next().and_then(parse_heading)
}

/// The stack of headings enclosing the current position in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingPath {
    stack: Vec<Heading>,
}

impl HeadingPath {
    /// An empty path (document root).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `heading`, closing any open heading at the same or a deeper level.
    pub fn enter(&mut self, heading: Heading) {
        while self
            .stack
            .last()
            .is_some_and(|open| open.level >= heading.level)
        {
            self.stack.pop();
        }
        self.stack.push(heading);
    }

    /// Heading titles, outermost first.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.stack.iter().map(|h| h.text.clone()).collect()
    }

    /// Titles joined with `" > "`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.stack
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR)
    }

    /// The innermost open heading.
    #[must_use]
    pub fn current(&self) -> Option<&Heading> {
        self.stack.last()
    }

    /// Number of open headings.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether no heading is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

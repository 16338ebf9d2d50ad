//! Text chunking strategies.
//!
//! This module provides the [`Chunker`] trait and six implementations:
//!
//! - [`FixedSizeChunker`] — splits by character count with configurable overlap
//! - [`DelimiterChunker`] — splits on a literal delimiter and trims the pieces
//! - [`SentenceChunker`] — packs whole sentences (Unicode sentence boundaries) into chunks
//! - [`RecursiveChunker`] — splits hierarchically by paragraphs, lines, sentences, words, then characters
//! - [`MarkdownChunker`] — splits by markdown headers, recording the header path
//! - [`LatexChunker`] — splits LaTeX before sectioning commands and environments
//!
//! All sizes are measured in characters (Unicode scalar values), never bytes.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// Metadata key holding the markdown or LaTeX heading hierarchy of a chunk.
pub const HEADER_PATH_KEY: &str = "header_path";

/// A strategy for splitting text into bounded, retrievable units.
///
/// Empty input yields an empty `Vec`, never an error.
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks, in source order.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn validate_window(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::InvalidArgument("chunk size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::InvalidArgument(format!(
            "chunk overlap ({chunk_overlap}) must be less than chunk size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Chunk *i* starts at character `i * (size - overlap)` and spans
/// `min(size, remaining)` characters.
///
/// # Example
///
/// ```rust
/// use ragkit_core::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(4, 1).unwrap();
/// let texts: Vec<_> = chunker.chunk("abcdefghij").into_iter().map(|c| c.text).collect();
/// assert_eq!(texts, ["abcd", "defg", "ghij", "j"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        // Byte position of every character boundary, including the end.
        let boundaries: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let total = boundaries.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < total {
            let end = (start + self.chunk_size).min(total);
            chunks.push(Chunk::new(&text[boundaries[start]..boundaries[end]], start));
            start += step;
        }
        chunks
    }
}

/// Splits text on a literal delimiter, trimming whitespace and dropping empty pieces.
#[derive(Debug, Clone)]
pub struct DelimiterChunker {
    delimiter: String,
}

impl DelimiterChunker {
    /// The delimiter used by [`DelimiterChunker::default`].
    pub const DEFAULT_DELIMITER: &'static str = ".";

    /// Create a new `DelimiterChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `delimiter` is empty.
    pub fn new(delimiter: impl Into<String>) -> Result<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(RagError::InvalidArgument("delimiter must not be empty".to_string()));
        }
        Ok(Self { delimiter })
    }
}

impl Default for DelimiterChunker {
    fn default() -> Self {
        Self { delimiter: Self::DEFAULT_DELIMITER.to_string() }
    }
}

impl Chunker for DelimiterChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut chars_before = 0;

        for piece in text.split(self.delimiter.as_str()) {
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                let leading = char_len(&piece[..piece.len() - piece.trim_start().len()]);
                chunks.push(Chunk::new(trimmed, chars_before + leading));
            }
            chars_before += char_len(piece) + char_len(&self.delimiter);
        }

        chunks
    }
}

/// The separators [`RecursiveChunker`] tries, in priority order.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// An oversize piece is split on the first separator that occurs in it, with
/// the separator kept at the end of the preceding piece. Pieces still larger
/// than `chunk_size` are split again with the remaining separators; the empty
/// separator cuts hard character runs. Adjacent pieces are then merged back
/// toward `chunk_size`, carrying up to `chunk_overlap` characters of trailing
/// pieces into the next chunk.
///
/// Every chunk is a non-empty contiguous slice of the input, so the chunks
/// reconstruct the source once overlapped prefixes are skipped.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    leading_separators: bool,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with [`DEFAULT_SEPARATORS`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            leading_separators: false,
        })
    }

    /// Replace the separator priority list.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Keep each separator at the start of the piece that follows it.
    ///
    /// Used for markup whose separators open a block (`\section{`), so the
    /// command stays with its body.
    pub fn with_leading_separators(mut self) -> Self {
        self.leading_separators = true;
        self
    }

    /// Byte ranges of the merged chunks of `text`.
    fn chunk_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut pieces = Vec::new();
        let split = Split { size: self.chunk_size, leading: self.leading_separators };
        split.pieces(text, 0..text.len(), self.separators.as_slice(), &mut pieces);
        merge_pieces(text, pieces, self.chunk_size, self.chunk_overlap)
    }
}

/// Piece-splitting parameters shared by the recursive, sentence and LaTeX chunkers.
#[derive(Clone, Copy)]
struct Split {
    size: usize,
    leading: bool,
}

impl Split {
    /// Break `text[range]` into contiguous non-empty pieces of at most `size` characters.
    fn pieces<S: AsRef<str>>(
        self,
        text: &str,
        range: Range<usize>,
        separators: &[S],
        out: &mut Vec<Range<usize>>,
    ) {
        let slice = &text[range.clone()];
        if slice.is_empty() {
            return;
        }
        if char_len(slice) <= self.size {
            out.push(range);
            return;
        }

        let chosen = separators.iter().position(|sep| {
            let sep = sep.as_ref();
            sep.is_empty() || slice.contains(sep)
        });
        let index = match chosen {
            Some(index) if !separators[index].as_ref().is_empty() => index,
            _ => {
                split_by_chars(text, range, self.size, out);
                return;
            }
        };

        let separator = separators[index].as_ref();
        let remaining = &separators[index + 1..];
        let mut start = range.start;
        for (pos, _) in slice.match_indices(separator) {
            let cut = range.start + pos + if self.leading { 0 } else { separator.len() };
            if cut > start {
                self.pieces(text, start..cut, remaining, out);
                start = cut;
            }
        }
        if start < range.end {
            self.pieces(text, start..range.end, remaining, out);
        }
    }
}

/// Cut `text[range]` into runs of `size` characters.
fn split_by_chars(text: &str, range: Range<usize>, size: usize, out: &mut Vec<Range<usize>>) {
    let mut start = range.start;
    let mut count = 0;
    for (i, _) in text[range.clone()].char_indices() {
        if count == size {
            out.push(start..range.start + i);
            start = range.start + i;
            count = 0;
        }
        count += 1;
    }
    if start < range.end {
        out.push(start..range.end);
    }
}

/// Merge contiguous pieces into chunks of at most `size` characters with overlap.
fn merge_pieces(
    text: &str,
    pieces: Vec<Range<usize>>,
    size: usize,
    overlap: usize,
) -> Vec<Range<usize>> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
    let mut total = 0;

    for piece in pieces {
        let len = char_len(&text[piece.clone()]);
        if total + len > size {
            if let Some(span) = window_span(&window) {
                chunks.push(span);
            }
            while total > overlap || (total > 0 && total + len > size) {
                match window.pop_front() {
                    Some((_, front_len)) => total -= front_len,
                    None => break,
                }
            }
        }
        window.push_back((piece, len));
        total += len;
    }
    if let Some(span) = window_span(&window) {
        chunks.push(span);
    }

    chunks
}

fn window_span(window: &VecDeque<(Range<usize>, usize)>) -> Option<Range<usize>> {
    let first = window.front()?;
    let last = window.back()?;
    Some(first.0.start..last.0.end)
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        self.chunk_spans(text)
            .into_iter()
            .map(|span| Chunk::new(&text[span.clone()], char_len(&text[..span.start])))
            .collect()
    }
}

/// Splits markdown by ATX headers, keeping each section as a chunk.
///
/// Header lines stay in the chunk text. The `header_path` metadata field
/// records the header hierarchy (`"Guide > Install"`); text before the first
/// header gets an empty path. Lines inside fenced code blocks are never
/// treated as headers. Sections longer than `max_size` are split further with
/// [`RecursiveChunker`] logic and every piece keeps the section's path.
#[derive(Debug, Clone)]
pub struct MarkdownChunker {
    max_size: usize,
    max_header_level: usize,
    splitter: RecursiveChunker,
}

impl MarkdownChunker {
    /// Headers up to this level (`#`, `##`, `###`) start a new section by default.
    pub const DEFAULT_MAX_HEADER_LEVEL: usize = 3;

    /// Create a new `MarkdownChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `max_size` is zero or
    /// `chunk_overlap >= max_size`.
    pub fn new(max_size: usize, chunk_overlap: usize) -> Result<Self> {
        Ok(Self {
            max_size,
            max_header_level: Self::DEFAULT_MAX_HEADER_LEVEL,
            splitter: RecursiveChunker::new(max_size, chunk_overlap)?,
        })
    }

    /// Split on headers up to `level` (clamped to `1..=6`).
    pub fn with_max_header_level(mut self, level: usize) -> Self {
        self.max_header_level = level.clamp(1, 6);
        self
    }
}

/// A markdown section: byte range in the source and its header hierarchy.
struct MarkdownSection {
    range: Range<usize>,
    header_path: String,
}

/// Parse an ATX header line into `(level, title)`.
fn parse_header(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t', '\r', '\n']) {
        return None;
    }
    Some((level, rest.trim()))
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn parse_markdown_sections(text: &str, max_level: usize) -> Vec<MarkdownSection> {
    let mut sections = Vec::new();
    let mut headers: Vec<(usize, String)> = Vec::new();
    let mut section_start = 0;
    let mut header_path = String::new();
    let mut in_fence = false;
    let mut pos = 0;

    for line in text.split_inclusive('\n') {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence {
            if let Some((level, title)) = parse_header(line).filter(|(l, _)| *l <= max_level) {
                if pos > section_start {
                    sections.push(MarkdownSection {
                        range: section_start..pos,
                        header_path: header_path.clone(),
                    });
                }
                while headers.last().is_some_and(|(l, _)| *l >= level) {
                    headers.pop();
                }
                headers.push((level, title.to_string()));
                header_path =
                    headers.iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>().join(" > ");
                section_start = pos;
            }
        }
        pos += line.len();
    }
    if text.len() > section_start {
        sections.push(MarkdownSection { range: section_start..text.len(), header_path });
    }

    sections
}

impl Chunker for MarkdownChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for section in parse_markdown_sections(text, self.max_header_level) {
            let body = &text[section.range.clone()];
            let spans = if char_len(body) > self.max_size {
                self.splitter
                    .chunk_spans(body)
                    .into_iter()
                    .map(|s| section.range.start + s.start..section.range.start + s.end)
                    .collect()
            } else {
                vec![section.range.clone()]
            };

            for span in spans {
                if let Some(mut chunk) = trimmed_chunk(text, span) {
                    chunk.metadata.insert(HEADER_PATH_KEY.to_string(), section.header_path.clone());
                    chunks.push(chunk);
                }
            }
        }

        chunks
    }
}

/// The whitespace-trimmed chunk for `text[span]`, or `None` if it is blank.
fn trimmed_chunk(text: &str, span: Range<usize>) -> Option<Chunk> {
    let raw = &text[span.clone()];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let leading = raw.len() - raw.trim_start().len();
    Some(Chunk::new(trimmed, char_len(&text[..span.start + leading])))
}

/// Packs consecutive sentences into chunks of at most `chunk_size` characters.
///
/// Sentence boundaries follow Unicode text segmentation (UAX #29), so
/// abbreviations followed by lower-case text ("e.g. this") do not end a
/// sentence. A sentence longer than `chunk_size` is split on spaces, then
/// characters. Overlap is carried in whole trailing sentences, up to
/// `chunk_overlap` characters. Chunk text is trimmed of surrounding whitespace.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// The sentences of `text` in order, each with its trailing whitespace.
    pub fn sentences(text: &str) -> Vec<&str> {
        text.split_sentence_bounds().collect()
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        let split = Split { size: self.chunk_size, leading: false };
        let mut pieces = Vec::new();
        for (start, sentence) in text.split_sentence_bound_indices() {
            split.pieces(text, start..start + sentence.len(), &[" ", ""], &mut pieces);
        }

        merge_pieces(text, pieces, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .filter_map(|span| trimmed_chunk(text, span))
            .collect()
    }
}

/// Separators tried by [`LatexChunker`], most structural first.
pub const LATEX_SEPARATORS: [&str; 19] = [
    "\n\\chapter{",
    "\n\\section{",
    "\n\\subsection{",
    "\n\\subsubsection{",
    "\n\\begin{enumerate}",
    "\n\\begin{itemize}",
    "\n\\begin{description}",
    "\n\\begin{list}",
    "\n\\begin{quote}",
    "\n\\begin{quotation}",
    "\n\\begin{verse}",
    "\n\\begin{verbatim}",
    "\n\\begin{align}",
    "\n\n",
    "\n",
    "$$",
    "$",
    " ",
    "",
];

/// LaTeX sectioning commands in nesting order.
const LATEX_SECTIONS: [&str; 4] = ["chapter", "section", "subsection", "subsubsection"];

/// Splits LaTeX source before sectioning commands and list/quote/math
/// environments, falling back to paragraphs, lines, words and characters.
///
/// Each separator stays at the start of the chunk it opens, so a
/// `\section{..}` line is never cut from its body. Every chunk records the
/// enclosing heading hierarchy in [`HEADER_PATH_KEY`] (`"Methods > Setup"`),
/// empty before the first sectioning command. Chunk text is trimmed.
#[derive(Debug, Clone)]
pub struct LatexChunker {
    splitter: RecursiveChunker,
}

impl LatexChunker {
    /// Create a new `LatexChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let splitter = RecursiveChunker::new(chunk_size, chunk_overlap)?
            .with_separators(LATEX_SEPARATORS)
            .with_leading_separators();
        Ok(Self { splitter })
    }
}

/// Byte position, nesting level and title of every sectioning command in `text`.
fn latex_headings(text: &str) -> Vec<(usize, usize, &str)> {
    let mut headings = Vec::new();
    for (pos, _) in text.match_indices('\\') {
        let rest = &text[pos + 1..];
        let Some((level, name)) =
            LATEX_SECTIONS.iter().enumerate().find(|(_, name)| rest.starts_with(**name))
        else {
            continue;
        };
        let rest = &rest[name.len()..];
        let rest = rest.strip_prefix('*').unwrap_or(rest);
        let Some(body) = rest.strip_prefix('{') else {
            continue;
        };
        if let Some(end) = body.find('}') {
            headings.push((pos, level, body[..end].trim()));
        }
    }
    headings
}

impl Chunker for LatexChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        let headings = latex_headings(text);
        let mut open: Vec<(usize, &str)> = Vec::new();
        let mut next_heading = 0;
        let mut chunks = Vec::new();

        for span in self.splitter.chunk_spans(text) {
            let raw = &text[span.clone()];
            let content_start = span.start + (raw.len() - raw.trim_start().len());
            while let Some(&(pos, level, title)) = headings.get(next_heading) {
                if pos > content_start {
                    break;
                }
                while open.last().is_some_and(|(l, _)| *l >= level) {
                    open.pop();
                }
                open.push((level, title));
                next_heading += 1;
            }

            if let Some(mut chunk) = trimmed_chunk(text, span) {
                let path = open.iter().map(|(_, t)| *t).collect::<Vec<_>>().join(" > ");
                chunk.metadata.insert(HEADER_PATH_KEY.to_string(), path);
                chunks.push(chunk);
            }
        }

        chunks
    }
}

fn default_delimiter() -> String {
    DelimiterChunker::DEFAULT_DELIMITER.to_string()
}

fn default_header_level() -> usize {
    MarkdownChunker::DEFAULT_MAX_HEADER_LEVEL
}

/// A chunking strategy selected from configuration.
///
/// ```toml
/// [chunking]
/// strategy = "recursive"
/// size = 1000
/// overlap = 100
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// [`FixedSizeChunker`].
    Fixed { size: usize, overlap: usize },
    /// [`DelimiterChunker`].
    Delimiter {
        #[serde(default = "default_delimiter")]
        delimiter: String,
    },
    /// [`SentenceChunker`].
    Sentence {
        size: usize,
        #[serde(default)]
        overlap: usize,
    },
    /// [`RecursiveChunker`].
    Recursive { size: usize, overlap: usize },
    /// [`MarkdownChunker`].
    Markdown {
        size: usize,
        #[serde(default)]
        overlap: usize,
        #[serde(default = "default_header_level")]
        max_header_level: usize,
    },
    /// [`LatexChunker`].
    Latex {
        size: usize,
        #[serde(default)]
        overlap: usize,
    },
}

impl Default for ChunkStrategy {
    fn default() -> Self {
        Self::Recursive { size: 1000, overlap: 0 }
    }
}

impl ChunkStrategy {
    /// Construct the configured chunker.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] for invalid size/overlap or delimiter values.
    pub fn build(&self) -> Result<Arc<dyn Chunker>> {
        Ok(match self {
            Self::Fixed { size, overlap } => Arc::new(FixedSizeChunker::new(*size, *overlap)?),
            Self::Delimiter { delimiter } => Arc::new(DelimiterChunker::new(delimiter.clone())?),
            Self::Sentence { size, overlap } => Arc::new(SentenceChunker::new(*size, *overlap)?),
            Self::Recursive { size, overlap } => Arc::new(RecursiveChunker::new(*size, *overlap)?),
            Self::Markdown { size, overlap, max_header_level } => Arc::new(
                MarkdownChunker::new(*size, *overlap)?.with_max_header_level(*max_header_level),
            ),
            Self::Latex { size, overlap } => Arc::new(LatexChunker::new(*size, *overlap)?),
        })
    }
}

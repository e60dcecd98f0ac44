//! Per-document cache of derived text views.
//!
//! A [`CodeDocument`](crate::CodeDocument) owns one [`DerivedViewCache`]. Views are
//! computed on first access and then live exactly as long as the document;
//! a new derivation produces a new document and therefore a fresh cache.

use std::fmt;
use std::sync::Arc;

use papaya::HashMap;

/// Identifies a derived view of a code document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    /// The document's own source text.
    SourceText,
    /// The generated primary-language text.
    PrimaryText,
    /// The generated markup text.
    SecondaryText,
}

/// Zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinePosition {
    pub line: usize,
    pub column: usize,
}

/// Text with a precomputed line index.
#[derive(Clone, PartialEq, Eq)]
pub struct IndexedText {
    text: Arc<str>,
    /// Byte offset of the first character of every line. Always starts with 0.
    line_starts: Vec<usize>,
}

impl IndexedText {
    /// Build the line index for `text`. Lines end at `\n`; a preceding `\r` stays
    /// part of the line content.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of lines. An empty text has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Content of line `index` without its terminating `\n`.
    pub fn line(&self, index: usize) -> Option<&str> {
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text.get(start..end)
    }

    /// Convert a byte offset into a line/column position.
    ///
    /// Returns `None` if the offset is past the end of the text.
    pub fn position_of(&self, offset: usize) -> Option<LinePosition> {
        if offset > self.text.len() {
            return None;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Some(LinePosition {
            line,
            column: offset - self.line_starts[line],
        })
    }

    /// Convert a line/column position into a byte offset.
    ///
    /// Returns `None` if the line does not exist or the column runs past it.
    pub fn offset_of(&self, position: LinePosition) -> Option<usize> {
        let line = self.line(position.line)?;
        if position.column > line.len() {
            return None;
        }
        Some(self.line_starts[position.line] + position.column)
    }
}

impl fmt::Debug for IndexedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedText")
            .field("len", &self.text.len())
            .field("lines", &self.line_starts.len())
            .finish()
    }
}

/// Memoized views keyed by [`ViewKey`].
///
/// Concurrent first access is first-writer-wins: racing factories may both run,
/// but only one result is ever stored and every caller gets the stored instance.
pub struct DerivedViewCache {
    views: HashMap<ViewKey, Arc<IndexedText>, ahash::RandomState>,
}

impl Default for DerivedViewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivedViewCache {
    pub fn new() -> Self {
        Self {
            views: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Get a view if it has been computed.
    pub fn get(&self, key: ViewKey) -> Option<Arc<IndexedText>> {
        self.views.pin().get(&key).cloned()
    }

    /// Get the stored view for `key`, computing it with `factory` on first access.
    pub fn get_or_create<F>(&self, key: ViewKey, factory: F) -> Arc<IndexedText>
    where
        F: FnOnce() -> IndexedText,
    {
        let views = self.views.pin();
        if let Some(view) = views.get(&key) {
            return view.clone();
        }
        views.get_or_insert(key, Arc::new(factory())).clone()
    }

    /// Fallible variant of [`DerivedViewCache::get_or_create`].
    ///
    /// A factory error is returned to the caller and nothing is stored.
    pub fn get_or_try_create<F, E>(&self, key: ViewKey, factory: F) -> Result<Arc<IndexedText>, E>
    where
        F: FnOnce() -> Result<IndexedText, E>,
    {
        let views = self.views.pin();
        if let Some(view) = views.get(&key) {
            return Ok(view.clone());
        }
        let view = Arc::new(factory()?);
        Ok(views.get_or_insert(key, view).clone())
    }

    /// Number of views computed so far.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl fmt::Debug for DerivedViewCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let views = self.views.pin();
        f.debug_set().entries(views.keys()).finish()
    }
}

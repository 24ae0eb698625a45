//! Content queue loading
//!
//! The queue is the immutable, ordered list of postable items for one run.
//! Its length is the modulus for all cycling logic.

use std::path::Path;

use tracing::info;

use crate::config::QueueFormat;
use crate::error::{ConfigError, Result};
use crate::types::ContentItem;

#[derive(Debug, Clone)]
pub struct ContentQueue {
    items: Vec<ContentItem>,
}

impl ContentQueue {
    /// Load the queue from a text file
    ///
    /// `Lines` treats every non-blank trimmed line as one item. `Blocks`
    /// splits on blank lines and treats each trimmed block as one item
    /// (multi-line content). Fails if the file is missing or yields zero
    /// items.
    pub fn load(path: &Path, format: QueueFormat) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::QueueMissing(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let queue = Self::parse(&content, format);

        if queue.is_empty() {
            return Err(ConfigError::QueueEmpty(path.display().to_string()).into());
        }

        info!(items = queue.len(), path = %path.display(), "loaded content queue");
        Ok(queue)
    }

    /// Build a queue from raw file content
    pub fn parse(content: &str, format: QueueFormat) -> Self {
        let texts: Vec<String> = match format {
            QueueFormat::Lines => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            QueueFormat::Blocks => content
                .split("\n\n")
                .map(str::trim)
                .filter(|block| !block.is_empty())
                .map(str::to_string)
                .collect(),
        };

        let items = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| ContentItem { index, text })
            .collect();

        Self { items }
    }

    /// Build a queue directly from item texts (tests, embedding)
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| ContentItem {
                index,
                text: text.into(),
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ContentItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lines_format() {
        let queue = ContentQueue::parse("first\nsecond\n\n  third  \n", QueueFormat::Lines);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.get(0).unwrap().text, "first");
        assert_eq!(queue.get(2).unwrap().text, "third");
        assert_eq!(queue.get(2).unwrap().index, 2);
    }

    #[test]
    fn test_blocks_format() {
        let content = "first line\nstill first item\n\nsecond item\n\n\nthird item\n";
        let queue = ContentQueue::parse(content, QueueFormat::Blocks);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.get(0).unwrap().text, "first line\nstill first item");
        assert_eq!(queue.get(1).unwrap().text, "second item");
    }

    #[test]
    fn test_blocks_keep_hash_prefixed_content() {
        // The source content format treats # lines as ordinary text
        let queue = ContentQueue::parse("# not a comment\n\nreal item\n", QueueFormat::Blocks);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.get(0).unwrap().text, "# not a comment");
    }

    #[test]
    fn test_load_missing_file() {
        let result = ContentQueue::load(
            Path::new("/nonexistent/queue.txt"),
            QueueFormat::Lines,
        );
        let err = result.unwrap_err();
        assert!(format!("{}", err).contains("Queue file not found"));
    }

    #[test]
    fn test_load_empty_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "\n\n   \n").unwrap();

        let result = ContentQueue::load(file.path(), QueueFormat::Lines);
        let err = result.unwrap_err();
        assert!(format!("{}", err).contains("no content"));
    }

    #[test]
    fn test_load_lines_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "alpha\nbeta\ngamma\n").unwrap();

        let queue = ContentQueue::load(file.path(), QueueFormat::Lines).unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.get(1).unwrap().text, "beta");
    }
}

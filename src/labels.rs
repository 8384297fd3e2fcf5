//! Class label file loading.
//!
//! The label file is an ordered sequence of strings, one per model output
//! channel. Index 0 is reserved for the background class and never reported.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// Index of the background class in every label set.
pub const BACKGROUND_CLASS: usize = 0;

/// Ordered class labels for the model's output channels.
#[derive(Clone, Debug)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Load labels from a file, one label per line.
    ///
    /// A missing or empty file is a fatal startup error; there is nothing
    /// sensible to detect without labels.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| {
            format!(
                "failed to read label file {} (was it copied alongside the model artifact?)",
                path.display()
            )
        })?;
        let labels: Vec<String> = raw
            .lines()
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self::from_labels(labels)
    }

    pub fn from_labels(labels: Vec<String>) -> Result<Self> {
        if labels.len() < 2 {
            return Err(anyhow!(
                "label set needs the background class plus at least one object class, found {}",
                labels.len()
            ));
        }
        Ok(Self { labels })
    }

    /// Number of classes, including background.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a class index, if in range.
    pub fn get(&self, class_index: usize) -> Option<&str> {
        self.labels.get(class_index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_labels_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp labels");
        writeln!(file, "background\nrock\npebble").expect("write labels");

        let labels = LabelSet::load(file.path()).expect("load labels");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(BACKGROUND_CLASS), Some("background"));
        assert_eq!(labels.get(1), Some("rock"));
        assert_eq!(labels.get(3), None);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = LabelSet::load("/nonexistent/labels.txt").unwrap_err();
        assert!(err.to_string().contains("label file"));
    }

    #[test]
    fn background_only_is_rejected() {
        assert!(LabelSet::from_labels(vec!["background".into()]).is_err());
    }
}

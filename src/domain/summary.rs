use serde::Serialize;
use std::fmt;

use super::detection::Detection;

pub const NO_OBJECTS_TEXT: &str = "No objects detected";

/// Occurrence count per class label, kept in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelSummary {
    counts: Vec<(String, usize)>,
}

impl LabelSummary {
    pub fn from_detections(detections: &[Detection]) -> Self {
        Self::from_labels(detections.iter().map(|d| d.label.as_str()))
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = Self::default();
        for label in labels {
            summary.add(label.as_ref());
        }
        summary
    }

    fn add(&mut self, label: &str) {
        match self.counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((label.to_string(), 1)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(l, c)| (l.as_str(), *c))
    }
}

/// `2 persons, 1 dog`, or the fallback text when nothing was found.
impl fmt::Display for LabelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(NO_OBJECTS_TEXT);
        }
        for (i, (label, count)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let plural = if count > 1 { "s" } else { "" };
            write!(f, "{count} {label}{plural}")?;
        }
        Ok(())
    }
}

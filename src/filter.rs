//! Detection filtering.
//!
//! The decoder emits one detection list per model channel, background
//! included. The filter drops the background class and empty lists and pairs
//! each surviving list with its label. It is a pure function of its input:
//! no state, no thresholds beyond what the decoder already applied.

use crate::decode::Detection;
use crate::labels::{LabelSet, BACKGROUND_CLASS};

/// Detections for one reported class.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDetections {
    pub class_index: usize,
    pub label: String,
    pub detections: Vec<Detection>,
}

/// Drops the background class and empty detection lists.
#[derive(Clone, Copy, Debug)]
pub struct DetectionFilter {
    background_class: usize,
}

impl DetectionFilter {
    pub fn new() -> Self {
        Self {
            background_class: BACKGROUND_CLASS,
        }
    }

    /// Filter the per-class detection lists from the decoder.
    ///
    /// Class indices without a label are reported under a placeholder; that
    /// mismatch is caught at startup, so hitting it here means the backend
    /// changed shape mid-run.
    pub fn filter(&self, per_class: &[Vec<Detection>], labels: &LabelSet) -> Vec<ClassDetections> {
        per_class
            .iter()
            .enumerate()
            .filter(|(class_index, detections)| {
                *class_index != self.background_class && !detections.is_empty()
            })
            .map(|(class_index, detections)| ClassDetections {
                class_index,
                label: labels
                    .get(class_index)
                    .unwrap_or("<unlabeled>")
                    .to_string(),
                detections: detections.clone(),
            })
            .collect()
    }
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::from_labels(vec!["background".into(), "rock".into()]).unwrap()
    }

    fn det(class_index: usize, score: f32) -> Detection {
        Detection {
            class_index,
            x: 10,
            y: 10,
            w: 8,
            h: 8,
            score,
        }
    }

    #[test]
    fn drops_background_and_empty_classes() {
        let per_class = vec![vec![det(0, 0.9)], vec![det(1, 0.8)]];
        let groups = DetectionFilter::new().filter(&per_class, &labels());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].class_index, 1);
        assert_eq!(groups[0].label, "rock");
        assert_eq!(groups[0].detections, vec![det(1, 0.8)]);
    }

    #[test]
    fn empty_lists_produce_no_groups() {
        let per_class = vec![vec![det(0, 0.9)], vec![]];
        let groups = DetectionFilter::new().filter(&per_class, &labels());
        assert!(groups.is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let per_class = vec![vec![], vec![det(1, 0.8), det(1, 0.4)]];
        let filter = DetectionFilter::new();

        let once = filter.filter(&per_class, &labels());
        let twice = filter.filter(&per_class, &labels());
        assert_eq!(once, twice);

        // Re-filtering the surviving lists changes nothing either.
        let survivors: Vec<Vec<Detection>> = {
            let mut all = vec![Vec::new()];
            all.extend(once.iter().map(|g| g.detections.clone()));
            all
        };
        let again = filter.filter(&survivors, &labels());
        assert_eq!(again[0].detections, once[0].detections);
    }
}

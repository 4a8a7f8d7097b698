//! Lookup of target milestones by release name.

use super::Milestone;
use std::collections::HashMap;

/// Target milestones keyed by title.
#[derive(Debug, Clone, Default)]
pub struct MilestoneIndex {
    by_title: HashMap<String, Milestone>,
}

impl MilestoneIndex {
    /// Indexes `milestones` by title; later duplicates win.
    #[must_use]
    pub fn new(milestones: impl IntoIterator<Item = Milestone>) -> Self {
        Self {
            by_title: milestones
                .into_iter()
                .map(|m| (m.title.clone(), m))
                .collect(),
        }
    }

    /// Returns the milestone titled `title`.
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&Milestone> {
        self.by_title.get(title)
    }

    /// Returns true when a milestone titled `title` exists.
    #[must_use]
    pub fn contains(&self, title: &str) -> bool {
        self.by_title.contains_key(title)
    }

    /// Adds a milestone.
    pub fn insert(&mut self, milestone: Milestone) {
        self.by_title.insert(milestone.title.clone(), milestone);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone(number: u64, title: &str) -> Milestone {
        Milestone {
            number,
            title: title.to_string(),
            state: "open".to_string(),
            due_on: None,
        }
    }

    #[test]
    fn looks_up_by_title() {
        let mut index = MilestoneIndex::new([milestone(1, "5.0.9"), milestone(2, "4.3.19")]);
        assert_eq!(index.get("4.3.19").map(|m| m.number), Some(2));
        assert!(!index.contains("6.0.0"));

        index.insert(milestone(3, "6.0.0"));
        assert!(index.contains("6.0.0"));
        assert_eq!(index.len(), 3);
    }
}

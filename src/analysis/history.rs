//! Bounded rolling history of recent analyses.

use std::collections::VecDeque;

use super::SkinToneAnalysis;

/// Default number of analyses retained per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Keeps the most recent analyses, evicting the oldest past the limit.
#[derive(Debug, Clone)]
pub struct AnalysisHistory {
    entries: VecDeque<SkinToneAnalysis>,
    limit: usize,
}

impl Default for AnalysisHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl AnalysisHistory {
    /// A limit of zero is treated as one.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, analysis: SkinToneAnalysis) {
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(analysis);
    }

    /// Oldest-first view of the retained analyses.
    pub fn entries(&self) -> impl Iterator<Item = &SkinToneAnalysis> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&SkinToneAnalysis> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

//! Append-only comment history owned by a single session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::sentiment::SentimentResult;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentRecord {
    #[schema(example = 1)]
    pub id: u64,
    pub text: String,
    #[serde(flatten)]
    pub sentiment: SentimentResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Comment {0} not found")]
    NotFound(u64),
}

#[derive(Debug, Clone)]
pub struct CommentHistory {
    records: Vec<CommentRecord>,
    next_id: u64,
}

impl Default for CommentHistory {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }
}

impl CommentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a comment and returns its id. Ids keep increasing across `clear`.
    pub fn append(&mut self, text: impl Into<String>, sentiment: SentimentResult) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(CommentRecord {
            id,
            text: text.into(),
            sentiment,
            timestamp: Utc::now(),
        });
        id
    }

    /// All records in insertion order.
    pub fn list(&self) -> &[CommentRecord] {
        &self.records
    }

    /// Most recent first, at most `limit` records.
    pub fn recent(&self, limit: usize) -> Vec<CommentRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }

    pub fn get(&self, id: u64) -> Result<&CommentRecord, HistoryError> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or(HistoryError::NotFound(id))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::score;

    fn append(history: &mut CommentHistory, text: &str) -> u64 {
        history.append(text, score(text))
    }

    #[test]
    fn test_ids_assigned_in_call_order() {
        let mut history = CommentHistory::new();
        let ids: Vec<u64> = ["first", "second", "third"]
            .iter()
            .map(|t| append(&mut history, t))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let texts: Vec<&str> = history.list().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_clear_empties_history() {
        let mut history = CommentHistory::new();
        append(&mut history, "a");
        append(&mut history, "b");
        history.clear();
        assert!(history.list().is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut history = CommentHistory::new();
        append(&mut history, "a");
        append(&mut history, "b");
        history.clear();
        assert_eq!(append(&mut history, "c"), 3);
        assert!(matches!(history.get(1), Err(HistoryError::NotFound(1))));
        assert_eq!(history.get(3).unwrap().text, "c");
    }

    #[test]
    fn test_get_by_id() {
        let mut history = CommentHistory::new();
        append(&mut history, "hello");
        let id = append(&mut history, "This is terrible");
        let record = history.get(id).unwrap();
        assert_eq!(record.text, "This is terrible");
        assert!(record.sentiment.polarity < 0.0);
        assert!(matches!(history.get(42), Err(HistoryError::NotFound(42))));
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut history = CommentHistory::new();
        for t in ["one", "two", "three"] {
            append(&mut history, t);
        }
        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "three");
        assert_eq!(recent[1].text, "two");
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut history = CommentHistory::new();
        append(&mut history, "good");
        let json = serde_json::to_value(&history.list()[0]).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["sentiment"], "Positive");
        assert!(json.get("polarity").is_some());
        assert!(json.get("timestamp").is_some());
    }
}

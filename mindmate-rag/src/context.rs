//! Conversation and retrieved-document context for response construction.
//!
//! [`ContextManager`] is an append-only log with a single writer. Reading the
//! [`window`](ContextManager::window) never mutates it: the log keeps every
//! turn and document, and the window trims on the way out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{Metadata, RankedResult};

/// Number of most recent turns kept in a context window by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
/// Number of best-scoring documents kept in a context window by default.
pub const DEFAULT_CONTEXT_DOCUMENTS: usize = 3;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// A document retrieved for some earlier query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl From<&RankedResult> for RetrievedDocument {
    fn from(result: &RankedResult) -> Self {
        Self {
            id: result.id.clone(),
            content: result.content.clone(),
            score: result.score,
            metadata: result.metadata.clone(),
        }
    }
}

/// The bounded view handed to response construction.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextWindow {
    /// The most recent turns, oldest first.
    pub history: Vec<ConversationTurn>,
    /// The best-scoring documents, best first.
    pub documents: Vec<RetrievedDocument>,
    pub current_query: Option<String>,
}

/// Counts describing the whole log.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextSummary {
    pub conversation_length: usize,
    pub retrieved_documents_count: usize,
    pub current_query: Option<String>,
    /// Rough token estimate at four characters per token.
    pub estimated_tokens: usize,
}

/// Accumulates conversation turns and retrieved documents.
#[derive(Debug, Clone)]
pub struct ContextManager {
    history_limit: usize,
    document_limit: usize,
    history: Vec<ConversationTurn>,
    documents: Vec<RetrievedDocument>,
    current_query: Option<String>,
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT, DEFAULT_CONTEXT_DOCUMENTS)
    }
}

impl ContextManager {
    /// Create a manager whose window keeps `history_limit` turns and
    /// `document_limit` documents.
    pub fn new(history_limit: usize, document_limit: usize) -> Self {
        Self {
            history_limit,
            document_limit,
            history: Vec::new(),
            documents: Vec::new(),
            current_query: None,
        }
    }

    pub fn add_user_message(&mut self, content: impl Into<String>, metadata: Option<Metadata>) {
        self.push_turn(Role::User, content.into(), metadata);
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>, metadata: Option<Metadata>) {
        self.push_turn(Role::Assistant, content.into(), metadata);
    }

    fn push_turn(&mut self, role: Role, content: String, metadata: Option<Metadata>) {
        debug!(?role, content_len = content.len(), "added conversation turn");
        self.history.push(ConversationTurn {
            role,
            content,
            timestamp: Utc::now(),
            metadata: metadata.unwrap_or_default(),
        });
    }

    pub fn set_current_query(&mut self, query: impl Into<String>) {
        self.current_query = Some(query.into());
    }

    pub fn add_retrieved_documents(&mut self, results: &[RankedResult]) {
        self.documents.extend(results.iter().map(RetrievedDocument::from));
        debug!(added = results.len(), total = self.documents.len(), "added retrieved documents");
    }

    /// The most recent turns and best documents.
    ///
    /// Documents with equal scores keep the order they were added in.
    pub fn window(&self) -> ContextWindow {
        let start = self.history.len().saturating_sub(self.history_limit);
        let history = self.history[start..].to_vec();

        let mut documents = self.documents.clone();
        documents.sort_by(|a, b| b.score.total_cmp(&a.score));
        documents.truncate(self.document_limit);

        debug!(history = history.len(), documents = documents.len(), "built context window");
        ContextWindow { history, documents, current_query: self.current_query.clone() }
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            conversation_length: self.history.len(),
            retrieved_documents_count: self.documents.len(),
            current_query: self.current_query.clone(),
            estimated_tokens: self.estimate_tokens(),
        }
    }

    fn estimate_tokens(&self) -> usize {
        let chars: usize = self.history.iter().map(|t| t.content.chars().count()).sum::<usize>()
            + self.documents.iter().map(|d| d.content.chars().count()).sum::<usize>()
            + self.current_query.as_deref().map_or(0, |q| q.chars().count());
        chars / 4
    }

    /// Drop every turn, document and the current query.
    pub fn clear(&mut self) {
        self.history.clear();
        self.documents.clear();
        self.current_query = None;
        debug!("cleared conversation context");
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ResultSource;

    fn result(id: &str, score: f32) -> RankedResult {
        RankedResult {
            id: id.into(),
            content: format!("about {id}"),
            metadata: Metadata::new(),
            score,
            source: ResultSource::Vector,
        }
    }

    #[test]
    fn window_keeps_most_recent_ten_turns() {
        let mut context = ContextManager::default();
        for i in 0..15 {
            context.add_user_message(format!("turn {i}"), None);
        }

        let window = context.window();
        assert_eq!(window.history.len(), 10);
        assert_eq!(window.history[0].content, "turn 5");
        assert_eq!(window.history[9].content, "turn 14");
        assert_eq!(context.history().len(), 15);
    }

    #[test]
    fn window_keeps_three_best_documents() {
        let mut context = ContextManager::default();
        context.add_retrieved_documents(&[result("a", 0.2), result("b", 0.9)]);
        context.add_retrieved_documents(&[result("c", 0.5), result("d", 0.7), result("e", 0.1)]);

        let ids: Vec<_> = context.window().documents.into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["b", "d", "c"]);
    }

    #[test]
    fn roles_and_current_query_are_recorded() {
        let mut context = ContextManager::default();
        context.set_current_query("where to eat?");
        context.add_user_message("where to eat?", None);
        context.add_assistant_message("try the market", None);

        let window = context.window();
        assert_eq!(window.current_query.as_deref(), Some("where to eat?"));
        assert_eq!(window.history[0].role, Role::User);
        assert_eq!(window.history[1].role, Role::Assistant);
    }

    #[test]
    fn summary_estimates_tokens_from_characters() {
        let mut context = ContextManager::default();
        context.set_current_query("abcd");
        context.add_user_message("abcdefgh", None);
        context.add_retrieved_documents(&[result("z", 0.5)]);

        let summary = context.summary();
        assert_eq!(summary.conversation_length, 1);
        assert_eq!(summary.retrieved_documents_count, 1);
        // "abcd" + "abcdefgh" + "about z" = 19 chars
        assert_eq!(summary.estimated_tokens, 4);
    }

    #[test]
    fn clear_resets_everything() {
        let mut context = ContextManager::default();
        context.set_current_query("q");
        context.add_user_message("q", None);
        context.add_retrieved_documents(&[result("a", 0.5)]);
        context.clear();

        let window = context.window();
        assert!(window.history.is_empty());
        assert!(window.documents.is_empty());
        assert!(window.current_query.is_none());
    }
}

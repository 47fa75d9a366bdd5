//! Response construction from ranked results.

use async_trait::async_trait;

use crate::context::ContextWindow;
use crate::document::RankedResult;
use crate::error::Result;

/// Composes an answer to a query from its ranked results.
///
/// Implementations may call out to a language model; the default
/// [`TemplateResponder`] is rule based and never fails.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Answer `query` from `results`, which are sorted best first and
    /// non-empty. `context` is the conversation window at the time of asking.
    async fn respond(
        &self,
        query: &str,
        results: &[RankedResult],
        context: &ContextWindow,
    ) -> Result<String>;
}

/// Cut `text` to `max_chars` characters, appending `...` if anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Topic-aware lead-in followed by an excerpt of the best document.
#[derive(Debug, Clone)]
pub struct TemplateResponder {
    topic_excerpt_chars: usize,
    generic_excerpt_chars: usize,
}

impl Default for TemplateResponder {
    fn default() -> Self {
        Self { topic_excerpt_chars: 200, generic_excerpt_chars: 300 }
    }
}

impl TemplateResponder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lead_in(query: &str) -> Option<&'static str> {
        let q = query.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| q.contains(w));

        if mentions(&["beach", "ocean"]) {
            Some("Based on my travel knowledge, beaches are wonderful destinations for relaxation. ")
        } else if mentions(&["hotel", "accommodation"]) {
            Some("For accommodations, I recommend considering location and amenities. ")
        } else if mentions(&["food", "restaurant"]) {
            Some("Food is an essential part of travel experience. ")
        } else {
            None
        }
    }
}

#[async_trait]
impl Responder for TemplateResponder {
    async fn respond(
        &self,
        query: &str,
        results: &[RankedResult],
        _context: &ContextWindow,
    ) -> Result<String> {
        let Some(best) = results.iter().max_by(|a, b| a.score.total_cmp(&b.score)) else {
            return Ok("I don't have specific information about that topic in my knowledge base. \
                       Could you provide more details or ask about something else related to travel?"
                .to_string());
        };

        let answer = match Self::lead_in(query) {
            Some(lead) => format!("{lead}{}", preview(&best.content, self.topic_excerpt_chars)),
            None => format!(
                "Based on my travel knowledge: {}",
                preview(&best.content, self.generic_excerpt_chars)
            ),
        };
        Ok(answer)
    }
}

/// Static guidance for when no document supports an answer.
pub fn fallback_guidance(query: &str) -> String {
    let q = query.to_lowercase();
    if q.contains("hotel") || q.contains("accommodation") {
        return "For finding hotels: pick a neighbourhood close to the attractions you want, \
                check recent reviews, and filter by your budget and required amenities \
                (Wi-Fi, breakfast, free cancellation)."
            .to_string();
    }
    if q.contains("flight") || q.contains("airline") {
        return "For flights: search flexible dates 2-3 months ahead, consider mid-week departures, \
                and use price alerts. If you give me your departure city and dates, I can suggest \
                a strategy."
            .to_string();
    }
    "I don't have matching documents in my knowledge base right now. Upload travel documents \
     (itineraries, guides, bookings) and I'll give specific, document-backed recommendations. \
     Meanwhile, tell me the destination and travel dates and I'll give general planning tips."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextManager;
    use crate::document::{Metadata, ResultSource};

    fn result(content: &str, score: f32) -> RankedResult {
        RankedResult {
            id: "id".into(),
            content: content.into(),
            metadata: Metadata::new(),
            score,
            source: ResultSource::Vector,
        }
    }

    #[test]
    fn preview_cuts_on_characters() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exactly", 7), "exactly");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }

    #[tokio::test]
    async fn topic_lead_in_uses_best_document() {
        let window = ContextManager::default().window();
        let answer = TemplateResponder::new()
            .respond(
                "Any good beach nearby?",
                &[result("weak match", 0.2), result("Palolem beach is calm.", 0.9)],
                &window,
            )
            .await
            .unwrap();
        assert!(answer.starts_with("Based on my travel knowledge, beaches"));
        assert!(answer.ends_with("Palolem beach is calm."));
    }

    #[tokio::test]
    async fn generic_answer_truncates_long_excerpt() {
        let window = ContextManager::default().window();
        let long = "x".repeat(400);
        let answer =
            TemplateResponder::new().respond("museums?", &[result(&long, 0.5)], &window).await.unwrap();
        assert!(answer.starts_with("Based on my travel knowledge: "));
        assert!(answer.ends_with("..."));
        assert_eq!(answer.chars().filter(|c| *c == 'x').count(), 300);
    }

    #[test]
    fn fallback_matches_topics() {
        assert!(fallback_guidance("cheap HOTEL in Goa").starts_with("For finding hotels"));
        assert!(fallback_guidance("which airline?").starts_with("For flights"));
        assert!(fallback_guidance("weather").starts_with("I don't have matching documents"));
    }
}

use std::sync::Arc;

use crate::agent::Failure;
use crate::ctx::Ctx;
use crate::llm::History;
use crate::tools::search::{Search, SearchHit, SearchQuery};

/// Interactive helper: code search, code review and follow-up questions.
///
/// Conversation state lives in a caller-owned [`History`], so one assistant
/// can serve several independent conversations.
#[derive(Clone)]
pub struct CodeAssistant {
    max_tokens: u32,
    search: Option<Arc<dyn Search>>,
}

impl CodeAssistant {
    pub fn new() -> Self {
        Self {
            max_tokens: 1000,
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Search + 'static) -> Self {
        self.search = Some(Arc::new(search));
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn search_code(&self, query: &str) -> Result<Vec<SearchHit>, Failure> {
        let search = self
            .search
            .as_ref()
            .ok_or_else(|| Failure::unavailable("no search backend configured"))?;
        search.search(&SearchQuery::new(query))
    }

    /// One-shot review: quality, likely issues, suggested improvements.
    pub fn analyze(&self, ctx: &Ctx, code: &str) -> Result<String, Failure> {
        ctx.llm()
            .user(format!(
                "Please analyze this code and provide insights about its quality, potential \
                 issues, and suggestions for improvement:\n\n```\n{code}\n```"
            ))
            .max_tokens(self.max_tokens)
            .send()
    }

    /// Ask with earlier turns replayed. The turn is recorded only when the
    /// call succeeds.
    pub fn ask(
        &self,
        ctx: &Ctx,
        history: &mut History,
        question: &str,
        context: &str,
    ) -> Result<String, Failure> {
        let prompt = if context.trim().is_empty() {
            question.to_string()
        } else {
            format!("Context:\n{context}\n\nQuestion: {question}")
        };

        let answer = ctx
            .llm()
            .history(history)
            .user(prompt.clone())
            .max_tokens(self.max_tokens)
            .send()?;

        history.push(prompt, answer.clone());
        Ok(answer)
    }
}

impl Default for CodeAssistant {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodeAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeAssistant")
            .field("max_tokens", &self.max_tokens)
            .field("search", &self.search.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::llm::fake::Scripted;

    struct OneHit;

    impl Search for OneHit {
        fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, Failure> {
            Ok(vec![SearchHit {
                title: Some(query.text.clone()),
                url: "https://example.com".into(),
                score: None,
                text: None,
                metadata: Default::default(),
            }])
        }
    }

    #[test]
    fn analyze_wraps_code_in_fence() {
        let backend = Arc::new(Scripted::new(["looks fine"]));
        let ctx = Ctx::new().with_shared_llm(backend.clone());

        let out = CodeAssistant::new().analyze(&ctx, "fn main() {}").unwrap();
        assert_eq!(out, "looks fine");

        let requests = backend.requests();
        assert!(requests[0].messages[0].content.ends_with("```\nfn main() {}\n```"));
        assert_eq!(requests[0].max_tokens, 1000);
    }

    #[test]
    fn ask_replays_history() {
        let backend = Arc::new(Scripted::new(["first answer", "second answer"]));
        let ctx = Ctx::new().with_shared_llm(backend.clone());
        let assistant = CodeAssistant::new();
        let mut history = History::with_capacity(4);

        assistant.ask(&ctx, &mut history, "what is a borrow?", "").unwrap();
        assistant
            .ask(&ctx, &mut history, "and a move?", "ownership chapter")
            .unwrap();

        assert_eq!(history.len(), 2);
        let requests = backend.requests();
        let second = &requests[1].messages;
        assert_eq!(second.len(), 3);
        assert_eq!(second[0].content, "what is a borrow?");
        assert_eq!(second[1].role, Role::Assistant);
        assert_eq!(second[1].content, "first answer");
        assert_eq!(
            second[2].content,
            "Context:\nownership chapter\n\nQuestion: and a move?"
        );
    }

    #[test]
    fn failed_ask_leaves_history_untouched() {
        let ctx = Ctx::new().with_llm(Scripted::with_results([Err(Failure::unavailable("down"))]));
        let mut history = History::default();

        let err = CodeAssistant::new()
            .ask(&ctx, &mut history, "q", "")
            .unwrap_err();
        assert!(err.is_transient());
        assert!(history.is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let ctx = Ctx::new().with_llm(Scripted::new(["a", "b", "c"]));
        let mut history = History::with_capacity(2);
        let assistant = CodeAssistant::new();

        for q in ["1", "2", "3"] {
            assistant.ask(&ctx, &mut history, q, "").unwrap();
        }
        let messages = history.messages();
        assert_eq!(history.len(), 2);
        assert_eq!(messages[0].content, "2");
    }

    #[test]
    fn search_requires_backend() {
        let err = CodeAssistant::new().search_code("tokio select").unwrap_err();
        assert!(matches!(err, Failure::ServiceUnavailable(_)));

        let hits = CodeAssistant::new()
            .with_search(OneHit)
            .search_code("tokio select")
            .unwrap();
        assert_eq!(hits[0].title.as_deref(), Some("tokio select"));
    }
}

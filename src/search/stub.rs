use crate::models::SearchResultItem;

use super::{SearchError, SearchProvider};

/// Returns the same single result for any query.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubSearch;

#[async_trait::async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResultItem>, SearchError> {
        Ok(vec![SearchResultItem {
            title: "Example Search Result".to_string(),
            url: "https://example.com".to_string(),
            snippet: "This is a sample search result snippet.".to_string(),
        }])
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

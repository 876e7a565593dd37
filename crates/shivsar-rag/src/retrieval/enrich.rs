//! Query enrichment with company context

use crate::config::CompanyConfig;

/// Appends a disambiguating company phrase to queries that do not mention it
#[derive(Debug, Clone)]
pub struct QueryEnricher {
    /// Lowercase term that marks a query as already about the company
    match_term: String,
    /// Phrase appended otherwise
    base_context: String,
}

impl QueryEnricher {
    /// Create an enricher
    pub fn new(match_term: impl Into<String>, base_context: impl Into<String>) -> Self {
        Self {
            match_term: match_term.into().to_lowercase(),
            base_context: base_context.into(),
        }
    }

    /// Create from the company section of the config
    pub fn from_config(config: &CompanyConfig) -> Self {
        Self::new(&config.match_term, &config.base_context)
    }

    /// Enrich a raw user query.
    ///
    /// Queries mentioning the company (case-insensitive) come back trimmed;
    /// all others get `" " + base_context` appended to the trimmed text. An
    /// empty query yields the bare context phrase, so enriching is idempotent.
    pub fn enrich(&self, query: &str) -> String {
        let trimmed = query.trim();
        if trimmed.to_lowercase().contains(&self.match_term) {
            return trimmed.to_string();
        }
        if trimmed.is_empty() {
            return self.base_context.clone();
        }
        format!("{} {}", trimmed, self.base_context)
    }
}

impl Default for QueryEnricher {
    fn default() -> Self {
        Self::from_config(&CompanyConfig::default())
    }
}

/// Enrich a query with the default Shivsar Export context
pub fn enrich_query(query: &str) -> String {
    QueryEnricher::default().enrich(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "about SHIVSAR EXPORT company";

    #[test]
    fn test_appends_context_when_company_missing() {
        assert_eq!(
            enrich_query("  what is your phone number "),
            format!("what is your phone number {}", BASE)
        );
        assert_eq!(enrich_query("who is ceo of google"), format!("who is ceo of google {}", BASE));
    }

    #[test]
    fn test_company_mention_any_case_is_left_alone() {
        assert_eq!(enrich_query("Where is Shivsar located?  "), "Where is Shivsar located?");
        assert_eq!(enrich_query("SHIVSAR onion prices"), "SHIVSAR onion prices");
        assert_eq!(enrich_query("\tshivsarexport.com contact"), "shivsarexport.com contact");
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        for query in ["what is your phone number", "  Shivsar email ", "", "   ", "ceo?"] {
            let once = enrich_query(query);
            assert_eq!(enrich_query(&once), once, "query {:?}", query);
        }
    }

    #[test]
    fn test_empty_query_gets_context() {
        assert_eq!(enrich_query(""), BASE);
        assert_eq!(enrich_query("   "), BASE);
    }

    #[test]
    fn test_custom_company() {
        let enricher = QueryEnricher::new("ACME", "about ACME corp");
        assert_eq!(enricher.enrich("hours"), "hours about ACME corp");
        assert_eq!(enricher.enrich("acme hours"), "acme hours");
    }
}

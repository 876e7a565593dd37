//! Prompt template for company-grounded answers

use crate::config::CompanyConfig;
use crate::types::Chunk;

/// Separator between chunks when they are stuffed into one prompt
const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Fixed instructions plus slots for retrieved context and the question
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    company_name: String,
    support_url: String,
}

impl PromptTemplate {
    /// Create a template for a company
    pub fn new(company_name: impl Into<String>, support_url: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            support_url: support_url.into(),
        }
    }

    /// Create from the company section of the config
    pub fn from_config(config: &CompanyConfig) -> Self {
        Self::new(&config.name, &config.support_url)
    }

    /// Reply the model is told to give when the data has no answer
    pub fn fallback_message(&self) -> String {
        format!(
            "Sorry, that information is not available. Visit {} for more.",
            self.support_url
        )
    }

    /// Join chunk texts into the context block, in retrieval order
    pub fn build_context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }

    /// Render the full prompt
    pub fn render(&self, context: &str, question: &str) -> String {
        format!(
            r#"
You are an intelligent and friendly assistant for the {company} Company.

Answer all user questions clearly and accurately using only the company information below.

- The user may use broken or short English. Your job is to understand their intent.
- If they mention "contact", "reach", "call", "email", "address", "whatsapp", etc., return actual phone numbers or emails from the data.
- Never guess or fabricate. If not found, say: "{fallback}"

Company Data:
{context}

User Question: {question}
Answer:"#,
            company = self.company_name,
            fallback = self.fallback_message(),
            context = context,
            question = question
        )
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::from_config(&CompanyConfig::default())
    }
}

//! Assembles the assistant reply from the generated answer and the lookup.

use crate::pubmed::{LookupOutcome, Record};

/// Characters of each abstract shown in the reply.
pub const EXCERPT_CHARS: usize = 300;
pub const ELLIPSIS: &str = "...";
/// PMID shown when the lookup failed.
pub const NOT_AVAILABLE: &str = "N/A";
pub const LOOKUP_ERROR_PREFIX: &str = "Error fetching PubMed articles: ";

pub fn article_url(pmid: &str) -> String {
    format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}")
}

/// First [`EXCERPT_CHARS`] characters of `text`, always followed by `...`.
pub fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Records to render for an outcome. A failed lookup renders as a single
/// placeholder whose abstract carries the error.
pub fn records_for(outcome: &LookupOutcome) -> Vec<Record> {
    match outcome {
        LookupOutcome::Found(records) => records.clone(),
        LookupOutcome::Failed(err) => vec![Record {
            pmid: NOT_AVAILABLE.to_string(),
            abstract_text: format!("{LOOKUP_ERROR_PREFIX}{err}"),
        }],
    }
}

/// Markdown reply shown as the assistant message.
pub fn format_reply(answer: &str, outcome: &LookupOutcome) -> String {
    let mut out = format!("🤖 **Medical Answer:**\n{answer}\n\n");
    out.push_str("📚 **Relevant Research Papers:**\n");

    for (idx, record) in records_for(outcome).iter().enumerate() {
        out.push_str(&format!("🔹 **Article {}**\n", idx + 1));
        out.push_str(&format!("🆔 PMID: {}\n", record.pmid));
        out.push_str(&format!("📜 Abstract: {}\n", excerpt(&record.abstract_text)));
        out.push_str(&format!("🔗 [Read more]({})\n\n", article_url(&record.pmid)));
    }
    out
}

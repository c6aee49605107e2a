use serde::{Deserialize, Serialize};

/// A job posting as extracted from the page currently open in a tab.
/// Ephemeral: rebuilt per page, never persisted by this service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

impl JobPosting {
    /// Text handed to the skill extractor. Only the description is scored; a
    /// skill named in the title alone does not count as required.
    pub fn scoring_text(&self) -> &str {
        &self.description
    }
}

/// Loose URL test used before scoring a page: anything that looks like a job listing.
pub fn is_job_page(url: &str) -> bool {
    let url = url.to_lowercase();
    url.contains("job") || url.contains("career") || url.contains("apply")
}

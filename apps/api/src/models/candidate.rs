use serde::{Deserialize, Serialize};

use crate::matching::vocabulary::SkillSet;

/// The candidate's profile as served by the resume collaborator. Read-only here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    /// Resume record id on the collaborator side. Used as the candidate reference
    /// on ledger writes.
    #[serde(default)]
    pub resume_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub years_experience: Option<u32>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CandidateProfile {
    /// Skills lowercased and deduplicated, in the order the resume lists them.
    pub fn skill_set(&self) -> SkillSet {
        SkillSet::from_tokens(self.skills.iter())
    }

    pub fn first_name(&self) -> String {
        self.name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string()
    }

    pub fn last_name(&self) -> String {
        self.name
            .split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn years_text(&self) -> String {
        self.years_experience
            .map(|y| y.to_string())
            .unwrap_or_default()
    }
}

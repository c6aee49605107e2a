use serde::{Deserialize, Serialize};

use crate::matching::extractor::SkillExtractor;
use crate::matching::vocabulary::SkillSet;

/// Score reported when the job text has no vocabulary hits at all.
/// "Not enough signal" is kept distinct from a real 0% match.
pub const NEUTRAL_SCORE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub overall_score: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

impl MatchResult {
    pub fn neutral() -> Self {
        Self {
            overall_score: NEUTRAL_SCORE,
            matched_skills: vec![],
            missing_skills: vec![],
        }
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.overall_score)
    }
}

/// Display bucket for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn from_score(score: u32) -> Self {
        if score >= 75 {
            ScoreBand::High
        } else if score >= 50 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }
}

/// Compares a candidate's skills against the skills found in a job's text.
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    extractor: SkillExtractor,
}

impl SkillMatcher {
    pub fn new(extractor: SkillExtractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &SkillExtractor {
        &self.extractor
    }

    pub fn score(&self, candidate: &SkillSet, job_text: &str) -> MatchResult {
        let job_skills = self.extractor.extract(job_text);
        score_skill_sets(candidate, &job_skills)
    }
}

/// matched = job ∩ candidate, missing = job − matched, both in job-set order.
pub fn score_skill_sets(candidate: &SkillSet, job_skills: &SkillSet) -> MatchResult {
    if job_skills.is_empty() {
        return MatchResult::neutral();
    }

    let matched = job_skills.intersection(candidate);
    let missing = job_skills.difference(&matched);
    let overall_score =
        ((matched.len() as f64 / job_skills.len() as f64) * 100.0).round() as u32;

    MatchResult {
        overall_score,
        matched_skills: matched.into_vec(),
        missing_skills: missing.into_vec(),
    }
}

/// "a, b, c..." for the first `limit` skills, or "None".
pub fn summarize_skills(skills: &[String], limit: usize) -> String {
    if skills.is_empty() {
        return "None".to_string();
    }
    let head = skills
        .iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if skills.len() > limit {
        format!("{head}...")
    } else {
        head
    }
}

use std::sync::Arc;

use crate::matching::vocabulary::{SkillSet, SkillVocabulary};

/// Scans free text for vocabulary tokens.
///
/// A token is present when it occurs as a case-insensitive substring of the
/// text; there is no fuzzy or partial matching. The result follows vocabulary
/// order so that sets extracted from different texts compare directly.
#[derive(Debug, Clone)]
pub struct SkillExtractor {
    vocabulary: Arc<SkillVocabulary>,
}

impl SkillExtractor {
    pub fn new(vocabulary: Arc<SkillVocabulary>) -> Self {
        Self { vocabulary }
    }

    #[cfg(test)]
    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    pub fn extract(&self, text: &str) -> SkillSet {
        if text.trim().is_empty() || self.vocabulary.is_empty() {
            return SkillSet::new();
        }
        let haystack = text.to_lowercase();
        SkillSet::from_tokens(
            self.vocabulary
                .tokens()
                .iter()
                .filter(|token| haystack.contains(token.as_str())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(tokens: &[&str]) -> SkillExtractor {
        SkillExtractor::new(Arc::new(SkillVocabulary::new(tokens.iter())))
    }

    #[test]
    fn test_extracts_in_vocabulary_order() {
        let ex = extractor(&["python", "react", "aws"]);
        let skills = ex.extract("AWS first, then React, and finally Python");
        assert_eq!(skills.as_slice(), ["python", "react", "aws"]);
    }

    #[test]
    fn test_empty_text_yields_empty_set() {
        let ex = extractor(&["python"]);
        assert!(ex.extract("").is_empty());
        assert!(ex.extract("   \n").is_empty());
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let ex = extractor(&["python"]);
        assert_eq!(ex.extract("python python PYTHON").len(), 1);
    }

    #[test]
    fn test_result_is_subset_of_vocabulary_and_idempotent() {
        let ex = SkillExtractor::new(Arc::new(SkillVocabulary::default()));
        let texts = [
            "We use Kubernetes, Docker and a sprinkle of ci/cd magic with Terraform",
            "Nothing relevant here at all",
            "JavaScript/TypeScript frontends, Node backends, Postgres via SQL",
        ];
        for text in texts {
            let first = ex.extract(text);
            assert!(first.iter().all(|t| ex.vocabulary().contains(t)));
            assert_eq!(first, ex.extract(text));
        }
    }

    #[test]
    fn test_substring_semantics_are_literal() {
        // "javascript" contains "java"; both are reported.
        let ex = extractor(&["java", "javascript"]);
        assert_eq!(ex.extract("Senior JavaScript developer").as_slice(), ["java", "javascript"]);
    }

    #[test]
    fn test_never_invents_tokens() {
        let ex = extractor(&["react"]);
        assert!(ex.extract("Reactive programming in Rust").as_slice() == ["react"]);
        assert!(ex.extract("Vue and Svelte").is_empty());
    }

    #[test]
    fn test_default_vocabulary_ignores_plain_english() {
        let ex = SkillExtractor::new(Arc::new(SkillVocabulary::default()));
        let text = "A scalable team of trusted people who swiftly turn a springboard into a revue";
        assert!(ex.extract(text).is_empty());
        assert_eq!(
            ex.extract("Vue.js frontend with Spring Boot services").as_slice(),
            ["vue.js", "spring boot"]
        );
    }
}

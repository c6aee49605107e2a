use serde::{Deserialize, Serialize};

/// Built-in skill tokens. The first fourteen are the set the browser extension
/// has always shipped with; the rest widen coverage across languages, frameworks,
/// infrastructure and process terms. Matching is by substring, so tokens that
/// also occur inside ordinary English words are spelled in a longer form.
const DEFAULT_SKILLS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "typescript",
    "react",
    "node",
    "sql",
    "aws",
    "docker",
    "kubernetes",
    "git",
    "agile",
    "scrum",
    "ci/cd",
    "golang",
    "c++",
    "c#",
    "ruby",
    "php",
    "kotlin",
    "swiftui",
    "angular",
    "vue.js",
    "django",
    "flask",
    "spring boot",
    "graphql",
    "postgresql",
    "mongodb",
    "redis",
    "kafka",
    "terraform",
    "azure",
    "gcp",
    "linux",
    "tensorflow",
    "pytorch",
    "machine learning",
    "jenkins",
    "ansible",
];

/// The reference set of known skill tokens. Configuration, not derived data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillVocabulary {
    tokens: Vec<String>,
}

impl SkillVocabulary {
    /// Tokens are trimmed and lowercased; empties are dropped and duplicates
    /// keep their first position.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self { tokens: Vec::new() };
        vocab.push_all(tokens);
        vocab
    }

    /// Default vocabulary followed by `extra`.
    pub fn extended<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self::default();
        vocab.push_all(extra);
        vocab
    }

    fn push_all<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            let token = token.as_ref().trim().to_lowercase();
            if !token.is_empty() && !self.tokens.contains(&token) {
                self.tokens.push(token);
            }
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.tokens.iter().any(|t| *t == token)
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_SKILLS.iter())
    }
}

/// Ordered set of lowercase skill tokens.
///
/// Order is insertion order. Sets produced by the extractor are in vocabulary
/// order, and `intersection`/`difference` preserve the receiver's order, so
/// matched/missing lists derived from a job set come out in vocabulary order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet {
    tokens: Vec<String>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for token in tokens {
            set.insert(token.as_ref());
        }
        set
    }

    /// Returns false when the token was already present (or blank).
    pub fn insert(&mut self, token: &str) -> bool {
        let token = token.trim().to_lowercase();
        if token.is_empty() || self.tokens.contains(&token) {
            return false;
        }
        self.tokens.push(token);
        true
    }

    pub fn contains(&self, token: &str) -> bool {
        let token = token.trim().to_lowercase();
        self.tokens.iter().any(|t| *t == token)
    }

    pub fn intersection(&self, other: &SkillSet) -> SkillSet {
        SkillSet {
            tokens: self
                .tokens
                .iter()
                .filter(|t| other.contains(t))
                .cloned()
                .collect(),
        }
    }

    pub fn difference(&self, other: &SkillSet) -> SkillSet {
        SkillSet {
            tokens: self
                .tokens
                .iter()
                .filter(|t| !other.contains(t))
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// First `n` tokens in set order.
    pub fn top(&self, n: usize) -> Vec<&str> {
        self.iter().take(n).collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }
}

//! Field mapping policy.
//!
//! Short-text inputs are matched against `KEYWORD_TABLE` by substring
//! containment on the lowercased descriptor (and on the descriptor with
//! separators removed, so `first_name` reaches `firstname`). The table is
//! ordered most-specific first; the first keyword with a non-empty profile value
//! wins, one write per input. Long-text inputs only take a cover letter. File
//! inputs are never filled: resume/CV uploads are flagged for the user instead.

use serde::{Deserialize, Serialize};

use crate::autofill::cover_letter::choose_cover_letter;
use crate::models::candidate::CandidateProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    ShortText,
    LongText,
    File,
}

/// One form input as seen by the mapper: its name/id/placeholder, lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub descriptor: String,
    pub kind: FieldKind,
}

impl FormInput {
    pub fn new(descriptor: &str, kind: FieldKind) -> Self {
        Self {
            descriptor: descriptor.trim().to_lowercase(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileField {
    FullName,
    FirstName,
    LastName,
    Email,
    Phone,
    LinkedIn,
    YearsExperience,
}

const KEYWORD_TABLE: &[(&str, ProfileField)] = &[
    ("firstname", ProfileField::FirstName),
    ("lastname", ProfileField::LastName),
    ("fullname", ProfileField::FullName),
    ("name", ProfileField::FullName),
    ("email", ProfileField::Email),
    ("mobile", ProfileField::Phone),
    ("phone", ProfileField::Phone),
    ("linkedin", ProfileField::LinkedIn),
    ("experience", ProfileField::YearsExperience),
    ("years", ProfileField::YearsExperience),
];

const COVER_LETTER_KEYWORDS: &[&str] = &["cover", "letter"];
const RESUME_UPLOAD_KEYWORDS: &[&str] = &["resume", "cv"];

pub const MANUAL_UPLOAD_HINT: &str = "Please upload your tailored resume here";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FieldAction {
    /// Write `value` into the input. `matched` names the keyword that selected it.
    Fill { value: String, matched: String },
    /// Cannot be scripted; the caller should highlight the input.
    NeedsManualAttention { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedField {
    /// Position of the input in the list handed to the mapper.
    pub index: usize,
    pub descriptor: String,
    pub kind: FieldKind,
    #[serde(flatten)]
    pub action: FieldAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillPlan {
    pub fields: Vec<PlannedField>,
}

impl FillPlan {
    pub fn filled(&self) -> impl Iterator<Item = &PlannedField> {
        self.fields
            .iter()
            .filter(|f| matches!(f.action, FieldAction::Fill { .. }))
    }

    pub fn needs_attention(&self) -> impl Iterator<Item = &PlannedField> {
        self.fields
            .iter()
            .filter(|f| matches!(f.action, FieldAction::NeedsManualAttention { .. }))
    }

    #[cfg(test)]
    pub fn value_for(&self, index: usize) -> Option<&str> {
        self.fields.iter().find(|f| f.index == index).and_then(|f| match &f.action {
            FieldAction::Fill { value, .. } => Some(value.as_str()),
            FieldAction::NeedsManualAttention { .. } => None,
        })
    }
}

pub struct FieldMapper<'a> {
    profile: &'a CandidateProfile,
    cover_letter: String,
}

impl<'a> FieldMapper<'a> {
    pub fn new(profile: &'a CandidateProfile, tailored_cover_letter: Option<&str>) -> Self {
        Self {
            profile,
            cover_letter: choose_cover_letter(profile, tailored_cover_letter),
        }
    }

    pub fn plan(&self, inputs: &[FormInput]) -> FillPlan {
        let fields = inputs
            .iter()
            .enumerate()
            .filter_map(|(index, input)| {
                self.action_for(input).map(|action| PlannedField {
                    index,
                    descriptor: input.descriptor.clone(),
                    kind: input.kind,
                    action,
                })
            })
            .collect();
        FillPlan { fields }
    }

    fn action_for(&self, input: &FormInput) -> Option<FieldAction> {
        let descriptor = input.descriptor.to_lowercase();
        if descriptor.is_empty() {
            return None;
        }

        match input.kind {
            FieldKind::ShortText => {
                let compact = compact(&descriptor);
                KEYWORD_TABLE
                    .iter()
                    .filter(|(keyword, _)| descriptor.contains(keyword) || compact.contains(keyword))
                    .find_map(|(keyword, field)| {
                        let value = self.value_of(*field);
                        (!value.is_empty()).then(|| FieldAction::Fill {
                            value,
                            matched: keyword.to_string(),
                        })
                    })
            }
            FieldKind::LongText => contains_any(&descriptor, COVER_LETTER_KEYWORDS).then(|| {
                FieldAction::Fill {
                    value: self.cover_letter.clone(),
                    matched: "cover_letter".to_string(),
                }
            }),
            FieldKind::File => contains_any(&descriptor, RESUME_UPLOAD_KEYWORDS).then(|| {
                FieldAction::NeedsManualAttention {
                    reason: MANUAL_UPLOAD_HINT.to_string(),
                }
            }),
        }
    }

    fn value_of(&self, field: ProfileField) -> String {
        let p = self.profile;
        match field {
            ProfileField::FullName => p.name.trim().to_string(),
            ProfileField::FirstName => p.first_name(),
            ProfileField::LastName => p.last_name(),
            ProfileField::Email => p.email.trim().to_string(),
            ProfileField::Phone => p.phone.trim().to_string(),
            ProfileField::LinkedIn => p.linkedin.trim().to_string(),
            ProfileField::YearsExperience => p.years_text(),
        }
    }
}

fn compact(descriptor: &str) -> String {
    descriptor
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | '.' | ' ' | '[' | ']'))
        .collect()
}

fn contains_any(descriptor: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| descriptor.contains(k))
}

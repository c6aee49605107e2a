use crate::models::candidate::CandidateProfile;

/// Skills quoted in the fallback letter.
pub const FALLBACK_TOP_SKILLS: usize = 3;

/// Generic letter used when the tailoring service has nothing for this job.
pub fn fallback_cover_letter(profile: &CandidateProfile) -> String {
    let skills = profile.skill_set();
    format!(
        "I am excited to apply for this position. My {} years of experience in {} make me a strong candidate.",
        profile.years_text(),
        skills.top(FALLBACK_TOP_SKILLS).join(", ")
    )
}

/// Tailored letter when one was supplied and is not blank, otherwise the fallback.
pub fn choose_cover_letter(profile: &CandidateProfile, tailored: Option<&str>) -> String {
    match tailored {
        Some(letter) if !letter.trim().is_empty() => letter.to_string(),
        _ => fallback_cover_letter(profile),
    }
}

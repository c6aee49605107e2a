use axum::Json;
use serde::Deserialize;

use crate::autofill::field_mapper::{FieldMapper, FillPlan, FormInput};
use crate::errors::AppError;
use crate::models::candidate::CandidateProfile;

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub profile: CandidateProfile,
    pub inputs: Vec<FormInput>,
    #[serde(default)]
    pub cover_letter: Option<String>,
}

/// POST /api/v1/autofill/plan
///
/// Stateless field mapping for callers that already hold the profile and the
/// form's input descriptors.
pub async fn handle_plan(Json(req): Json<PlanRequest>) -> Result<Json<FillPlan>, AppError> {
    if req.inputs.len() > 500 {
        return Err(AppError::Validation(
            "a form may describe at most 500 inputs".to_string(),
        ));
    }
    let inputs: Vec<FormInput> = req
        .inputs
        .iter()
        .map(|i| FormInput::new(&i.descriptor, i.kind))
        .collect();
    let mapper = FieldMapper::new(&req.profile, req.cover_letter.as_deref());
    Ok(Json(mapper.plan(&inputs)))
}

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Passcode;
use crate::otp_cache::VerifyError;
use crate::routes::error_chain_fmt;
use crate::startup::RegistrationCache;

#[derive(serde::Deserialize)]
pub struct ConfirmationData {
    email: String,
    passcode: String,
}

#[derive(serde::Serialize)]
pub struct ConfirmedRegistration {
    pub registration_id: Uuid,
    pub email: String,
    pub name: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(thiserror::Error)]
pub enum ConfirmError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Failed to confirm the registration.")]
    VerificationError(#[source] VerifyError),
}

impl std::fmt::Debug for ConfirmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ConfirmError {
    fn status_code(&self) -> StatusCode {
        match self {
            ConfirmError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ConfirmError::VerificationError(VerifyError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ConfirmError::VerificationError(VerifyError::Expired) => {
                StatusCode::GONE
            }
            ConfirmError::VerificationError(VerifyError::Mismatch) => {
                StatusCode::UNAUTHORIZED
            }
        }
    }
}

#[tracing::instrument(
    name = "Confirm a pending registration",
    skip(form, cache),
    fields(registrant_email = %form.email)
)]
pub async fn confirm_registration(
    form: web::Form<ConfirmationData>,
    cache: web::Data<RegistrationCache>,
) -> Result<HttpResponse, ConfirmError> {
    let ConfirmationData { email, passcode } = form.into_inner();
    let passcode =
        Passcode::parse(passcode).map_err(ConfirmError::ValidationError)?;

    let registrant = cache
        .verify(&email, passcode.as_secret())
        .map_err(|e| {
            tracing::warn!(error.message = %e, "Passcode verification failed");
            ConfirmError::VerificationError(e)
        })?;

    tracing::info!(
        registration_id = %registrant.registration_id,
        requested_at = %registrant.requested_at,
        "Registration confirmed"
    );
    Ok(HttpResponse::Ok().json(ConfirmedRegistration {
        registration_id: registrant.registration_id,
        email: registrant.email.as_ref().to_owned(),
        name: registrant.name.as_ref().to_owned(),
        requested_at: registrant.requested_at,
    }))
}

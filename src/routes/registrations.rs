use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use crate::configuration::OtpSettings;
use crate::domain::{NewRegistrant, Passcode, RegistrantEmail, RegistrantName};
use crate::email_client::EmailClient;
use crate::startup::RegistrationCache;

#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
    name: String,
}

impl TryFrom<FormData> for NewRegistrant {
    type Error = String;

    fn try_from(value: FormData) -> Result<Self, Self::Error> {
        let name = RegistrantName::parse(value.name)?;
        let email = RegistrantEmail::parse(value.email)?;
        Ok(Self {
            registration_id: Uuid::new_v4(),
            email,
            name,
            requested_at: Utc::now(),
        })
    }
}

#[derive(thiserror::Error)]
pub enum RegisterError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for RegisterError {
    fn status_code(&self) -> StatusCode {
        match self {
            RegisterError::ValidationError(_) => StatusCode::BAD_REQUEST,
            RegisterError::UnexpectedError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[tracing::instrument(
    name = "Registering a new account",
    skip(form, cache, email_client, otp_settings),
    fields(
        registrant_email = %form.email,
        registrant_name = %form.name
    )
)]
pub async fn register(
    form: web::Form<FormData>,
    cache: web::Data<RegistrationCache>,
    email_client: web::Data<EmailClient>,
    otp_settings: web::Data<OtpSettings>,
) -> Result<HttpResponse, RegisterError> {
    let new_registrant: NewRegistrant =
        form.0.try_into().map_err(RegisterError::ValidationError)?;
    let passcode = Passcode::generate(
        &mut rand::thread_rng(),
        otp_settings.passcode_length,
    );
    let email = PasscodeEmail::render(&passcode, otp_settings.ttl());

    let recipient = new_registrant.email.clone();
    tracing::info!(
        registration_id = %new_registrant.registration_id,
        "Holding registration until its passcode is confirmed"
    );
    // The entry has to exist before the registrant can read the email
    cache.save(recipient.as_ref(), passcode.into_secret(), new_registrant);

    email_client
        .send_email(&recipient, PasscodeEmail::SUBJECT, &email.html, &email.text)
        .await
        .context("Failed to send a registration passcode email.")?;
    Ok(HttpResponse::Ok().finish())
}

struct PasscodeEmail {
    html: String,
    text: String,
}

impl PasscodeEmail {
    const SUBJECT: &'static str = "Your registration passcode";

    fn render(passcode: &Passcode, valid_for: Duration) -> Self {
        let valid_for = describe_window(valid_for);
        let html = format!(
            "Welcome!<br />\
            Your registration passcode is <strong>{}</strong>.<br />\
            It expires in {}.",
            passcode.expose(),
            valid_for
        );
        let text = format!(
            "Welcome!\nYour registration passcode is {}.\nIt expires in {}.",
            passcode.expose(),
            valid_for
        );
        Self { html, text }
    }
}

fn describe_window(window: Duration) -> String {
    match window.as_secs() {
        60 => "1 minute".to_string(),
        s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{} seconds", s),
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

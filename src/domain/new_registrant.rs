use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::RegistrantEmail;
use crate::domain::RegistrantName;

/// Registration details held until the emailed passcode is confirmed.
#[derive(Debug, Clone, Serialize)]
pub struct NewRegistrant {
    pub registration_id: Uuid,
    pub email: RegistrantEmail,
    pub name: RegistrantName,
    pub requested_at: DateTime<Utc>,
}

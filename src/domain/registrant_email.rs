use serde::Serialize;
use validator::validate_email;

#[derive(Debug, Clone, Serialize)]
pub struct RegistrantEmail(String);

impl RegistrantEmail {
    pub fn parse(s: String) -> Result<RegistrantEmail, String> {
        if validate_email(&s) {
            Ok(Self(s))
        } else {
            Err(format!("{} is not a valid registrant email.", s))
        }
    }
}

impl AsRef<str> for RegistrantEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistrantEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

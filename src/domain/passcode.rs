use rand::Rng;
use secrecy::{ExposeSecret, Secret};

/// A one-time passcode. Compared literally, never logged.
#[derive(Debug)]
pub struct Passcode(Secret<String>);

impl Passcode {
    /// Draws `length` decimal digits, leading zeros included.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Self {
        let digits = (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(Secret::new(digits))
    }

    /// Accepts any non-blank input, kept exactly as supplied.
    pub fn parse(s: String) -> Result<Passcode, String> {
        if s.trim().is_empty() {
            Err("The passcode must not be blank.".to_string())
        } else {
            Ok(Self(Secret::new(s)))
        }
    }

    pub fn as_secret(&self) -> &Secret<String> {
        &self.0
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn into_secret(self) -> Secret<String> {
        self.0
    }
}

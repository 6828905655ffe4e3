use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

const MAX_GRAPHEMES: usize = 256;
const FORBIDDEN_CHARACTERS: [char; 9] =
    ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];

#[derive(Debug, Clone, Serialize)]
pub struct RegistrantName(String);

impl RegistrantName {
    /// Returns an instance of `RegistrantName` if the input satisfies all
    /// our validation constraints on registrant names, an error message
    /// otherwise.
    pub fn parse(s: String) -> Result<RegistrantName, String> {
        let is_empty_or_whitespace = s.trim().is_empty();

        // A grapheme is defined by the Unicode standard as a "user-perceived"
        // character: `å` is a single grapheme, but it is composed of two
        // characters (`a` and `̊`).
        let is_too_long = s.graphemes(true).count() > MAX_GRAPHEMES;

        let contains_forbidden_characters =
            s.chars().any(|g| FORBIDDEN_CHARACTERS.contains(&g));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_characters
        {
            Err(format!("{} is not a valid registrant name.", s))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for RegistrantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

mod new_registrant;
mod passcode;
mod registrant_email;
mod registrant_name;

pub use new_registrant::NewRegistrant;
pub use passcode::Passcode;
pub use registrant_email::RegistrantEmail;
pub use registrant_name::RegistrantName;

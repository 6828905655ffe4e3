mod health_check;
mod registrations;
mod registrations_confirm;

pub use health_check::*;
pub use registrations::*;
pub use registrations_confirm::*;

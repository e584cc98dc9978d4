mod organization;
mod user;

pub use organization::{Department, Filiale, OrgProfile, Role};
pub use user::User;

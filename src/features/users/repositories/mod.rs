mod organization_repository;
mod user_repository;

pub use organization_repository::{OrganizationRepository, PgOrganizationRepository};
pub use user_repository::{PgUserRepository, UserRepository};

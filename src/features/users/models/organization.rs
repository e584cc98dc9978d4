use sqlx::FromRow;
use uuid::Uuid;

/// Top-level organizational unit (subsidiary)
#[derive(Debug, Clone, FromRow)]
pub struct Filiale {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    /// The filiale whose IT department builds and supports the software
    pub is_software_provider: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub filiale_id: Option<Uuid>,
    pub is_it_department: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub filiale_id: Option<Uuid>,
}

/// Organizational placement of a user, resolved once per operation.
#[derive(Debug, Clone, Default)]
pub struct OrgProfile {
    pub user_id: Uuid,
    pub department_id: Option<Uuid>,
    pub filiale_id: Option<Uuid>,
    /// Member of the IT department of the software provider filiale
    pub is_provider_it: bool,
}

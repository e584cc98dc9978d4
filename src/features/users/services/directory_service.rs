use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{Department, OrgProfile, User};
use crate::features::users::repositories::{OrganizationRepository, UserRepository};

/// Resolves users and their place in the organization
pub struct DirectoryService {
    users: Arc<dyn UserRepository>,
    organization: Arc<dyn OrganizationRepository>,
}

impl DirectoryService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        organization: Arc<dyn OrganizationRepository>,
    ) -> Self {
        Self {
            users,
            organization,
        }
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        self.users.find_by_id(id).await
    }

    pub async fn require_user(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))
    }

    async fn department_of(&self, user: &User) -> Result<Option<Department>> {
        match user.department_id {
            Some(id) => self.organization.find_department(id).await,
            None => Ok(None),
        }
    }

    /// Filiale of a user: own, else role's, else department's (first match wins)
    pub async fn resolve_filiale(&self, user: &User) -> Result<Option<Uuid>> {
        if let Some(id) = user.filiale_id {
            return Ok(Some(id));
        }

        if let Some(role_id) = user.role_id {
            if let Some(filiale_id) = self
                .organization
                .find_role(role_id)
                .await?
                .and_then(|r| r.filiale_id)
            {
                return Ok(Some(filiale_id));
            }
        }

        Ok(self.department_of(user).await?.and_then(|d| d.filiale_id))
    }

    pub async fn profile(&self, user: &User) -> Result<OrgProfile> {
        let department = self.department_of(user).await?;
        let filiale_id = self.resolve_filiale(user).await?;

        let is_provider_it = match &department {
            Some(dept) if dept.is_it_department => {
                match self.organization.find_software_provider().await? {
                    Some(provider) => dept.filiale_id == Some(provider.id),
                    None => false,
                }
            }
            _ => false,
        };

        Ok(OrgProfile {
            user_id: user.id,
            department_id: department.map(|d| d.id),
            filiale_id,
            is_provider_it,
        })
    }

    /// Active IT staff of the software provider filiale
    pub async fn provider_it_users(&self) -> Result<Vec<User>> {
        match self.organization.find_software_provider().await? {
            Some(provider) => self.users.find_active_it_users(provider.id).await,
            None => {
                tracing::warn!("No software provider filiale configured");
                Ok(Vec::new())
            }
        }
    }

    pub async fn provider_it_user_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self
            .provider_it_users()
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryStore;

    #[tokio::test]
    async fn test_resolve_filiale_precedence() {
        let store = InMemoryStore::new();
        let org = store.seed_organization().await;
        let service = DirectoryService::new(store.clone(), store.clone());

        // Own filiale wins
        let mut user = store.add_user(Some(org.client_dept)).await;
        user.filiale_id = Some(org.provider);
        user.role_id = Some(org.client_role);
        assert_eq!(service.resolve_filiale(&user).await.unwrap(), Some(org.provider));

        // Then role
        user.filiale_id = None;
        assert_eq!(service.resolve_filiale(&user).await.unwrap(), Some(org.client));

        // Then department
        user.role_id = None;
        user.department_id = Some(org.it_dept);
        assert_eq!(service.resolve_filiale(&user).await.unwrap(), Some(org.provider));

        user.department_id = None;
        assert_eq!(service.resolve_filiale(&user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_provider_it_profile() {
        let store = InMemoryStore::new();
        let org = store.seed_organization().await;
        let service = DirectoryService::new(store.clone(), store.clone());

        let it = store.add_user(Some(org.it_dept)).await;
        let support = store.add_user(Some(org.support_dept)).await;
        let client = store.add_user(Some(org.client_dept)).await;

        assert!(service.profile(&it).await.unwrap().is_provider_it);
        assert!(!service.profile(&support).await.unwrap().is_provider_it);
        assert!(!service.profile(&client).await.unwrap().is_provider_it);

        let ids = service.provider_it_user_ids().await.unwrap();
        assert_eq!(ids, vec![it.id]);
    }

    #[tokio::test]
    async fn test_require_user_not_found() {
        let store = InMemoryStore::new();
        let service = DirectoryService::new(store.clone(), store.clone());
        assert!(matches!(
            service.require_user(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}

use crate::domain::directory;
use crate::domain::models::{EmployeeProfile, UserRole};
use crate::error::{AppError, AppResult};
use crate::store::DirectoryStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn DirectoryStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    pub async fn find_profile_by_email(&self, email: &str) -> AppResult<EmployeeProfile> {
        self.store
            .find_profile_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("employee profile"))
    }

    pub async fn list_profiles(&self, query: Option<&str>) -> AppResult<Vec<EmployeeProfile>> {
        let profiles = self.store.list_profiles().await?;
        Ok(directory::search(profiles, query))
    }

    /// Name to show for the caller. A missing profile falls back to the role
    /// placeholder; any other failure is still an error.
    pub async fn display_label(&self, email: &str, role: UserRole) -> AppResult<String> {
        match self.find_profile_by_email(email).await {
            Ok(profile) => Ok(directory::display_label(Some(&profile), role)),
            Err(AppError::NotFound(_)) => Ok(directory::display_label(None, role)),
            Err(e) => Err(e),
        }
    }

    pub async fn assigner_name(&self, email: &str) -> AppResult<String> {
        let profile = self.store.find_profile_by_email(email).await?;
        Ok(directory::assigner_name(profile.as_ref(), email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    async fn service_with(profiles: &[(&str, &str, i64)]) -> DirectoryService {
        let store = Arc::new(MemoryStore::new());
        for (email, name, employee_id) in profiles {
            store
                .upsert_profile(&EmployeeProfile {
                    id: Uuid::new_v4(),
                    employee_email: email.to_string(),
                    employee_id: *employee_id,
                    name: name.to_string(),
                    designation: "Technician".to_string(),
                })
                .await
                .unwrap();
        }
        DirectoryService::new(store)
    }

    #[tokio::test]
    async fn test_unknown_email_is_not_found() {
        let svc = service_with(&[("ali@berc.org", "Ali", 7)]).await;
        for email in ["ghost@berc.org", "", "ali@berc.or"] {
            assert!(matches!(
                svc.find_profile_by_email(email).await,
                Err(AppError::NotFound(_))
            ));
        }
        let found = svc.find_profile_by_email("ALI@berc.org").await.unwrap();
        assert_eq!(found.employee_id, 7);
    }

    #[tokio::test]
    async fn test_label_falls_back_explicitly() {
        let svc = service_with(&[("ali@berc.org", "Ali", 7)]).await;
        assert_eq!(svc.display_label("ali@berc.org", UserRole::Employee).await.unwrap(), "Ali");
        assert_eq!(svc.display_label("boss@berc.org", UserRole::Admin).await.unwrap(), "Admin");
    }

    #[tokio::test]
    async fn test_list_profiles_sorted_by_employee_id() {
        let svc = service_with(&[
            ("sara@berc.org", "Sara", 3),
            ("ali@berc.org", "Ali", 1),
            ("alina@berc.org", "Alina", 2),
        ])
        .await;
        let names: Vec<String> = svc
            .list_profiles(Some("ali"))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Ali", "Alina"]);
        assert_eq!(svc.list_profiles(None).await.unwrap().len(), 3);
    }
}

use crate::domain::models::{EmployeeProfile, UserRole};

/// Case-insensitive substring search on name, ordered by employee id.
pub fn search(profiles: Vec<EmployeeProfile>, query: Option<&str>) -> Vec<EmployeeProfile> {
    let needle = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
    let mut hits: Vec<EmployeeProfile> = profiles
        .into_iter()
        .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
        .collect();
    hits.sort_by_key(|p| p.employee_id);
    hits
}

/// Profile name when one exists, otherwise the role placeholder.
pub fn display_label(profile: Option<&EmployeeProfile>, role: UserRole) -> String {
    match profile {
        Some(p) => p.name.clone(),
        None => role.placeholder_label().to_string(),
    }
}

/// Name recorded as `assigned_by` on a new task.
pub fn assigner_name(profile: Option<&EmployeeProfile>, email: &str) -> String {
    if let Some(p) = profile {
        if !p.name.trim().is_empty() {
            return p.name.trim().to_string();
        }
    }
    match email.split('@').next().map(str::trim) {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(employee_id: i64, name: &str) -> EmployeeProfile {
        EmployeeProfile {
            id: Uuid::new_v4(),
            employee_email: format!("{}@berc.org", name.to_lowercase()),
            employee_id,
            name: name.to_string(),
            designation: "Engineer".to_string(),
        }
    }

    #[test]
    fn test_search_sorts_and_filters() {
        let profiles = vec![profile(30, "Sara Khan"), profile(10, "Ali Raza"), profile(20, "Alina")];
        let all: Vec<i64> = search(profiles.clone(), None).iter().map(|p| p.employee_id).collect();
        assert_eq!(all, vec![10, 20, 30]);

        let ali: Vec<String> = search(profiles, Some("  ALI ")).into_iter().map(|p| p.name).collect();
        assert_eq!(ali, vec!["Ali Raza", "Alina"]);
    }

    #[test]
    fn test_display_label_fallback() {
        assert_eq!(display_label(None, UserRole::Admin), "Admin");
        assert_eq!(display_label(None, UserRole::Employee), "Employee");
        let p = profile(1, "Ali");
        assert_eq!(display_label(Some(&p), UserRole::Admin), "Ali");
    }

    #[test]
    fn test_assigner_name_fallbacks() {
        let p = profile(1, "Sara");
        assert_eq!(assigner_name(Some(&p), "boss@berc.org"), "Sara");
        assert_eq!(assigner_name(None, "boss@berc.org"), "boss");
        assert_eq!(assigner_name(None, "@berc.org"), "Unknown");
        assert_eq!(assigner_name(None, ""), "Unknown");
    }
}

/// User directory: read-only lookups over a snapshot of all known users
///
/// The core never fetches users itself. The host application hands it a
/// [`Directory`] (typically a [`UserDirectory`] built from whatever its user
/// store returned) and every decision is computed over that snapshot.
///
/// # Boundary Normalization
///
/// External stores are inconsistent: some rows carry `_id` instead of `id`,
/// older clients wrote `team_member` instead of `member`, and unselected
/// links arrive as empty strings. [`UserRecord`] accepts all of these and
/// [`UserRecord::normalize`] turns a record into a canonical [`User`]. This is
/// the only place where role aliases are recognized.
///
/// # Example
///
/// ```
/// use teamtask_shared::directory::{Directory, UserDirectory, UserRecord};
/// use teamtask_shared::models::Role;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let records: Vec<UserRecord> = serde_json::from_str(r#"[
///     {"_id": "m1", "name": "Mia", "email": "mia@example.com", "role": "manager", "status": "active"},
///     {"id": "x1", "name": "Xan", "email": "xan@example.com", "role": "team_member",
///      "status": "active", "supervisorId": "s1", "managerId": "m1"}
/// ]"#)?;
///
/// let directory = UserDirectory::from_records(records)?;
/// assert_eq!(directory.get_user_by_id("x1")?.role, Role::Member);
/// assert!(directory.find_by_email("MIA@example.com").is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::role::Role;
use crate::models::user::{normalize_email, User, UserStatus};

/// Error type for directory lookups and maintenance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// No user with this id
    #[error("User not found: {0}")]
    NotFound(String),

    /// The user's supervisor link points at a user that no longer exists
    #[error("Supervisor not found: {supervisor_id} (referenced by {user_id})")]
    SupervisorNotFound { user_id: String, supervisor_id: String },

    /// The user's manager link points at a user that no longer exists
    #[error("Manager not found: {manager_id} (referenced by {user_id})")]
    ManagerNotFound { user_id: String, manager_id: String },

    /// Another user already has this id
    #[error("Duplicate user id: {0}")]
    DuplicateId(String),

    /// Another user already has this email (case-insensitive)
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// A record arrived without any id
    #[error("User record has no id")]
    MissingId,

    /// A record's role label matches no known role or legacy alias
    #[error("Unknown role label: {0}")]
    UnknownRoleLabel(String),
}

/// Read interface over a snapshot of users
///
/// Id lookups are case-sensitive; email lookups are case-insensitive.
/// Listings are ordered by name (case-insensitive, ties broken by id).
pub trait Directory {
    /// Looks up a user by id
    fn get_user_by_id(&self, id: &str) -> Result<&User, DirectoryError>;

    /// Lists every user holding `role`, in any status
    fn list_by_role(&self, role: Role) -> Vec<&User>;

    /// Lists every active user
    fn list_active(&self) -> Vec<&User>;

    /// Looks up a user by email, ignoring case
    fn find_by_email(&self, email: &str) -> Option<&User>;

    /// Resolves the user's supervisor link
    ///
    /// `Ok(None)` when the user has no supervisor link, an error when the
    /// link is dangling.
    fn supervisor_of(&self, user: &User) -> Result<Option<&User>, DirectoryError> {
        match user.supervisor_id.as_deref() {
            None => Ok(None),
            Some(id) => self.get_user_by_id(id).map(Some).map_err(|_| {
                tracing::warn!(user_id = %user.id, supervisor_id = %id, "Dangling supervisor link");
                DirectoryError::SupervisorNotFound {
                    user_id: user.id.clone(),
                    supervisor_id: id.to_string(),
                }
            }),
        }
    }

    /// Resolves the user's manager link
    ///
    /// `Ok(None)` when the user has no manager link, an error when the link
    /// is dangling.
    fn manager_of(&self, user: &User) -> Result<Option<&User>, DirectoryError> {
        match user.manager_id.as_deref() {
            None => Ok(None),
            Some(id) => self.get_user_by_id(id).map(Some).map_err(|_| {
                tracing::warn!(user_id = %user.id, manager_id = %id, "Dangling manager link");
                DirectoryError::ManagerNotFound {
                    user_id: user.id.clone(),
                    manager_id: id.to_string(),
                }
            }),
        }
    }
}

/// Sorts users by name (case-insensitive), then by id
pub fn sort_by_name(users: &mut [&User]) {
    users.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// In-memory directory keyed by user id, with an email index
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, User>,

    /// Normalized email -> user id
    emails: HashMap<String, String>,
}

impl UserDirectory {
    /// Creates an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory from canonical users
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` or `DuplicateEmail` if two users collide.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Result<Self, DirectoryError> {
        let mut directory = Self::new();
        for user in users {
            directory.insert(user)?;
        }
        Ok(directory)
    }

    /// Builds a directory from raw store records, normalizing each one
    pub fn from_records(records: impl IntoIterator<Item = UserRecord>) -> Result<Self, DirectoryError> {
        let users = records
            .into_iter()
            .map(UserRecord::normalize)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_users(users)
    }

    /// Adds a user that must not exist yet
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the id is taken, `DuplicateEmail` if another
    /// user has the same email ignoring case.
    pub fn insert(&mut self, user: User) -> Result<(), DirectoryError> {
        if self.users.contains_key(&user.id) {
            return Err(DirectoryError::DuplicateId(user.id));
        }
        let key = user.email_key();
        if self.emails.contains_key(&key) {
            return Err(DirectoryError::DuplicateEmail(user.email));
        }
        self.emails.insert(key, user.id.clone());
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Replaces an existing user (matched by id)
    ///
    /// Returns the previous version.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no user has this id, `DuplicateEmail` if the new
    /// email belongs to someone else.
    pub fn replace(&mut self, user: User) -> Result<User, DirectoryError> {
        let previous_key = match self.users.get(&user.id) {
            Some(existing) => existing.email_key(),
            None => return Err(DirectoryError::NotFound(user.id)),
        };

        let key = user.email_key();
        if let Some(owner) = self.emails.get(&key) {
            if owner != &user.id {
                return Err(DirectoryError::DuplicateEmail(user.email));
            }
        }

        self.emails.remove(&previous_key);
        self.emails.insert(key, user.id.clone());
        let id = user.id.clone();
        self.users
            .insert(id.clone(), user)
            .ok_or(DirectoryError::NotFound(id))
    }

    /// Removes a user
    ///
    /// Links held by other users are left in place and will resolve as not
    /// found afterwards.
    pub fn remove(&mut self, id: &str) -> Option<User> {
        let user = self.users.remove(id)?;
        self.emails.remove(&user.email_key());
        Some(user)
    }

    /// Lists every user, ordered by name
    pub fn list_all(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        sort_by_name(&mut users);
        users
    }

    /// Lists users in the given status, ordered by name
    pub fn list_by_status(&self, status: UserStatus) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().filter(|u| u.status == status).collect();
        sort_by_name(&mut users);
        users
    }

    /// Number of users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Directory for UserDirectory {
    fn get_user_by_id(&self, id: &str) -> Result<&User, DirectoryError> {
        self.users
            .get(id)
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }

    fn list_by_role(&self, role: Role) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().filter(|u| u.role == role).collect();
        sort_by_name(&mut users);
        users
    }

    fn list_active(&self) -> Vec<&User> {
        self.list_by_status(UserStatus::Active)
    }

    fn find_by_email(&self, email: &str) -> Option<&User> {
        self.emails
            .get(&normalize_email(email))
            .and_then(|id| self.users.get(id))
    }
}

/// Loose user shape as returned by external user stores
///
/// Accepts both `id` and `_id`, camelCase or snake_case link names, role
/// labels including legacy aliases, and empty strings for absent links.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, rename = "_id")]
    pub legacy_id: Option<String>,

    pub name: String,

    pub email: String,

    pub role: String,

    pub status: UserStatus,

    #[serde(default, alias = "supervisorId")]
    pub supervisor_id: Option<String>,

    #[serde(default, alias = "managerId")]
    pub manager_id: Option<String>,

    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Converts the record into a canonical [`User`]
    ///
    /// # Errors
    ///
    /// Returns `MissingId` if neither `id` nor `_id` is present and
    /// `UnknownRoleLabel` if the role label is not recognized.
    pub fn normalize(self) -> Result<User, DirectoryError> {
        let id = non_blank(self.id)
            .or_else(|| non_blank(self.legacy_id))
            .ok_or(DirectoryError::MissingId)?;
        let role = normalize_role_label(&self.role)
            .ok_or_else(|| DirectoryError::UnknownRoleLabel(self.role.clone()))?;

        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let updated_at = self.updated_at.unwrap_or(created_at);

        Ok(User {
            id,
            name: self.name,
            email: self.email,
            role,
            status: self.status,
            supervisor_id: non_blank(self.supervisor_id),
            manager_id: non_blank(self.manager_id),
            created_at,
            updated_at,
        })
    }
}

/// Maps canonical and legacy role labels onto [`Role`]
pub fn normalize_role_label(label: &str) -> Option<Role> {
    let label = label.trim().to_lowercase().replace('-', "_");
    match label.as_str() {
        "member" | "team_member" | "teammember" => Some(Role::Member),
        "supervisor" => Some(Role::Supervisor),
        "manager" => Some(Role::Manager),
        "super_admin" | "superadmin" | "admin" => Some(Role::SuperAdmin),
        _ => None,
    }
}

/// Treats blank strings as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str, role: Role, status: UserStatus) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            role,
            status,
            supervisor_id: None,
            manager_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> UserDirectory {
        UserDirectory::from_users(vec![
            user("m1", "Mia", Role::Manager, UserStatus::Active),
            user("s2", "bob", Role::Supervisor, UserStatus::Active),
            user("s1", "Alice", Role::Supervisor, UserStatus::Active),
            user("p1", "Pat", Role::Member, UserStatus::PendingApproval),
            user("x1", "Xan", Role::Member, UserStatus::Suspended),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_user_by_id_is_case_sensitive() {
        let directory = sample();
        assert_eq!(directory.get_user_by_id("m1").unwrap().name, "Mia");
        assert_eq!(
            directory.get_user_by_id("M1"),
            Err(DirectoryError::NotFound("M1".to_string()))
        );
    }

    #[test]
    fn test_list_by_role_is_ordered_by_name() {
        let directory = sample();
        let names: Vec<&str> = directory
            .list_by_role(Role::Supervisor)
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice", "bob"]);

        // Restartable: a second call yields the same sequence
        let again: Vec<&str> = directory
            .list_by_role(Role::Supervisor)
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(names, again);
    }

    #[test]
    fn test_list_active_excludes_pending_and_suspended() {
        let directory = sample();
        let ids: Vec<&str> = directory.list_active().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "m1"]);
    }

    #[test]
    fn test_find_by_email_ignores_case() {
        let directory = sample();
        assert_eq!(directory.find_by_email("M1@Example.COM").unwrap().id, "m1");
        assert!(directory.find_by_email("nobody@example.com").is_none());
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut directory = sample();

        let err = directory
            .insert(user("m1", "Other", Role::Manager, UserStatus::Active))
            .unwrap_err();
        assert_eq!(err, DirectoryError::DuplicateId("m1".to_string()));

        let mut clash = user("m9", "Other", Role::Manager, UserStatus::Active);
        clash.email = "M1@EXAMPLE.COM".to_string();
        assert!(matches!(directory.insert(clash), Err(DirectoryError::DuplicateEmail(_))));
    }

    #[test]
    fn test_replace_keeps_email_index_current() {
        let mut directory = sample();
        let mut updated = directory.get_user_by_id("s1").unwrap().clone();
        updated.email = "alice@corp.example".to_string();

        let previous = directory.replace(updated).unwrap();
        assert_eq!(previous.email, "s1@example.com");
        assert!(directory.find_by_email("s1@example.com").is_none());
        assert_eq!(directory.find_by_email("ALICE@corp.example").unwrap().id, "s1");

        let ghost = user("zz", "Ghost", Role::Member, UserStatus::Active);
        assert!(matches!(directory.replace(ghost), Err(DirectoryError::NotFound(_))));
    }

    #[test]
    fn test_remove_leaves_dangling_links() {
        let mut member = user("x2", "Xena", Role::Member, UserStatus::Active);
        member.supervisor_id = Some("s1".to_string());
        member.manager_id = Some("m1".to_string());

        let mut directory = sample();
        directory.insert(member).unwrap();

        assert!(directory.remove("s1").is_some());

        // The member survives; its link now resolves as not found
        let member = directory.get_user_by_id("x2").unwrap();
        assert_eq!(member.supervisor_id.as_deref(), Some("s1"));
        assert_eq!(
            directory.supervisor_of(member),
            Err(DirectoryError::SupervisorNotFound {
                user_id: "x2".to_string(),
                supervisor_id: "s1".to_string(),
            })
        );
        assert_eq!(directory.manager_of(member).unwrap().unwrap().id, "m1");
    }

    #[test]
    fn test_link_resolution_without_links() {
        let directory = sample();
        let manager = directory.get_user_by_id("m1").unwrap();
        assert_eq!(directory.supervisor_of(manager), Ok(None));
        assert_eq!(directory.manager_of(manager), Ok(None));
    }

    #[test]
    fn test_normalize_role_label() {
        assert_eq!(normalize_role_label("team_member"), Some(Role::Member));
        assert_eq!(normalize_role_label("Member"), Some(Role::Member));
        assert_eq!(normalize_role_label("super-admin"), Some(Role::SuperAdmin));
        assert_eq!(normalize_role_label("superadmin"), Some(Role::SuperAdmin));
        assert_eq!(normalize_role_label("manager"), Some(Role::Manager));
        assert_eq!(normalize_role_label("intern"), None);
    }

    #[test]
    fn test_record_normalization() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "_id": "x1",
            "name": "Xan",
            "email": "xan@example.com",
            "role": "team_member",
            "status": "active",
            "supervisorId": "s1",
            "managerId": ""
        }))
        .unwrap();

        let user = record.normalize().unwrap();
        assert_eq!(user.id, "x1");
        assert_eq!(user.role, Role::Member);
        assert_eq!(user.supervisor_id.as_deref(), Some("s1"));
        assert!(user.manager_id.is_none());
    }

    #[test]
    fn test_record_prefers_id_over_legacy_id() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "id": "new",
            "_id": "old",
            "name": "N",
            "email": "n@example.com",
            "role": "manager",
            "status": "active"
        }))
        .unwrap();
        assert_eq!(record.normalize().unwrap().id, "new");
    }

    #[test]
    fn test_record_rejects_unknown_role_and_missing_id() {
        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "U",
            "email": "u@example.com",
            "role": "intern",
            "status": "active"
        }))
        .unwrap();
        assert_eq!(
            record.normalize(),
            Err(DirectoryError::UnknownRoleLabel("intern".to_string()))
        );

        let record: UserRecord = serde_json::from_value(serde_json::json!({
            "name": "U",
            "email": "u@example.com",
            "role": "member",
            "status": "active"
        }))
        .unwrap();
        assert_eq!(record.normalize(), Err(DirectoryError::MissingId));
    }
}

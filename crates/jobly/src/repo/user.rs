use super::{FieldKind, FieldRule, PasswordHasher, check_payload};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::update::{FieldMap, UpdatePayload, build_set_clause};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const COLUMNS: &str = "username, first_name, last_name, email, is_admin";

const FIELDS: FieldMap = FieldMap::new(&[("firstName", "first_name"), ("lastName", "last_name")]);

/// Self-service fields. `isAdmin` is only changed through [`User::set_admin`].
const UPDATABLE: &[FieldRule] = &[
    FieldRule::new("firstName", FieldKind::Text),
    FieldRule::new("lastName", FieldKind::Text),
    FieldRule::new("password", FieldKind::Text),
    FieldRule::new("email", FieldKind::Text),
];

/// A user as exposed to callers. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// A user with the ids of the jobs they applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub applications: Vec<i32>,
}

impl FromRow for User {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            username: row.try_get_column("username")?,
            first_name: row.try_get_column("first_name")?,
            last_name: row.try_get_column("last_name")?,
            email: row.try_get_column("email")?,
            is_admin: row.try_get_column("is_admin")?,
        })
    }
}

fn invalid_credentials() -> JoblyError {
    JoblyError::Unauthenticated("invalid username/password".to_string())
}

impl User {
    /// Create a user with a hashed password. A taken username is a conflict.
    pub async fn register(
        conn: &impl GenericClient,
        new_user: &NewUser,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<User> {
        let hashed = hasher.hash(&new_user.password)?;
        query(format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT DO NOTHING RETURNING {COLUMNS}"
        ))
        .tag("users.register")
        .bind(new_user.username.clone())
        .bind(hashed)
        .bind(new_user.first_name.clone())
        .bind(new_user.last_name.clone())
        .bind(new_user.email.clone())
        .bind(new_user.is_admin)
        .fetch_opt_as(conn)
        .await?
        .ok_or_else(|| JoblyError::conflict(format!("duplicate username: {}", new_user.username)))
    }

    /// Check a username/password pair.
    ///
    /// An unknown user and a wrong password fail the same way.
    pub async fn authenticate(
        conn: &impl GenericClient,
        username: &str,
        password: &str,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<User> {
        let row = query(format!("SELECT {COLUMNS}, password FROM users WHERE username = $1"))
            .tag("users.authenticate")
            .bind(username.to_string())
            .fetch_opt(conn)
            .await?
            .ok_or_else(invalid_credentials)?;

        let hashed: String = row.try_get_column("password")?;
        if !hasher.verify(password, &hashed)? {
            return Err(invalid_credentials());
        }
        User::from_row(&row)
    }

    pub async fn find_all(conn: &impl GenericClient) -> JoblyResult<Vec<User>> {
        query(format!("SELECT {COLUMNS} FROM users ORDER BY username"))
            .tag("users.find_all")
            .fetch_all_as(conn)
            .await
    }

    pub async fn get(conn: &impl GenericClient, username: &str) -> JoblyResult<UserDetail> {
        let user: User = query(format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
            .tag("users.get")
            .bind(username.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("no user: {username}")))?;

        let applications = query("SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id")
            .tag("users.get.applications")
            .bind(username.to_string())
            .fetch_all(conn)
            .await?
            .iter()
            .map(|row| row.try_get_column::<i32>("job_id"))
            .collect::<JoblyResult<Vec<_>>>()?;

        Ok(UserDetail { user, applications })
    }

    /// Apply a partial update. A new password is hashed before it is stored.
    pub async fn update(
        conn: &impl GenericClient,
        username: &str,
        mut payload: UpdatePayload,
        hasher: &impl PasswordHasher,
    ) -> JoblyResult<User> {
        check_payload(&payload, UPDATABLE, "user")?;
        if let Some(Value::Text(password)) = payload.get_mut("password") {
            *password = hasher.hash(password)?;
        }
        let set = build_set_clause(payload, &FIELDS)?;
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {COLUMNS}",
            set.sql(),
            set.next_index()
        );
        query(sql)
            .tag("users.update")
            .bind_fragment(set)
            .bind(username.to_string())
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("no user: {username}")))
    }

    /// Grant or revoke admin rights. Callers gate this with `ENSURE_ADMIN`.
    pub async fn set_admin(
        conn: &impl GenericClient,
        username: &str,
        is_admin: bool,
    ) -> JoblyResult<User> {
        query(format!(
            "UPDATE users SET is_admin = $1 WHERE username = $2 RETURNING {COLUMNS}"
        ))
        .tag("users.set_admin")
        .bind(is_admin)
        .bind(username.to_string())
        .fetch_opt_as(conn)
        .await?
        .ok_or_else(|| JoblyError::not_found(format!("no user: {username}")))
    }

    pub async fn remove(conn: &impl GenericClient, username: &str) -> JoblyResult<()> {
        query("DELETE FROM users WHERE username = $1 RETURNING username")
            .tag("users.remove")
            .bind(username.to_string())
            .fetch_opt(conn)
            .await?
            .map(|_| ())
            .ok_or_else(|| JoblyError::not_found(format!("no user: {username}")))
    }

    /// Record an application. Applying twice is a no-op; an unknown user or
    /// job is `NotFound`.
    pub async fn apply_to_job(
        conn: &impl GenericClient,
        username: &str,
        job_id: i32,
    ) -> JoblyResult<()> {
        query(
            "INSERT INTO applications (username, job_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .tag("users.apply_to_job")
        .bind(username.to_string())
        .bind(job_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_defaults_to_non_admin() {
        let json = serde_json::json!({
            "username": "u1",
            "password": "pw",
            "firstName": "U",
            "lastName": "One",
            "email": "u1@example.com"
        });
        let new_user: NewUser = serde_json::from_value(json).unwrap();
        assert!(!new_user.is_admin);
        assert_eq!(new_user.first_name, "U");
    }

    #[test]
    fn detail_flattens_user_fields() {
        let detail = UserDetail {
            user: User {
                username: "u1".into(),
                first_name: "U".into(),
                last_name: "One".into(),
                email: "u1@example.com".into(),
                is_admin: false,
            },
            applications: vec![1, 3],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["isAdmin"], serde_json::json!(false));
        assert_eq!(json["applications"], serde_json::json!([1, 3]));
        assert!(json.get("password").is_none());
    }

    #[test]
    fn username_is_not_updatable() {
        let payload = UpdatePayload::new().with("username", "other");
        assert!(check_payload(&payload, UPDATABLE, "user").is_err());
    }

    #[test]
    fn admin_flag_is_not_self_updatable() {
        let payload = UpdatePayload::new().with("isAdmin", true);
        let err = check_payload(&payload, UPDATABLE, "user").unwrap_err();
        assert!(err.is_validation());
    }
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use stadium_shared::Masked;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    StadiumOwner,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::StadiumOwner => "stadium_owner",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "stadium_owner" => Ok(Role::StadiumOwner),
            "client" => Ok(Role::Client),
            other => Err(CoreError::ValidationError(format!(
                "\"{}\" is not a valid role.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: Masked<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// What the API shows about a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
    pub password: Masked<String>,
}

/// A user row that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: Masked<String>,
}

/// Server-side record backing a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn open(user_id: i64, ttl_seconds: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds as i64),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("stadium_owner".parse::<Role>().unwrap(), Role::StadiumOwner);
        assert_eq!(Role::Client.to_string(), "client");
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_session_expiry() {
        let session = Session::open(1, 60);
        assert!(!session.is_expired_at(Utc::now()));
        assert!(session.is_expired_at(Utc::now() + Duration::seconds(61)));
    }
}

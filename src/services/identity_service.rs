use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::User;
use crate::utils;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct IdentityService {
    pool: PgPool,
}

impl IdentityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Maps a verified claim set onto the local user record, provisioning
    /// one on first contact. Idempotent per email: a second resolution for
    /// the same address always returns the first-created user.
    pub async fn resolve(&self, claims: &Claims) -> Result<User> {
        let email = email_claim(claims).ok_or_else(|| {
            Error::Identity("No email claim present in the identity token".to_string())
        })?;

        if let Some(user) = self.find_active_by_email(email).await? {
            return Ok(user);
        }

        let (first_name, last_name) = resolve_names(claims);
        match self.insert_user(email, &first_name, &last_name).await {
            Ok(user) => {
                tracing::info!(%email, "Provisioned user from identity claims");
                Ok(user)
            }
            // Lost a concurrent first-contact race on the email unique
            // constraint; the winner's row is the canonical one.
            Err(Error::Conflict(_)) => self
                .find_active_by_email(email)
                .await?
                .ok_or_else(|| Error::Identity(format!("User {} is deactivated", email))),
            Err(other) => Err(other),
        }
    }

    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, time_zone, is_active, created_at, updated_at
            FROM users
            WHERE email = $1 AND is_active = TRUE
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, email: &str, first_name: &str, last_name: &str) -> Result<User> {
        let now = utils::time::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, first_name, last_name, time_zone, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'UTC', TRUE, $5, $5)
            RETURNING id, email, first_name, last_name, time_zone, is_active, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

/// Highest-precedence email-equivalent claim, B2C flavor first.
fn email_claim(claims: &Claims) -> Option<&str> {
    claims
        .email
        .as_deref()
        .or_else(|| claims.emails.as_ref().and_then(|e| e.first()).map(String::as_str))
        .or(claims.preferred_username.as_deref())
        .filter(|s| !s.is_empty())
}

/// Given/family name from explicit claims; missing pieces are split out of
/// the combined display name, and "Unknown"/"User" close the gap when no
/// name claim exists at all.
fn resolve_names(claims: &Claims) -> (String, String) {
    let mut given = claims.given_name.clone().filter(|s| !s.is_empty());
    let mut family = claims.family_name.clone().filter(|s| !s.is_empty());

    if given.is_none() {
        if let Some(name) = claims.name.as_deref().filter(|s| !s.trim().is_empty()) {
            let mut parts = name.split_whitespace();
            given = parts.next().map(str::to_string);
            if family.is_none() {
                family = Some(parts.collect::<Vec<_>>().join(" "));
            }
        }
    }

    (
        given.unwrap_or_else(|| "Unknown".to_string()),
        family.unwrap_or_else(|| "User".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        Claims {
            sub: Some("subject-1".to_string()),
            exp: 0,
            email: None,
            emails: None,
            preferred_username: None,
            name: None,
            given_name: None,
            family_name: None,
        }
    }

    #[test]
    fn email_precedence_prefers_email_then_emails_then_username() {
        let mut c = claims();
        c.email = Some("primary@x.com".to_string());
        c.emails = Some(vec!["list@x.com".to_string()]);
        c.preferred_username = Some("user@x.com".to_string());
        assert_eq!(email_claim(&c), Some("primary@x.com"));

        c.email = None;
        assert_eq!(email_claim(&c), Some("list@x.com"));

        c.emails = None;
        assert_eq!(email_claim(&c), Some("user@x.com"));

        c.preferred_username = None;
        assert_eq!(email_claim(&c), None);
    }

    #[test]
    fn empty_email_claim_does_not_resolve() {
        let mut c = claims();
        c.email = Some(String::new());
        assert_eq!(email_claim(&c), None);
    }

    #[test]
    fn explicit_name_claims_win() {
        let mut c = claims();
        c.given_name = Some("Jane".to_string());
        c.family_name = Some("Doe".to_string());
        c.name = Some("Somebody Else".to_string());
        assert_eq!(resolve_names(&c), ("Jane".to_string(), "Doe".to_string()));
    }

    #[test]
    fn display_name_is_split_on_whitespace() {
        let mut c = claims();
        c.name = Some("Jane Doe".to_string());
        assert_eq!(resolve_names(&c), ("Jane".to_string(), "Doe".to_string()));

        c.name = Some("Jane van der Berg".to_string());
        assert_eq!(
            resolve_names(&c),
            ("Jane".to_string(), "van der Berg".to_string())
        );
    }

    #[test]
    fn single_token_display_name_leaves_family_empty() {
        let mut c = claims();
        c.name = Some("Jane".to_string());
        assert_eq!(resolve_names(&c), ("Jane".to_string(), "".to_string()));
    }

    #[test]
    fn missing_names_fall_back_to_placeholders() {
        let c = claims();
        assert_eq!(
            resolve_names(&c),
            ("Unknown".to_string(), "User".to_string())
        );
    }
}

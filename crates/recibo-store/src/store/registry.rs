//! Registered-user lookup and identity validation.

use super::Store;
use crate::models::RegisteredUser;
use chrono::NaiveDate;
use recibo_core::error::ReciboError;
use thiserror::Error;
use tracing::warn;

/// Why an identity claim was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("national id not registered")]
    NotRegistered,
    #[error("issue date does not match")]
    DateMismatch,
}

impl Store {
    /// Find an active registered user by national id.
    pub async fn find_registered_user(
        &self,
        national_id: &str,
    ) -> Result<Option<RegisteredUser>, ReciboError> {
        let row: Option<(String, String, String, i64)> = sqlx::query_as(
            "SELECT national_id, name, issue_date, is_active
             FROM registered_users WHERE national_id = ? AND is_active = 1",
        )
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ReciboError::Store(format!("registry lookup failed: {e}")))?;

        let Some((national_id, name, issue_date, is_active)) = row else {
            return Ok(None);
        };

        let issue_date = match NaiveDate::parse_from_str(&issue_date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                warn!("registry row {national_id} has malformed issue_date: {e}");
                return Ok(None);
            }
        };

        Ok(Some(RegisteredUser {
            national_id,
            name,
            issue_date,
            is_active: is_active != 0,
        }))
    }

    /// Check a claimed (id, issue date) pair against the registry.
    ///
    /// The claimed date is accepted when it falls within one day of the
    /// stored date, absorbing off-by-one transcriptions from the physical
    /// document.
    pub async fn validate_identity(
        &self,
        national_id: &str,
        claimed_date: NaiveDate,
    ) -> Result<Result<RegisteredUser, IdentityError>, ReciboError> {
        let Some(user) = self.find_registered_user(national_id).await? else {
            return Ok(Err(IdentityError::NotRegistered));
        };

        let delta = (claimed_date - user.issue_date).num_days().abs();
        if delta > 1 {
            return Ok(Err(IdentityError::DateMismatch));
        }

        Ok(Ok(user))
    }

    /// Insert or replace a registry entry. Used by seeding and admin tooling.
    pub async fn upsert_registered_user(
        &self,
        national_id: &str,
        name: &str,
        issue_date: NaiveDate,
    ) -> Result<(), ReciboError> {
        sqlx::query(
            "INSERT INTO registered_users (national_id, name, issue_date, is_active)
             VALUES (?, ?, ?, 1)
             ON CONFLICT(national_id) DO UPDATE SET
                 name = excluded.name, issue_date = excluded.issue_date, is_active = 1",
        )
        .bind(national_id)
        .bind(name)
        .bind(issue_date.format("%Y-%m-%d").to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| ReciboError::Store(format!("registry upsert failed: {e}")))?;
        Ok(())
    }
}

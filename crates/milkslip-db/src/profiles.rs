use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use milkslip_core::{AppError, Profile, Role};

/// Profile repository.
///
/// One profile per account; profiles are auto-created on first sight of an
/// authenticated user id, defaulting to the Member role.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the profile for a user id, or None if it was never created.
    #[tracing::instrument(skip(self), fields(db.table = "profiles", db.operation = "select"))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<Postgres, Profile>(
            "SELECT id, email, display_name, role, created_at, updated_at
             FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Fetch the profile for a caller, failing if none exists.
    pub async fn require(&self, id: Uuid) -> Result<Profile, AppError> {
        self.get(id).await?.ok_or_else(|| {
            AppError::Unauthorized(format!("No profile exists for user {}", id))
        })
    }

    /// Create the profile for a newly signed-up user, or return the existing
    /// one. New profiles default to Member.
    #[tracing::instrument(skip(self), fields(db.table = "profiles", db.operation = "upsert"))]
    pub async fn ensure_profile(
        &self,
        id: Uuid,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<Profile, AppError> {
        let profile = sqlx::query_as::<Postgres, Profile>(
            "INSERT INTO profiles (id, email, display_name, role)
             VALUES ($1, $2, $3, 'member')
             ON CONFLICT (id) DO UPDATE SET updated_at = now()
             RETURNING id, email, display_name, role, created_at, updated_at",
        )
        .bind(id)
        .bind(email)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Change a profile's role. Only admins may reassign roles.
    #[tracing::instrument(skip(self), fields(db.table = "profiles", db.operation = "update"))]
    pub async fn set_role(
        &self,
        caller_id: Uuid,
        target_id: Uuid,
        role: Role,
    ) -> Result<Profile, AppError> {
        let caller = self.require(caller_id).await?;
        if !caller.role.can_mutate() {
            return Err(AppError::Unauthorized(
                "Only an admin may change roles".to_string(),
            ));
        }

        sqlx::query_as::<Postgres, Profile>(
            "UPDATE profiles SET role = $2, updated_at = now()
             WHERE id = $1
             RETURNING id, email, display_name, role, created_at, updated_at",
        )
        .bind(target_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", target_id)))
    }
}

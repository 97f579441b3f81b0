//! API models for stored entities, request payloads and response shapes

use sqlx::{Row, postgres::PgRow};

pub mod dashboard;
pub mod like;
pub mod playlist;
pub mod social;
pub mod subscription;
pub mod user;
pub mod video;

pub use user::UserSummary;

/// Read the joined `owner_id`, `owner_username`, `owner_avatar` columns
pub(crate) fn owner_summary(row: &PgRow) -> Result<UserSummary, sqlx::Error> {
    Ok(UserSummary {
        id: row.try_get("owner_id")?,
        username: row.try_get("owner_username")?,
        avatar: row.try_get("owner_avatar")?,
    })
}

//! Fixtures shared by handler and repository tests

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Request},
};
use chrono::Utc;
use common::database::{DatabaseConfig, init_pool, run_migrations};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::{AuthUser, jwt},
    models::{
        user::{ImageRef, NewUser, PublicUser, User},
        video::{MediaRef, NewVideo, Video},
    },
    repositories::{UserRepository, VideoRepository},
};

const BOUNDARY: &str = "X-BOUNDARY";

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Multipart body made of text fields only
pub fn multipart_body(fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

pub async fn multipart(fields: &[(&str, &str)]) -> Multipart {
    let request = Request::builder()
        .method("POST")
        .header("content-type", multipart_content_type())
        .body(Body::from(multipart_body(fields)))
        .unwrap();

    Multipart::from_request(request, &()).await.unwrap()
}

/// Signed-in user that only exists in memory
pub fn actor() -> AuthUser {
    AuthUser {
        user: PublicUser {
            id: Uuid::new_v4(),
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            avatar: "https://cdn.example.test/a.png".to_string(),
            cover_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
        access_token: "token".to_string(),
        expires_at: jwt::now() + 3600,
    }
}

/// Pool on `DATABASE_URL` with the schema migrated
pub async fn live_pool() -> PgPool {
    let config = DatabaseConfig::from_env().unwrap();
    let pool = init_pool(&config).await.unwrap();
    run_migrations(&pool, &crate::MIGRATOR).await.unwrap();
    pool
}

fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Insert a user with a fresh username and email
pub async fn seed_user(pool: &PgPool) -> User {
    let tag = tag();
    UserRepository::new(pool.clone())
        .create(&NewUser {
            username: format!("user_{}", tag),
            email: format!("{}@example.test", tag),
            full_name: "Test User".to_string(),
            password_hash: "unused".to_string(),
            avatar: ImageRef {
                url: format!("https://cdn.example.test/{}.png", tag),
                public_id: format!("uploads/{}.png", tag),
            },
            cover_image: None,
        })
        .await
        .unwrap()
}

/// Insert a published video owned by `owner_id`
pub async fn seed_video(pool: &PgPool, owner_id: Uuid, title: &str) -> Video {
    let tag = tag();
    VideoRepository::new(pool.clone())
        .create(&NewVideo {
            title: title.to_string(),
            description: "test video".to_string(),
            video_file: MediaRef {
                url: format!("https://cdn.example.test/{}.mp4", tag),
                public_id: format!("uploads/{}.mp4", tag),
            },
            thumbnail: None,
            duration: 12.5,
            owner_id,
        })
        .await
        .unwrap()
}

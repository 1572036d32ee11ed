// handlers/public/auth/mod.rs - Public authentication handlers
//
// Both endpoints answer with the account plus a freshly issued bearer token.

use serde::Serialize;
use uuid::Uuid;

use crate::database::models::User;

pub mod login; // POST /api/auth/login
pub mod register; // POST /api/auth/register

pub use login::login_post;
pub use register::register_post;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub token: String,
}

impl AuthResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            token,
        }
    }
}

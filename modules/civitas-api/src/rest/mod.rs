pub mod admin;
pub mod complaints;
pub mod zones;

use serde::Serialize;

use civitas_common::DirectoryUser;

/// Directory reference resolved for display, without the role field.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
}

impl From<DirectoryUser> for PublicUser {
    fn from(user: DirectoryUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Physical location ("sede"), the primary tenancy unit. The site row is the
/// single source of truth for its franchise tag; a site belongs to at most
/// one franchise at a time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Site {
    pub id: Uuid,
    pub sede_id: String,
    pub nombre: String,
    pub pais: String,
    pub franquicia_id: Option<String>,
}

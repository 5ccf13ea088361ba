use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Staff account. `franquicia_id` is a denormalized copy of the bound site's
/// franchise tag; its only writer is the membership propagator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    pub rol: String,
    pub sede_id: Option<String>,
    pub franquicia_id: Option<String>,
}

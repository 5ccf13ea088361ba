use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Top-level tenant grouping. Owns the site-membership list (`sedes`); the
/// propagator keeps the denormalized tags on sites and accounts in sync with
/// this array.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Franchise {
    pub id: Uuid,
    pub franquicia_id: String,
    pub nombre: String,
    pub sedes: Vec<String>,
    pub creado_por: String,
    pub fecha_creacion: NaiveDateTime,
    pub modificado_por: Option<String>,
    pub fecha_modificacion: Option<NaiveDateTime>,
}

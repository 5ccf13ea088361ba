use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only client note (text, author, timestamp)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientNote {
    pub texto: String,
    pub autor: String,
    pub fecha: NaiveDateTime,
}

/// Salon client. `franquicia_id` is inherited from the owning site once at
/// creation time and deliberately never re-derived if the site later moves to
/// another franchise (historical attribution).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub cliente_id: String,
    pub nombre: String,
    pub correo: Option<String>,
    pub telefono: Option<String>,
    pub sede_id: String,
    pub franquicia_id: Option<String>,
    pub pais: String,
    pub notas_historial: Json<Vec<ClientNote>>,
    pub creado_por: String,
    pub fecha_creacion: NaiveDateTime,
    pub modificado_por: Option<String>,
    pub fecha_modificacion: Option<NaiveDateTime>,
}

/// Projection returned by the paginated listing; keeps payloads small for
/// lazy-loading clients in the UI.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientSummary {
    pub id: Uuid,
    pub cliente_id: String,
    pub nombre: String,
    pub correo: Option<String>,
    pub telefono: Option<String>,
    pub sede_id: String,
    pub franquicia_id: Option<String>,
}

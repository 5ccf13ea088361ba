use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Visibility classification of a catalog service, derived from its two
/// optional scope tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alcance {
    /// Both tags null: visible to everyone
    Global,
    /// Franchise tag set, site tag null: visible to the whole franchise
    Franquicia,
    /// Site tag set (franchise tag irrelevant): visible only to that site
    Local,
}

impl Alcance {
    pub fn classify(sede_id: Option<&str>, franquicia_id: Option<&str>) -> Alcance {
        match (sede_id, franquicia_id) {
            (Some(_), _) => Alcance::Local,
            (None, Some(_)) => Alcance::Franquicia,
            (None, None) => Alcance::Global,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Alcance::Global => "global",
            Alcance::Franquicia => "franquicia",
            Alcance::Local => "local",
        }
    }
}

/// Catalog service offered at one or more sites. Soft-deletable: `activo` is
/// flipped to false and the row retained with the deletion actor/timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CatalogItem {
    pub id: Uuid,
    pub servicio_id: String,
    pub nombre: String,
    pub categoria: Option<String>,
    /// Per-currency price map, document-shaped
    pub precios: Json<Value>,
    pub duracion_minutos: i32,
    pub sede_id: Option<String>,
    pub franquicia_id: Option<String>,
    pub activo: bool,
    pub creado_por: String,
    pub created_at: NaiveDateTime,
    pub updated_by: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
}

impl CatalogItem {
    pub fn alcance(&self) -> Alcance {
        Alcance::classify(self.sede_id.as_deref(), self.franquicia_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_tags_absent_is_global() {
        assert_eq!(Alcance::classify(None, None), Alcance::Global);
    }

    #[test]
    fn franchise_tag_alone_is_franquicia() {
        assert_eq!(Alcance::classify(None, Some("FR-1")), Alcance::Franquicia);
    }

    #[test]
    fn site_tag_wins_regardless_of_franchise_tag() {
        assert_eq!(Alcance::classify(Some("SD-1"), None), Alcance::Local);
        assert_eq!(Alcance::classify(Some("SD-1"), Some("FR-1")), Alcance::Local);
    }
}

//! Human-readable entity identifiers.
//!
//! IDs look like `SV-000042`: a fixed per-entity prefix plus a zero-padded
//! counter drawn from the `contadores` table in one atomic upsert. Format
//! validation is a pure pattern check; it says nothing about existence.

use sqlx::PgPool;

/// Entity kinds that receive generated identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Franquicia,
    Sede,
    Cliente,
    Servicio,
    Venta,
    Comision,
}

impl Entity {
    pub fn prefix(&self) -> &'static str {
        match self {
            Entity::Franquicia => "FR",
            Entity::Sede => "SD",
            Entity::Cliente => "CL",
            Entity::Servicio => "SV",
            Entity::Venta => "VT",
            Entity::Comision => "CM",
        }
    }

    fn counter_key(&self) -> &'static str {
        match self {
            Entity::Franquicia => "franquicia",
            Entity::Sede => "sede",
            Entity::Cliente => "cliente",
            Entity::Servicio => "servicio",
            Entity::Venta => "venta",
            Entity::Comision => "comision",
        }
    }
}

/// Generate the next identifier for an entity kind. The counter row is
/// upserted atomically, so concurrent generators never hand out the same
/// number.
pub async fn generate_id(pool: &PgPool, entity: Entity) -> Result<String, sqlx::Error> {
    let (value,): (i64,) = sqlx::query_as(
        "INSERT INTO contadores (entidad, valor) VALUES ($1, 1) \
         ON CONFLICT (entidad) DO UPDATE SET valor = contadores.valor + 1 \
         RETURNING valor",
    )
    .bind(entity.counter_key())
    .fetch_one(pool)
    .await?;

    Ok(format_id(entity, value))
}

pub fn format_id(entity: Entity, value: i64) -> String {
    format!("{}-{:06}", entity.prefix(), value)
}

/// Pure format check: prefix, dash, digits. No uniqueness or existence check.
pub fn validate_format(entity: Entity, id: &str) -> bool {
    let Some(rest) = id
        .strip_prefix(entity.prefix())
        .and_then(|r| r.strip_prefix('-'))
    else {
        return false;
    };

    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_id(Entity::Servicio, 42), "SV-000042");
        assert_eq!(format_id(Entity::Cliente, 1_234_567), "CL-1234567");
    }

    #[test]
    fn validates_prefix_and_digits() {
        assert!(validate_format(Entity::Servicio, "SV-000042"));
        assert!(validate_format(Entity::Servicio, "SV-7"));
        assert!(!validate_format(Entity::Servicio, "CL-000042"));
        assert!(!validate_format(Entity::Servicio, "SV-"));
        assert!(!validate_format(Entity::Servicio, "SV-12a"));
        assert!(!validate_format(Entity::Servicio, "sv-000042"));
    }
}

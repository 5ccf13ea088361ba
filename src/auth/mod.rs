use serde::{Deserialize, Serialize};

/// Staff roles, closed set. Scope and permission rules dispatch on this enum
/// rather than on raw role strings scattered across handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "super_admin")]
    SuperAdmin,
    #[serde(rename = "admin_franquicia")]
    AdminFranquicia,
    #[serde(rename = "admin_sede")]
    AdminSede,
    #[serde(rename = "estilista")]
    Estilista,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::AdminFranquicia => "admin_franquicia",
            Role::AdminSede => "admin_sede",
            Role::Estilista => "estilista",
        }
    }

    /// Roles allowed to see the financial dashboard
    pub fn can_view_dashboard(&self) -> bool {
        matches!(
            self,
            Role::SuperAdmin | Role::AdminFranquicia | Role::AdminSede
        )
    }

    /// Roles allowed to create/edit clients
    pub fn can_manage_clients(&self) -> bool {
        matches!(
            self,
            Role::SuperAdmin | Role::AdminFranquicia | Role::AdminSede
        )
    }

    /// Roles allowed to read client records
    pub fn can_view_clients(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::AdminSede | Role::Estilista)
    }

    /// Roles allowed to manage the service catalog
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::AdminSede)
    }

    /// Franchise topology changes (create/assign/unassign/delete) are
    /// restricted to super_admin
    pub fn can_manage_franchises(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims issued by the identity provider. This core trusts them fully;
/// only the signature is checked.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub rol: Role,
    #[serde(default)]
    pub sede_id: Option<String>,
    #[serde(default)]
    pub franquicia_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated caller context injected by the auth middleware
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub email: String,
    pub rol: Role,
    pub sede_id: Option<String>,
    pub franquicia_id: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.email,
            rol: claims.rol,
            sede_id: claims.sede_id,
            franquicia_id: claims.franquicia_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_serde() {
        for (role, s) in [
            (Role::SuperAdmin, "\"super_admin\""),
            (Role::AdminFranquicia, "\"admin_franquicia\""),
            (Role::AdminSede, "\"admin_sede\""),
            (Role::Estilista, "\"estilista\""),
        ] {
            assert_eq!(serde_json::to_string(&role).unwrap(), s);
            assert_eq!(serde_json::from_str::<Role>(s).unwrap(), role);
        }
    }

    #[test]
    fn topology_changes_are_super_admin_only() {
        assert!(Role::SuperAdmin.can_manage_franchises());
        assert!(!Role::AdminFranquicia.can_manage_franchises());
        assert!(!Role::AdminSede.can_manage_franchises());
        assert!(!Role::Estilista.can_manage_franchises());
    }

    #[test]
    fn estilista_reads_but_never_manages() {
        assert!(Role::Estilista.can_view_clients());
        assert!(!Role::Estilista.can_manage_clients());
        assert!(!Role::Estilista.can_manage_catalog());
        assert!(!Role::Estilista.can_view_dashboard());
    }
}

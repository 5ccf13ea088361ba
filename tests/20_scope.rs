// These tests verify the scope predicate surface: role-derived visibility,
// the rendered SQL fragments, and param numbering when the predicate is
// composed into a larger query.

use serde_json::json;

use salon_api::auth::Role;
use salon_api::scope::{ScopeColumns, ScopeError, Visibility};

#[test]
fn role_policy_table_is_closed() {
    assert_eq!(
        Visibility::from_parts(Role::SuperAdmin, None, None).unwrap(),
        Visibility::Unrestricted
    );

    assert_eq!(
        Visibility::from_parts(Role::AdminFranquicia, None, Some("FR-000001".into())).unwrap(),
        Visibility::Franchise("FR-000001".into())
    );

    assert_eq!(
        Visibility::from_parts(
            Role::AdminSede,
            Some("SD-000002".into()),
            Some("FR-000001".into())
        )
        .unwrap(),
        Visibility::Site {
            sede_id: "SD-000002".into(),
            franquicia_id: Some("FR-000001".into()),
        }
    );
}

#[test]
fn missing_bindings_are_rejected_not_widened() {
    // A franchise admin without a franchise must not silently see everything
    assert!(matches!(
        Visibility::from_parts(Role::AdminFranquicia, Some("SD-1".into()), None),
        Err(ScopeError::MissingFranchise)
    ));
    assert!(matches!(
        Visibility::from_parts(Role::AdminSede, None, None),
        Err(ScopeError::MissingSite)
    ));
    assert!(matches!(
        Visibility::from_parts(Role::Estilista, None, None),
        Err(ScopeError::MissingSite)
    ));
}

#[test]
fn predicate_composes_into_a_larger_query() {
    let v = Visibility::from_parts(
        Role::Estilista,
        Some("SD-000002".into()),
        Some("FR-000001".into()),
    )
    .unwrap();

    // One param already taken by the caller ($1), the predicate starts at $2
    let (fragment, params) = v.predicate(2);
    let sql = format!("SELECT * FROM servicios WHERE activo = $1 AND {fragment}");

    assert_eq!(
        sql,
        "SELECT * FROM servicios WHERE activo = $1 AND \
         (\"sede_id\" IS NULL OR \"sede_id\" = $2 OR \"franquicia_id\" = $3)"
    );
    assert_eq!(params, vec![json!("SD-000002"), json!("FR-000001")]);
    assert_eq!(v.next_param(2), 4);
}

#[test]
fn global_branch_survives_every_scope() {
    // Whatever the caller's bindings, untagged records stay reachable
    for v in [
        Visibility::Franchise("FR-1".into()),
        Visibility::Site {
            sede_id: "SD-1".into(),
            franquicia_id: None,
        },
        Visibility::Site {
            sede_id: "SD-1".into(),
            franquicia_id: Some("FR-1".into()),
        },
    ] {
        let (fragment, _) = v.predicate(1);
        assert!(fragment.contains("IS NULL"), "no global branch in: {fragment}");
    }
}

#[test]
fn custom_columns_are_honored() {
    let v = Visibility::Franchise("FR-9".into());
    let cols = ScopeColumns {
        sede: "sede_ref",
        franquicia: "franquicia_ref",
    };
    let (fragment, _) = v.predicate_with(&cols, 1);
    assert_eq!(fragment, "(\"franquicia_ref\" IS NULL OR \"franquicia_ref\" = $1)");
}

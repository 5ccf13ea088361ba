// These tests cover the remaining domain surface reachable without a
// database: generated-id formats, catalog scope classification, record-level
// client access, and commission summaries.

use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use salon_api::auth::Role;
use salon_api::database::models::{
    Alcance, Client, Commission, CommissionLine, CommissionState,
};
use salon_api::ident::{self, Entity};
use salon_api::scope::Visibility;
use salon_api::auth::AuthUser;
use salon_api::services::client_service::can_access;
use salon_api::services::commission_service::{summarize, CommissionError, CommissionScope};

#[test]
fn generated_ids_are_prefixed_and_padded() {
    assert_eq!(ident::format_id(Entity::Cliente, 7), "CL-000007");
    assert_eq!(ident::format_id(Entity::Venta, 123), "VT-000123");

    assert!(ident::validate_format(Entity::Servicio, "SV-000042"));
    assert!(!ident::validate_format(Entity::Servicio, "SV-00 42"));
    assert!(!ident::validate_format(Entity::Servicio, "VT-000042"));
}

#[test]
fn catalog_scope_is_derived_from_the_tags() {
    assert_eq!(Alcance::classify(None, None), Alcance::Global);
    assert_eq!(Alcance::classify(None, Some("FR-1")), Alcance::Franquicia);
    assert_eq!(Alcance::classify(Some("SD-1"), Some("FR-1")), Alcance::Local);
}

fn client_at(sede: &str, franquicia: Option<&str>) -> Client {
    Client {
        id: Uuid::new_v4(),
        cliente_id: "CL-000010".into(),
        nombre: "Marta".into(),
        correo: Some("marta@example.com".into()),
        telefono: None,
        sede_id: sede.into(),
        franquicia_id: franquicia.map(str::to_string),
        pais: "CO".into(),
        notas_historial: Json(vec![]),
        creado_por: "admin@example.com".into(),
        fecha_creacion: Utc::now().naive_utc(),
        modificado_por: None,
        fecha_modificacion: None,
    }
}

#[test]
fn sibling_sites_share_clients_through_the_franchise() {
    let v = Visibility::from_parts(
        Role::AdminSede,
        Some("SD-000001".into()),
        Some("FR-000001".into()),
    )
    .unwrap();

    assert!(can_access(&v, &client_at("SD-000002", Some("FR-000001"))));
    assert!(!can_access(&v, &client_at("SD-000002", Some("FR-000002"))));

    // Without franchise tags on either side, only the own site remains
    let lone = Visibility::from_parts(Role::AdminSede, Some("SD-000001".into()), None).unwrap();
    assert!(can_access(&lone, &client_at("SD-000001", None)));
    assert!(!can_access(&lone, &client_at("SD-000002", None)));
}

#[test]
fn commission_scope_rejects_unbound_callers() {
    // An unbound franchise or site admin must be turned away, not handed an
    // unfiltered listing across every tenant
    let unbound_franchise = AuthUser {
        email: "dir@example.com".into(),
        rol: Role::AdminFranquicia,
        sede_id: None,
        franquicia_id: None,
    };
    assert!(matches!(
        CommissionScope::for_user(&unbound_franchise),
        Err(CommissionError::Forbidden(_))
    ));

    let unbound_site = AuthUser {
        email: "gerente@example.com".into(),
        rol: Role::AdminSede,
        sede_id: None,
        franquicia_id: Some("FR-000001".into()),
    };
    assert!(matches!(
        CommissionScope::for_user(&unbound_site),
        Err(CommissionError::Forbidden(_))
    ));
}

#[test]
fn commission_scope_pins_to_the_callers_tenant() {
    let scope = CommissionScope::Franchise("FR-000001".into());
    assert!(scope.allows("SD-000002", Some("FR-000001")));
    assert!(!scope.allows("SD-000002", Some("FR-000002")));
    assert!(!scope.allows("SD-000002", None));

    let scope = CommissionScope::Site("SD-000001".into());
    assert!(scope.allows("SD-000001", None));
    assert!(!scope.allows("SD-000009", Some("FR-000001")));
}

#[test]
fn commission_state_parsing_is_strict() {
    assert_eq!(CommissionState::parse("pendiente"), Some(CommissionState::Pendiente));
    assert_eq!(CommissionState::parse("liquidada"), Some(CommissionState::Liquidada));
    assert_eq!(CommissionState::parse("LIQUIDADA"), None);
    assert_eq!(CommissionState::parse("pagada"), None);
}

#[test]
fn commission_summary_splits_service_and_product_sides() {
    let lines = vec![
        CommissionLine {
            servicio_id: "SV-000001".into(),
            servicio_nombre: "Corte".into(),
            valor_servicio: 100.0,
            porcentaje: 40.0,
            valor_comision_servicio: 40.0,
            valor_comision_productos: 10.0,
            valor_comision_total: 50.0,
            fecha: "10-06-2026".into(),
            numero_comprobante: Some("0001".into()),
        },
        CommissionLine {
            servicio_id: "SV-000002".into(),
            servicio_nombre: "Tinte".into(),
            valor_servicio: 75.0,
            porcentaje: 40.0,
            valor_comision_servicio: 30.0,
            valor_comision_productos: 20.0,
            valor_comision_total: 50.0,
            fecha: "11-06-2026".into(),
            numero_comprobante: None,
        },
    ];

    let commission = Commission {
        id: Uuid::new_v4(),
        comision_id: "CM-000001".into(),
        profesional_id: "laura@example.com".into(),
        profesional_nombre: "Laura".into(),
        sede_id: "SD-000001".into(),
        moneda: "COP".into(),
        tipo_comision: "mixto".into(),
        total_servicios: 2,
        total_comisiones: 100.0,
        servicios_detalle: Json(lines),
        periodo_inicio: "01-06-2026".into(),
        periodo_fin: "15-06-2026".into(),
        estado: "pendiente".into(),
        creado_en: Utc::now().naive_utc(),
        liquidada_por: None,
        liquidada_en: None,
    };

    let summary = summarize(&commission);
    assert_eq!(summary.comisiones_servicios, 70.0);
    assert_eq!(summary.comisiones_productos, 30.0);
    assert_eq!(summary.porcentaje_servicios, 70.0);
    assert_eq!(summary.porcentaje_productos, 30.0);
    assert_eq!(summary.total_comisiones, 100.0);
}

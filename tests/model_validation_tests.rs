use serde_json::json;
use tremonte_dashboard::{
    cadastros::{ESTADOS, PRODUTOS, UNIDADES, all_tables, table_by_name},
    error::AppError,
    models::{Lembrete, StatusLembrete},
    schema::{FieldValue, validate},
};

// --- Table validation ---

#[test]
fn test_validate_trims_and_uppercases_codes() {
    let values = validate(&ESTADOS, &json!({ "nome": "  Bahia  ", "uf": " ba" })).unwrap();

    assert_eq!(values.get("nome"), Some(&FieldValue::Text("Bahia".to_string())));
    assert_eq!(values.get("uf"), Some(&FieldValue::Text("BA".to_string())));
}

#[test]
fn test_validate_ignores_unknown_fields_and_id() {
    let values = validate(&ESTADOS, &json!({ "id": 9, "nome": "Acre", "uf": "AC", "extra": 1 }))
        .unwrap();

    let record = values.to_record(3);
    assert_eq!(record["id"], 3);
    assert!(!record.contains_key("extra"));
}

#[test]
fn test_validate_rejects_non_object_body() {
    let err = validate(&ESTADOS, &json!(["Acre", "AC"])).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn test_validate_counts_characters_not_bytes() {
    // "ÇÃ" is two characters but four bytes.
    assert!(validate(&ESTADOS, &json!({ "nome": "Ceará", "uf": "ÇÃ" })).is_ok());
}

#[test]
fn test_length_limit_applies_after_upper_casing() {
    // "ß" upper-cases to "SS", doubling the stored length.
    let err = validate(&UNIDADES, &json!({ "sigla": "ßßßß", "descricao": "x" })).unwrap_err();
    assert!(
        matches!(err, AppError::Validation(ref m) if m == "Campo 'sigla' deve ter no máximo 6 caracteres")
    );

    let err = validate(&ESTADOS, &json!({ "nome": "X", "uf": "ßß" })).unwrap_err();
    assert!(
        matches!(err, AppError::Validation(ref m) if m == "Campo 'uf' deve ter no máximo 2 caracteres")
    );

    let values = validate(&UNIDADES, &json!({ "sigla": "ßßß", "descricao": "x" })).unwrap();
    assert_eq!(values.get("sigla"), Some(&FieldValue::Text("SSSSSS".to_string())));
}

#[test]
fn test_optional_references_and_integer_strings() {
    let values = validate(
        &PRODUTOS,
        &json!({
            "codigo": "p-1",
            "descricao": "Parafuso",
            "fabricanteId": "12",
            "marcaId": "",
        }),
    )
    .unwrap();

    assert_eq!(values.get("codigo"), Some(&FieldValue::Text("P-1".to_string())));
    assert_eq!(values.get("fabricanteId"), Some(&FieldValue::Integer(12)));
    assert_eq!(values.get("marcaId"), Some(&FieldValue::Null));
    assert_eq!(values.get("unidadeId"), Some(&FieldValue::Null));
    assert_eq!(values.get("bloqueado"), Some(&FieldValue::Boolean(false)));

    let err = validate(
        &PRODUTOS,
        &json!({ "codigo": "P1", "descricao": "X", "unidadeId": 1.5 }),
    )
    .unwrap_err();
    assert!(
        matches!(err, AppError::Validation(ref m) if m == "Campo 'unidadeId' deve ser um número inteiro")
    );
}

#[test]
fn test_every_table_is_consistent() {
    for table in all_tables() {
        assert_eq!(table_by_name(table.name).map(|t| t.name), Some(table.name));
        assert!(table.column(table.sort).is_some(), "{} sorts by a known field", table.name);
        for group in table.unique {
            for field in *group {
                assert!(table.column(field).is_some(), "{}.{field}", table.name);
            }
        }
        for column in table.columns {
            if let Some(target) = column.references {
                assert!(table_by_name(target).is_some(), "{} -> {target}", table.name);
            }
        }
    }
}

// --- Reminder lifecycle ---

#[test]
fn test_open_statuses_accept_any_other_status() {
    use StatusLembrete::*;

    for from in [Confirmado, Pendente, Adiado] {
        for to in [Confirmado, Pendente, Adiado, Concluido, Cancelado] {
            let result = from.check_transition(to);
            assert_eq!(result.is_ok(), from != to, "{from} -> {to}");
        }
    }
}

#[test]
fn test_final_statuses_reject_everything() {
    for from in [StatusLembrete::Concluido, StatusLembrete::Cancelado] {
        assert!(from.is_final());
        let err = from.check_transition(StatusLembrete::Pendente).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains(from.as_str())));
    }
}

#[test]
fn test_status_round_trips_through_text() {
    for status in [
        StatusLembrete::Confirmado,
        StatusLembrete::Pendente,
        StatusLembrete::Adiado,
        StatusLembrete::Concluido,
        StatusLembrete::Cancelado,
    ] {
        assert_eq!(status.as_str().parse::<StatusLembrete>(), Ok(status));
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!(status.as_str())
        );
    }
    assert!("concluido".parse::<StatusLembrete>().is_err());
}

#[test]
fn test_lembrete_serializes_camel_case() {
    let lembrete: Lembrete = serde_json::from_value(json!({
        "id": 1,
        "usuarioId": "7f8a9c2e-0000-4000-8000-000000000001",
        "titulo": "Ligar",
        "descricao": null,
        "prioridade": "URGENTE",
        "intervaloMinutos": 60,
        "antecedenciaMinutos": 5,
        "adiamentoMinutos": 10,
        "proximoDisparo": "2030-01-01T12:00:00Z",
        "status": "PENDENTE",
        "criadoEm": "2029-12-31T12:00:00Z",
        "atualizadoEm": "2029-12-31T12:00:00Z",
    }))
    .unwrap();

    let output = serde_json::to_value(&lembrete).unwrap();
    assert_eq!(output["proximoDisparo"], "2030-01-01T12:00:00Z");
    assert_eq!(output["status"], "PENDENTE");
    assert!(output.get("proximo_disparo").is_none());
}

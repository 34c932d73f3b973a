use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use tremonte_dashboard::{
    AppState, InMemoryRepository,
    cadastros::{Estado, Fabricante, Marca, Produto, VendedorRegiao},
    config::AppConfig,
    error::AppError,
    extract::{ApiJson, ApiPath},
    handlers::{cadastros, parametros},
};

// --- Helpers ---

fn test_state() -> AppState {
    AppState {
        repo: Arc::new(InMemoryRepository::new()),
        config: AppConfig::default(),
    }
}

fn no_params() -> Query<HashMap<String, String>> {
    Query(HashMap::new())
}

fn params(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
    Query(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

async fn error_body(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create_estado(state: &AppState, nome: &str, uf: &str) -> Result<Estado, AppError> {
    cadastros::create::<Estado>(State(state.clone()), ApiJson(json!({ "nome": nome, "uf": uf })))
        .await
        .map(|(_, Json(estado))| estado)
}

async fn create_fabricante(state: &AppState, codigo: &str, nome: &str) -> Fabricante {
    let (_, Json(fabricante)) = cadastros::create::<Fabricante>(
        State(state.clone()),
        ApiJson(json!({ "codigo": codigo, "nome": nome })),
    )
    .await
    .unwrap();
    fabricante
}

// --- Create ---

#[tokio::test]
async fn test_create_returns_201_with_normalised_record() {
    let state = test_state();

    let (status, Json(estado)) = cadastros::create::<Estado>(
        State(state),
        ApiJson(json!({ "nome": "  Acre ", "uf": "ac" })),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(estado.id, 1);
    assert_eq!(estado.nome, "Acre");
    assert_eq!(estado.uf, "AC");
}

#[tokio::test]
async fn test_duplicate_uf_differing_only_in_case_is_conflict() {
    let state = test_state();
    create_estado(&state, "Acre", "AC").await.unwrap();

    let err = create_estado(&state, "Acre", "ac").await.unwrap_err();
    let (status, body) = error_body(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Estado ou UF já existe");
}

#[tokio::test]
async fn test_duplicate_code_conflicts_regardless_of_other_fields() {
    let state = test_state();
    create_fabricante(&state, "F01", "Fabricante Um").await;

    let err = cadastros::create::<Fabricante>(
        State(state.clone()),
        ApiJson(json!({ "codigo": "f01", "nome": "Outro Nome", "ativo": false })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m.contains("Fabricante")));

    // Same description with a new code is also a conflict.
    let err = cadastros::create::<Fabricante>(
        State(state),
        ApiJson(json!({ "codigo": "F02", "nome": "FABRICANTE UM" })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_validation_names_the_field() {
    let state = test_state();

    let err = create_estado(&state, "", "AC").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "Campo 'nome' é obrigatório"));

    let err = create_estado(&state, "Acre", "ACR").await.unwrap_err();
    assert!(
        matches!(err, AppError::Validation(ref m) if m == "Campo 'uf' deve ter no máximo 2 caracteres")
    );

    let err = cadastros::create::<Fabricante>(
        State(state),
        ApiJson(json!({ "codigo": "F1", "nome": "X", "ativo": "sim" })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m.contains("'ativo'")));
}

#[tokio::test]
async fn test_boolean_defaults_apply_when_omitted() {
    let state = test_state();
    let fabricante = create_fabricante(&state, "F01", "Fabricante Um").await;

    assert!(fabricante.ativo);
    assert!(fabricante.liberado);
}

#[tokio::test]
async fn test_composite_unique_group() {
    let state = test_state();
    let create = |vendedor: &'static str, regiao: &'static str| {
        cadastros::create::<VendedorRegiao>(
            State(state.clone()),
            ApiJson(json!({ "vendedorCodigo": vendedor, "regiaoCodigo": regiao })),
        )
    };

    create("V1", "SUL").await.unwrap();
    // Either half alone may repeat.
    create("V1", "NORTE").await.unwrap();
    create("V2", "SUL").await.unwrap();

    let err = create("v1", "sul").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Vendedor já associado a esta região"));
}

// --- References ---

#[tokio::test]
async fn test_missing_reference_is_validation_error() {
    let state = test_state();

    let err = cadastros::create::<Marca>(
        State(state),
        ApiJson(json!({ "codigo": "M1", "descricao": "Marca", "fabricanteId": 99 })),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Validation(ref m) if m.contains("fabricanteId")));
}

#[tokio::test]
async fn test_delete_referenced_record_is_rejected() {
    let state = test_state();
    let fabricante = create_fabricante(&state, "F01", "Fabricante Um").await;
    cadastros::create::<Marca>(
        State(state.clone()),
        ApiJson(json!({ "codigo": "M1", "descricao": "Marca", "fabricanteId": fabricante.id })),
    )
    .await
    .unwrap();

    let err = cadastros::delete::<Fabricante>(State(state.clone()), ApiPath(fabricante.id))
        .await
        .unwrap_err();
    let (status, body) = error_body(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("marcas"));

    // Still there.
    assert!(
        cadastros::get::<Fabricante>(State(state), ApiPath(fabricante.id))
            .await
            .is_ok()
    );
}

// --- Update ---

#[tokio::test]
async fn test_update_to_own_values_succeeds() {
    let state = test_state();
    let estado = create_estado(&state, "Acre", "AC").await.unwrap();

    let Json(updated) = cadastros::update::<Estado>(
        State(state),
        ApiPath(estado.id),
        ApiJson(json!({ "nome": "ACRE", "uf": "ac" })),
    )
    .await
    .unwrap();

    assert_eq!(updated.id, estado.id);
    assert_eq!(updated.nome, "ACRE");
    assert_eq!(updated.uf, "AC");
}

#[tokio::test]
async fn test_update_to_another_records_code_is_conflict() {
    let state = test_state();
    create_estado(&state, "Acre", "AC").await.unwrap();
    let bahia = create_estado(&state, "Bahia", "BA").await.unwrap();

    let err = cadastros::update::<Estado>(
        State(state.clone()),
        ApiPath(bahia.id),
        ApiJson(json!({ "nome": "Bahia", "uf": "ac" })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Estado ou UF já existe"));

    let Json(unchanged) = cadastros::get::<Estado>(State(state), ApiPath(bahia.id))
        .await
        .unwrap();
    assert_eq!(unchanged.uf, "BA");
}

#[tokio::test]
async fn test_update_missing_record_is_not_found() {
    let state = test_state();

    let err = cadastros::update::<Estado>(
        State(state),
        ApiPath(42),
        ApiJson(json!({ "nome": "Acre", "uf": "AC" })),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_update_keeps_omitted_flags() {
    let state = test_state();
    let (_, Json(fabricante)) = cadastros::create::<Fabricante>(
        State(state.clone()),
        ApiJson(json!({ "codigo": "F01", "nome": "Fab", "ativo": false, "liberado": false })),
    )
    .await
    .unwrap();

    let Json(renamed) = cadastros::update::<Fabricante>(
        State(state.clone()),
        ApiPath(fabricante.id),
        ApiJson(json!({ "codigo": "F01", "nome": "Fab Renomeado" })),
    )
    .await
    .unwrap();

    assert_eq!(renamed.nome, "Fab Renomeado");
    assert!(!renamed.ativo);
    assert!(!renamed.liberado);

    // An explicit value still applies.
    let Json(reactivated) = cadastros::update::<Fabricante>(
        State(state),
        ApiPath(fabricante.id),
        ApiJson(json!({ "ativo": true })),
    )
    .await
    .unwrap();
    assert!(reactivated.ativo);
    assert!(!reactivated.liberado);
    assert_eq!(reactivated.codigo, "F01");
}

// --- Get / Delete ---

#[tokio::test]
async fn test_get_and_delete_missing_id_are_404() {
    let state = test_state();

    let err = cadastros::get::<Estado>(State(state.clone()), ApiPath(7))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let err = cadastros::delete::<Estado>(State(state), ApiPath(7))
        .await
        .unwrap_err();
    let (status, body) = error_body(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Registro não encontrado");
}

#[tokio::test]
async fn test_delete_returns_success_body() {
    let state = test_state();
    let estado = create_estado(&state, "Acre", "AC").await.unwrap();

    let response = cadastros::delete::<Estado>(State(state.clone()), ApiPath(estado.id))
        .await
        .unwrap()
        .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!({ "success": true }));

    let Json(remaining) = cadastros::list::<Estado>(State(state), no_params())
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

// --- List ---

#[tokio::test]
async fn test_list_is_sorted_and_searchable() {
    let state = test_state();
    create_estado(&state, "Sergipe", "SE").await.unwrap();
    create_estado(&state, "acre", "AC").await.unwrap();
    create_estado(&state, "Bahia", "BA").await.unwrap();

    let Json(all) = cadastros::list::<Estado>(State(state.clone()), no_params())
        .await
        .unwrap();
    let nomes: Vec<_> = all.iter().map(|e| e.nome.as_str()).collect();
    assert_eq!(nomes, vec!["acre", "Bahia", "Sergipe"]);

    let Json(found) = cadastros::list::<Estado>(State(state), params(&[("busca", "HIA")]))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].uf, "BA");
}

#[tokio::test]
async fn test_list_filters_by_parent_reference() {
    let state = test_state();
    let um = create_fabricante(&state, "F01", "Fabricante Um").await;
    let dois = create_fabricante(&state, "F02", "Fabricante Dois").await;
    for (codigo, fabricante) in [("P1", um.id), ("P2", dois.id), ("P3", um.id)] {
        cadastros::create::<Produto>(
            State(state.clone()),
            ApiJson(json!({
                "codigo": codigo,
                "descricao": format!("Produto {codigo}"),
                "fabricanteId": fabricante,
            })),
        )
        .await
        .unwrap();
    }

    let Json(produtos) = cadastros::list::<Produto>(
        State(state.clone()),
        params(&[("fabricanteId", um.id.to_string().as_str())]),
    )
    .await
    .unwrap();
    assert_eq!(produtos.len(), 2);
    assert!(produtos.iter().all(|p| p.fabricante_id == Some(um.id)));

    let err = cadastros::list::<Produto>(State(state), params(&[("fabricanteId", "abc")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_parametros_are_capped() {
    let state = test_state();
    for i in 0..25 {
        create_fabricante(&state, &format!("F{i:02}"), &format!("Fabricante {i:02}")).await;
    }

    let Json(capped) = parametros::list::<Fabricante>(State(state.clone()), no_params())
        .await
        .unwrap();
    assert_eq!(capped.len(), parametros::PARAMETROS_LIMIT);

    let Json(all) = cadastros::list::<Fabricante>(State(state), no_params())
        .await
        .unwrap();
    assert_eq!(all.len(), 25);
}

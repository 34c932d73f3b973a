//! Runs against a real Postgres. Set `DATABASE_URL` and use
//! `cargo test -- --ignored` to include these.

use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use tremonte_dashboard::{
    cadastros::{FABRICANTES, MARCAS, PRODUTOS},
    error::StoreError,
    models::{NewUser, NovoLembrete, Prioridade, StatusChange, StatusLembrete},
    repository::{PostgresRepository, Repository},
    schema::{ListFilter, Values, validate},
};
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Short random code so repeated runs never collide on unique columns.
fn unique_code() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}

fn fabricante_values(codigo: &str, nome: &str) -> Values {
    validate(&FABRICANTES, &json!({ "codigo": codigo, "nome": nome })).unwrap()
}

async fn create_user(repo: &PostgresRepository) -> Uuid {
    repo.create_user(NewUser {
        email: format!("{}@tremonte.test", Uuid::new_v4()),
        nome: "Teste".to_string(),
        senha_hash: "unused".to_string(),
    })
    .await
    .unwrap()
    .id
}

// --- Cadastros ---

#[tokio::test]
#[ignore]
async fn test_insert_conflicts_case_insensitively() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let codigo = unique_code();
    let nome = format!("Fabricante {codigo}");

    let record = repo
        .insert_record(&FABRICANTES, &fabricante_values(&codigo, &nome))
        .await
        .unwrap();
    assert_eq!(record["codigo"], codigo.as_str());
    assert_eq!(record["ativo"], true);

    let err = repo
        .insert_record(
            &FABRICANTES,
            &fabricante_values(&unique_code(), &nome.to_lowercase()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict));
}

#[tokio::test]
#[ignore]
async fn test_update_excludes_own_row_and_detects_missing() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let codigo = unique_code();
    let nome = format!("Fabricante {codigo}");
    let record = repo
        .insert_record(&FABRICANTES, &fabricante_values(&codigo, &nome))
        .await
        .unwrap();
    let id = record["id"].as_i64().unwrap();

    let updated = repo
        .update_record(&FABRICANTES, id, &fabricante_values(&codigo, &nome.to_uppercase()))
        .await
        .unwrap();
    assert_eq!(updated["nome"], nome.to_uppercase());

    let err = repo
        .update_record(&FABRICANTES, i64::MAX, &fabricante_values(&unique_code(), "X"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
#[ignore]
async fn test_foreign_keys_map_to_reference_errors() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let err = repo
        .insert_record(
            &MARCAS,
            &validate(
                &MARCAS,
                &json!({ "codigo": unique_code(), "descricao": unique_code(), "fabricanteId": i64::MAX }),
            )
            .unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidReference("fabricanteId")));

    let fabricante = repo
        .insert_record(&FABRICANTES, &fabricante_values(&unique_code(), &unique_code()))
        .await
        .unwrap();
    let fabricante_id = fabricante["id"].as_i64().unwrap();
    repo.insert_record(
        &PRODUTOS,
        &validate(
            &PRODUTOS,
            &json!({ "codigo": unique_code(), "descricao": unique_code(), "fabricanteId": fabricante_id }),
        )
        .unwrap(),
    )
    .await
    .unwrap();

    let err = repo.delete_record(&FABRICANTES, fabricante_id).await.unwrap_err();
    assert!(matches!(err, StoreError::InUse(ref by) if by == "produtos"));

    let filtered = repo
        .list_records(
            &PRODUTOS,
            &ListFilter {
                parent: Some(fabricante_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_search_escapes_like_wildcards() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let tag = unique_code();
    repo.insert_record(&FABRICANTES, &fabricante_values(&unique_code(), &format!("{tag} 100%")))
        .await
        .unwrap();
    repo.insert_record(&FABRICANTES, &fabricante_values(&unique_code(), &format!("{tag} 1000")))
        .await
        .unwrap();

    let found = repo
        .list_records(
            &FABRICANTES,
            &ListFilter {
                search: Some(format!("{} 100%", tag.to_lowercase())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["nome"], format!("{tag} 100%"));
}

// --- Lembretes ---

#[tokio::test]
#[ignore]
async fn test_status_change_is_guarded_by_previous_status() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let owner = create_user(&repo).await;
    let disparo = Utc::now() + Duration::hours(1);

    let lembrete = repo
        .create_lembrete(
            owner,
            NovoLembrete {
                titulo: "Conferir estoque".to_string(),
                descricao: None,
                prioridade: Prioridade::Baixa,
                intervalo_minutos: 60,
                antecedencia_minutos: 0,
                adiamento_minutos: 15,
                proximo_disparo: disparo,
                observacao: None,
            },
        )
        .await
        .unwrap();

    let change = |anterior| StatusChange {
        anterior,
        novo: StatusLembrete::Concluido,
        proximo_disparo: lembrete.proximo_disparo,
        observacao: None,
    };

    let concluido = repo
        .change_lembrete_status(owner, lembrete.id, change(StatusLembrete::Confirmado))
        .await
        .unwrap();
    assert_eq!(concluido.status, StatusLembrete::Concluido);

    // A second writer that read the old status loses.
    let err = repo
        .change_lembrete_status(owner, lembrete.id, change(StatusLembrete::Confirmado))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Stale));

    let err = repo
        .change_lembrete_status(Uuid::new_v4(), lembrete.id, change(StatusLembrete::Concluido))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    repo.delete_lembrete(owner, lembrete.id, Some("limpeza".to_string()))
        .await
        .unwrap();
    let historico = repo.list_historico(lembrete.id).await.unwrap();
    assert_eq!(historico.len(), 3);
    assert_eq!(historico[0].observacao.as_deref(), Some("limpeza"));
}

// --- Dashboard ---

#[tokio::test]
#[ignore]
async fn test_vendas_por_fabricante_joins_names() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let nome = format!("Fabricante {}", unique_code());
    let fabricante = repo
        .insert_record(&FABRICANTES, &fabricante_values(&unique_code(), &nome))
        .await
        .unwrap();
    let fabricante_id = fabricante["id"].as_i64().unwrap();

    for (valor, status) in [(10.25, Some("FATURADO")), (4.75, Some("ABERTO")), (99.0, None)] {
        sqlx::query(
            "INSERT INTO pedidos (data_pedido, fabricante_id, valor, status) \
             VALUES (now(), $1, $2::numeric, $3)",
        )
        .bind(fabricante_id)
        .bind(valor)
        .bind(status)
        .execute(&ctx.pool)
        .await
        .unwrap();
    }

    let ranking = repo
        .vendas_por_fabricante(Utc::now() - Duration::days(1))
        .await
        .unwrap();
    let entry = ranking
        .iter()
        .find(|v| v.fabricante_id == Some(fabricante_id))
        .unwrap();

    assert_eq!(entry.fabricante_nome.as_deref(), Some(nome.as_str()));
    assert_eq!(entry.pedidos, 2);
    assert_eq!(entry.valor, 15.0);
}

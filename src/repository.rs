use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    cadastros::all_tables,
    error::StoreError,
    models::{
        AcaoHistorico, DashboardResumo, HistoricoLembrete, Lembrete, NewUser, NovoLembrete,
        StatusChange, StatusLembrete, User, UserCredentials, VendaDiaria, VendaPorFabricante,
        VendaPorRegiao,
    },
    schema::{CaseRule, Column, FieldValue, Kind, ListFilter, Record, Table, Values},
};

/// Repository Trait
///
/// The persistence contract shared by the Postgres store and the in-memory
/// store. Cadastro operations are driven by a `Table` descriptor; writes that
/// must respect unique groups are atomic conditional writes, never a separate
/// check followed by an insert.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Cadastros ---
    async fn list_records(
        &self,
        table: &'static Table,
        filter: &ListFilter,
    ) -> Result<Vec<Record>, StoreError>;
    async fn get_record(&self, table: &'static Table, id: i64)
    -> Result<Option<Record>, StoreError>;
    /// `StoreError::Conflict` when a unique group matches an existing record.
    async fn insert_record(
        &self,
        table: &'static Table,
        values: &Values,
    ) -> Result<Record, StoreError>;
    /// Replace-in-place. `NotFound` is checked before uniqueness; the record's
    /// own id is excluded from the duplicate search.
    async fn update_record(
        &self,
        table: &'static Table,
        id: i64,
        values: &Values,
    ) -> Result<Record, StoreError>;
    async fn delete_record(&self, table: &'static Table, id: i64) -> Result<(), StoreError>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Case-insensitive lookup by email.
    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<UserCredentials>, StoreError>;
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    // --- Lembretes (always scoped to the owner) ---
    /// Writes the reminder and its `CRIACAO` history row together.
    async fn create_lembrete(&self, owner: Uuid, novo: NovoLembrete)
    -> Result<Lembrete, StoreError>;
    /// Ordered by `proximo_disparo` ascending.
    async fn list_lembretes(&self, owner: Uuid) -> Result<Vec<Lembrete>, StoreError>;
    async fn get_lembrete(&self, owner: Uuid, id: i64) -> Result<Option<Lembrete>, StoreError>;
    /// Newest first.
    async fn list_historico(&self, lembrete_id: i64)
    -> Result<Vec<HistoricoLembrete>, StoreError>;
    /// `Stale` when the status is no longer `change.anterior`.
    async fn change_lembrete_status(
        &self,
        owner: Uuid,
        id: i64,
        change: StatusChange,
    ) -> Result<Lembrete, StoreError>;
    /// Removes the reminder and appends an `EXCLUSAO` history row.
    async fn delete_lembrete(
        &self,
        owner: Uuid,
        id: i64,
        observacao: Option<String>,
    ) -> Result<(), StoreError>;

    // --- Dashboard ---
    async fn dashboard_resumo(&self, owner: Uuid) -> Result<DashboardResumo, StoreError>;
    async fn vendas_por_dia(&self, desde: DateTime<Utc>) -> Result<Vec<VendaDiaria>, StoreError>;
    async fn vendas_por_regiao(
        &self,
        desde: DateTime<Utc>,
    ) -> Result<Vec<VendaPorRegiao>, StoreError>;
    async fn vendas_por_fabricante(
        &self,
        desde: DateTime<Utc>,
    ) -> Result<Vec<VendaPorFabricante>, StoreError>;
}

/// RepositoryState
///
/// The shared handle placed in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. SQL identifiers only ever come from the
/// static `Table` descriptors; every value is bound.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations in `./migrations`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

// --- SQL building helpers ---

fn select_list(table: &Table) -> String {
    std::iter::once("id")
        .chain(table.columns.iter().map(|c| c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, column: &Column, value: &FieldValue) {
    match (value, column.kind) {
        (FieldValue::Text(s), _) => builder.push_bind(s.clone()),
        (FieldValue::Integer(i), _) => builder.push_bind(*i),
        (FieldValue::Boolean(b), _) => builder.push_bind(*b),
        (FieldValue::Null, Kind::Text { .. }) => builder.push_bind(None::<String>),
        (FieldValue::Null, Kind::Integer) => builder.push_bind(None::<i64>),
        (FieldValue::Null, Kind::Boolean { .. }) => builder.push_bind(None::<bool>),
    };
}

type UniqueGroup<'a> = Vec<(&'static Column, &'a FieldValue)>;

/// Unique groups that can match anything: groups with a null value never do.
fn candidate_groups<'a>(table: &'static Table, values: &'a Values) -> Vec<UniqueGroup<'a>> {
    table
        .unique
        .iter()
        .filter_map(|group| {
            let resolved: UniqueGroup<'a> = group
                .iter()
                .filter_map(|field| table.column(field).zip(values.get(field)))
                .collect();
            let complete = resolved.len() == group.len() && resolved.iter().all(|(_, v)| !v.is_null());
            complete.then_some(resolved)
        })
        .collect()
}

/// Pushes `(a = $1) OR (lower(b) = lower($2) AND c = $3)`.
fn push_duplicate_predicate(builder: &mut QueryBuilder<'_, Postgres>, groups: &[UniqueGroup<'_>]) {
    for (g, group) in groups.iter().enumerate() {
        builder.push(if g == 0 { "(" } else { " OR (" });
        for (i, (column, value)) in group.iter().enumerate() {
            if i > 0 {
                builder.push(" AND ");
            }
            let folded = column.case == CaseRule::Insensitive && matches!(column.kind, Kind::Text { .. });
            if folded {
                builder.push(format!("lower({}) = lower(", column.name));
                push_value(builder, column, value);
                builder.push(")");
            } else {
                builder.push(format!("{} = ", column.name));
                push_value(builder, column, value);
            }
        }
        builder.push(")");
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn row_to_record(table: &Table, row: &PgRow) -> Result<Record, StoreError> {
    let mut record = Record::new();
    record.insert("id".to_string(), Value::from(row.try_get::<i64, _>("id")?));
    for column in table.columns {
        let value = match column.kind {
            Kind::Text { .. } => row
                .try_get::<Option<String>, _>(column.name)?
                .map(Value::String),
            Kind::Integer => row.try_get::<Option<i64>, _>(column.name)?.map(Value::from),
            Kind::Boolean { .. } => row.try_get::<Option<bool>, _>(column.name)?.map(Value::Bool),
        };
        record.insert(column.field.to_string(), value.unwrap_or(Value::Null));
    }
    Ok(record)
}

fn fk_constraint(table: &Table, column: &Column) -> String {
    format!("fk_{}_{}", table.name, column.name)
}

/// Translates constraint violations raised by inserts and updates.
fn map_write_error(table: &'static Table, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("23505") => return StoreError::Conflict,
            Some("23503") => {
                let field = db.constraint().and_then(|name| {
                    table
                        .columns
                        .iter()
                        .find(|c| fk_constraint(table, c) == name)
                        .map(|c| c.field)
                });
                if let Some(field) = field {
                    return StoreError::InvalidReference(field);
                }
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// Translates a foreign-key violation raised by a delete into `InUse`.
fn map_delete_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23503") {
            let by = db
                .constraint()
                .and_then(|name| {
                    all_tables().into_iter().find(|t| {
                        t.columns.iter().any(|c| fk_constraint(t, c) == name)
                    })
                })
                .map(|t| t.label.to_string())
                .unwrap_or_else(|| "outros cadastros".to_string());
            return StoreError::InUse(by);
        }
    }
    StoreError::Database(err)
}

fn parse_enum<T: std::str::FromStr<Err = String>>(raw: String) -> Result<T, StoreError> {
    raw.parse::<T>().map_err(StoreError::Corrupt)
}

const LEMBRETE_COLUMNS: &str = "id, usuario_id, titulo, descricao, prioridade, intervalo_minutos, \
     antecedencia_minutos, adiamento_minutos, proximo_disparo, status, criado_em, atualizado_em";

const HISTORICO_COLUMNS: &str =
    "id, lembrete_id, estado_anterior, estado_novo, acao, observacao, usuario_id, criado_em";

fn lembrete_from_row(row: &PgRow) -> Result<Lembrete, StoreError> {
    Ok(Lembrete {
        id: row.try_get("id")?,
        usuario_id: row.try_get("usuario_id")?,
        titulo: row.try_get("titulo")?,
        descricao: row.try_get("descricao")?,
        prioridade: parse_enum(row.try_get("prioridade")?)?,
        intervalo_minutos: row.try_get("intervalo_minutos")?,
        antecedencia_minutos: row.try_get("antecedencia_minutos")?,
        adiamento_minutos: row.try_get("adiamento_minutos")?,
        proximo_disparo: row.try_get("proximo_disparo")?,
        status: parse_enum(row.try_get("status")?)?,
        criado_em: row.try_get("criado_em")?,
        atualizado_em: row.try_get("atualizado_em")?,
    })
}

fn historico_from_row(row: &PgRow) -> Result<HistoricoLembrete, StoreError> {
    let anterior: Option<String> = row.try_get("estado_anterior")?;
    Ok(HistoricoLembrete {
        id: row.try_get("id")?,
        lembrete_id: row.try_get("lembrete_id")?,
        estado_anterior: anterior.map(parse_enum).transpose()?,
        estado_novo: parse_enum(row.try_get("estado_novo")?)?,
        acao: parse_enum(row.try_get("acao")?)?,
        observacao: row.try_get("observacao")?,
        usuario_id: row.try_get("usuario_id")?,
        criado_em: row.try_get("criado_em")?,
    })
}

/// Appends one audit row inside the caller's transaction.
async fn append_historico(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    lembrete_id: i64,
    anterior: Option<StatusLembrete>,
    novo: StatusLembrete,
    acao: AcaoHistorico,
    observacao: Option<&str>,
    usuario_id: Uuid,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO lembretes_historico \
         (lembrete_id, estado_anterior, estado_novo, acao, observacao, usuario_id) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(lembrete_id)
    .bind(anterior.map(StatusLembrete::as_str))
    .bind(novo.as_str())
    .bind(acao.as_str())
    .bind(observacao)
    .bind(usuario_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_records
    ///
    /// `busca` is a case-insensitive substring match (`ILIKE`, wildcards in the
    /// term escaped) over the table's search fields.
    async fn list_records(
        &self,
        table: &'static Table,
        filter: &ListFilter,
    ) -> Result<Vec<Record>, StoreError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE 1 = 1",
            select_list(table),
            table.name
        ));

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(term));
            builder.push(" AND (");
            for (i, column) in table
                .search
                .iter()
                .filter_map(|field| table.column(field))
                .enumerate()
            {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(format!("{} ILIKE ", column.name));
                builder.push_bind(pattern.clone());
            }
            builder.push(")");
        }

        if let Some(parent) = filter.parent {
            if let Some(column) = table.parent.and_then(|field| table.column(field)) {
                builder.push(format!(" AND {} = ", column.name));
                builder.push_bind(parent);
            }
        }

        let sort = table.column(table.sort);
        match sort {
            Some(column) if matches!(column.kind, Kind::Text { .. }) => {
                builder.push(format!(" ORDER BY lower({}) ASC, id ASC", column.name));
            }
            Some(column) => {
                builder.push(format!(" ORDER BY {} ASC, id ASC", column.name));
            }
            None => {
                builder.push(" ORDER BY id ASC");
            }
        }

        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(|row| row_to_record(table, row)).collect()
    }

    async fn get_record(
        &self,
        table: &'static Table,
        id: i64,
    ) -> Result<Option<Record>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", select_list(table), table.name);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(|row| row_to_record(table, &row)).transpose()
    }

    /// insert_record
    ///
    /// `INSERT … SELECT … WHERE NOT EXISTS (duplicate)`: the uniqueness check
    /// and the insert are one statement. The unique indexes from the migration
    /// catch the remaining race and surface as `Conflict` too.
    async fn insert_record(
        &self,
        table: &'static Table,
        values: &Values,
    ) -> Result<Record, StoreError> {
        let columns = values.iter().map(|(c, _)| c.name).collect::<Vec<_>>().join(", ");
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} ({}) SELECT ", table.name, columns));
        for (i, (column, value)) in values.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, column, value);
        }

        let groups = candidate_groups(table, values);
        if !groups.is_empty() {
            builder.push(format!(" WHERE NOT EXISTS (SELECT 1 FROM {} WHERE ", table.name));
            push_duplicate_predicate(&mut builder, &groups);
            builder.push(")");
        }
        builder.push(format!(" RETURNING {}", select_list(table)));

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(table, e))?
            .ok_or(StoreError::Conflict)?;
        row_to_record(table, &row)
    }

    async fn update_record(
        &self,
        table: &'static Table,
        id: i64,
        values: &Values,
    ) -> Result<Record, StoreError> {
        let mut tx = self.pool.begin().await?;

        let lock = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", table.name);
        if sqlx::query(&lock).bind(id).fetch_optional(&mut *tx).await?.is_none() {
            return Err(StoreError::NotFound);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET ", table.name));
        for (i, (column, value)) in values.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(format!("{} = ", column.name));
            push_value(&mut builder, column, value);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let groups = candidate_groups(table, values);
        if !groups.is_empty() {
            builder.push(format!(
                " AND NOT EXISTS (SELECT 1 FROM {} WHERE id <> ",
                table.name
            ));
            builder.push_bind(id);
            builder.push(" AND (");
            push_duplicate_predicate(&mut builder, &groups);
            builder.push("))");
        }
        builder.push(format!(" RETURNING {}", select_list(table)));

        let row = builder
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_write_error(table, e))?
            .ok_or(StoreError::Conflict)?;
        let record = row_to_record(table, &row)?;
        tx.commit().await?;
        Ok(record)
    }

    async fn delete_record(&self, table: &'static Table, id: i64) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table.name);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_delete_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, nome, criado_em FROM usuarios WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, nome, criado_em, senha_hash FROM usuarios WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(UserCredentials {
                user: User {
                    id: row.try_get("id")?,
                    email: row.try_get("email")?,
                    nome: row.try_get("nome")?,
                    criado_em: row.try_get("criado_em")?,
                },
                senha_hash: row.try_get("senha_hash")?,
            })
        })
        .transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO usuarios (id, email, nome, senha_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, nome, criado_em",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.nome)
        .bind(&user.senha_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::Conflict
            }
            _ => StoreError::Database(e),
        })
    }

    async fn create_lembrete(
        &self,
        owner: Uuid,
        novo: NovoLembrete,
    ) -> Result<Lembrete, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO lembretes (usuario_id, titulo, descricao, prioridade, intervalo_minutos, \
             antecedencia_minutos, adiamento_minutos, proximo_disparo, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {LEMBRETE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(owner)
            .bind(&novo.titulo)
            .bind(&novo.descricao)
            .bind(novo.prioridade.as_str())
            .bind(novo.intervalo_minutos)
            .bind(novo.antecedencia_minutos)
            .bind(novo.adiamento_minutos)
            .bind(novo.proximo_disparo)
            .bind(StatusLembrete::Confirmado.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let lembrete = lembrete_from_row(&row)?;

        append_historico(
            &mut tx,
            lembrete.id,
            None,
            lembrete.status,
            AcaoHistorico::Criacao,
            novo.observacao.as_deref(),
            owner,
        )
        .await?;

        tx.commit().await?;
        Ok(lembrete)
    }

    async fn list_lembretes(&self, owner: Uuid) -> Result<Vec<Lembrete>, StoreError> {
        let sql = format!(
            "SELECT {LEMBRETE_COLUMNS} FROM lembretes WHERE usuario_id = $1 \
             ORDER BY proximo_disparo ASC, id ASC"
        );
        let rows = sqlx::query(&sql).bind(owner).fetch_all(&self.pool).await?;
        rows.iter().map(lembrete_from_row).collect()
    }

    async fn get_lembrete(&self, owner: Uuid, id: i64) -> Result<Option<Lembrete>, StoreError> {
        let sql =
            format!("SELECT {LEMBRETE_COLUMNS} FROM lembretes WHERE id = $1 AND usuario_id = $2");
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(lembrete_from_row).transpose()
    }

    async fn list_historico(
        &self,
        lembrete_id: i64,
    ) -> Result<Vec<HistoricoLembrete>, StoreError> {
        let sql = format!(
            "SELECT {HISTORICO_COLUMNS} FROM lembretes_historico WHERE lembrete_id = $1 \
             ORDER BY criado_em DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(lembrete_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(historico_from_row).collect()
    }

    /// change_lembrete_status
    ///
    /// The update is conditional on the status still being `anterior`, so two
    /// concurrent transitions cannot both append history.
    async fn change_lembrete_status(
        &self,
        owner: Uuid,
        id: i64,
        change: StatusChange,
    ) -> Result<Lembrete, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE lembretes SET status = $1, proximo_disparo = $2, atualizado_em = NOW() \
             WHERE id = $3 AND usuario_id = $4 AND status = $5 RETURNING {LEMBRETE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(change.novo.as_str())
            .bind(change.proximo_disparo)
            .bind(id)
            .bind(owner)
            .bind(change.anterior.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            let exists = sqlx::query("SELECT 1 FROM lembretes WHERE id = $1 AND usuario_id = $2")
                .bind(id)
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(if exists.is_some() {
                StoreError::Stale
            } else {
                StoreError::NotFound
            });
        };
        let lembrete = lembrete_from_row(&row)?;

        append_historico(
            &mut tx,
            id,
            Some(change.anterior),
            change.novo,
            AcaoHistorico::AlteracaoStatus,
            change.observacao.as_deref(),
            owner,
        )
        .await?;

        tx.commit().await?;
        Ok(lembrete)
    }

    async fn delete_lembrete(
        &self,
        owner: Uuid,
        id: i64,
        observacao: Option<String>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "DELETE FROM lembretes WHERE id = $1 AND usuario_id = $2 RETURNING status",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;
        let status: StatusLembrete = parse_enum(row.try_get("status")?)?;

        append_historico(
            &mut tx,
            id,
            Some(status),
            status,
            AcaoHistorico::Exclusao,
            observacao.as_deref(),
            owner,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn dashboard_resumo(&self, owner: Uuid) -> Result<DashboardResumo, StoreError> {
        let resumo = sqlx::query_as::<_, DashboardResumo>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM produtos) AS produtos_total,
                (SELECT COUNT(*) FROM produtos WHERE NOT bloqueado) AS produtos_ativos,
                (SELECT COUNT(*) FROM fabricantes) AS fabricantes_total,
                (SELECT COUNT(*) FROM fabricantes WHERE ativo AND liberado) AS fabricantes_ativos,
                (SELECT COUNT(*) FROM pedidos WHERE status IS NOT NULL) AS pedidos_total,
                (SELECT COUNT(*) FROM lembretes
                  WHERE usuario_id = $1 AND status NOT IN ('CONCLUIDO', 'CANCELADO')) AS lembretes_abertos
            "#,
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(resumo)
    }

    async fn vendas_por_dia(&self, desde: DateTime<Utc>) -> Result<Vec<VendaDiaria>, StoreError> {
        let vendas = sqlx::query_as::<_, VendaDiaria>(
            r#"
            SELECT (data_pedido AT TIME ZONE 'UTC')::date AS dia,
                   COUNT(*) AS pedidos,
                   COALESCE(SUM(valor), 0)::float8 AS valor
            FROM pedidos
            WHERE status IS NOT NULL AND data_pedido >= $1
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(desde)
        .fetch_all(&self.pool)
        .await?;
        Ok(vendas)
    }

    async fn vendas_por_regiao(
        &self,
        desde: DateTime<Utc>,
    ) -> Result<Vec<VendaPorRegiao>, StoreError> {
        let vendas = sqlx::query_as::<_, VendaPorRegiao>(
            r#"
            SELECT regiao_codigo,
                   COUNT(*) AS pedidos,
                   COALESCE(SUM(valor), 0)::float8 AS valor
            FROM pedidos
            WHERE status IS NOT NULL AND data_pedido >= $1
            GROUP BY regiao_codigo
            ORDER BY 3 DESC, 1 ASC
            "#,
        )
        .bind(desde)
        .fetch_all(&self.pool)
        .await?;
        Ok(vendas)
    }

    async fn vendas_por_fabricante(
        &self,
        desde: DateTime<Utc>,
    ) -> Result<Vec<VendaPorFabricante>, StoreError> {
        let vendas = sqlx::query_as::<_, VendaPorFabricante>(
            r#"
            SELECT p.fabricante_id,
                   f.nome AS fabricante_nome,
                   COUNT(*) AS pedidos,
                   COALESCE(SUM(p.valor), 0)::float8 AS valor
            FROM pedidos p
            LEFT JOIN fabricantes f ON f.id = p.fabricante_id
            WHERE p.status IS NOT NULL AND p.data_pedido >= $1
            GROUP BY p.fabricante_id, f.nome
            ORDER BY 4 DESC, 1 ASC
            "#,
        )
        .bind(desde)
        .fetch_all(&self.pool)
        .await?;
        Ok(vendas)
    }
}

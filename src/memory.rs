use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    cadastros::all_tables,
    error::StoreError,
    models::{
        AcaoHistorico, DashboardResumo, HistoricoLembrete, Lembrete, NewUser, NovoLembrete,
        Pedido, StatusChange, StatusLembrete, User, UserCredentials, VendaDiaria,
        VendaPorFabricante, VendaPorRegiao,
    },
    repository::Repository,
    schema::{CaseRule, FieldValue, Kind, ListFilter, Record, Table, Values},
};

#[derive(Default)]
struct TableRows {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<&'static str, TableRows>,
    users: Vec<UserCredentials>,
    lembretes: Vec<Lembrete>,
    historico: Vec<HistoricoLembrete>,
    pedidos: Vec<Pedido>,
    next_lembrete_id: i64,
    next_historico_id: i64,
}

impl MemoryState {
    fn rows(&self, table: &str) -> impl Iterator<Item = (&i64, &Record)> {
        self.tables.get(table).into_iter().flat_map(|t| t.rows.iter())
    }

    fn contains(&self, table: &str, id: i64) -> bool {
        self.tables
            .get(table)
            .is_some_and(|t| t.rows.contains_key(&id))
    }

    /// Every referenced id must exist.
    fn check_references(&self, values: &Values) -> Result<(), StoreError> {
        for (column, value) in values.iter() {
            if let (Some(target), FieldValue::Integer(id)) = (column.references, value) {
                if !self.contains(target, *id) {
                    return Err(StoreError::InvalidReference(column.field));
                }
            }
        }
        Ok(())
    }

    /// Any unique group matching a record other than `exclude`.
    fn has_duplicate(&self, table: &'static Table, values: &Values, exclude: Option<i64>) -> bool {
        table.unique.iter().any(|group| {
            let wanted: Option<Vec<_>> = group
                .iter()
                .map(|field| {
                    let column = table.column(field)?;
                    let value = values.get(field).filter(|v| !v.is_null())?;
                    Some((column, value))
                })
                .collect();
            let Some(wanted) = wanted else {
                return false;
            };

            self.rows(table.name)
                .filter(|(id, _)| Some(**id) != exclude)
                .any(|(_, record)| {
                    wanted.iter().all(|(column, value)| {
                        let stored = record.get(column.field).unwrap_or(&Value::Null);
                        let folded = column.case == CaseRule::Insensitive
                            && matches!(column.kind, Kind::Text { .. });
                        match (value, stored) {
                            (FieldValue::Text(a), Value::String(b)) if folded => {
                                a.to_lowercase() == b.to_lowercase()
                            }
                            (value, stored) => value.to_json() == *stored,
                        }
                    })
                })
        })
    }

    /// Label of the first table with a record pointing at `table`/`id`.
    fn referenced_by(&self, table: &'static Table, id: i64) -> Option<&'static str> {
        all_tables().into_iter().find_map(|other| {
            let in_use = other
                .columns
                .iter()
                .filter(|c| c.references == Some(table.name))
                .any(|column| {
                    self.rows(other.name)
                        .any(|(_, record)| record.get(column.field) == Some(&Value::from(id)))
                });
            in_use.then_some(other.label)
        })
    }

    fn push_historico(
        &mut self,
        lembrete_id: i64,
        anterior: Option<StatusLembrete>,
        novo: StatusLembrete,
        acao: AcaoHistorico,
        observacao: Option<String>,
        usuario_id: Uuid,
    ) {
        self.next_historico_id += 1;
        self.historico.push(HistoricoLembrete {
            id: self.next_historico_id,
            lembrete_id,
            estado_anterior: anterior,
            estado_novo: novo,
            acao,
            observacao,
            usuario_id,
            criado_em: Utc::now(),
        });
    }

    fn vendas_desde(&self, desde: DateTime<Utc>) -> impl Iterator<Item = &Pedido> {
        self.pedidos
            .iter()
            .filter(move |p| p.status.is_some() && p.data_pedido >= desde)
    }
}

/// Case-insensitive ordering key for list sorting.
fn sort_key(record: &Record, field: &str) -> (Option<String>, Option<i64>) {
    match record.get(field) {
        Some(Value::String(s)) => (Some(s.to_lowercase()), None),
        Some(Value::Number(n)) => (None, n.as_i64()),
        _ => (None, None),
    }
}

fn matches_search(table: &Table, record: &Record, term: &str) -> bool {
    let term = term.to_lowercase();
    table.search.iter().any(|field| {
        record
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|value| value.to_lowercase().contains(&term))
    })
}

/// Sales totals ordered by value descending, then key ascending with the
/// missing key last.
fn rank<K: Ord>(totals: HashMap<Option<K>, (i64, f64)>) -> Vec<(Option<K>, i64, f64)> {
    let mut ranked: Vec<_> = totals
        .into_iter()
        .map(|(key, (pedidos, valor))| (key, pedidos, valor))
        .collect();
    ranked.sort_by(|a, b| {
        b.2.total_cmp(&a.2).then_with(|| match (&a.0, &b.0) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    });
    ranked
}

/// InMemoryRepository
///
/// `Repository` kept in process memory, used by the test suite and by local
/// runs without `DATABASE_URL`. One lock guards the whole state, so every
/// check-then-write below is atomic.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an order, standing in for the ERP sync that fills `pedidos`.
    pub async fn seed_pedido(&self, pedido: Pedido) {
        self.state.lock().await.pedidos.push(pedido);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_records(
        &self,
        table: &'static Table,
        filter: &ListFilter,
    ) -> Result<Vec<Record>, StoreError> {
        let state = self.state.lock().await;
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let parent = filter.parent.zip(table.parent);

        let mut records: Vec<Record> = state
            .rows(table.name)
            .map(|(_, record)| record)
            .filter(|record| search.is_none_or(|term| matches_search(table, record, term)))
            .filter(|record| {
                parent.is_none_or(|(id, field)| record.get(field) == Some(&Value::from(id)))
            })
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            sort_key(a, table.sort)
                .cmp(&sort_key(b, table.sort))
                .then_with(|| sort_key(a, "id").cmp(&sort_key(b, "id")))
        });
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn get_record(
        &self,
        table: &'static Table,
        id: i64,
    ) -> Result<Option<Record>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .tables
            .get(table.name)
            .and_then(|t| t.rows.get(&id))
            .cloned())
    }

    async fn insert_record(
        &self,
        table: &'static Table,
        values: &Values,
    ) -> Result<Record, StoreError> {
        let mut state = self.state.lock().await;
        state.check_references(values)?;
        if state.has_duplicate(table, values, None) {
            return Err(StoreError::Conflict);
        }

        let rows = state.tables.entry(table.name).or_default();
        rows.next_id += 1;
        let record = values.to_record(rows.next_id);
        rows.rows.insert(rows.next_id, record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        table: &'static Table,
        id: i64,
        values: &Values,
    ) -> Result<Record, StoreError> {
        let mut state = self.state.lock().await;
        if !state.contains(table.name, id) {
            return Err(StoreError::NotFound);
        }
        state.check_references(values)?;
        if state.has_duplicate(table, values, Some(id)) {
            return Err(StoreError::Conflict);
        }

        let record = values.to_record(id);
        state
            .tables
            .entry(table.name)
            .or_default()
            .rows
            .insert(id, record.clone());
        Ok(record)
    }

    async fn delete_record(&self, table: &'static Table, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.contains(table.name, id) {
            return Err(StoreError::NotFound);
        }
        if let Some(label) = state.referenced_by(table, id) {
            return Err(StoreError::InUse(label.to_string()));
        }
        if let Some(rows) = state.tables.get_mut(table.name) {
            rows.rows.remove(&id);
        }
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|c| c.user.id == id)
            .map(|c| c.user.clone()))
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|c| c.user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|c| c.user.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Conflict);
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            nome: user.nome,
            criado_em: Utc::now(),
        };
        state.users.push(UserCredentials {
            user: created.clone(),
            senha_hash: user.senha_hash,
        });
        Ok(created)
    }

    async fn create_lembrete(
        &self,
        owner: Uuid,
        novo: NovoLembrete,
    ) -> Result<Lembrete, StoreError> {
        let mut state = self.state.lock().await;
        state.next_lembrete_id += 1;
        let now = Utc::now();
        let lembrete = Lembrete {
            id: state.next_lembrete_id,
            usuario_id: owner,
            titulo: novo.titulo,
            descricao: novo.descricao,
            prioridade: novo.prioridade,
            intervalo_minutos: novo.intervalo_minutos,
            antecedencia_minutos: novo.antecedencia_minutos,
            adiamento_minutos: novo.adiamento_minutos,
            proximo_disparo: novo.proximo_disparo,
            status: StatusLembrete::Confirmado,
            criado_em: now,
            atualizado_em: now,
        };
        state.lembretes.push(lembrete.clone());
        state.push_historico(
            lembrete.id,
            None,
            lembrete.status,
            AcaoHistorico::Criacao,
            novo.observacao,
            owner,
        );
        Ok(lembrete)
    }

    async fn list_lembretes(&self, owner: Uuid) -> Result<Vec<Lembrete>, StoreError> {
        let state = self.state.lock().await;
        let mut lembretes: Vec<Lembrete> = state
            .lembretes
            .iter()
            .filter(|l| l.usuario_id == owner)
            .cloned()
            .collect();
        lembretes.sort_by(|a, b| {
            a.proximo_disparo
                .cmp(&b.proximo_disparo)
                .then(a.id.cmp(&b.id))
        });
        Ok(lembretes)
    }

    async fn get_lembrete(&self, owner: Uuid, id: i64) -> Result<Option<Lembrete>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .lembretes
            .iter()
            .find(|l| l.id == id && l.usuario_id == owner)
            .cloned())
    }

    async fn list_historico(
        &self,
        lembrete_id: i64,
    ) -> Result<Vec<HistoricoLembrete>, StoreError> {
        let state = self.state.lock().await;
        let mut historico: Vec<HistoricoLembrete> = state
            .historico
            .iter()
            .filter(|h| h.lembrete_id == lembrete_id)
            .cloned()
            .collect();
        historico.sort_by(|a, b| b.criado_em.cmp(&a.criado_em).then(b.id.cmp(&a.id)));
        Ok(historico)
    }

    async fn change_lembrete_status(
        &self,
        owner: Uuid,
        id: i64,
        change: StatusChange,
    ) -> Result<Lembrete, StoreError> {
        let mut state = self.state.lock().await;
        let lembrete = state
            .lembretes
            .iter_mut()
            .find(|l| l.id == id && l.usuario_id == owner)
            .ok_or(StoreError::NotFound)?;
        if lembrete.status != change.anterior {
            return Err(StoreError::Stale);
        }

        lembrete.status = change.novo;
        lembrete.proximo_disparo = change.proximo_disparo;
        lembrete.atualizado_em = Utc::now();
        let updated = lembrete.clone();

        state.push_historico(
            id,
            Some(change.anterior),
            change.novo,
            AcaoHistorico::AlteracaoStatus,
            change.observacao,
            owner,
        );
        Ok(updated)
    }

    async fn delete_lembrete(
        &self,
        owner: Uuid,
        id: i64,
        observacao: Option<String>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let index = state
            .lembretes
            .iter()
            .position(|l| l.id == id && l.usuario_id == owner)
            .ok_or(StoreError::NotFound)?;
        let removed = state.lembretes.remove(index);

        state.push_historico(
            id,
            Some(removed.status),
            removed.status,
            AcaoHistorico::Exclusao,
            observacao,
            owner,
        );
        Ok(())
    }

    async fn dashboard_resumo(&self, owner: Uuid) -> Result<DashboardResumo, StoreError> {
        let state = self.state.lock().await;
        let flag = |record: &Record, field: &str| record.get(field) == Some(&Value::Bool(true));

        Ok(DashboardResumo {
            produtos_total: state.rows("produtos").count() as i64,
            produtos_ativos: state
                .rows("produtos")
                .filter(|(_, r)| !flag(*r, "bloqueado"))
                .count() as i64,
            fabricantes_total: state.rows("fabricantes").count() as i64,
            fabricantes_ativos: state
                .rows("fabricantes")
                .filter(|(_, r)| flag(*r, "ativo") && flag(*r, "liberado"))
                .count() as i64,
            pedidos_total: state.pedidos.iter().filter(|p| p.status.is_some()).count() as i64,
            lembretes_abertos: state
                .lembretes
                .iter()
                .filter(|l| l.usuario_id == owner && !l.status.is_final())
                .count() as i64,
        })
    }

    async fn vendas_por_dia(&self, desde: DateTime<Utc>) -> Result<Vec<VendaDiaria>, StoreError> {
        let state = self.state.lock().await;
        let mut por_dia: BTreeMap<NaiveDate, (i64, f64)> = BTreeMap::new();
        for pedido in state.vendas_desde(desde) {
            let entry = por_dia.entry(pedido.data_pedido.date_naive()).or_default();
            entry.0 += 1;
            entry.1 += pedido.valor;
        }

        Ok(por_dia
            .into_iter()
            .map(|(dia, (pedidos, valor))| VendaDiaria { dia, pedidos, valor })
            .collect())
    }

    async fn vendas_por_regiao(
        &self,
        desde: DateTime<Utc>,
    ) -> Result<Vec<VendaPorRegiao>, StoreError> {
        let state = self.state.lock().await;
        let mut totals: HashMap<Option<String>, (i64, f64)> = HashMap::new();
        for pedido in state.vendas_desde(desde) {
            let entry = totals.entry(pedido.regiao_codigo.clone()).or_default();
            entry.0 += 1;
            entry.1 += pedido.valor;
        }

        Ok(rank(totals)
            .into_iter()
            .map(|(regiao_codigo, pedidos, valor)| VendaPorRegiao {
                regiao_codigo,
                pedidos,
                valor,
            })
            .collect())
    }

    async fn vendas_por_fabricante(
        &self,
        desde: DateTime<Utc>,
    ) -> Result<Vec<VendaPorFabricante>, StoreError> {
        let state = self.state.lock().await;
        let mut totals: HashMap<Option<i64>, (i64, f64)> = HashMap::new();
        for pedido in state.vendas_desde(desde) {
            let entry = totals.entry(pedido.fabricante_id).or_default();
            entry.0 += 1;
            entry.1 += pedido.valor;
        }

        Ok(rank(totals)
            .into_iter()
            .map(|(fabricante_id, pedidos, valor)| VendaPorFabricante {
                fabricante_id,
                fabricante_nome: fabricante_id.and_then(|id| {
                    state
                        .tables
                        .get("fabricantes")
                        .and_then(|t| t.rows.get(&id))
                        .and_then(|r| r.get("nome"))
                        .and_then(Value::as_str)
                        .map(str::to_owned)
                }),
                pedidos,
                valor,
            })
            .collect())
    }
}

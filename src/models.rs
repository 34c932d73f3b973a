use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

// --- Users & Sessions ---

/// User
///
/// A dashboard operator. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nome: String,
    #[ts(type = "string")]
    pub criado_em: DateTime<Utc>,
}

/// A user row together with its Argon2id hash, used only by login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub senha_hash: String,
}

/// Validated registration data handed to the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub nome: String,
    pub senha_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub senha: Option<String>,
}

/// LoginResponse
///
/// The session token is returned in the body for API clients and set as the
/// `tremonte_session` cookie for browsers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    #[ts(type = "string")]
    pub expira_em: DateTime<Utc>,
    pub usuario: User,
}

/// What a page request resolves to once the gate lets it through.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageContext {
    pub locale: String,
    pub path: String,
    pub authenticated: bool,
    pub user_id: Option<Uuid>,
}

// --- Lembretes ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Prioridade {
    Baixa,
    #[default]
    Media,
    Alta,
    Urgente,
}

impl Prioridade {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baixa => "BAIXA",
            Self::Media => "MEDIA",
            Self::Alta => "ALTA",
            Self::Urgente => "URGENTE",
        }
    }
}

impl FromStr for Prioridade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BAIXA" => Ok(Self::Baixa),
            "MEDIA" => Ok(Self::Media),
            "ALTA" => Ok(Self::Alta),
            "URGENTE" => Ok(Self::Urgente),
            other => Err(format!("unknown prioridade `{other}`")),
        }
    }
}

/// StatusLembrete
///
/// `Concluido` and `Cancelado` are final: a reminder in either state no longer
/// accepts transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum StatusLembrete {
    #[default]
    Confirmado,
    Pendente,
    Adiado,
    Concluido,
    Cancelado,
}

impl StatusLembrete {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmado => "CONFIRMADO",
            Self::Pendente => "PENDENTE",
            Self::Adiado => "ADIADO",
            Self::Concluido => "CONCLUIDO",
            Self::Cancelado => "CANCELADO",
        }
    }

    pub fn is_final(self) -> bool {
        matches!(self, Self::Concluido | Self::Cancelado)
    }

    pub fn check_transition(self, next: StatusLembrete) -> AppResult<()> {
        if self.is_final() {
            return Err(AppError::Validation(format!(
                "Lembrete {} não pode mais ser alterado",
                self.as_str()
            )));
        }
        if self == next {
            return Err(AppError::Validation(format!(
                "Lembrete já está com status {}",
                next.as_str()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for StatusLembrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusLembrete {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMADO" => Ok(Self::Confirmado),
            "PENDENTE" => Ok(Self::Pendente),
            "ADIADO" => Ok(Self::Adiado),
            "CONCLUIDO" => Ok(Self::Concluido),
            "CANCELADO" => Ok(Self::Cancelado),
            other => Err(format!("unknown status `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum AcaoHistorico {
    Criacao,
    AlteracaoStatus,
    Exclusao,
}

impl AcaoHistorico {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Criacao => "CRIACAO",
            Self::AlteracaoStatus => "ALTERACAO_STATUS",
            Self::Exclusao => "EXCLUSAO",
        }
    }
}

impl FromStr for AcaoHistorico {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRIACAO" => Ok(Self::Criacao),
            "ALTERACAO_STATUS" => Ok(Self::AlteracaoStatus),
            "EXCLUSAO" => Ok(Self::Exclusao),
            other => Err(format!("unknown acao `{other}`")),
        }
    }
}

/// Lembrete
///
/// A reminder owned by one user. Triggering is data only: nothing in this
/// service fires reminders, `proximo_disparo` is read by the UI.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Lembrete {
    pub id: i64,
    pub usuario_id: Uuid,
    pub titulo: String,
    pub descricao: Option<String>,
    pub prioridade: Prioridade,
    /// Recurrence cadence in minutes.
    pub intervalo_minutos: i32,
    /// How long before `proximo_disparo` the reminder is shown.
    pub antecedencia_minutos: i32,
    /// Step applied to `proximo_disparo` when the reminder is postponed.
    pub adiamento_minutos: i32,
    #[ts(type = "string")]
    pub proximo_disparo: DateTime<Utc>,
    pub status: StatusLembrete,
    #[ts(type = "string")]
    pub criado_em: DateTime<Utc>,
    #[ts(type = "string")]
    pub atualizado_em: DateTime<Utc>,
}

/// HistoricoLembrete
///
/// One append-only audit row. Rows outlive the reminder they describe.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoricoLembrete {
    pub id: i64,
    pub lembrete_id: i64,
    pub estado_anterior: Option<StatusLembrete>,
    pub estado_novo: StatusLembrete,
    pub acao: AcaoHistorico,
    pub observacao: Option<String>,
    pub usuario_id: Uuid,
    #[ts(type = "string")]
    pub criado_em: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct LembreteDetalhe {
    pub lembrete: Lembrete,
    /// Newest first.
    pub historico: Vec<HistoricoLembrete>,
}

/// CreateLembreteRequest
///
/// Every field is optional at the wire level so that a missing one is reported
/// by name instead of as a generic deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateLembreteRequest {
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub prioridade: Option<Prioridade>,
    pub intervalo_minutos: Option<i32>,
    pub antecedencia_minutos: Option<i32>,
    pub adiamento_minutos: Option<i32>,
    #[ts(type = "string | null")]
    pub proximo_disparo: Option<DateTime<Utc>>,
    pub observacao: Option<String>,
}

/// Validated reminder data handed to the store.
#[derive(Debug, Clone)]
pub struct NovoLembrete {
    pub titulo: String,
    pub descricao: Option<String>,
    pub prioridade: Prioridade,
    pub intervalo_minutos: i32,
    pub antecedencia_minutos: i32,
    pub adiamento_minutos: i32,
    pub proximo_disparo: DateTime<Utc>,
    pub observacao: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AlterarStatusRequest {
    pub status: Option<StatusLembrete>,
    pub observacao: Option<String>,
}

/// A status transition checked against the reminder's current state.
/// The store applies it only if the status is still `anterior`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub anterior: StatusLembrete,
    pub novo: StatusLembrete,
    pub proximo_disparo: DateTime<Utc>,
    pub observacao: Option<String>,
}

// --- Dashboard ---

/// Pedido
///
/// An order loaded by the ERP sync. Read-only here; only orders with a
/// non-null `status` count as sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pedido {
    pub id: i64,
    #[ts(type = "string")]
    pub data_pedido: DateTime<Utc>,
    pub regiao_codigo: Option<String>,
    pub fabricante_id: Option<i64>,
    pub valor: f64,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardResumo {
    pub produtos_total: i64,
    pub produtos_ativos: i64,
    pub fabricantes_total: i64,
    pub fabricantes_ativos: i64,
    pub pedidos_total: i64,
    /// Caller's reminders that are not yet finished.
    pub lembretes_abertos: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VendaDiaria {
    #[ts(type = "string")]
    pub dia: NaiveDate,
    pub pedidos: i64,
    pub valor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VendaPorRegiao {
    pub regiao_codigo: Option<String>,
    pub pedidos: i64,
    pub valor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VendaPorFabricante {
    pub fabricante_id: Option<i64>,
    pub fabricante_nome: Option<String>,
    pub pedidos: i64,
    pub valor: f64,
}

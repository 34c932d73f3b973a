use serde::{Deserialize, Serialize, de::DeserializeOwned};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::schema::{Column, Table};

/// Cadastro
///
/// Binds a typed master-data model to the table descriptor that drives its
/// validation and persistence. The generic handlers in `handlers::cadastros`
/// are instantiated once per implementor.
pub trait Cadastro: Serialize + DeserializeOwned + Send + 'static {
    fn table() -> &'static Table;
}

// --- Estados ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Estado {
    pub id: i64,
    pub nome: String,
    /// Two-letter code, stored upper case.
    pub uf: String,
}

pub static ESTADOS: Table = Table {
    resource: "estados",
    name: "estados",
    label: "estados",
    columns: &[
        Column::text("nome", "nome", 60).required().ignore_case(),
        Column::text("uf", "uf", 2).required().ignore_case().upper(),
    ],
    unique: &[&["nome"], &["uf"]],
    conflict: "Estado ou UF já existe",
    search: &["nome", "uf"],
    parent: None,
    sort: "nome",
};

impl Cadastro for Estado {
    fn table() -> &'static Table {
        &ESTADOS
    }
}

// --- Unidades de medida ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Unidade {
    pub id: i64,
    pub sigla: String,
    pub descricao: String,
}

pub static UNIDADES: Table = Table {
    resource: "unidades",
    name: "unidades",
    label: "unidades de medida",
    columns: &[
        Column::text("sigla", "sigla", 6).required().ignore_case().upper(),
        Column::text("descricao", "descricao", 60).required().ignore_case(),
    ],
    unique: &[&["sigla"], &["descricao"]],
    conflict: "Unidade ou descrição já existe",
    search: &["sigla", "descricao"],
    parent: None,
    sort: "sigla",
};

impl Cadastro for Unidade {
    fn table() -> &'static Table {
        &UNIDADES
    }
}

// --- Grupos de produto ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GrupoProduto {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
}

pub static GRUPOS_PRODUTO: Table = Table {
    resource: "grupos-produto",
    name: "grupos_produto",
    label: "grupos de produto",
    columns: &[
        Column::text("codigo", "codigo", 6).required().ignore_case().upper(),
        Column::text("descricao", "descricao", 60).required().ignore_case(),
    ],
    unique: &[&["codigo"], &["descricao"]],
    conflict: "Grupo de produto com este código ou descrição já existe",
    search: &["codigo", "descricao"],
    parent: None,
    sort: "descricao",
};

impl Cadastro for GrupoProduto {
    fn table() -> &'static Table {
        &GRUPOS_PRODUTO
    }
}

// --- Fabricantes ---

/// A manufacturer counts as active only when both `ativo` and `liberado` are set.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Fabricante {
    pub id: i64,
    pub codigo: String,
    pub nome: String,
    pub ativo: bool,
    pub liberado: bool,
}

pub static FABRICANTES: Table = Table {
    resource: "fabricantes",
    name: "fabricantes",
    label: "fabricantes",
    columns: &[
        Column::text("codigo", "codigo", 6).required().ignore_case().upper(),
        Column::text("nome", "nome", 60).required().ignore_case(),
        Column::boolean("ativo", "ativo", true),
        Column::boolean("liberado", "liberado", true),
    ],
    unique: &[&["codigo"], &["nome"]],
    conflict: "Fabricante com este código ou nome já existe",
    search: &["codigo", "nome"],
    parent: None,
    sort: "nome",
};

impl Cadastro for Fabricante {
    fn table() -> &'static Table {
        &FABRICANTES
    }
}

// --- Marcas ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Marca {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
    pub fabricante_id: i64,
}

pub static MARCAS: Table = Table {
    resource: "marcas",
    name: "marcas",
    label: "marcas",
    columns: &[
        Column::text("codigo", "codigo", 6).required().ignore_case().upper(),
        Column::text("descricao", "descricao", 60).required().ignore_case(),
        Column::integer("fabricante_id", "fabricanteId")
            .required()
            .references("fabricantes"),
    ],
    unique: &[&["codigo"], &["descricao"]],
    conflict: "Marca com este código ou descrição já existe",
    search: &["codigo", "descricao"],
    parent: Some("fabricanteId"),
    sort: "descricao",
};

impl Cadastro for Marca {
    fn table() -> &'static Table {
        &MARCAS
    }
}

// --- Produtos ---

/// A product counts as active while it is not `bloqueado`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Produto {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
    pub fabricante_id: Option<i64>,
    pub marca_id: Option<i64>,
    pub grupo_produto_id: Option<i64>,
    pub unidade_id: Option<i64>,
    pub bloqueado: bool,
}

pub static PRODUTOS: Table = Table {
    resource: "produtos",
    name: "produtos",
    label: "produtos",
    columns: &[
        Column::text("codigo", "codigo", 20).required().ignore_case().upper(),
        Column::text("descricao", "descricao", 120).required().ignore_case(),
        Column::integer("fabricante_id", "fabricanteId").references("fabricantes"),
        Column::integer("marca_id", "marcaId").references("marcas"),
        Column::integer("grupo_produto_id", "grupoProdutoId").references("grupos_produto"),
        Column::integer("unidade_id", "unidadeId").references("unidades"),
        Column::boolean("bloqueado", "bloqueado", false),
    ],
    unique: &[&["codigo"], &["descricao"]],
    conflict: "Produto com este código ou descrição já existe",
    search: &["codigo", "descricao"],
    parent: Some("fabricanteId"),
    sort: "descricao",
};

impl Cadastro for Produto {
    fn table() -> &'static Table {
        &PRODUTOS
    }
}

// --- Critérios de pagamento ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CriterioPagamento {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
    pub prazo_dias: Option<i64>,
    pub ativo: bool,
}

pub static CRITERIOS_PAGAMENTO: Table = Table {
    resource: "criterios-pagamento",
    name: "criterios_pagamento",
    label: "critérios de pagamento",
    columns: &[
        Column::text("codigo", "codigo", 6).required().ignore_case().upper(),
        Column::text("descricao", "descricao", 60).required().ignore_case(),
        Column::integer("prazo_dias", "prazoDias"),
        Column::boolean("ativo", "ativo", true),
    ],
    unique: &[&["codigo"], &["descricao"]],
    conflict: "Critério de pagamento com este código ou descrição já existe",
    search: &["codigo", "descricao"],
    parent: None,
    sort: "descricao",
};

impl Cadastro for CriterioPagamento {
    fn table() -> &'static Table {
        &CRITERIOS_PAGAMENTO
    }
}

// --- Motivos de bloqueio de venda ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MotivoBloqueio {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
}

pub static MOTIVOS_BLOQUEIO: Table = Table {
    resource: "motivos-bloqueio",
    name: "motivos_bloqueio",
    label: "motivos de bloqueio",
    columns: &[
        Column::text("codigo", "codigo", 6).required().ignore_case().upper(),
        Column::text("descricao", "descricao", 60).required().ignore_case(),
    ],
    unique: &[&["codigo"], &["descricao"]],
    conflict: "Motivo de bloqueio com este código ou descrição já existe",
    search: &["codigo", "descricao"],
    parent: None,
    sort: "descricao",
};

impl Cadastro for MotivoBloqueio {
    fn table() -> &'static Table {
        &MOTIVOS_BLOQUEIO
    }
}

// --- Grupos de cliente ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GrupoCliente {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
}

pub static GRUPOS_CLIENTE: Table = Table {
    resource: "grupos-cliente",
    name: "grupos_cliente",
    label: "grupos de cliente",
    columns: &[
        Column::text("codigo", "codigo", 6).required().ignore_case().upper(),
        Column::text("descricao", "descricao", 60).required().ignore_case(),
    ],
    unique: &[&["codigo"], &["descricao"]],
    conflict: "Grupo de cliente com este código ou descrição já existe",
    search: &["codigo", "descricao"],
    parent: None,
    sort: "descricao",
};

impl Cadastro for GrupoCliente {
    fn table() -> &'static Table {
        &GRUPOS_CLIENTE
    }
}

// --- Tabelas de preço ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TabelaPreco {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
    pub ativo: bool,
}

pub static TABELAS_PRECO: Table = Table {
    resource: "tabelas-preco",
    name: "tabelas_preco",
    label: "tabelas de preço",
    columns: &[
        Column::text("codigo", "codigo", 6).required().ignore_case().upper(),
        Column::text("descricao", "descricao", 60).required().ignore_case(),
        Column::boolean("ativo", "ativo", true),
    ],
    unique: &[&["codigo"], &["descricao"]],
    conflict: "Tabela de preço com este código ou descrição já existe",
    search: &["codigo", "descricao"],
    parent: None,
    sort: "codigo",
};

impl Cadastro for TabelaPreco {
    fn table() -> &'static Table {
        &TABELAS_PRECO
    }
}

// --- Vendedor x região ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VendedorRegiao {
    pub id: i64,
    pub vendedor_codigo: String,
    pub regiao_codigo: String,
}

pub static VENDEDORES_REGIOES: Table = Table {
    resource: "vendedores-regioes",
    name: "vendedores_regioes",
    label: "associações de vendedor",
    columns: &[
        Column::text("vendedor_codigo", "vendedorCodigo", 20)
            .required()
            .ignore_case()
            .upper(),
        Column::text("regiao_codigo", "regiaoCodigo", 20)
            .required()
            .ignore_case()
            .upper(),
    ],
    unique: &[&["vendedorCodigo", "regiaoCodigo"]],
    conflict: "Vendedor já associado a esta região",
    search: &["vendedorCodigo", "regiaoCodigo"],
    parent: None,
    sort: "vendedorCodigo",
};

impl Cadastro for VendedorRegiao {
    fn table() -> &'static Table {
        &VENDEDORES_REGIOES
    }
}

/// Every cadastro table, in dependency order (referenced tables first).
pub fn all_tables() -> [&'static Table; 11] {
    [
        &ESTADOS,
        &UNIDADES,
        &GRUPOS_PRODUTO,
        &FABRICANTES,
        &MARCAS,
        &PRODUTOS,
        &CRITERIOS_PAGAMENTO,
        &MOTIVOS_BLOQUEIO,
        &GRUPOS_CLIENTE,
        &TABELAS_PRECO,
        &VENDEDORES_REGIOES,
    ]
}

/// Looks a table up by its SQL name.
pub fn table_by_name(name: &str) -> Option<&'static Table> {
    all_tables().into_iter().find(|t| t.name == name)
}

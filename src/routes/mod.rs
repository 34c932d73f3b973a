//! Router Module Index
//!
//! API routes are split by access level. Protection is applied as a layer on
//! the whole authenticated router, so a handler cannot be exposed by
//! forgetting an extractor.

/// Expands `$router.merge($routes::<Model>())` for every cadastro model.
macro_rules! for_each_cadastro {
    ($router:expr, $routes:ident) => {
        $router
            .merge($routes::<$crate::cadastros::Estado>())
            .merge($routes::<$crate::cadastros::Unidade>())
            .merge($routes::<$crate::cadastros::GrupoProduto>())
            .merge($routes::<$crate::cadastros::Fabricante>())
            .merge($routes::<$crate::cadastros::Marca>())
            .merge($routes::<$crate::cadastros::Produto>())
            .merge($routes::<$crate::cadastros::CriterioPagamento>())
            .merge($routes::<$crate::cadastros::MotivoBloqueio>())
            .merge($routes::<$crate::cadastros::GrupoCliente>())
            .merge($routes::<$crate::cadastros::TabelaPreco>())
            .merge($routes::<$crate::cadastros::VendedorRegiao>())
    };
}

/// Routes reachable without a session: login flow and the `parametros`
/// selection lists.
pub mod public;

/// Routes behind the `AuthUser` layer.
pub mod authenticated;

use axum::{Extension, Json, http::Uri};

use crate::{gate::PageSession, models::PageContext};

/// render
///
/// Answers every page request the gate lets through. The frontend bundle owns
/// the markup; this returns what the gate resolved for the path.
pub async fn render(Extension(session): Extension<PageSession>, uri: Uri) -> Json<PageContext> {
    Json(PageContext {
        locale: session.locale.to_string(),
        path: uri.path().to_string(),
        authenticated: session.user_id.is_some(),
        user_id: session.user_id,
    })
}

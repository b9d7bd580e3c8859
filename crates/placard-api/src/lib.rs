pub mod accounts;
pub mod claims;
pub mod elections;
pub mod error;
pub mod join_requests;
pub mod middleware;
pub mod parties;
pub mod posters;
pub mod routes;

use std::sync::Arc;

use placard_db::Database;

use crate::claims::TokenService;
use crate::error::ApiResult;

/// Default radius, in metres, within which a removal request can match a poster.
pub const DEFAULT_REMOVE_RADIUS_M: f64 = 20.0;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub remove_radius_m: f64,
}

/// Runs blocking store work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppStateInner) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state)).await?
}

/// Rejects an id the client left unset.
pub(crate) fn require_id(value: i64, field: &str) -> ApiResult<()> {
    if value <= 0 {
        return Err(error::ApiError::validation(format!("{} not set", field)));
    }
    Ok(())
}

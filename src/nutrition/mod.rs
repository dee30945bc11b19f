pub mod calories;
pub mod handlers;
pub mod totals;

use crate::state::AppState;
use axum::Router;

pub use calories::calories_from_macros;
pub use totals::MacroTotals;

pub fn router() -> Router<AppState> {
    handlers::nutrition_routes()
}

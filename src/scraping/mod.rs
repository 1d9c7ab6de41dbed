pub mod auth;
pub mod browser_manager;
pub mod consent;
pub mod session;
pub mod stealth;
pub mod tournament;

pub use auth::{login, try_login, AuthState};
pub use consent::resolve_popups;
pub use session::{ScoutSession, SessionContext};
pub use tournament::{discover_tournaments, ScrapeUrls};

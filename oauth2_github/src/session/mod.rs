mod accessor;
mod memory;
mod types;

pub use accessor::{AuthSession, REDIRECT_SESSION_KEY, STATE_SESSION_KEY};
pub use memory::InMemorySessionStore;
pub use types::{FlowSession, SessionStore, StoreSession, new_session_id};

pub(crate) use accessor::{read_access_token, read_profile};

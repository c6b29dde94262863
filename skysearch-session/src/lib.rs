pub mod navigation;
pub mod resolver;
pub mod session;

pub use navigation::{MemoryNavigation, NavigationStore};
pub use resolver::{LocationResolver, ResolverSettings, ResolverSnapshot, ResolverStatus};
pub use session::{FetchStatus, SearchOutcome, SearchSession, SearchTicket, SessionError, SessionView};

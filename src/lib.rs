pub mod errors;
pub mod models;
pub mod services;
pub mod state;


// Re-export commonly used types
pub use errors::{PushError, PushResult};
pub use models::{NotificationPayload, ProviderKind, PushToken, RemoteMessage, Selection};

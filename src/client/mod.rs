//! Client side of the storefront: a persistent per-browser session id, a typed
//! HTTP client for the JSON API, and the cached cart state a UI renders from.

pub mod cart_state;
pub mod error;
pub mod http;
pub mod session;

pub use cart_state::{CartApi, CartState};
pub use error::{ClientError, ClientResult};
pub use http::{ClientConfig, StorefrontClient};
pub use session::{FileStorage, MemoryStorage, SessionIdProvider, SessionStorage};

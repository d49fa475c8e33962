mod cache;
mod check;
mod engine;
mod memory;

pub use cache::CheckCache;
pub use check::{AuthorizationEngine, CheckOptions, DEFAULT_CHECK_TIMEOUT};
pub use engine::{AuthzEngine, CheckQuery};
pub use memory::MemoryAuthzEngine;

#[cfg(any(test, feature = "testing"))]
pub use engine::MockAuthzEngine;

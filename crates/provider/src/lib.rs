pub mod catalog;
pub mod error;
pub mod provider;
pub mod registry;

pub use error::ProviderError;
pub use provider::{Capability, Provider, ProviderCategory};
pub use registry::ProviderRegistry;

//! Shared registry, KV backend adapter and data model for dnswall's DNS
//! front-end and discovery agent.

pub mod backend;
pub mod error;
pub mod key;
pub mod model;
pub mod registry;
pub mod supervisor;

pub use backend::{Backend, BackendUrl, KvError, Leaf};
pub use backend::etcd::EtcdBackend;
pub use error::{Error, Result};
pub use model::{DomainDetail, DomainItem};
pub use registry::Registry;
pub use supervisor::Supervisor;

//! SkillSwap Registry Adapter
//!
//! Client-side access layer for the SkillSwap registry contract. The contract
//! offers point lookups and counters only; this crate builds the views an
//! application needs on top of them and tracks writes to completion.
//!
//! Components, leaf first:
//! - [`resolver`]: registry id to contract address, cached per process
//! - [`transport`]: the network seam ([`rpc_transport`] over JSON-RPC)
//! - [`rpc_client`]: failure-isolating point reads plus read metrics
//! - [`aggregation`]: counter-bounded scans (listings by creator, proposals by
//!   participant, active listings, owned tokens)
//! - [`lifecycle`]: `Composing -> Submitted -> Confirmed | Failed` write tracking
//! - [`adapter`]: the façade tying them together
//!
//! Read paths never fail: unavailable data comes back empty and is counted in
//! [`rpc_client::Metrics`]. Write paths always report their outcome through a
//! [`lifecycle::TxHandle`].

pub mod adapter;
pub mod aggregation;
pub mod error;
pub mod lifecycle;
pub mod resolver;
pub mod rpc_client;
pub mod rpc_transport;
pub mod testing;
pub mod transport;

pub use adapter::{ProfileSummary, RegistryAdapter};
pub use aggregation::{RegistryQueries, ScanAggregator};
pub use error::{ResolveError, TransportError};
pub use lifecycle::{split_skills, LifecycleManager, RegistrationCheck, TxFailure, TxHandle, TxStatus};
pub use resolver::{AddressResolver, DirectoryLookup, MirrorNodeLookup};
pub use rpc_client::{Metrics, PointReader, ReadMetrics};
pub use rpc_transport::RpcTransport;
pub use transport::{ReadCall, ReceiptOutcome, RegistryTransport, WriteCall};

//! # proxymgr-codegen
//!
//! Drives the external proxy generator and inspects what it produced.
//!
//! - [`invoker`] — argument construction and the bounded child-process run
//!   behind the [`CodeGenerator`] trait
//! - [`contract`] — declaration-tree scan answering "does the artifact
//!   declare a service contract?"

pub mod contract;
pub mod error;
pub mod invoker;

pub use contract::has_service_contract;
pub use error::{ContractError, GenerationError};
pub use invoker::{
    build_arguments, namespace_for, CodeGenerator, GenerationOutcome, GenerationRequest,
    ProcessGenerator,
};

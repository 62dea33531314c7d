//! The creator-client port trait.
//!
//! The engine fans out to creator services exclusively through this trait;
//! transport adapters (HTTP in `creator-api`, in-memory scripted creators in
//! tests) implement it. The engine never learns what carries the call.

use async_trait::async_trait;

use crate::{CreatorError, CreatorRequest, CreatorResponse};

/// One resolve call to a single creator service.
///
/// Implementations must be cheap to call concurrently: the fan-out
/// coordinator invokes every registered client in parallel, once per
/// iteration, always with the full current dependency set.
#[async_trait]
pub trait CreatorClient: Send + Sync {
    /// Asks the creator to classify whichever fragments it understands.
    ///
    /// A creator that understands none of the fragments returns an empty
    /// response rather than an error; [`CreatorError`] is reserved for calls
    /// that could not complete.
    async fn resolve(&self, request: CreatorRequest) -> Result<CreatorResponse, CreatorError>;
}

//! ModelGateway trait — the abstraction over the hosted model API.
//!
//! A gateway sends one prompt (plus the registry's tool declarations) to
//! the external model and returns the parsed, ordered part sequence. The
//! call is a single blocking request/response; the model's own output is
//! never streamed — only the local fan-out of its result is incremental.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::part::Part;
use crate::tool::ToolDeclaration;

/// The model gateway contract.
///
/// Implementations live in `patchchat-providers`. A failed call means no
/// patches are emitted for the turn; the failure surfaces as ordinary
/// chat content, never a raw fault.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send one prompt and the advertised tools; get back the ordered
    /// parts of the model's response.
    async fn complete(
        &self,
        prompt: &str,
        tools: &[ToolDeclaration],
    ) -> std::result::Result<Vec<Part>, GatewayError>;
}

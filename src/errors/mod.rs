mod relay_error;
mod rpc_error;

pub use relay_error::{RelayError, RelayErrorKind};
pub use rpc_error::{ErrorCode, RpcError};

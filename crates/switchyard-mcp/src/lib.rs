pub mod codec;
pub mod jsonrpc;
pub mod normalize;
pub mod protocol;
pub mod tools;

pub use codec::{decode_response, encode_notification, encode_request, EncodedRequest};
pub use jsonrpc::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
pub use normalize::{normalize, normalize_tools, ProviderResponse, ProviderTool};
pub use tools::GatewayTools;

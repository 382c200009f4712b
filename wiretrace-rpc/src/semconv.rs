//! Attribute keys recorded on RPC spans.

/// The RPC system, always `grpc`.
pub const RPC_SYSTEM: &str = "rpc.system";
/// Service part of the called method.
pub const RPC_SERVICE: &str = "rpc.service";
/// Method part of the called method.
pub const RPC_METHOD: &str = "rpc.method";
/// Numeric gRPC status code, recorded on failed calls only.
pub const RPC_GRPC_STATUS_CODE: &str = "rpc.grpc.status_code";
/// Component that produced the span.
pub const COMPONENT: &str = "component";

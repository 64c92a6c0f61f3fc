//! JSON-RPC 2.0 message codec.
//!
//! Both transports speak the same envelope format:
//!
//! ```json
//! {"jsonrpc":"2.0","method":"echo.echo","params":{"message":"hi"},"id":1}
//! ```
//!
//! and receive either a `result` or an `error`, never both:
//!
//! ```json
//! {"jsonrpc":"2.0","result":{"message":"hi","timestamp":"..."},"id":1}
//! {"jsonrpc":"2.0","error":{"code":-32601,"message":"...","data":{...}},"id":1}
//! ```
//!
//! Every encoded message ends with a single `\n`. The stream transport relies
//! on this for framing ([`FrameBuffer`]); datagram replies carry it as well.

mod codec;
mod envelope;
mod frame;

pub use self::codec::{Incoming, decode, encode, encode_batch};
pub use self::envelope::{
    ErrorObject, JSONRPC_VERSION, Outgoing, Request, RequestId, Response, ResponsePayload,
};
pub use self::frame::{FrameBuffer, FrameEvent};

const CODEC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::codec");

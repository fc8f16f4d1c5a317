//! Conversation state and the streaming chat transport.

mod conversation;
mod decode;
mod transport;

pub use conversation::{Conversation, Message, Role};
pub use decode::ChunkAssembler;
pub use transport::ChatTransport;

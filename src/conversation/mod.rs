//! Conversation reassembly.
//!
//! Sessions are classified as request or response side by the service port,
//! resolved to a shared `ConversationId` and attached as the two halves of a
//! `Conversation`. `summarize` turns the result into a `Report`.

mod canonical;
mod reassembler;
mod report;

pub use canonical::{ConversationId, Role, canonicalize};
pub use reassembler::{
    Conversation, ConversationState, Half, Reassembler, Reassembly, ReassemblyStats, reassemble,
};
pub use report::{Report, summarize};

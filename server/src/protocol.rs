//! Wire message conventions for the relay.
//!
//! These strings are what existing clients parse, so they are kept verbatim,
//! including the `#` prefix that the join notice alone omits.

use crate::ws::ClientId;

/// Broadcast to other clients when a client connects.
pub fn join_notice(id: ClientId) -> String {
    format!("Client {}: joined the chat", id)
}

/// Echo sent back to the author of a message.
pub fn echo_reply(data: &str) -> String {
    format!("You wrote: {}", data)
}

/// Relay of a message to everyone except its author.
pub fn relay_notice(id: ClientId, data: &str) -> String {
    format!("Client #{} says: {}", id, data)
}

/// Broadcast to remaining clients when a client disconnects.
pub fn leave_notice(id: ClientId) -> String {
    format!("Client #{} left the chat", id)
}

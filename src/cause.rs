//! Resolving a readable message from an error chain.

use std::error::Error as StdError;
use std::panic::Location;

/// Longest chain walked before giving up on finding the root.
const MAX_DEPTH: usize = 128;

/// Walk `err`'s source chain to its root and describe it.
///
/// The walk stops at the first node that was already visited, so chains
/// that loop back on themselves terminate. When the root has an empty
/// description, `"<root debug> @ <location>"` is used instead.
///
/// The fallback formats the root with `Debug`, so errors that can sit in a
/// cyclic chain need a `Debug` impl that does not follow their source link.
pub fn root_cause_message(err: &(dyn StdError + 'static), location: &Location<'_>) -> String {
    let root = root_cause(err);
    let message = root.to_string();

    if message.is_empty() {
        format!("{:?} @ {}", root, location)
    } else {
        message
    }
}

/// The last distinct error in `err`'s source chain.
///
/// Nodes are compared by data pointer and vtable: a newtype and the error
/// it wraps share an address but are different nodes. The walk is capped at
/// `MAX_DEPTH` hops.
pub fn root_cause<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut visited: Vec<*const dyn StdError> = vec![err as *const dyn StdError];
    let mut root = err;

    while let Some(next) = root.source() {
        if visited.len() >= MAX_DEPTH || visited.iter().any(|&seen| std::ptr::eq(seen, next)) {
            break;
        }
        visited.push(next);
        root = next;
    }

    root
}

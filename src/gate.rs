//! Decryption gate: decides per message whether the local identity may
//! attempt decryption at all, and converts the outcome into displayable
//! text.
//!
//! Outgoing messages are encrypted with the sender included as a recipient
//! (sender-as-first-recipient), so the gate admits both directions.  A
//! permissions gap and a technical decrypt failure produce distinct
//! placeholders — callers must be able to tell them apart.

use crate::store::{Decryptor, MessageRow};

/// Shown when the local identity is neither sender nor recipient.  The
/// decrypt capability is never invoked in that case.
pub const NO_ACCESS_PLACEHOLDER: &str = "[encrypted]";

/// Shown when decryption was attempted and the capability failed, or the
/// plaintext was not valid UTF-8.
pub const DECRYPT_FAILED_PLACEHOLDER: &str = "[decryption failed]";

/// Outcome of one gate pass for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayText {
    Plaintext(String),
    NoAccess,
    DecryptFailed,
}

impl DisplayText {
    /// The text a transcript line should carry.
    pub fn text(&self) -> &str {
        match self {
            DisplayText::Plaintext(body) => body,
            DisplayText::NoAccess => NO_ACCESS_PLACEHOLDER,
            DisplayText::DecryptFailed => DECRYPT_FAILED_PLACEHOLDER,
        }
    }
}

/// Gate-checked decryption for a one-to-one message.
///
/// Decryption is attempted only when the local identity is the message's
/// recipient or its sender; otherwise the no-access placeholder is returned
/// without touching the decrypt capability.  No retry happens within a
/// render pass — a later full reload re-invokes the gate from scratch.
pub fn attempt_decrypt<D: Decryptor + ?Sized>(
    decryptor: &D,
    msg: &MessageRow,
    local_identity: &str,
) -> DisplayText {
    if msg.recipient != local_identity && msg.sender != local_identity {
        return DisplayText::NoAccess;
    }
    decrypt_for_display(decryptor, msg.id)
}

/// Ungated decryption, used for group messages where the recipient set is
/// not visible to the client and membership authorization is already
/// enforced by the store/crypto layer.
pub fn decrypt_for_display<D: Decryptor + ?Sized>(decryptor: &D, message_id: i64) -> DisplayText {
    match decryptor.decrypt(message_id) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(body) => DisplayText::Plaintext(body),
            Err(_) => DisplayText::DecryptFailed,
        },
        Err(_) => DisplayText::DecryptFailed,
    }
}

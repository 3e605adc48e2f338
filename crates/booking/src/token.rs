//! Payment-reference token generation.

use rand::Rng;
use sha2::{Digest, Sha256};

use billcraft_core::CustomerId;

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a payment token in characters.
pub const TOKEN_LEN: usize = 20;

/// Generate the opaque payment-reference token for a published invoice.
///
/// A 16-byte random component mixed with the customer id and the document
/// number, folded through SHA-256 and mapped onto a compact lowercase
/// alphanumeric alphabet. Unguessable enough for a public payment-lookup
/// URL and URL-safe; not a security credential.
pub fn payment_token(customer_id: CustomerId, document_number: &str) -> String {
    let nonce: [u8; 16] = rand::thread_rng().r#gen();

    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(customer_id.as_uuid().as_bytes());
    hasher.update(document_number.as_bytes());
    let digest = hasher.finalize();

    digest
        .iter()
        .take(TOKEN_LEN)
        .map(|b| TOKEN_ALPHABET[usize::from(*b) % TOKEN_ALPHABET.len()] as char)
        .collect()
}

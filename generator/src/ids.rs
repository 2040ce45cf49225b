//! Random trace and span identifiers.
//!
//! IDs are lowercase hex, 16 bytes for traces and 8 bytes for spans, and
//! never all zero (the all-zero value is invalid in W3C trace context).

use rand::Rng;

fn random_hex<R: Rng + ?Sized, const N: usize>(rng: &mut R) -> String {
    let mut bytes = [0u8; N];
    while bytes.iter().all(|b| *b == 0) {
        rng.fill(&mut bytes[..]);
    }
    hex::encode(bytes)
}

/// Generates a 32-character trace ID.
pub fn trace_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_hex::<R, 16>(rng)
}

/// Generates a 16-character span ID.
pub fn span_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_hex::<R, 8>(rng)
}

//! Utilidades compartidas

pub mod errors;
pub mod stripe_signature;

//! Verificación de firma de webhooks de Stripe
//!
//! HMAC-SHA256 sobre `"{timestamp}.{body}"` contra el secreto compartido,
//! con ventana de tolerancia de timestamp y comparación en tiempo
//! constante. Falla cerrado: cualquier problema con la firma rechaza el
//! evento sin ejecutar side effects.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;

use crate::utils::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Verificar el header `stripe-signature` contra el payload crudo
pub fn verify_signature(
    payload: &[u8],
    headers: &HeaderMap,
    webhook_secret: &str,
    tolerance_seconds: i64,
) -> Result<(), AppError> {
    if webhook_secret.is_empty() {
        return Err(AppError::InvalidSignature(
            "webhook secret is not configured".to_string(),
        ));
    }

    let signature_header = headers
        .get("stripe-signature")
        .or_else(|| headers.get("Stripe-Signature"))
        .ok_or_else(|| AppError::InvalidSignature("missing stripe-signature header".to_string()))?
        .to_str()
        .map_err(|e| AppError::InvalidSignature(format!("invalid header encoding: {}", e)))?;

    // Formato del header: t=timestamp,v1=firma[,v1=firma2,...]
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let kv: Vec<&str> = part.splitn(2, '=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => timestamp = kv[1].parse().ok(),
            "v1" => signatures.push(kv[1]),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        AppError::InvalidSignature("missing timestamp in signature header".to_string())
    })?;

    if signatures.is_empty() {
        return Err(AppError::InvalidSignature("no v1 signature found".to_string()));
    }

    let current_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InvalidSignature(format!("system time error: {}", e)))?
        .as_secs() as i64;

    let time_diff = (current_time - timestamp).abs();
    if time_diff > tolerance_seconds {
        return Err(AppError::InvalidSignature(format!(
            "timestamp {} outside tolerance window of {}s",
            timestamp, tolerance_seconds
        )));
    }

    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
        .map_err(|e| AppError::InvalidSignature(format!("HMAC init error: {}", e)))?;
    mac.update(signed_payload.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    // Comparación en tiempo constante contra cada firma v1 presente
    let signature_valid = signatures.iter().any(|sig| {
        expected_signature.as_bytes().len() == sig.as_bytes().len()
            && expected_signature
                .as_bytes()
                .iter()
                .zip(sig.as_bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    });

    if !signature_valid {
        return Err(AppError::InvalidSignature("signature mismatch".to_string()));
    }

    tracing::debug!(timestamp, time_diff, "firma de webhook verificada");

    Ok(())
}

// ============================================================================
// CODES DE CONFIRMATION
// ============================================================================
//
// Format: <timestamp base36>-<20 hex>
//   - le hex est le début d'un HMAC-SHA256(secret, état du compte + timestamp)
//   - état du compte = id, username, email, role, is_staff
//
// Propriétés:
//   - imprévisible sans SECRET_KEY
//   - lié à l'état du compte: changer email/role/username rend le code "périmé"
//     au sens de `is_current` (vérification optionnelle, cf. CONFIRMATION_CODES_STRICT)
//
// ============================================================================

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::users;

type HmacSha256 = Hmac<Sha256>;

const KEY_SALT: &str = "api_yamdb.confirmation";
const DIGEST_BYTES: usize = 10;

#[derive(Clone)]
pub struct ConfirmationCodes {
    mac: HmacSha256,
}

impl ConfirmationCodes {
    pub fn new(secret: &str) -> Result<Self, String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| format!("Invalid confirmation secret: {}", e))?;
        mac.update(KEY_SALT.as_bytes());
        Ok(Self { mac })
    }

    /// Génère un nouveau code pour l'état actuel du compte.
    pub fn make_code(&self, user: &users::Model) -> String {
        self.make_code_at(user, Utc::now().timestamp())
    }

    fn make_code_at(&self, user: &users::Model, timestamp: i64) -> String {
        let digest = self.digest(user, timestamp);
        format!(
            "{}-{}",
            to_base36(timestamp),
            hex::encode(&digest[..DIGEST_BYTES])
        )
    }

    /// Vrai si `code` a été généré pour l'état actuel du compte.
    pub fn is_current(&self, user: &users::Model, code: &str) -> bool {
        let Some((ts_part, hash_part)) = code.split_once('-') else {
            return false;
        };
        let Some(timestamp) = from_base36(ts_part) else {
            return false;
        };
        let Ok(expected) = hex::decode(hash_part) else {
            return false;
        };
        if expected.len() != DIGEST_BYTES {
            return false;
        }

        // Comparaison en temps constant
        self.state_mac(user, timestamp)
            .verify_truncated_left(&expected)
            .is_ok()
    }

    fn state_mac(&self, user: &users::Model, timestamp: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        let state = format!(
            "{}|{}|{}|{}|{}|{}",
            user.id,
            user.username,
            user.email,
            user.role.as_str(),
            user.is_staff,
            timestamp
        );
        mac.update(state.as_bytes());
        mac
    }

    fn digest(&self, user: &users::Model, timestamp: i64) -> Vec<u8> {
        self.state_mac(user, timestamp).finalize().into_bytes().to_vec()
    }
}

fn to_base36(mut value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(input: &str) -> Option<i64> {
    if input.is_empty() || input.len() > 13 {
        return None;
    }
    i64::from_str_radix(input, 36).ok()
}

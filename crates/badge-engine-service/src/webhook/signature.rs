//! Webhook 签名
//!
//! HMAC-SHA256 作用于原始请求体字节，签名头格式为 `sha256=<hex>`。
//! 比较使用 `verify_slice`，耗时与签名内容无关。

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 签名头前缀
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// 计算带前缀的签名
pub fn sign(secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// 校验签名头
///
/// 缺少前缀、非法十六进制或空密钥都视为校验失败
pub fn verify(secret: &[u8], body: &[u8], header: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Some(hex_signature) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"webhook-secret";
    const BODY: &[u8] = br#"{"action":"closed"}"#;

    #[test]
    fn test_sign_format() {
        let signature = sign(SECRET, BODY).unwrap();
        assert!(signature.starts_with("sha256="));
        assert_eq!(signature.len(), SIGNATURE_PREFIX.len() + 64);
    }

    #[test]
    fn test_verify_valid() {
        let signature = sign(SECRET, BODY).unwrap();
        assert!(verify(SECRET, BODY, &signature));
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let signature = sign(SECRET, BODY).unwrap();
        assert!(!verify(SECRET, br#"{"action":"opened"}"#, &signature));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let signature = sign(b"other-secret", BODY).unwrap();
        assert!(!verify(SECRET, BODY, &signature));
    }

    #[test]
    fn test_verify_requires_prefix() {
        let signature = sign(SECRET, BODY).unwrap();
        let bare = signature.trim_start_matches(SIGNATURE_PREFIX);
        assert!(!verify(SECRET, BODY, bare));
        assert!(!verify(SECRET, BODY, "sha256=not-hex"));
    }

    #[test]
    fn test_verify_rejects_empty_secret() {
        let signature = sign(b"", BODY).unwrap();
        assert!(!verify(b"", BODY, &signature));
    }
}

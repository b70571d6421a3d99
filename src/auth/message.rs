//! Sign-in message templates.
//!
//! Two templates are understood. The legacy one embeds a client-chosen
//! timestamp:
//!
//! ```text
//! I am signing this message to authenticate with {app} as {wallet}. Timestamp: {unix_ms}
//! ```
//!
//! The challenge template embeds a server-issued nonce:
//!
//! ```text
//! I am signing this message to authenticate with {app} as {wallet}. Nonce: {nonce}. Issued: {rfc3339}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::WalletAddress;

const PREFIX: &str = "I am signing this message to authenticate with ";

/// What binds a signed message to a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageProof {
    /// Server-issued single-use nonce.
    Nonce(String),
    /// Client-supplied creation time.
    Timestamp(DateTime<Utc>),
}

/// A sign-in message broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInMessage {
    /// Wallet the message claims to authenticate.
    pub wallet: WalletAddress,
    /// Freshness proof.
    pub proof: MessageProof,
}

/// Renders the challenge template.
#[must_use]
pub fn challenge_message(
    app_name: &str,
    wallet: &WalletAddress,
    nonce: &str,
    issued_at: DateTime<Utc>,
) -> String {
    format!(
        "{PREFIX}{app_name} as {wallet}. Nonce: {nonce}. Issued: {}",
        issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Renders the legacy timestamp template.
#[must_use]
pub fn timestamp_message(app_name: &str, wallet: &WalletAddress, at: DateTime<Utc>) -> String {
    format!(
        "{PREFIX}{app_name} as {wallet}. Timestamp: {}",
        at.timestamp_millis()
    )
}

/// Parses a message produced by either template for `app_name`.
///
/// The wallet is matched case-insensitively and trailing whitespace is
/// ignored. Returns `None` for anything else.
#[must_use]
pub fn parse(app_name: &str, message: &str) -> Option<SignInMessage> {
    let rest = message
        .trim_end()
        .strip_prefix(PREFIX)?
        .strip_prefix(app_name)?
        .strip_prefix(" as ")?;
    let (wallet_raw, tail) = rest.split_once(". ")?;
    let wallet = WalletAddress::parse(wallet_raw).ok()?;

    let proof = if let Some(nonce_part) = tail.strip_prefix("Nonce: ") {
        let (nonce, issued) = nonce_part.split_once(". Issued: ")?;
        if nonce.is_empty() || DateTime::parse_from_rfc3339(issued).is_err() {
            return None;
        }
        MessageProof::Nonce(nonce.to_string())
    } else {
        let millis = tail.strip_prefix("Timestamp: ")?.trim().parse::<i64>().ok()?;
        MessageProof::Timestamp(DateTime::from_timestamp_millis(millis)?)
    };

    Some(SignInMessage { wallet, proof })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const APP: &str = "SmartWhales.ai";

    fn wallet() -> WalletAddress {
        WalletAddress::from_bytes([0x11; 20])
    }

    #[test]
    fn parses_challenge_message() {
        let msg = challenge_message(APP, &wallet(), "abc123", Utc::now());
        let parsed = parse(APP, &msg);
        assert_eq!(
            parsed,
            Some(SignInMessage {
                wallet: wallet(),
                proof: MessageProof::Nonce("abc123".to_string()),
            })
        );
    }

    #[test]
    fn parses_legacy_message_with_checksummed_wallet() {
        let msg = format!(
            "I am signing this message to authenticate with {APP} as 0x{}. Timestamp: 1700000000000",
            "AB".repeat(20)
        );
        let Some(parsed) = parse(APP, &msg) else {
            panic!("legacy message not parsed");
        };
        assert_eq!(parsed.wallet, WalletAddress::from_bytes([0xab; 20]));
        assert_eq!(
            parsed.proof,
            MessageProof::Timestamp(
                DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or_default()
            )
        );
    }

    #[test]
    fn timestamp_template_round_trips() {
        let Some(at) = DateTime::from_timestamp_millis(1_712_345_678_901) else {
            panic!("valid timestamp");
        };
        let msg = timestamp_message(APP, &wallet(), at);
        assert_eq!(parse(APP, &msg).map(|m| m.proof), Some(MessageProof::Timestamp(at)));
    }

    #[test]
    fn rejects_other_app_and_garbage() {
        let msg = challenge_message(APP, &wallet(), "n", Utc::now());
        assert_eq!(parse("OtherApp", &msg), None);
        assert_eq!(parse(APP, "hello"), None);
        let short = format!(
            "I am signing this message to authenticate with {APP} as 0x12. Timestamp: 1"
        );
        assert_eq!(parse(APP, &short), None);
    }

    #[test]
    fn rejects_empty_nonce() {
        let msg = challenge_message(APP, &wallet(), "", Utc::now());
        assert_eq!(parse(APP, &msg), None);
    }
}

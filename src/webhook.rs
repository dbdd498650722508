//! Webhook subscription verification records.
//!
//! A provider confirms endpoint ownership by sending a mode, a one-time
//! challenge and the shared verify token. These types carry those values
//! unchanged between the HTTP layer and whatever decides whether to answer;
//! deciding is left to the caller.

use serde::{Deserialize, Serialize};

/// Verification request as received from the provider.
///
/// Deserializes from the `hub.mode`, `hub.challenge` and `hub.verify_token`
/// query parameters. Missing parameters become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HookVerificationRequest {
    #[serde(rename = "hub.mode", default)]
    pub mode: String,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: String,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: String,
}

/// Internal form of a verification request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookVerificationCommand {
    pub mode: String,
    pub challenge: String,
    pub verify_token: String,
}

/// Challenge to echo back to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookVerificationResponse {
    pub challenge: String,
}

/// Copy a request field-for-field into a command. No trimming or validation.
pub fn map_to_command(request: HookVerificationRequest) -> HookVerificationCommand {
    HookVerificationCommand {
        mode: request.mode,
        challenge: request.challenge,
        verify_token: request.verify_token,
    }
}

/// Wrap `challenge` verbatim.
pub fn to_verification_response(challenge: impl Into<String>) -> HookVerificationResponse {
    HookVerificationResponse {
        challenge: challenge.into(),
    }
}

impl From<HookVerificationRequest> for HookVerificationCommand {
    fn from(request: HookVerificationRequest) -> Self {
        map_to_command(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: &str, challenge: &str, verify_token: &str) -> HookVerificationRequest {
        HookVerificationRequest {
            mode: mode.to_string(),
            challenge: challenge.to_string(),
            verify_token: verify_token.to_string(),
        }
    }

    #[test]
    fn test_map_to_command_copies_fields() {
        let command = map_to_command(request("subscribe", "challenge123", "verify-token"));
        assert_eq!(
            command,
            HookVerificationCommand {
                mode: "subscribe".to_string(),
                challenge: "challenge123".to_string(),
                verify_token: "verify-token".to_string(),
            }
        );
    }

    #[test]
    fn test_map_to_command_keeps_empty_strings() {
        let command = map_to_command(HookVerificationRequest::default());
        assert_eq!(command, HookVerificationCommand::default());
    }

    #[test]
    fn test_map_to_command_does_not_normalize() {
        let cases = [
            ("  SUBSCRIBE ", "\tpadded\n", " tok "),
            ("订阅", "challenge-你好-🎉", "tøken"),
            ("\u{0}", "\u{7f}\r\n", "\u{1b}[0m"),
        ];
        for (mode, challenge, token) in cases {
            let command = map_to_command(request(mode, challenge, token));
            assert_eq!(command.mode, mode);
            assert_eq!(command.challenge, challenge);
            assert_eq!(command.verify_token, token);
        }
    }

    #[test]
    fn test_from_request_matches_map_to_command() {
        let req = request("subscribe", "abc", "secret");
        assert_eq!(HookVerificationCommand::from(req.clone()), map_to_command(req));
    }

    #[test]
    fn test_to_verification_response_empty() {
        assert_eq!(to_verification_response("").challenge, "");
    }

    #[test]
    fn test_to_verification_response_preserves_bytes() {
        let challenge = "challenge-你好-🎉";
        let response = to_verification_response(challenge);
        assert_eq!(response.challenge.as_bytes(), challenge.as_bytes());
    }

    #[test]
    fn test_to_verification_response_keeps_whitespace() {
        assert_eq!(to_verification_response(" 42 \n").challenge, " 42 \n");
    }

    #[test]
    fn test_request_deserializes_hub_parameters() {
        let req: HookVerificationRequest = serde_json::from_value(serde_json::json!({
            "hub.mode": "subscribe",
            "hub.challenge": "1158201444",
            "hub.verify_token": "meatyhamhock",
        }))
        .unwrap();
        assert_eq!(req, request("subscribe", "1158201444", "meatyhamhock"));
    }

    #[test]
    fn test_request_missing_parameters_are_empty() {
        let req: HookVerificationRequest =
            serde_json::from_value(serde_json::json!({ "hub.challenge": "x" })).unwrap();
        assert_eq!(req, request("", "x", ""));
    }

    #[test]
    fn test_response_serializes_single_field() {
        let json = serde_json::to_string(&to_verification_response("abc")).unwrap();
        assert_eq!(json, r#"{"challenge":"abc"}"#);
    }
}

//! Line grammar for the local serial protocol
//!
//! One trimmed input line parses to exactly one [`Command`]. The matching
//! order is load-bearing: the case-sensitive `SSID=` / `WIFIPASS=` / `URL=`
//! prefixes and the exact queries are tried before the line is lowercased,
//! because lowercasing first would corrupt credential and URL payloads.

use crate::command::{Command, RelayId, WifiField};
use crate::limits::MAX_LINE_BYTES;

/// Parse one input line into a [`Command`].
///
/// Surrounding CR/LF/space/tab is ignored, so `"  LED ON\r\n"` parses the
/// same as `"led on"`. Payloads longer than [`MAX_LINE_BYTES`] are truncated
/// on a character boundary. Unrecognized input parses to
/// [`Command::Unknown`]; this function never fails.
pub fn parse_line(input: &str) -> Command {
    let line = input.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n'));

    if let Some(value) = line.strip_prefix("SSID=") {
        return Command::SetWifiField(WifiField::Ssid, bounded(value));
    }
    if let Some(value) = line.strip_prefix("WIFIPASS=") {
        return Command::SetWifiField(WifiField::Password, bounded(value));
    }
    if let Some(value) = line.strip_prefix("URL=") {
        return Command::SetRemoteUrl(bounded(value));
    }

    match line {
        "SSID?" => return Command::QueryWifiField(WifiField::Ssid),
        "WIFIPASS?" => return Command::QueryWifiField(WifiField::Password),
        "URL?" => return Command::QueryRemoteUrl,
        "IP?" => return Command::QueryIp,
        _ => {}
    }

    // Only the fixed on/off vocabulary is case-insensitive.
    match line.to_ascii_lowercase().as_str() {
        "led on" => Command::SetLed(true),
        "led off" => Command::SetLed(false),
        "relay1 on" => Command::SetRelay(RelayId::One, true),
        "relay1 off" => Command::SetRelay(RelayId::One, false),
        "relay2 on" => Command::SetRelay(RelayId::Two, true),
        "relay2 off" => Command::SetRelay(RelayId::Two, false),
        _ => Command::Unknown,
    }
}

/// Mask a stored secret for display.
///
/// Length 3 or less masks entirely, 4-5 keeps the first three characters,
/// longer secrets keep the first three and last two: `"abcdefgh"` becomes
/// `"abc***gh"`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0..=3 => "***".to_string(),
        4..=5 => format!("{}***", chars[..3].iter().collect::<String>()),
        n => format!(
            "{}***{}",
            chars[..3].iter().collect::<String>(),
            chars[n - 2..].iter().collect::<String>()
        ),
    }
}

/// Bound a payload to [`MAX_LINE_BYTES`], backing off to a char boundary
fn bounded(value: &str) -> String {
    if value.len() <= MAX_LINE_BYTES {
        return value.to_string();
    }
    let mut end = MAX_LINE_BYTES;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_vocabulary_any_casing() {
        let cases = [
            ("led on", Command::SetLed(true)),
            ("led off", Command::SetLed(false)),
            ("relay1 on", Command::SetRelay(RelayId::One, true)),
            ("relay1 off", Command::SetRelay(RelayId::One, false)),
            ("relay2 on", Command::SetRelay(RelayId::Two, true)),
            ("relay2 off", Command::SetRelay(RelayId::Two, false)),
        ];

        for (canonical, expected) in cases {
            assert_eq!(parse_line(canonical), expected);
            assert_eq!(parse_line(&canonical.to_uppercase()), expected);

            // Mixed casing and surrounding whitespace parse identically
            let mixed: String = canonical
                .chars()
                .enumerate()
                .map(|(i, c)| if i % 2 == 0 { c.to_ascii_uppercase() } else { c })
                .collect();
            assert_eq!(parse_line(&mixed), expected);
            assert_eq!(parse_line(&format!(" \t{canonical}\r\n")), expected);
        }
    }

    #[test]
    fn test_unrecognized_input_is_unknown() {
        for input in ["", "relay3 on", "led", "relay1", "on", "bogus", "relay1on"] {
            assert_eq!(parse_line(input), Command::Unknown, "input: {input:?}");
        }
    }

    #[test]
    fn test_value_prefixes_preserve_case() {
        assert_eq!(
            parse_line("SSID=MyHomeAP"),
            Command::SetWifiField(WifiField::Ssid, "MyHomeAP".into())
        );
        assert_eq!(
            parse_line("WIFIPASS=S3cr3t!PaSs"),
            Command::SetWifiField(WifiField::Password, "S3cr3t!PaSs".into())
        );
        assert_eq!(
            parse_line("URL=https://Example.com/API/relay"),
            Command::SetRemoteUrl("https://Example.com/API/relay".into())
        );
    }

    #[test]
    fn test_prefixes_are_case_sensitive() {
        // A lowercased prefix is not a settings command
        assert_eq!(parse_line("ssid=MyHomeAP"), Command::Unknown);
        assert_eq!(parse_line("url=http://x"), Command::Unknown);
        assert_eq!(parse_line("Ssid?"), Command::Unknown);
    }

    #[test]
    fn test_exact_queries() {
        assert_eq!(parse_line("SSID?"), Command::QueryWifiField(WifiField::Ssid));
        assert_eq!(
            parse_line("WIFIPASS?"),
            Command::QueryWifiField(WifiField::Password)
        );
        assert_eq!(parse_line("URL?"), Command::QueryRemoteUrl);
        assert_eq!(parse_line("IP?"), Command::QueryIp);
        assert_eq!(parse_line("URL? "), Command::QueryRemoteUrl);
    }

    #[test]
    fn test_empty_payload_is_kept() {
        assert_eq!(
            parse_line("SSID="),
            Command::SetWifiField(WifiField::Ssid, String::new())
        );
    }

    #[test]
    fn test_overlong_payload_truncates() {
        let long = "x".repeat(MAX_LINE_BYTES + 40);
        match parse_line(&format!("URL={long}")) {
            Command::SetRemoteUrl(url) => assert_eq!(url.len(), MAX_LINE_BYTES),
            other => panic!("expected SetRemoteUrl, got {other:?}"),
        }
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        // 2-byte characters straddling the limit must not split
        let long = "é".repeat(MAX_LINE_BYTES);
        match parse_line(&format!("SSID={long}")) {
            Command::SetWifiField(WifiField::Ssid, v) => {
                assert!(v.len() <= MAX_LINE_BYTES);
                assert!(v.chars().all(|c| c == 'é'));
            }
            other => panic!("expected SetWifiField, got {other:?}"),
        }
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "***");
        assert_eq!(mask_secret("ab"), "***");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("abcd"), "abc***");
        assert_eq!(mask_secret("abcde"), "abc***");
        assert_eq!(mask_secret("abcdef"), "abc***ef");
        assert_eq!(mask_secret("abcdefgh"), "abc***gh");
    }
}

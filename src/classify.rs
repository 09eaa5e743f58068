//! Input classification and payload formatting.
//!
//! Inspects free-form text, decides which structured data type it represents and produces the
//! scheme-prefixed payload (`tel:`, `mailto:`, `sms:`, `WIFI:`, `geo:`, `https://`) that common
//! QR readers act on. Classification is total: anything unrecognised is encoded as plain text.
use core::fmt;
use core::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// The detected semantic category of an input string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Phone,
    Email,
    Url,
    Sms,
    Wifi,
    Geo,
    Text,
}

impl DataKind {
    /// Every kind, in detection order. `Text` is the fallback and comes last.
    pub const ALL: [DataKind; 7] = [
        DataKind::Phone,
        DataKind::Email,
        DataKind::Sms,
        DataKind::Wifi,
        DataKind::Geo,
        DataKind::Url,
        DataKind::Text,
    ];

    /// Returns the lowercase identifier used in history files and JSON output.
    pub fn as_str(self) -> &'static str {
        use DataKind::*;
        match self {
            Phone => "phone",
            Email => "email",
            Url => "url",
            Sms => "sms",
            Wifi => "wifi",
            Geo => "geo",
            Text => "text",
        }
    }

    /// Returns a short display label.
    pub fn label(self) -> &'static str {
        use DataKind::*;
        match self {
            Phone => "Phone number",
            Email => "E-mail",
            Url => "Website",
            Sms => "Text message",
            Wifi => "WiFi network",
            Geo => "Coordinates",
            Text => "Plain text",
        }
    }

    fn describe(self, value: &str) -> String {
        use DataKind::*;
        match self {
            Phone => format!("{} → call {}", self.label(), value),
            Email => format!("{} → send mail to {}", self.label(), value),
            Url => format!("{} → open {}", self.label(), value),
            Sms => format!("{} → send a message to {}", self.label(), value),
            Wifi => format!("{} → join {}", self.label(), value),
            Geo => format!("{} → show {} on a map", self.label(), value),
            Text => self.label().to_string(),
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when parsing an unknown [`DataKind`] identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for DataKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// The outcome of classifying one input string.
///
/// `formatted` is the payload to hand to the QR encoder. For [`DataKind::Text`] it is the
/// untrimmed `original`; for every other kind it starts with the kind's scheme prefix.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Classification {
    pub kind: DataKind,
    pub original: String,
    pub formatted: String,
    pub description: String,
}

/// Inputs showing off every kind, in detection order.
pub const SAMPLE_INPUTS: [&str; 8] = [
    "010-1234-5678",
    "user@example.com",
    "https://www.google.com",
    "naver.com",
    "SMS:010-1234-5678",
    "WiFi:MyNetwork:password123",
    "37.5665,126.9780",
    "안녕하세요",
];

/// A recognised input: the payload and the normalized value quoted in the description.
struct Normalized {
    payload: String,
    value: String,
}

struct Rule {
    kind: DataKind,
    pattern: Regex,
    normalize: fn(&str, &Captures) -> Normalized,
}

// Whitespace as web browsers see it: Unicode White_Space without NEL (U+0085), plus the BOM.
const SPACE: &str = r"\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

// Any character except a line terminator.
const LINE: &str = r"[^\n\r\x{2028}\x{2029}]";

/// Whether `c` counts as whitespace for trimming and phone normalization.
fn is_space(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{FEFF}'
}

fn trim_space(s: &str) -> &str {
    s.trim_matches(is_space)
}

// Domestic mobile numbers: optional +82, optional trunk 0, 1x prefix, then two digit groups.
const DOMESTIC_PHONE: &str = r"(?:\+?82[- ]?)?0?1[0-9][- ]?[0-9]{3,4}[- ]?[0-9]{4}";

fn rule(kind: DataKind, pattern: &str, normalize: fn(&str, &Captures) -> Normalized) -> Rule {
    Rule {
        kind,
        pattern: Regex::new(pattern).expect("classification pattern must compile"),
        normalize,
    }
}

// Order matters: the URL rule accepts bare `domain.tld` and must not shadow the others.
static RULES: Lazy<[Rule; 6]> = Lazy::new(|| {
    [
        rule(
            DataKind::Phone,
            &format!(
                r"^{DOMESTIC_PHONE}$|^(?:\+?[0-9]{{1,3}}[- ]?)?[0-9]{{2,4}}[- ]?[0-9]{{3,4}}[- ]?[0-9]{{4}}$"
            ),
            |trimmed, _| {
                let number = normalize_phone(trimmed);
                Normalized {
                    payload: format!("tel:{number}"),
                    value: number,
                }
            },
        ),
        rule(
            DataKind::Email,
            &format!(r"^[^{SPACE}@]+@[^{SPACE}@]+\.[^{SPACE}@]+$"),
            |trimmed, _| Normalized {
                payload: format!("mailto:{trimmed}"),
                value: trimmed.to_string(),
            },
        ),
        rule(
            DataKind::Sms,
            &format!(r"^(?:sms|SMS|문자)[:：][{SPACE}]*(?P<number>{DOMESTIC_PHONE})$"),
            |_, caps| {
                let number = normalize_phone(&caps["number"]);
                Normalized {
                    payload: format!("sms:{number}"),
                    value: number,
                }
            },
        ),
        rule(
            DataKind::Wifi,
            &format!(
                r"^(?:wifi|WiFi|WIFI)[:：][{SPACE}]*(?P<network>[^:]+)[:：][{SPACE}]*(?P<password>{LINE}+)$"
            ),
            |_, caps| {
                let network = trim_space(&caps["network"]);
                let password = trim_space(&caps["password"]);
                Normalized {
                    payload: format!("WIFI:T:WPA;S:{network};P:{password};;"),
                    value: network.to_string(),
                }
            },
        ),
        rule(
            DataKind::Geo,
            &format!(r"^-?[0-9]+\.?[0-9]*[{SPACE}]*,[{SPACE}]*-?[0-9]+\.?[0-9]*$"),
            |trimmed, _| {
                let (lat, lng) = trimmed.split_once(',').unwrap_or((trimmed, ""));
                let (lat, lng) = (trim_space(lat), trim_space(lng));
                Normalized {
                    payload: format!("geo:{lat},{lng}"),
                    value: format!("{lat}, {lng}"),
                }
            },
        ),
        rule(
            DataKind::Url,
            &format!(
                r"^(?:https?://)?(?:www\.)?[a-zA-Z0-9-]+\.[a-zA-Z]{{2,}}(?:/{LINE}*)?$|^(?:https?://)?[a-zA-Z0-9-]+\.(?:com|net|org|co\.kr|kr|io|dev|tech)(?:/{LINE}*)?$"
            ),
            |trimmed, _| {
                let url = normalize_url(trimmed);
                Normalized {
                    payload: url.clone(),
                    value: url,
                }
            },
        ),
    ]
});

/// Classifies `input` and formats it as a QR payload.
///
/// Patterns are tested against the trimmed input in a fixed order (phone, e-mail, SMS, WiFi,
/// coordinates, URL); the first match wins. Anything else, including the empty string, is
/// [`DataKind::Text`] with the input passed through untouched.
///
/// # Example
///
/// ```rust
/// use smartqr::classify::{classify, DataKind};
///
/// let result = classify("010-1234-5678");
/// assert_eq!(result.kind, DataKind::Phone);
/// assert_eq!(result.formatted, "tel:01012345678");
/// ```
pub fn classify(input: &str) -> Classification {
    let trimmed = trim_space(input);
    if !trimmed.is_empty() {
        for rule in RULES.iter() {
            if let Some(caps) = rule.pattern.captures(trimmed) {
                let Normalized { payload, value } = (rule.normalize)(trimmed, &caps);
                tracing::trace!(kind = %rule.kind, payload = %payload, "input classified");
                return Classification {
                    kind: rule.kind,
                    original: input.to_string(),
                    formatted: payload,
                    description: rule.kind.describe(&value),
                };
            }
        }
    }
    Classification {
        kind: DataKind::Text,
        original: input.to_string(),
        formatted: input.to_string(),
        description: DataKind::Text.describe(input),
    }
}

/// Normalizes a phone number to its dialable domestic form.
///
/// Spaces and hyphens are removed, a `+82` (or bare `82` on numbers longer than ten
/// characters) country code becomes a trunk `0`, and a bare 8-digit number gets `010`.
pub fn normalize_phone(phone: &str) -> String {
    let mut cleaned: String = phone
        .chars()
        .filter(|c| !is_space(*c) && *c != '-')
        .collect();

    if let Some(rest) = cleaned.strip_prefix("+82") {
        cleaned = format!("0{rest}");
    } else if cleaned.starts_with("82") && cleaned.len() > 10 {
        cleaned = format!("0{}", &cleaned[2..]);
    }

    // Guess: 8 digits without a trunk prefix is a mobile number missing its 010.
    if !cleaned.starts_with('0') && cleaned.len() == 8 {
        cleaned.insert_str(0, "010");
    }
    cleaned
}

/// Prefixes `https://` unless the URL already carries an `http://` or `https://` scheme.
pub fn normalize_url(url: &str) -> String {
    let url = trim_space(url);
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

// User agent inspection and environment capability probing

/// Capabilities of the environment hosting a ceremony
///
/// Injected so hosts decide how capability and browser detection happen, and
/// tests can substitute fixed values.
pub trait Environment: Send + Sync {
    /// Whether a public-key credential API is available at all
    fn supports_public_key_credential(&self) -> bool;

    /// The user agent string of the hosting browser
    fn user_agent(&self) -> &str;

    /// Whether the host requires a user gesture before invoking the API
    fn requires_user_gesture(&self) -> bool {
        is_safari(self.user_agent())
    }
}

/// Environment with fixed answers
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    pub supported: bool,
    pub user_agent: String,
}

impl StaticEnvironment {
    #[must_use]
    pub fn new(supported: bool, user_agent: impl Into<String>) -> Self {
        Self {
            supported,
            user_agent: user_agent.into(),
        }
    }
}

impl Environment for StaticEnvironment {
    fn supports_public_key_credential(&self) -> bool {
        self.supported
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Safari-but-not-Chrome detection
///
/// Chrome and most Chromium derivatives also advertise `Safari`, so the
/// `Chrome` token must be absent.
#[must_use]
pub fn is_safari(user_agent: &str) -> bool {
    user_agent.contains("Safari") && !user_agent.contains("Chrome")
}

/// User-agent tokens per platform, first match wins
const PLATFORM_TOKENS: &[(&str, &[&str])] = &[
    ("Android", &["android"]),
    ("iOS", &["iphone", "ipad", "ios"]),
    ("Chrome OS", &["chrome os", "cros"]),
    ("Windows", &["windows"]),
    ("macOS", &["macintosh", "mac os"]),
    ("Linux", &["linux"]),
];

/// Platform name reported with failures, `Unknown` when nothing matches
#[must_use]
pub fn derive_platform_from_user_agent(user_agent: &str) -> &'static str {
    let ua_lower = user_agent.to_lowercase();
    PLATFORM_TOKENS
        .iter()
        .find(|(_, tokens)| tokens.iter().any(|token| ua_lower.contains(token)))
        .map_or("Unknown", |&(platform, _)| platform)
}

//! Default User-Agent string.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/simple-downloader";

/// Default User-Agent for every request (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("simple-downloader/{version} (+{PROJECT_UA_URL})")
}

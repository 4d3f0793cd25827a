//! Host address normalization.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Rewrites the resolved host before it is put into a destination URL.
///
/// Selected once when the synthesizer is built, never per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostSuffixPolicy {
    /// Use the host as reported.
    #[default]
    None,
    /// Append `.local` to bare hostnames (no dot, no `.local` suffix).
    /// IPv6 literals are left alone.
    AppendLocal,
}

impl HostSuffixPolicy {
    pub fn apply<'a>(&self, host: &'a str) -> Cow<'a, str> {
        match self {
            HostSuffixPolicy::None => Cow::Borrowed(host),
            HostSuffixPolicy::AppendLocal => {
                // IPv6 literals carry no dot either
                if host.contains('.') || host.contains(':') || host.ends_with(".local") {
                    Cow::Borrowed(host)
                } else {
                    Cow::Owned(format!("{host}.local"))
                }
            }
        }
    }
}

/// Configured host suffix behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostSuffixMode {
    #[default]
    None,
    /// Append `.local` to bare hostnames when running on macOS.
    AppendLocalOnDarwin,
}

impl HostSuffixMode {
    /// Resolve the policy for the platform this process runs on.
    pub fn policy(&self) -> HostSuffixPolicy {
        self.policy_for(std::env::consts::OS)
    }

    /// Resolve the policy for the given `std::env::consts::OS` value.
    pub fn policy_for(&self, os: &str) -> HostSuffixPolicy {
        match self {
            HostSuffixMode::AppendLocalOnDarwin if os == "macos" => HostSuffixPolicy::AppendLocal,
            _ => HostSuffixPolicy::None,
        }
    }
}

/// Join host and port, bracketing IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

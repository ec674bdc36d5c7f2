use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Traffic shape applied to every event of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Normal,
    ErrorBurst,
    LatencySpike,
    NewSignature,
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::Normal,
        Profile::ErrorBurst,
        Profile::LatencySpike,
        Profile::NewSignature,
    ];

    /// Probability that a synthesized event takes the error branch.
    pub fn error_rate(self) -> f64 {
        match self {
            Profile::Normal => 0.05,
            Profile::ErrorBurst => 0.70,
            Profile::LatencySpike => 0.05,
            Profile::NewSignature => 0.30,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Normal => "normal",
            Profile::ErrorBurst => "error_burst",
            Profile::LatencySpike => "latency_spike",
            Profile::NewSignature => "new_signature",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile name that is not one of the four known policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProfile(pub String);

impl std::fmt::Display for UnknownProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown profile '{}' (expected normal, error_burst, latency_spike or new_signature)",
            self.0
        )
    }
}

impl std::error::Error for UnknownProfile {}

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|profile| profile.as_str() == value)
            .ok_or_else(|| UnknownProfile(value.to_string()))
    }
}

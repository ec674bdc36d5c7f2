use super::catalog::{pick, pick_code, ENVIRONMENTS, REQUEST_PATHS, SERVICES, SUCCESS_STATUS};
use super::templates::{error_message, info_message, novel_error};
use crate::core::event::{LogEvent, Severity};
use crate::core::profile::Profile;
use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Builds log events for a profile.
///
/// Each call is independent; the only state carried between calls is the RNG
/// and the deployment id fixed at construction. The seed drives every
/// catalog and profile draw. Trace ids always come from OS entropy, so two
/// runs with the same seed never share one.
pub struct Synthesizer {
    rng: StdRng,
    deploy_id: String,
}

impl Synthesizer {
    /// Creates a synthesizer with a random `vNNN` deployment id.
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let deploy_id = format!("v{}", rng.gen_range(100..=999));
        Self { rng, deploy_id }
    }

    /// Creates a synthesizer that stamps every event with `deploy_id`.
    pub fn with_deploy_id(seed: Option<u64>, deploy_id: impl Into<String>) -> Self {
        let mut synthesizer = Self::new(seed);
        synthesizer.deploy_id = deploy_id.into();
        synthesizer
    }

    pub fn deploy_id(&self) -> &str {
        &self.deploy_id
    }

    pub fn synthesize(&mut self, profile: Profile) -> LogEvent {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let service = pick(&mut self.rng, &SERVICES);
        let request_path = pick(&mut self.rng, &REQUEST_PATHS);
        let env = pick(&mut self.rng, &ENVIRONMENTS);
        let trace_id = Uuid::new_v4().hyphenated().to_string();

        let is_error = self.rng.gen_bool(profile.error_rate());
        let (severity, status_code, message, latency_ms) = if is_error {
            let status = pick_code(&mut self.rng);
            let message = match profile {
                Profile::NewSignature => novel_error(service, &mut self.rng),
                _ => error_message(&mut self.rng),
            };
            let latency = self.rng.gen_range(1_000..=10_000);
            (Severity::Error, status, message, latency)
        } else {
            let severity = if self.rng.gen_bool(0.5) {
                Severity::Info
            } else {
                Severity::Debug
            };
            let message = info_message(&mut self.rng);
            let latency = match profile {
                Profile::LatencySpike => self.rng.gen_range(2_000..=15_000),
                _ => self.rng.gen_range(10..=500),
            };
            (severity, SUCCESS_STATUS, message, latency)
        };

        LogEvent {
            ts,
            service: service.to_string(),
            severity,
            status_code,
            latency_ms,
            message,
            trace_id,
            request_path: request_path.to_string(),
            env: env.to_string(),
            deploy_id: self.deploy_id.clone(),
        }
    }
}

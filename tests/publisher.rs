use loadgen::core::config::{ConfigError, RunPlan};
use loadgen::core::event::LogEvent;
use loadgen::core::rate::{Ticker, Unpaced};
use loadgen::core::traits::{EventSink, PublishError};
use loadgen::publisher::{Publisher, RunStatus, StopSignal};
use loadgen::sinks::{DryRunSink, HttpSink};
use loadgen::sources::synth::Synthesizer;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Records decoded payloads; shared so tests can inspect it after the run.
#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.events.lock().expect("lock").len()
    }
}

impl EventSink for RecordingSink {
    fn publish(&mut self, payload: &[u8]) -> Result<String, PublishError> {
        let event: LogEvent = serde_json::from_slice(payload)?;
        let mut events = self.events.lock().expect("lock");
        events.push(event);
        Ok(events.len().to_string())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct FailingSink {
    calls: u64,
}

impl EventSink for FailingSink {
    fn publish(&mut self, _payload: &[u8]) -> Result<String, PublishError> {
        self.calls += 1;
        Err(PublishError::Status(503))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Takes `delay` to acknowledge each of its first `slow_for` events, then
/// acknowledges instantly. Records when each publish started.
struct SlowSink {
    delay: Duration,
    slow_for: usize,
    calls: Vec<Instant>,
}

impl SlowSink {
    fn new(delay: Duration, slow_for: usize) -> Self {
        Self {
            delay,
            slow_for,
            calls: Vec::new(),
        }
    }
}

impl EventSink for SlowSink {
    fn publish(&mut self, _payload: &[u8]) -> Result<String, PublishError> {
        self.calls.push(Instant::now());
        if self.calls.len() <= self.slow_for {
            thread::sleep(self.delay);
        }
        Ok(self.calls.len().to_string())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// HTTP endpoint that answers the reachability check and then accepts
/// connections without ever responding.
fn stalled_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}/ingest", listener.local_addr().expect("addr"));
    thread::spawn(move || {
        let mut held = Vec::new();
        for (index, stream) in listener.incoming().enumerate() {
            let Ok(stream) = stream else { break };
            if index > 0 {
                held.push(stream);
                continue;
            }
            let mut reader = BufReader::new(stream);
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
            }
            let _ = reader
                .get_mut()
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        }
    });
    url
}

#[test]
fn budget_is_rate_times_duration() {
    let plan = RunPlan::new(10, 5, "normal").expect("plan");
    let sink = RecordingSink::default();
    let mut publisher = Publisher::new(
        sink.clone(),
        Synthesizer::new(Some(10)),
        Unpaced,
        StopSignal::new(),
    );

    let summary = publisher.run(&plan, |_| {}).expect("run");
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.attempted, 50);
    assert_eq!(summary.succeeded + summary.failed, 50);
    assert_eq!(sink.count(), 50);
}

#[test]
fn events_share_one_deploy_id() {
    let plan = RunPlan::new(100, 2, "new_signature").expect("plan");
    let sink = RecordingSink::default();
    let mut publisher = Publisher::new(
        sink.clone(),
        Synthesizer::new(None),
        Unpaced,
        StopSignal::new(),
    );
    let deploy_id = publisher.deploy_id().to_string();
    publisher.run(&plan, |_| {}).expect("run");

    let events = sink.events.lock().expect("lock");
    assert_eq!(events.len(), 200);
    assert!(events.iter().all(|event| event.deploy_id == deploy_id));
}

#[test]
fn unknown_profile_is_rejected_before_publishing() {
    let sink = RecordingSink::default();
    let result = RunPlan::new(10, 5, "bogus").map(|plan| {
        let mut publisher = Publisher::new(
            sink.clone(),
            Synthesizer::new(Some(1)),
            Unpaced,
            StopSignal::new(),
        );
        publisher.run(&plan, |_| {})
    });

    assert!(matches!(result, Err(ConfigError::UnknownProfile(_))));
    assert_eq!(sink.count(), 0);
}

#[test]
fn failing_sink_does_not_abort_the_run() {
    let plan = RunPlan::new(20, 1, "error_burst").expect("plan");
    let mut publisher = Publisher::new(
        FailingSink { calls: 0 },
        Synthesizer::new(Some(3)),
        Unpaced,
        StopSignal::new(),
    );
    let mut reports = 0;

    let summary = publisher.run(&plan, |_| reports += 1).expect("run");
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 20);
    assert_eq!(publisher.sink().calls, 20);
    assert_eq!(reports, 0);
}

#[test]
fn stop_signal_yields_partial_summary() {
    let plan = RunPlan::new(50, 10, "normal").expect("plan");
    let stop = StopSignal::new();
    let sink = RecordingSink::default();
    let mut publisher = Publisher::new(
        sink.clone(),
        Synthesizer::new(Some(8)),
        Ticker::new(plan.interval()),
        stop.clone(),
    );

    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        stop.trigger();
    });
    let summary = publisher.run(&plan, |_| {}).expect("run");
    trigger.join().expect("trigger thread");

    assert_eq!(summary.status, RunStatus::Interrupted);
    assert!(summary.interrupted());
    assert!(summary.attempted > 0 && summary.attempted < 500);
    assert_eq!(summary.succeeded + summary.failed, summary.attempted);
    assert_eq!(sink.count() as u64, summary.succeeded);
}

#[test]
fn paced_run_holds_target_rate() {
    let plan = RunPlan::new(20, 10, "normal").expect("plan");
    let mut publisher = Publisher::new(
        DryRunSink::new(false),
        Synthesizer::new(Some(20)),
        Ticker::new(plan.interval()),
        StopSignal::new(),
    );

    let summary = publisher.run(&plan, |_| {}).expect("run");
    let elapsed = summary.elapsed.as_secs_f64();
    assert_eq!(summary.succeeded, 200);
    assert!((9.0..=11.0).contains(&elapsed), "elapsed {elapsed}s");
}

#[test]
fn slow_sink_stretches_the_run() {
    let delay = Duration::from_millis(30);
    let plan = RunPlan::new(50, 1, "normal").expect("plan");
    let mut publisher = Publisher::new(
        SlowSink::new(delay, usize::MAX),
        Synthesizer::new(Some(30)),
        Ticker::new(plan.interval()),
        StopSignal::new(),
    );

    let summary = publisher.run(&plan, |_| {}).expect("run");
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.succeeded + summary.failed, 50);
    assert!(summary.elapsed >= delay * 50, "elapsed {:?}", summary.elapsed);
    assert_eq!(publisher.pacer().overruns(), 50);
    assert!(summary.achieved_rate() < 50.0);
}

#[test]
fn recovered_sink_is_not_sent_a_catch_up_burst() {
    let delay = Duration::from_millis(100);
    let plan = RunPlan::new(50, 1, "normal").expect("plan");
    let interval = plan.interval();
    let mut publisher = Publisher::new(
        SlowSink::new(delay, 5),
        Synthesizer::new(Some(31)),
        Ticker::new(interval),
        StopSignal::new(),
    );

    let summary = publisher.run(&plan, |_| {}).expect("run");
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.succeeded, 50);
    assert!(summary.elapsed >= delay * 5 + interval * 44, "elapsed {:?}", summary.elapsed);
    assert!(publisher.pacer().overruns() >= 5);

    let calls = &publisher.sink().calls;
    for pair in calls[5..].windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_millis(15), "burst gap {gap:?}");
    }
}

#[test]
fn timed_out_publishes_count_as_failures() {
    let timeout = Duration::from_millis(150);
    let sink = HttpSink::connect(&stalled_endpoint(), timeout).expect("connect");
    let plan = RunPlan::new(4, 1, "normal").expect("plan");
    let mut publisher = Publisher::new(
        sink,
        Synthesizer::new(Some(4)),
        Ticker::new(plan.interval()),
        StopSignal::new(),
    );

    let summary = publisher.run(&plan, |_| {}).expect("run");
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.attempted, 4);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 4);
    assert!(summary.elapsed >= timeout * 4, "elapsed {:?}", summary.elapsed);
}

//! End-to-end runs: roster → assignment → secret log → notifications
//!
//! The secret log must exist iff an assignment was produced, and it must be
//! written before the first notification is attempted.

use secret_santa_core::{
    DeliveryError, Dispatcher, Mailer, Notification, Orchestrator, Registry, RegistryError,
    RunConfig, RunError, SecretLog, Template,
};
use std::path::PathBuf;
use tempfile::TempDir;

const ROSTER: &str = "Alice\talice@example.com\tBob\n\
                      Bob\tbob@example.com\tAlice\n\
                      Carol\tcarol@example.com\tDave\n\
                      Dave\tdave@example.com\tCarol\n\
                      Erin\terin@example.com\t\n";

/// Fails every send, noting whether the secret log was on disk at the time
struct DownMailer {
    log_path: PathBuf,
    log_present_at_send: Vec<bool>,
}

impl Mailer for DownMailer {
    fn send(&mut self, _notification: &Notification) -> Result<(), DeliveryError> {
        self.log_present_at_send.push(self.log_path.exists());
        Err(DeliveryError::Authentication("535 bad credentials".to_string()))
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Vec<Notification>,
}

impl Mailer for RecordingMailer {
    fn send(&mut self, notification: &Notification) -> Result<(), DeliveryError> {
        self.sent.push(notification.clone());
        Ok(())
    }
}

fn config(seed: u64) -> RunConfig {
    RunConfig {
        seed,
        ..RunConfig::default()
    }
}

#[test]
fn test_full_run_notifies_everyone() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("secret.json");
    let registry = Registry::from_reader(ROSTER.as_bytes()).unwrap();
    let template = Template::parse("{santa}, your santee is {santee}.").unwrap();

    let mut orchestrator = Orchestrator::new(config(12345), registry).unwrap();
    let assignment = orchestrator.assign(&log_path).unwrap();
    let mut dispatcher = Dispatcher::new(RecordingMailer::default());
    let report = orchestrator.notify(&assignment, &template, &mut dispatcher);

    assert!(report.is_complete());
    let sent = dispatcher.into_mailer().sent;
    assert_eq!(sent.len(), 5);
    for notification in &sent {
        let santee = assignment.santee_of(&notification.santa).unwrap();
        assert_eq!(
            notification.body,
            format!("{}, your santee is {}.", notification.santa, santee)
        );
    }

    let log = SecretLog::read(&log_path).unwrap();
    assert_eq!(log.assignment(), &assignment);
    log.verify(orchestrator.registry()).unwrap();
}

#[test]
fn test_log_written_before_first_send_and_survives_total_failure() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("secret.json");
    let registry = Registry::from_reader(ROSTER.as_bytes()).unwrap();
    let template = Template::parse("You give to {santee}").unwrap();

    let mut orchestrator = Orchestrator::new(config(7), registry).unwrap();
    let assignment = orchestrator.assign(&log_path).unwrap();
    let written = std::fs::read_to_string(&log_path).unwrap();

    let mut dispatcher = Dispatcher::new(DownMailer {
        log_path: log_path.clone(),
        log_present_at_send: Vec::new(),
    });
    let report = orchestrator.notify(&assignment, &template, &mut dispatcher);

    assert!(report.delivered.is_empty());
    assert_eq!(report.failed.len(), 5);
    assert_eq!(
        dispatcher.into_mailer().log_present_at_send,
        vec![true; 5]
    );

    // Untouched by the failed sends, and still verifies
    assert_eq!(std::fs::read_to_string(&log_path).unwrap(), written);
    let log = SecretLog::read(&log_path).unwrap();
    assert_eq!(log.assignment(), &assignment);
    log.verify(orchestrator.registry()).unwrap();
}

#[test]
fn test_malformed_input_produces_no_log() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("secret.json");
    let data = "Alice\talice@example.com\t\nBob\tbob@example.com\n";

    let result = Registry::from_reader(data.as_bytes())
        .map_err(RunError::from)
        .and_then(|registry| Orchestrator::new(config(1), registry))
        .and_then(|mut orchestrator| orchestrator.assign(&log_path));

    assert_eq!(
        result.unwrap_err(),
        RunError::Registry(RegistryError::MalformedRecord { line: 2, fields: 2 })
    );
    assert!(!log_path.exists());
}

#[test]
fn test_unsatisfiable_roster_produces_no_log() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("secret.json");
    let registry = Registry::from_reader("Solo\tsolo@example.com\t\n".as_bytes()).unwrap();

    let mut orchestrator = Orchestrator::new(config(1), registry).unwrap();
    let err = orchestrator.assign(&log_path).unwrap_err();

    assert!(matches!(err, RunError::Assignment(_)));
    assert!(!log_path.exists());
}

#[test]
fn test_exhausted_ceiling_produces_no_log() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("secret.json");
    let data = "A\ta@example.com\tB\nB\tb@example.com\tA\nC\tc@example.com\t\n";
    let registry = Registry::from_reader(data.as_bytes()).unwrap();
    let config = RunConfig {
        seed: 1,
        max_attempts: Some(200),
        overwrite_secret_log: false,
    };

    let mut orchestrator = Orchestrator::new(config, registry).unwrap();
    let err = orchestrator.assign(&log_path).unwrap_err();

    assert_eq!(
        err.to_string(),
        "no valid assignment found after 200 attempts; exclusions are likely too dense"
    );
    assert!(!log_path.exists());
}

#[test]
fn test_existing_log_not_clobbered() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("secret.json");
    std::fs::write(&log_path, "last year's draw").unwrap();
    let registry = Registry::from_reader(ROSTER.as_bytes()).unwrap();

    let mut orchestrator = Orchestrator::new(config(1), registry).unwrap();
    let err = orchestrator.assign(&log_path).unwrap_err();

    assert!(matches!(err, RunError::SecretLog(_)));
    assert_eq!(
        std::fs::read_to_string(&log_path).unwrap(),
        "last year's draw"
    );
}

#[test]
fn test_same_seed_reproduces_draw() {
    let dir = TempDir::new().unwrap();

    let draw = |name: &str| {
        let registry = Registry::from_reader(ROSTER.as_bytes()).unwrap();
        let mut orchestrator = Orchestrator::new(config(424242), registry).unwrap();
        orchestrator.assign(&dir.path().join(name)).unwrap()
    };

    assert_eq!(draw("first.json"), draw("second.json"));
}

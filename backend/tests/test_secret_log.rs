//! Secret log persistence and verification

use secret_santa_core::secret_log::{compute_roster_digest, SECRET_LOG_FORMAT_VERSION};
use secret_santa_core::{
    Assignment, AssignmentGenerator, Generated, Participant, Rejection, Registry, RngManager,
    SecretLog, SecretLogError,
};
use tempfile::TempDir;

fn registry() -> Registry {
    Registry::from_participants([
        Participant::new("A", "a@example.com", ["B"]),
        Participant::new("B", "b@example.com", ["C"]),
        Participant::new("C", "c@example.com", Vec::<String>::new()),
    ])
    .unwrap()
}

fn generated(registry: &Registry) -> Generated {
    AssignmentGenerator::new(RngManager::new(12345))
        .generate(registry)
        .unwrap()
}

#[test]
fn test_write_then_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.json");
    let registry = registry();
    let log = SecretLog::new(&registry, &generated(&registry), 12345).unwrap();

    log.write(&path, false).unwrap();
    let loaded = SecretLog::read(&path).unwrap();

    assert_eq!(loaded, log);
    assert_eq!(loaded.format_version, SECRET_LOG_FORMAT_VERSION);
    assert_eq!(loaded.seed, 12345);
    assert_eq!(
        loaded.assignment(),
        &Assignment::from_pairs([("A", "C"), ("C", "B"), ("B", "A")])
    );
    assert_eq!(loaded.ring, vec!["A", "C", "B"]);
    loaded.verify(&registry).unwrap();
}

#[test]
fn test_log_is_readable_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.json");
    let registry = registry();
    SecretLog::new(&registry, &generated(&registry), 1)
        .unwrap()
        .write(&path, false)
        .unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(value["pairs"]["A"], "C");
    assert_eq!(value["pairs"]["B"], "A");
    assert_eq!(value["pairs"]["C"], "B");
    assert_eq!(
        value["roster_digest"],
        compute_roster_digest(&registry).unwrap()
    );
}

#[test]
fn test_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.json");
    std::fs::write(&path, "earlier run").unwrap();
    let registry = registry();
    let log = SecretLog::new(&registry, &generated(&registry), 1).unwrap();

    let err = log.write(&path, false).unwrap_err();

    assert_eq!(err, SecretLogError::AlreadyExists { path: path.clone() });
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier run");
}

#[test]
fn test_overwrite_when_requested() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.json");
    std::fs::write(&path, "earlier run").unwrap();
    let registry = registry();
    let log = SecretLog::new(&registry, &generated(&registry), 1).unwrap();

    log.write(&path, true).unwrap();

    assert_eq!(SecretLog::read(&path).unwrap(), log);
}

fn dir_entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_write_leaves_only_the_log() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.json");
    let registry = registry();
    let log = SecretLog::new(&registry, &generated(&registry), 1).unwrap();

    log.write(&path, false).unwrap();
    assert_eq!(dir_entries(&dir), vec!["secret.json".to_string()]);

    // refused second write cleans up after itself
    assert!(log.write(&path, false).is_err());
    assert_eq!(dir_entries(&dir), vec!["secret.json".to_string()]);
}

#[test]
fn test_failed_write_does_not_block_retry() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("logs");
    let path = target.join("secret.json");
    let registry = registry();
    let log = SecretLog::new(&registry, &generated(&registry), 1).unwrap();

    assert!(matches!(
        log.write(&path, false),
        Err(SecretLogError::Io { .. })
    ));
    assert!(!path.exists());

    std::fs::create_dir(&target).unwrap();
    log.write(&path, false).unwrap();
    assert_eq!(SecretLog::read(&path).unwrap(), log);
}

#[test]
fn test_missing_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("secret.json");
    let registry = registry();
    let log = SecretLog::new(&registry, &generated(&registry), 1).unwrap();

    let err = log.write(&path, false).unwrap_err();

    assert!(matches!(err, SecretLogError::Io { .. }));
}

#[test]
fn test_verify_detects_other_roster() {
    let registry = registry();
    let log = SecretLog::new(&registry, &generated(&registry), 1).unwrap();
    let edited = Registry::from_participants([
        Participant::new("A", "a@example.com", Vec::<String>::new()),
        Participant::new("B", "b@example.com", ["C"]),
        Participant::new("C", "c@example.com", Vec::<String>::new()),
    ])
    .unwrap();

    let err = log.verify(&edited).unwrap_err();

    assert!(matches!(err, SecretLogError::RosterMismatch { .. }));
}

#[test]
fn test_verify_detects_tampered_pairs() {
    let registry = registry();
    let mut log = SecretLog::new(&registry, &generated(&registry), 1).unwrap();
    log.pairs = Assignment::from_pairs([("A", "B"), ("B", "C"), ("C", "A")]);

    let err = log.verify(&registry).unwrap_err();

    assert_eq!(
        err,
        SecretLogError::InvalidAssignment(Rejection::Excluded {
            santa: "A".to_string()
        })
    );
}

#[test]
fn test_unsupported_version_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.json");
    let registry = registry();
    let mut log = SecretLog::new(&registry, &generated(&registry), 1).unwrap();
    log.format_version = SECRET_LOG_FORMAT_VERSION + 1;
    log.write(&path, false).unwrap();

    let err = SecretLog::read(&path).unwrap_err();

    assert_eq!(
        err,
        SecretLogError::UnsupportedVersion(SECRET_LOG_FORMAT_VERSION + 1)
    );
}

#[test]
fn test_garbage_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secret.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = SecretLog::read(&path).unwrap_err();

    assert!(matches!(err, SecretLogError::Serialization(_)));
}

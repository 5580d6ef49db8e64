//! Configuration load/persist against an in-memory flash with injected
//! faults.

use gatehouse::Error;
use gatehouse::app::config_store::{
    BACKUP_FILE, LoadSource, PRIMARY_FILE, PersistOutcome, TEMP_FILE,
};
use gatehouse::app::ports::StorageError;
use gatehouse::config::{ConfigRecord, MAX_SSID_LEN, WifiMode, defaults};

use crate::mock_hw::{MemStorage, TestService, service, service_with};

const NET1: &[u8] = b"ssid=net1\npassword=pw1\nhostname=dev1\nwifi_mode=AP\n\n";
const NET2: &[u8] = b"ssid = net2\npassword = pw2\nhostname = dev2\nwifi_mode = STA\n";

fn assert_factory(app: &TestService) {
    assert_eq!(app.config(), &ConfigRecord::factory());
}

// ── Round trip ────────────────────────────────────────────────

#[test]
fn persist_then_load_round_trips() {
    let mut app = service();
    app.set_ssid("net1").unwrap();
    app.set_password("pw1").unwrap();
    app.set_hostname("dev1").unwrap();
    app.set_wifi_mode(WifiMode::AccessPoint);
    assert!(app.is_config_dirty());

    assert_eq!(app.persist_config(), Ok(PersistOutcome::Written));
    assert!(!app.is_config_dirty());
    assert!(!app.storage().is_mounted());

    // Scribble over memory, then reload from flash.
    app.set_ssid("scratch").unwrap();
    assert_eq!(app.load_config(), LoadSource::Primary);
    assert_eq!(app.ssid(), "net1");
    assert_eq!(app.password(), "pw1");
    assert_eq!(app.hostname(), "dev1");
    assert_eq!(app.wifi_mode(), WifiMode::AccessPoint);
    assert!(!app.is_config_dirty());
}

#[test]
fn persisted_file_uses_plain_key_value_lines() {
    let mut app = service();
    app.set_ssid("net1").unwrap();
    app.set_password("pw1").unwrap();
    app.set_hostname("dev1").unwrap();
    app.set_wifi_mode(WifiMode::Station);
    app.persist_config().unwrap();
    assert_eq!(
        app.storage().text(PRIMARY_FILE).unwrap(),
        "ssid=net1\npassword=pw1\nhostname=dev1\nwifi_mode=STA\n\n"
    );
}

#[test]
fn surrounding_spaces_survive_persist_and_load() {
    let mut app = service();
    app.set_ssid("lobby net ").unwrap();
    app.set_password("  pass phrase ").unwrap();
    app.set_hostname(" gate").unwrap();
    assert_eq!(app.persist_config(), Ok(PersistOutcome::Written));

    app.set_ssid("scratch").unwrap();
    assert_eq!(app.load_config(), LoadSource::Primary);
    assert_eq!(app.ssid(), "lobby net ");
    assert_eq!(app.password(), "  pass phrase ");
    assert_eq!(app.hostname(), " gate");
}

#[test]
fn blank_ssid_loads_from_primary_not_stale_backup() {
    let mut app = service_with(MemStorage::new().with_file(PRIMARY_FILE, NET1));
    app.set_ssid("   ").unwrap();
    app.persist_config().unwrap();

    assert_eq!(app.load_config(), LoadSource::Primary);
    assert_eq!(app.ssid(), "   ");
}

#[test]
fn load_accepts_spaced_format() {
    let mut app = service_with(MemStorage::new().with_file(PRIMARY_FILE, NET2));
    assert_eq!(app.load_config(), LoadSource::Primary);
    assert_eq!(app.ssid(), "net2");
    assert_eq!(app.wifi_mode(), WifiMode::Station);
}

// ── Rotation ──────────────────────────────────────────────────

#[test]
fn first_persist_creates_primary_only() {
    let mut app = service();
    app.set_ssid("first").unwrap();
    app.persist_config().unwrap();
    let files: Vec<_> = app.storage().files.keys().cloned().collect();
    assert_eq!(files, vec![PRIMARY_FILE.to_string()]);
}

#[test]
fn second_persist_rotates_previous_primary_to_backup() {
    let mut app = service();
    app.set_ssid("one").unwrap();
    app.persist_config().unwrap();
    app.set_ssid("two").unwrap();
    app.persist_config().unwrap();
    app.set_ssid("three").unwrap();
    app.persist_config().unwrap();

    let storage = app.storage();
    assert!(storage.text(PRIMARY_FILE).unwrap().starts_with("ssid=three\n"));
    assert!(storage.text(BACKUP_FILE).unwrap().starts_with("ssid=two\n"));
    assert!(storage.text(TEMP_FILE).is_none());
}

// ── Factory override ──────────────────────────────────────────

#[test]
fn override_ignores_flash_and_never_mounts() {
    let storage = MemStorage::new()
        .with_file(PRIMARY_FILE, NET1)
        .with_file(BACKUP_FILE, NET2);
    let mut app = service_with(storage);
    app.hub().gpio().set_factory_override(true);

    assert_eq!(app.load_config(), LoadSource::FactoryOverride);
    assert_factory(&app);
    assert!(!app.is_config_dirty());
    assert_eq!(app.storage().mounts, 0);
    assert_eq!(app.storage().writes, 0);
    // Stored generations are left alone.
    assert_eq!(app.storage().files.len(), 2);
}

#[test]
fn override_discards_unsaved_changes() {
    let mut app = service_with(MemStorage::new().with_file(PRIMARY_FILE, NET1));
    app.set_hostname("edited").unwrap();
    app.hub().gpio().set_factory_override(true);
    app.load_config();
    assert_eq!(app.hostname(), defaults::HOSTNAME);
}

// ── Resilience ────────────────────────────────────────────────

#[test]
fn missing_primary_falls_back_to_backup() {
    let mut app = service_with(MemStorage::new().with_file(BACKUP_FILE, NET1));
    assert_eq!(app.load_config(), LoadSource::Backup);
    assert_eq!(app.ssid(), "net1");
    assert_eq!(app.password(), "pw1");
    assert_eq!(app.hostname(), "dev1");
}

#[test]
fn corrupt_primary_falls_back_to_backup_without_leaking_values() {
    for garbage in [
        &b"\xff\xfe\x00garbage"[..],
        b"hostname=evil\npassword=leak\n",
        b"",
        b"ssid=\n",
    ] {
        let storage = MemStorage::new()
            .with_file(PRIMARY_FILE, garbage)
            .with_file(BACKUP_FILE, NET1);
        let mut app = service_with(storage);
        assert_eq!(app.load_config(), LoadSource::Backup);
        assert_eq!(app.ssid(), "net1");
        assert_eq!(app.password(), "pw1");
        assert_eq!(app.hostname(), "dev1");
    }
}

#[test]
fn nothing_usable_keeps_defaults() {
    let storage = MemStorage::new()
        .with_file(PRIMARY_FILE, b"junk")
        .with_file(BACKUP_FILE, b"\xc3\x28");
    let mut app = service_with(storage);
    assert_eq!(app.load_config(), LoadSource::Defaults);
    assert_factory(&app);
    assert!(!app.storage().is_mounted());
}

#[test]
fn mount_failure_on_load_keeps_defaults() {
    let mut storage = MemStorage::new().with_file(PRIMARY_FILE, NET1);
    storage.fail_mount = true;
    let mut app = service_with(storage);
    assert_eq!(app.load_config(), LoadSource::Defaults);
    assert_factory(&app);
}

#[test]
fn unknown_keys_and_bad_values_are_skipped() {
    let storage = MemStorage::new().with_file(
        PRIMARY_FILE,
        b"# comment\nssid=net1\nmodo_wifi=STA\nwifi_mode=BOTH\nhostname=\ncolour=blue\n",
    );
    let mut app = service_with(storage);
    assert_eq!(app.load_config(), LoadSource::Primary);
    assert_eq!(app.ssid(), "net1");
    assert_eq!(app.wifi_mode(), defaults::WIFI_MODE);
    assert_eq!(app.hostname(), defaults::HOSTNAME);
}

// ── Bounds ────────────────────────────────────────────────────

#[test]
fn overlong_ssid_is_a_clean_no_op() {
    let mut app = service();
    let before = app.ssid().to_string();
    let too_long = "x".repeat(MAX_SSID_LEN + 1);
    assert!(matches!(app.set_ssid(&too_long), Err(Error::InvalidValue(_))));
    assert_eq!(app.ssid(), before);
    assert!(!app.is_config_dirty());
}

// ── Persist failures ──────────────────────────────────────────

#[test]
fn clean_record_is_not_written() {
    let mut app = service();
    assert_eq!(app.persist_config(), Ok(PersistOutcome::NothingToDo));
    assert_eq!(app.storage().mounts, 0);
    assert_eq!(app.storage().writes, 0);
}

#[test]
fn mount_failure_keeps_dirty() {
    let mut app = service();
    app.set_ssid("net1").unwrap();
    app.storage_mut().fail_mount = true;
    assert_eq!(
        app.persist_config(),
        Err(Error::StorageUnavailable(StorageError::MountFailed))
    );
    assert!(app.is_config_dirty());
}

#[test]
fn temp_write_failure_leaves_generations_untouched() {
    let mut app = service_with(MemStorage::new().with_file(PRIMARY_FILE, NET1));
    app.set_ssid("net9").unwrap();
    app.storage_mut().fail_write = true;

    assert_eq!(app.persist_config(), Err(Error::StorageUnavailable(StorageError::Io)));
    assert!(app.is_config_dirty());
    assert!(!app.storage().is_mounted());
    assert_eq!(app.storage().files.get(PRIMARY_FILE).unwrap(), NET1);
}

#[test]
fn failed_primary_rotation_is_incomplete_and_recoverable() {
    let mut app = service_with(MemStorage::new().with_file(PRIMARY_FILE, NET1));
    app.set_ssid("net9").unwrap();
    app.storage_mut().fail_rename_to = Some(BACKUP_FILE);

    assert!(matches!(app.persist_config(), Err(Error::IncompleteWrite(_))));
    assert!(app.is_config_dirty());
    assert!(!app.storage().is_mounted());

    app.storage_mut().fail_rename_to = None;
    assert_eq!(app.load_config(), LoadSource::Primary);
    assert_eq!(app.ssid(), "net1");
}

#[test]
fn failed_promotion_is_incomplete_and_backup_recovers() {
    let mut app = service_with(MemStorage::new().with_file(PRIMARY_FILE, NET1));
    app.set_ssid("net9").unwrap();
    app.storage_mut().fail_rename_to = Some(PRIMARY_FILE);

    assert!(matches!(app.persist_config(), Err(Error::IncompleteWrite(_))));
    assert!(app.is_config_dirty());

    app.storage_mut().fail_rename_to = None;
    assert_eq!(app.load_config(), LoadSource::Backup);
    assert_eq!(app.ssid(), "net1");
}

#[test]
fn retry_after_incomplete_write_succeeds() {
    let mut app = service_with(MemStorage::new().with_file(PRIMARY_FILE, NET1));
    app.set_ssid("net9").unwrap();
    app.storage_mut().fail_rename_to = Some(PRIMARY_FILE);
    assert!(app.persist_config().is_err());

    app.storage_mut().fail_rename_to = None;
    assert_eq!(app.persist_config(), Ok(PersistOutcome::Written));
    assert!(!app.is_config_dirty());
    assert!(app.storage().text(PRIMARY_FILE).unwrap().starts_with("ssid=net9\n"));
    assert!(app.storage().text(BACKUP_FILE).unwrap().starts_with("ssid=net1\n"));
}

#[test]
fn stale_backup_that_cannot_be_removed_is_incomplete() {
    let storage = MemStorage::new()
        .with_file(PRIMARY_FILE, NET1)
        .with_file(BACKUP_FILE, NET2);
    let mut app = service_with(storage);
    app.set_ssid("net9").unwrap();
    app.storage_mut().fail_remove = true;

    assert!(matches!(app.persist_config(), Err(Error::IncompleteWrite(_))));
    assert!(app.is_config_dirty());
    assert_eq!(app.storage().files.get(PRIMARY_FILE).unwrap(), NET1);
}

//! Request bodies → AppCommand → AppService::handle_command → Reply.

use gatehouse::Error;
use gatehouse::app::commands::{
    ActuatorAction, AppCommand, Reply, parse_actuator_body, parse_config_body,
};
use gatehouse::app::config_store::PRIMARY_FILE;
use gatehouse::app::ports::TickTarget;
use gatehouse::config::{ConfigKey, WifiMode};
use gatehouse::pins::Level;

use crate::mock_hw::service;

fn actuate(body: &str, id: i32) -> AppCommand {
    AppCommand::Actuate {
        id,
        action: parse_actuator_body(body).unwrap(),
    }
}

#[test]
fn status_command_returns_text() {
    let mut app = service();
    let Reply::Text(text) = app.handle_command(AppCommand::GetStatus) else {
        panic!("expected text");
    };
    assert!(text.starts_with("Control module\n"));
}

#[test]
fn actuator_bodies_drive_the_bank() {
    let mut app = service();
    assert_eq!(app.handle_command(actuate("action=on", 1)), Reply::Level(Level::High));
    assert_eq!(app.handle_command(actuate("action=toggle", 1)), Reply::Level(Level::Low));
    assert_eq!(
        app.handle_command(actuate("action=pulse\nduration=250", 1)),
        Reply::Count(3)
    );
    assert_eq!(app.handle_command(AppCommand::ReadActuator(1)), Reply::Level(Level::High));
    assert_eq!(app.handle_command(actuate("action=off", 1)), Reply::Level(Level::Low));
}

#[test]
fn rejected_commands_carry_the_error() {
    let mut app = service();
    let reply = app.handle_command(AppCommand::Actuate {
        id: 1,
        action: ActuatorAction::Pulse { duration_ms: 0 },
    });
    assert!(matches!(reply, Reply::Rejected(Error::InvalidValue(_))));
    assert!(matches!(
        app.handle_command(AppCommand::ReadSensor(7)),
        Reply::Rejected(Error::InvalidId { .. })
    ));
}

#[test]
fn counter_commands() {
    let mut app = service();
    let pin = gatehouse::pins::COUNTER_GPIOS[0];
    app.hub().gpio().set_level(pin, false);
    app.hub().advance_tick();
    assert_eq!(app.handle_command(AppCommand::ReadCounter(1)), Reply::Count(1));
    assert_eq!(app.handle_command(AppCommand::ResetCounter(1)), Reply::Done);
    assert_eq!(app.handle_command(AppCommand::ReadCounter(1)), Reply::Count(0));
}

#[test]
fn factory_override_query() {
    let mut app = service();
    assert_eq!(
        app.handle_command(AppCommand::QueryFactoryOverride),
        Reply::Level(Level::Low)
    );
    app.hub().gpio().set_factory_override(true);
    assert_eq!(
        app.handle_command(AppCommand::QueryFactoryOverride),
        Reply::Level(Level::High)
    );
}

#[test]
fn configure_applies_and_persists() {
    let mut app = service();
    let updates = parse_config_body("ssid=lobby\npassword=s3cret\nwifi_mode=STA\n");
    assert_eq!(app.handle_command(AppCommand::Configure(updates)), Reply::Created);

    assert_eq!(app.ssid(), "lobby");
    assert_eq!(app.wifi_mode(), WifiMode::Station);
    assert!(!app.is_config_dirty());
    assert!(app.storage().text(PRIMARY_FILE).unwrap().contains("password=s3cret\n"));
    assert_eq!(
        app.handle_command(AppCommand::ReadConfig(ConfigKey::WifiMode)),
        Reply::Text("STA".into())
    );
}

#[test]
fn configure_stores_values_verbatim() {
    let mut app = service();
    let updates = parse_config_body("ssid=lobby\npassword= x \n");
    assert_eq!(app.handle_command(AppCommand::Configure(updates)), Reply::Created);
    assert_eq!(app.password(), " x ");
    assert_eq!(
        app.handle_command(AppCommand::ReadConfig(ConfigKey::Password)),
        Reply::Text(" x ".into())
    );

    assert_eq!(app.load_config(), gatehouse::app::config_store::LoadSource::Primary);
    assert_eq!(app.password(), " x ");
}

#[test]
fn configure_with_no_known_keys_has_nothing_to_do() {
    let mut app = service();
    let updates = parse_config_body("colour=blue\n");
    assert!(updates.is_empty());
    assert_eq!(app.handle_command(AppCommand::Configure(updates)), Reply::NothingToDo);
    assert_eq!(app.storage().mounts, 0);
}

#[test]
fn configure_keeps_accepted_updates_but_reports_rejection() {
    let mut app = service();
    let body = format!("hostname=gate-7\nssid={}\n", "x".repeat(40));
    let reply = app.handle_command(AppCommand::Configure(parse_config_body(&body)));
    assert!(matches!(reply, Reply::Rejected(Error::InvalidValue(_))));

    assert_eq!(app.hostname(), "gate-7");
    assert!(!app.is_config_dirty(), "accepted update was persisted");
}

#[test]
fn configure_reports_storage_failure() {
    let mut app = service();
    app.storage_mut().fail_mount = true;
    let reply = app.handle_command(AppCommand::Configure(parse_config_body("ssid=x")));
    assert!(matches!(reply, Reply::Rejected(Error::StorageUnavailable(_))));
    assert!(app.is_config_dirty());
}

#[test]
fn load_and_persist_commands() {
    let mut app = service();
    assert_eq!(app.handle_command(AppCommand::PersistConfig), Reply::NothingToDo);
    app.set_hostname("gate-2").unwrap();
    assert_eq!(app.handle_command(AppCommand::PersistConfig), Reply::Created);
    assert_eq!(
        app.handle_command(AppCommand::LoadConfig),
        Reply::Text("primary".into())
    );
    assert_eq!(app.hostname(), "gate-2");
}

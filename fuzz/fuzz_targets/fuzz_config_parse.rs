//! Fuzz target: `ConfigRecord::from_file`
//!
//! Feeds arbitrary bytes through the same UTF-8 check and line grammar the
//! config store applies to flash contents.  An accepted file must yield a
//! record within bounds, and rendering that record must parse back to the
//! same values.
//!
//! cargo fuzz run fuzz_config_parse

#![no_main]

use gatehouse::config::{ConfigRecord, MAX_CFG_VALUE_LEN, MAX_SSID_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Some(record) = ConfigRecord::from_file(text) else {
        return;
    };

    assert!(!record.is_dirty(), "a freshly loaded record must be clean");
    assert!(!record.ssid().is_empty());
    assert!(record.ssid().len() <= MAX_SSID_LEN);
    assert!(record.password().len() <= MAX_CFG_VALUE_LEN);
    assert!(record.hostname().len() <= MAX_CFG_VALUE_LEN);

    let again = ConfigRecord::from_file(&record.render()).expect("rendered record must load");
    assert_eq!(again, record);
});

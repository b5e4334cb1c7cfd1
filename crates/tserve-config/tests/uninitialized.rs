//! Access before init. Kept in its own test binary so no other test can
//! publish an instance first.

use tserve_config::{ConfigManager, TsError};

#[test]
fn test_instance_before_init_fails() {
    let err = ConfigManager::instance().unwrap_err();
    assert!(matches!(err, TsError::Uninitialized));
}

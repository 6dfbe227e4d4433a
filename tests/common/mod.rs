//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use umms_client::{
    cli::{ArgDefaults, DispatchSettings},
    services::umms::{ProtocolVersion, SessionManager, testing::MockBus},
};

pub fn session(version: ProtocolVersion) -> (Arc<MockBus>, Arc<SessionManager>) {
    let service = Arc::new(MockBus::default());
    let session = Arc::new(SessionManager::new(service.clone(), version));
    (service, session)
}

pub fn settings() -> DispatchSettings {
    DispatchSettings {
        unattended_budget: Duration::from_secs(5),
        defaults: ArgDefaults {
            uri: "file:///root/720p.m4v".to_string(),
            record_location: "/tmp/record.ts".to_string(),
        },
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

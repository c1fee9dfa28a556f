mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::*;
use tokio_test::assert_ok;
use usereg_auth::infrastructure::WaitOutcome;
use usereg_auth::models::AddressFamily;
use usereg_auth::services::{NetworkAddressResolver, StaticInterfaces};
use usereg_auth::{App, AppError, RunOutcome};

fn resolver(pairs: &[(&str, &str)]) -> NetworkAddressResolver<StaticInterfaces> {
    NetworkAddressResolver::new(
        StaticInterfaces::from_pairs(pairs.iter().copied()),
        AddressFamily::V6,
    )
}

#[tokio::test]
async fn test_no_address_aborts_before_browser_is_opened() {
    let opened = Arc::new(AtomicBool::new(false));
    let flag = opened.clone();
    let log = ActionLog::default();
    let driver_log = log.clone();

    let app = App::new(fast_config(5));
    let outcome = assert_ok!(
        app.run_with(
            &resolver(&[("eth0", "::1")]),
            ScriptedSolver::always("ab12"),
            move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<_, AppError>(ScriptedDriver::new(driver_log, vec![WaitOutcome::Found]))
            },
        )
        .await
    );

    assert!(matches!(
        outcome,
        RunOutcome::AddressUnavailable {
            family: AddressFamily::V6
        }
    ));
    assert_eq!(outcome.exit_code(), 2);
    assert!(!opened.load(Ordering::SeqCst));
    assert!(log.actions().is_empty());
}

#[tokio::test]
async fn test_full_run_registers_global_address() {
    let log = ActionLog::default();
    let driver_log = log.clone();

    let app = App::new(fast_config(5));
    let outcome = assert_ok!(
        app.run_with(
            &resolver(&[("eth0", "::1"), ("eth0", "fe80::1"), ("eth0", "2001:db8::5")]),
            ScriptedSolver::new(["", "ab12"]),
            move || async move { Ok::<_, AppError>(ScriptedDriver::new(driver_log, vec![WaitOutcome::Found])) },
        )
        .await
    );

    match &outcome {
        RunOutcome::Completed { address, attempts } => {
            assert_eq!(address.value(), "2001:db8::5");
            assert_eq!(*attempts, 2);
        }
        other => panic!("意外的结果: {:?}", other),
    }
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(
        log.count(&Action::Fill(
            locators().device_address_field,
            "2001:db8::5".to_string()
        )),
        1
    );
    assert_eq!(log.count(&Action::Check(locators().off_campus_radio)), 1);
    assert_eq!(log.count(&Action::Release), 1);
    assert_eq!(log.actions().last(), Some(&Action::Release));
}

#[tokio::test]
async fn test_login_exhaustion_is_reported_not_fatal() {
    let log = ActionLog::default();
    let driver_log = log.clone();

    let app = App::new(fast_config(3));
    let outcome = assert_ok!(
        app.run_with(
            &resolver(&[("eth0", "2001:db8::5")]),
            ScriptedSolver::always("ab12"),
            move || async move { Ok::<_, AppError>(ScriptedDriver::new(driver_log, vec![])) },
        )
        .await
    );

    match &outcome {
        RunOutcome::LoginFailed(report) => assert_eq!(report.attempts, 3),
        other => panic!("意外的结果: {:?}", other),
    }
    assert_eq!(outcome.exit_code(), 3);
    assert_eq!(log.count(&Action::Release), 1);
    assert_eq!(
        log.count_where(|a| matches!(a, Action::Fill(l, _) if *l == locators().device_address_field)),
        0
    );
}

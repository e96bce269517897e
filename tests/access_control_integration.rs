//! Интеграционные тесты in-memory слоя контроля доступа.

use std::time::Duration;

use credkeep::{
    AccessControl, AccessPolicy, Account, AccountError, KindDetail, KindName, Permissions,
};

fn demo_population() -> AccessControl {
    let mut ac = AccessControl::new();
    ac.register(
        Account::administrator(
            "admin",
            "admin123",
            Permissions::new(["full_access", "user_management"]),
        )
        .unwrap(),
    )
    .unwrap();
    ac.register(Account::regular("john_doe", "password123").unwrap())
        .unwrap();
    ac.register(Account::default_guest()).unwrap();
    ac.register(
        Account::regular("inactive_user", "pass123")
            .unwrap()
            .with_active(false),
    )
    .unwrap();
    ac
}

#[test]
fn test_status_lines() {
    let ac = demo_population();
    let lines: Vec<String> = ac.list_all().iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        [
            "Administrator: admin (Active)",
            "Regular: john_doe (Active)",
            "Guest: guest (Active)",
            "Regular: inactive_user (Inactive)",
        ]
    );
}

#[test]
fn test_kind_details() {
    let ac = demo_population();

    let admin = ac.get("admin").unwrap();
    assert_eq!(admin.kind_name(), KindName::Administrator);
    match &admin.detail {
        KindDetail::Administrator { permissions } => {
            assert_eq!(permissions, &["full_access", "user_management"]);
        }
        other => panic!("unexpected detail: {other:?}"),
    }

    let regular = ac.get("john_doe").unwrap();
    assert_eq!(regular.detail_line(), "Last login: Never, Login count: 0");

    let guest = ac.get("guest").unwrap();
    match guest.detail {
        KindDetail::Guest {
            remaining_secs,
            access_level,
        } => {
            assert!(remaining_secs <= 3600);
            assert_eq!(access_level, "read_only");
        }
        other => panic!("unexpected detail: {other:?}"),
    }
}

#[test]
fn test_login_count_increments_per_success() {
    let mut ac = demo_population();
    for _ in 0..3 {
        ac.authenticate("john_doe", "password123").unwrap();
    }
    let _ = ac.authenticate("john_doe", "bad");

    match ac.get("john_doe").unwrap().detail {
        KindDetail::Regular {
            last_login,
            login_count,
        } => {
            assert_eq!(login_count, 3);
            assert!(last_login.is_some());
        }
        other => panic!("unexpected detail: {other:?}"),
    }
}

#[test]
fn test_admin_and_guest_auth_have_no_side_effects() {
    let mut ac = demo_population();
    let before = ac.get("admin").unwrap();
    ac.authenticate("admin", "admin123").unwrap();
    assert_eq!(ac.get("admin").unwrap(), before);
}

#[test]
fn test_deactivate_reactivate_cycle() {
    let mut ac = demo_population();

    ac.deactivate("admin").unwrap();
    assert_eq!(ac.get("admin").unwrap().status(), "Inactive");
    assert!(matches!(
        ac.authenticate("admin", "admin123"),
        Err(AccountError::InactiveAccount { .. })
    ));

    ac.activate("admin").unwrap();
    assert!(ac.authenticate("admin", "admin123").is_ok());
}

#[test]
fn test_registration_validation() {
    assert_eq!(
        Account::regular("", "pw").unwrap_err(),
        AccountError::validation("login")
    );
    assert_eq!(
        Account::regular("bob", "").unwrap_err(),
        AccountError::validation("password")
    );
}

#[test]
fn test_policy_driven_accounts() {
    let policy = AccessPolicy {
        guest_session: Duration::from_secs(10),
        admin_permissions: vec!["audit".into()],
    };
    let mut ac = AccessControl::with_policy(policy.clone());
    ac.register(policy.administrator("root", "toor").unwrap())
        .unwrap();
    ac.register(policy.guest().unwrap()).unwrap();

    assert!(ac.has_permission("root", "audit").unwrap());
    assert!(!ac.has_permission("root", "user_management").unwrap());
    assert!(matches!(
        ac.has_permission("guest", "audit"),
        Err(AccountError::KindMismatch { .. })
    ));
}

/// Тест проверяет границу гостевой сессии на управляемых часах tokio:
/// ровно `duration` ещё допустимо, чуть больше уже нет.
#[tokio::test]
async fn test_guest_session_boundary() {
    tokio::time::pause();

    let mut ac = AccessControl::new();
    ac.register(Account::guest("visitor", "pw", Duration::from_secs(3600)).unwrap())
        .unwrap();

    tokio::time::advance(Duration::from_secs(1800)).await;
    match ac.authenticate("visitor", "pw").unwrap().detail {
        KindDetail::Guest { remaining_secs, .. } => assert_eq!(remaining_secs, 1800),
        other => panic!("unexpected detail: {other:?}"),
    }

    tokio::time::advance(Duration::from_secs(1800)).await;
    assert!(ac.authenticate("visitor", "pw").is_ok());

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(
        ac.authenticate("visitor", "pw").unwrap_err(),
        AccountError::SessionExpired {
            login: "visitor".into()
        }
    );

    match ac.get("visitor").unwrap().detail {
        KindDetail::Guest { remaining_secs, .. } => assert_eq!(remaining_secs, 0),
        other => panic!("unexpected detail: {other:?}"),
    }
}

/// Тест проверяет, что неактивность проверяется раньше истечения сессии.
#[tokio::test]
async fn test_inactive_expired_guest_reports_inactive() {
    tokio::time::pause();

    let mut ac = AccessControl::new();
    ac.register(
        Account::guest("visitor", "pw", Duration::from_secs(60))
            .unwrap()
            .with_active(false),
    )
    .unwrap();

    tokio::time::advance(Duration::from_secs(120)).await;
    assert!(matches!(
        ac.authenticate("visitor", "pw"),
        Err(AccountError::InactiveAccount { .. })
    ));
}

#[test]
fn test_views_serialize_with_kind_tag() {
    let ac = demo_population();
    let json = serde_json::to_value(ac.get("john_doe").unwrap()).unwrap();
    assert_eq!(json["login"], "john_doe");
    assert_eq!(json["detail"]["kind"], "Regular");
    assert_eq!(json["detail"]["login_count"], 0);
}

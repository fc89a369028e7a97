mod common;

use common::{Call, ScriptedPlatform};
use devicekit_permission::sys::SystemPermissions;
use devicekit_permission::{GrantState, Outcome, PermissionController, PermissionKind};
use PermissionKind::{Camera, Contacts, ForegroundLocation, Microphone, Notifications, Photos};

#[tokio::test]
async fn current_outcome_never_prompts() {
    let platform = ScriptedPlatform::new().already_granted(Camera);
    let controller = PermissionController::new();

    let outcome = controller
        .current_outcome(&platform, [Camera, Microphone])
        .await;

    assert_eq!(outcome, Ok(Outcome::NotDetermined));
    assert!(
        platform
            .calls()
            .iter()
            .all(|call| !matches!(call, Call::Prompt(_) | Call::Settings))
    );
}

#[tokio::test]
async fn current_outcome_reports_askable_denial() {
    let platform = ScriptedPlatform::new().explains(Microphone);
    let controller = PermissionController::new();

    let outcome = controller.current_outcome(&platform, [Microphone]).await;

    assert_eq!(
        outcome,
        Ok(Outcome::Denied {
            can_ask_again: true
        })
    );
}

#[tokio::test]
async fn current_outcome_reports_final_denial() {
    let platform = ScriptedPlatform::new().refused(Notifications);
    let controller = PermissionController::new();

    let outcome = controller.current_outcome(&platform, [Notifications]).await;

    assert_eq!(
        outcome,
        Ok(Outcome::Denied {
            can_ask_again: false
        })
    );
}

#[tokio::test]
async fn current_outcome_of_nothing_is_granted() {
    let platform = ScriptedPlatform::new();
    let controller = PermissionController::new();

    let outcome = controller
        .current_outcome(&platform, std::iter::empty())
        .await;

    assert_eq!(outcome, Ok(Outcome::Granted));
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn restricted_kind_is_a_final_denial() {
    let platform = ScriptedPlatform::new().reports(Camera, GrantState::Restricted);
    let controller = PermissionController::new();

    let outcome = controller.current_outcome(&platform, [Camera]).await;

    assert_eq!(
        outcome,
        Ok(Outcome::Denied {
            can_ask_again: false
        })
    );
}

#[tokio::test]
async fn status_passes_restriction_and_limited_access_through() {
    let platform = ScriptedPlatform::new()
        .reports(Camera, GrantState::Restricted)
        .reports(Photos, GrantState::Limited);
    let controller = PermissionController::new();

    assert_eq!(
        controller.status(&platform, Camera).await,
        Ok(GrantState::Restricted)
    );
    assert_eq!(
        controller.status(&platform, Photos).await,
        Ok(GrantState::Limited)
    );
    assert!(platform.prompts().is_empty());
}

#[tokio::test]
async fn status_reads_explainable_kind_as_denied() {
    let platform = ScriptedPlatform::new()
        .explains(Microphone)
        .already_granted(Camera);
    let controller = PermissionController::new();

    assert_eq!(
        controller.status(&platform, Microphone).await,
        Ok(GrantState::Denied)
    );
    assert_eq!(
        controller.status(&platform, Contacts).await,
        Ok(GrantState::Undetermined)
    );
    assert_eq!(
        controller.status(&platform, Camera).await,
        Ok(GrantState::Granted)
    );
    assert!(!controller.is_in_flight(Microphone));
}

#[tokio::test]
async fn already_granted_location_skips_the_dialog() {
    let platform = ScriptedPlatform::new().already_granted(ForegroundLocation);
    let controller = PermissionController::new();

    let outcome = controller
        .request_location_when_in_use(&platform, &platform)
        .await;

    assert_eq!(outcome, Ok(Outcome::Granted));
    assert_eq!(platform.calls(), vec![Call::IsGranted(ForegroundLocation)]);
}

#[tokio::test]
async fn notifications_request_runs_the_full_flow() {
    let platform = ScriptedPlatform::new()
        .answers(&[(Notifications, false)])
        .answers(&[(Notifications, true)])
        .explains(Notifications);
    let controller = PermissionController::new();

    let outcome = controller.request_notifications(&platform, &platform).await;

    assert_eq!(outcome, Ok(Outcome::Granted));
    assert_eq!(platform.prompts().len(), 2);
}

#[cfg(any(target_os = "linux", target_os = "windows"))]
#[tokio::test]
async fn desktop_hosts_grant_without_dialogs() {
    let system = SystemPermissions;
    let controller = PermissionController::new();

    assert_eq!(
        controller.request_location_always(&system, &system).await,
        Ok(Outcome::Granted)
    );
    assert_eq!(
        controller.resolve(&system, &system, PermissionKind::ALL).await,
        Ok(Outcome::Granted)
    );
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
#[tokio::test]
async fn other_hosts_need_an_injected_binding() {
    let system = SystemPermissions;
    let controller = PermissionController::new();

    let outcome = controller.resolve(&system, &system, [Camera]).await;

    assert!(matches!(outcome, Err(devicekit_permission::PermissionError::PlatformUnavailable(_))));
    assert!(!controller.is_in_flight(Camera));
}

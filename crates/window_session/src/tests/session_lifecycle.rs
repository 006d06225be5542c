//! Window creation, bookkeeping and teardown

use super::{headless_session, open};
use crate::backend::{HeadlessBackend, HeadlessCall, Image};
use crate::config::{Config, SessionConfig};
use crate::error::{DispatchError, ErrorCode, NativeError, RegistryError, SessionError};
use crate::event::NativeEvent;
use crate::hints::{ClientApi, InitHint, PlatformKind, WindowHint, WindowHints};
use crate::{Session, WindowId};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_registry_consistent_through_create_and_destroy() {
        let (mut session, probe) = headless_session();
        let (a, _) = open(&mut session, "a");
        let (b, handle_b) = open(&mut session, "b");
        let (c, _) = open(&mut session, "c");
        assert_eq!(session.check_consistency(), Ok(()));

        assert!(session.destroy_window(b));
        assert!(!session.destroy_window(b));
        assert_eq!(session.check_consistency(), Ok(()));
        assert!(!probe.is_alive(handle_b));
        assert_eq!(session.window_ids(), vec![a, c]);
    }

    #[test]
    fn test_every_trampoline_installed_and_slot_written() {
        let (mut session, probe) = headless_session();
        let (id, handle) = open(&mut session, "wired");

        let native = probe.window(handle).unwrap();
        assert_eq!(native.installed, crate::event::EventMask::ALL);
        assert_eq!(native.user_slot, Some(session.window(id).unwrap().callback_key().to_user_slot()));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let (mut session, _probe) = headless_session();
        let (first, _) = open(&mut session, "first");
        assert_eq!(first, WindowId::from_raw(1));
        session.destroy_window(first);

        let (second, _) = open(&mut session, "second");
        assert_eq!(second, WindowId::from_raw(2));
        assert!(!second.is_none());
    }

    #[test]
    fn test_pending_hints_apply_to_one_window() {
        let (mut session, probe) = headless_session();
        session.set_next_window_hints(
            WindowHints::new().with(WindowHint::Resizable(false)).with_swap_interval(1),
        );
        let (_, hinted) = open(&mut session, "hinted");
        let (_, plain) = open(&mut session, "plain");

        let hinted = probe.window(hinted).unwrap();
        assert_eq!(hinted.hints, vec![WindowHint::Resizable(false)]);
        assert_eq!(hinted.swap_interval, Some(1));

        let plain = probe.window(plain).unwrap();
        assert!(plain.hints.is_empty());
        assert_eq!(plain.swap_interval, None);
    }

    #[test]
    fn test_swap_interval_restores_previous_context() {
        let (mut session, probe) = headless_session();
        let (first, handle_first) = open(&mut session, "first");
        session.window_mut(first).unwrap().make_current(true);

        session.set_next_window_hints(WindowHints::new().with_swap_interval(0));
        let (_, handle_second) = open(&mut session, "second");

        assert_eq!(probe.current_context(), Some(handle_first));
        assert_eq!(probe.window(handle_second).unwrap().swap_interval, Some(0));
        assert!(session.window(first).unwrap().is_current());
    }

    #[test]
    fn test_config_hints_under_pending_hints() {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let config = SessionConfig {
            init_hints: vec![InitHint::Platform(PlatformKind::Null)],
            window_hints: WindowHints::new().with(WindowHint::Visible(false)),
        };
        let mut session = Session::with_config(backend, &config).unwrap();
        assert_eq!(probe.init_hints(), vec![InitHint::Platform(PlatformKind::Null)]);

        session.set_next_window_hints(WindowHints::new().with(WindowHint::Visible(true)));
        let (_, first) = open(&mut session, "first");
        let (_, second) = open(&mut session, "second");

        assert_eq!(
            probe.window(first).unwrap().hints,
            vec![WindowHint::Visible(false), WindowHint::Visible(true)]
        );
        assert_eq!(probe.window(second).unwrap().hints, vec![WindowHint::Visible(false)]);
    }

    #[test]
    fn test_init_failure_classification() {
        let backend = HeadlessBackend::new();
        backend.probe().fail_init(NativeError::new(ErrorCode::PlatformUnavailable, "no display"));
        assert!(matches!(Session::new(backend), Err(SessionError::PlatformUnavailable(_))));

        let backend = HeadlessBackend::new();
        backend.probe().fail_init(NativeError::new(ErrorCode::OutOfMemory, "oom"));
        assert!(matches!(Session::new(backend), Err(SessionError::PlatformError(_))));
    }

    #[test]
    fn test_creation_failure_reports_native_error_and_consumes_hints() {
        let (mut session, probe) = headless_session();
        session.set_next_window_hints(WindowHints::new().with(WindowHint::Decorated(false)));
        probe.fail_next_create(NativeError::new(ErrorCode::VersionUnavailable, "GL 9.9"));

        let err = session.create_window(640, 480, "doomed", None, None).unwrap_err();
        assert!(matches!(err, SessionError::WindowCreation(ref e) if e.code == ErrorCode::VersionUnavailable));
        assert!(session.is_empty());

        let (_, handle) = open(&mut session, "after");
        assert!(probe.window(handle).unwrap().hints.is_empty());
        assert_eq!(session.check_consistency(), Ok(()));
    }

    #[test]
    fn test_zero_size_window_is_refused() {
        let (mut session, _probe) = headless_session();
        let err = session.create_window(0, 480, "flat", None, None).unwrap_err();
        assert!(matches!(err, SessionError::WindowCreation(ref e) if e.code == ErrorCode::InvalidValue));
    }

    #[test]
    fn test_shared_context() {
        let (mut session, probe) = headless_session();
        let (a, handle_a) = open(&mut session, "a");

        let shared = session.create_window(320, 240, "b", None, Some(a)).unwrap().handle();
        assert_eq!(probe.window(shared).unwrap().share, Some(handle_a));

        let unshared = session.create_window(320, 240, "c", None, Some(WindowId::NONE)).unwrap().handle();
        assert_eq!(probe.window(unshared).unwrap().share, None);

        let unknown = WindowId::from_raw(99);
        let err = session.create_window(320, 240, "d", None, Some(unknown)).unwrap_err();
        assert!(matches!(err, SessionError::UnknownWindow(id) if id == unknown));
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn test_window_teardown_order() {
        let (mut session, probe) = headless_session();
        let (id, handle) = open(&mut session, "doomed");
        session.destroy_window(id);

        let calls = probe.calls();
        let position = |call: &HeadlessCall| calls.iter().position(|c| c == call).unwrap();
        assert!(position(&HeadlessCall::Create(handle)) < position(&HeadlessCall::SetUserSlot(handle, None)));
        assert!(position(&HeadlessCall::SetUserSlot(handle, None)) < position(&HeadlessCall::Destroy(handle)));
    }

    #[test]
    fn test_session_teardown_detaches_then_destroys_then_terminates() {
        let (mut session, probe) = headless_session();
        let (a, handle_a) = open(&mut session, "a");
        let (_, handle_b) = open(&mut session, "b");
        session.window_mut(a).unwrap().make_current(true);
        drop(session);

        assert!(probe.live_handles().is_empty());
        assert!(!probe.is_initialized());
        assert_eq!(probe.current_context(), None);

        let calls = probe.calls();
        let position = |call: &HeadlessCall| calls.iter().rposition(|c| c == call).unwrap();
        assert!(position(&HeadlessCall::MakeCurrent(None)) < position(&HeadlessCall::Destroy(handle_a)));
        assert!(position(&HeadlessCall::Destroy(handle_b)) < position(&HeadlessCall::Terminate));
        assert_eq!(calls.last(), Some(&HeadlessCall::Terminate));
    }

    #[test]
    fn test_reused_native_handle_routes_to_new_owner() {
        let (mut session, probe) = headless_session();
        probe.reuse_handles(true);
        let (old, handle) = open(&mut session, "old");
        session.destroy_window(old);

        let (new, reused) = open(&mut session, "new");
        assert_eq!(reused, handle);
        assert_eq!(session.check_consistency(), Ok(()));
        assert!(session.dispatch_event(reused, NativeEvent::Refresh).is_ok());
        assert_eq!(session.window_ids(), vec![new]);
    }

    #[test]
    fn test_consistency_reports_foreign_slot() {
        let (mut session, _probe) = headless_session();
        let (id, handle) = open(&mut session, "tampered");
        session.shared().backend.borrow_mut().set_user_slot(handle, None);

        assert!(matches!(
            session.check_consistency(),
            Err(RegistryError::Inconsistent { window, .. }) if window == id
        ));
    }

    #[test]
    fn test_window_properties_round_trip() {
        let (mut session, probe) = headless_session();
        let (id, handle) = open(&mut session, "props");
        let window = session.window_mut(id).unwrap();

        window.set_title("renamed");
        window.set_pos(10, 20);
        window.set_size(800, 600);
        window.set_opacity(0.5);
        window.set_aspect_ratio(Some((16, 9)));
        window.set_icon(&[Image::from_rgba(1, 1, vec![255; 4]).unwrap()]);

        assert_eq!(window.title(), "renamed");
        assert_eq!(window.pos(), (10, 20));
        assert_eq!(window.size(), (800, 600));
        assert_eq!(window.framebuffer_size(), (800, 600));
        assert_relative_eq!(window.opacity(), 0.5);

        let native = probe.window(handle).unwrap();
        assert_eq!(native.aspect_ratio, Some((16, 9)));
        assert_eq!(native.icon.len(), 1);
    }

    #[test]
    fn test_native_errors_surface_through_last_error() {
        let (mut session, _probe) = headless_session();
        let (id, _) = open(&mut session, "errors");
        assert!(session.last_error().is_none());

        session.window_mut(id).unwrap().set_opacity(2.0);
        assert_eq!(session.last_error().map(|e| e.code), Some(ErrorCode::InvalidValue));
        assert!(session.last_error().is_none());
        assert_relative_eq!(session.window(id).unwrap().opacity(), 1.0);
    }

    #[test]
    fn test_proc_address_requires_current_context() {
        let (mut session, _probe) = headless_session();
        let (id, _) = open(&mut session, "gl");
        let window = session.window_mut(id).unwrap();

        assert!(window.proc_address("glClear").is_none());
        assert!(!window.extension_supported("GL_KHR_debug"));

        window.make_current(true);
        assert!(window.proc_address("glClear").is_some());
        assert!(window.proc_address("glNotAFunction").is_none());
        assert!(window.extension_supported("GL_KHR_debug"));

        window.make_current(false);
        assert!(!window.is_current());
    }

    #[test]
    fn test_context_less_window_cannot_become_current() {
        let (mut session, probe) = headless_session();
        session.set_next_window_hints(WindowHints::new().with(WindowHint::ClientApi(ClientApi::NoApi)));
        let (id, _) = open(&mut session, "vulkan");
        let window = session.window_mut(id).unwrap();
        window.make_current(true);

        assert!(!window.is_current());
        assert!(window.proc_address("glClear").is_none());
        assert_eq!(probe.current_context(), None);
        assert_eq!(session.last_error().map(|e| e.code), Some(ErrorCode::NoWindowContext));
    }

    #[test]
    fn test_failed_bind_keeps_previous_context() {
        let (mut session, probe) = headless_session();
        let (gl, handle_gl) = open(&mut session, "gl");
        session.window_mut(gl).unwrap().make_current(true);
        session.set_next_window_hints(WindowHints::new().with(WindowHint::ClientApi(ClientApi::NoApi)));
        let (vk, _) = open(&mut session, "vulkan");

        session.window_mut(vk).unwrap().make_current(true);
        assert!(!session.window(vk).unwrap().is_current());
        assert!(session.window(gl).unwrap().is_current());
        assert_eq!(probe.current_context(), Some(handle_gl));
    }

    #[test]
    fn test_swap_interval_skipped_for_context_less_window() {
        let (mut session, probe) = headless_session();
        let (gl, handle_gl) = open(&mut session, "gl");
        session.window_mut(gl).unwrap().make_current(true);

        session.set_next_window_hints(
            WindowHints::new().with(WindowHint::ClientApi(ClientApi::NoApi)).with_swap_interval(1),
        );
        let (_, handle_vk) = open(&mut session, "vulkan");

        assert_eq!(probe.window(handle_vk).unwrap().swap_interval, None);
        assert_eq!(probe.current_context(), Some(handle_gl));
        assert!(session.window(gl).unwrap().is_current());
        assert_eq!(session.last_error().map(|e| e.code), Some(ErrorCode::NoWindowContext));
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_base_swap_interval_applies_to_every_window() {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        let config = SessionConfig::from_toml_str("[window_hints]\nswap_interval = 1").unwrap();
        let mut session = Session::with_config(backend, &config).unwrap();

        let (_, first) = open(&mut session, "first");
        session.set_next_window_hints(WindowHints::new().with_swap_interval(0));
        let (_, overridden) = open(&mut session, "overridden");
        let (_, third) = open(&mut session, "third");

        assert_eq!(probe.window(first).unwrap().swap_interval, Some(1));
        assert_eq!(probe.window(overridden).unwrap().swap_interval, Some(0));
        assert_eq!(probe.window(third).unwrap().swap_interval, Some(1));
        assert_eq!(probe.current_context(), None);
    }

    #[test]
    fn test_window_swapped_across_sessions_fails_handle_check() {
        let (mut first, _first_probe) = headless_session();
        let (mut second, _second_probe) = headless_session();
        let (a, handle_a) = open(&mut first, "a");
        open(&mut second, "padding");
        let (x, handle_x) = open(&mut second, "x");
        assert_ne!(handle_a, handle_x);

        std::mem::swap(first.window_mut(a).unwrap(), second.window_mut(x).unwrap());

        assert_eq!(
            first.dispatch_event(handle_a, NativeEvent::Refresh),
            Err(DispatchError::HandleMismatch { dispatched: handle_a, window: a, owned: handle_x })
        );
        assert!(first.check_consistency().is_err());
        std::mem::swap(first.window_mut(a).unwrap(), second.window_mut(x).unwrap());
        assert_eq!(first.check_consistency(), Ok(()));
    }

    #[test]
    fn test_monitor_queries() {
        let (mut session, probe) = headless_session();
        let primary = session.primary_monitor().unwrap();
        assert_eq!(primary.name(), Some("Headless-1"));

        let current = session.current_video_mode(&primary).unwrap();
        assert_eq!((current.width, current.height), (1920, 1080));
        assert_eq!(session.video_modes(&primary).len(), 2);

        probe.add_monitor("Side", Vec::new()).unwrap();
        let monitors = session.monitors();
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[0], primary);
        assert!(session.current_video_mode(&monitors[1]).is_none());

        let handle = session.create_window(1920, 1080, "full", Some(&primary), None).unwrap().handle();
        assert_eq!(probe.window(handle).unwrap().monitor, Some(primary.handle()));
    }
}

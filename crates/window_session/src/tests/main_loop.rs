//! Close detection, two-pass deletion and loop termination

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{headless_session, open};
use crate::error::DispatchError;
use crate::event::NativeEvent;
use crate::input::{Action, Key};
use crate::WindowId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_close_is_a_pure_query() {
        let (mut session, _probe) = headless_session();
        let (id, _) = open(&mut session, "idle");
        let window = session.window_mut(id).unwrap();

        assert!(!window.should_close());
        assert!(!window.should_close());
        window.set_should_close(true);
        assert!(window.should_close());
        assert!(window.should_close());
        window.set_should_close(false);
        assert!(!window.should_close());

        assert!(session.run_once().is_empty());
        assert!(session.contains(id));
    }

    #[test]
    fn test_closing_first_window_leaves_second() {
        let (mut session, _probe) = headless_session();
        let (a, handle_a) = open(&mut session, "A");
        let (b, _) = open(&mut session, "B");
        assert_eq!((a, b), (WindowId::from_raw(1), WindowId::from_raw(2)));

        session.window_mut(a).unwrap().set_should_close(true);
        assert_eq!(session.run_once(), vec![a]);

        assert_eq!(session.window_ids(), vec![b]);
        assert_eq!(
            session.dispatch_event(handle_a, NativeEvent::Refresh),
            Err(DispatchError::NotFound(handle_a))
        );
        assert_eq!(session.check_consistency(), Ok(()));
    }

    #[test]
    fn test_two_pass_deletion_of_scattered_windows() {
        let (mut session, probe) = headless_session();
        let opened: Vec<_> = (1..=6).map(|n| open(&mut session, &format!("w{n}"))).collect();
        let processed = Rc::new(RefCell::new(BTreeMap::<WindowId, u32>::new()));

        let sink = Rc::clone(&processed);
        session.on_window_process.connect(move |_, id| *sink.borrow_mut().entry(*id).or_default() += 1);

        for &index in &[1, 2, 4] {
            probe.request_close(opened[index].1);
        }
        let erased = session.run_once();

        let closed: Vec<_> = [1, 2, 4].iter().map(|&index| opened[index].0).collect();
        let kept: Vec<_> = [0, 3, 5].iter().map(|&index| opened[index].0).collect();
        assert_eq!(erased, closed);
        assert_eq!(session.window_ids(), kept);
        assert_eq!(processed.borrow().keys().copied().collect::<Vec<_>>(), kept);
        for &index in &[1, 2, 4] {
            assert!(!probe.is_alive(opened[index].1));
        }
        assert_eq!(session.check_consistency(), Ok(()));
    }

    #[test]
    fn test_live_windows_are_processed_then_swapped() {
        let (mut session, probe) = headless_session();
        let (id, handle) = open(&mut session, "frames");
        let frames = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&frames);
        session.on_window_process.connect(move |window, id| {
            assert_eq!(window.id(), *id);
            sink.borrow_mut().push(*id);
        });

        session.run_once();
        session.run_once();
        assert_eq!(*frames.borrow(), vec![id, id]);
        assert_eq!(probe.window(handle).unwrap().swaps, 2);
    }

    #[test]
    fn test_closing_window_is_not_processed_or_swapped() {
        let (mut session, probe) = headless_session();
        let (id, handle) = open(&mut session, "closing");
        let processed = Rc::new(RefCell::new(0));

        let sink = Rc::clone(&processed);
        session.on_window_process.connect(move |_, _| *sink.borrow_mut() += 1);

        probe.request_close(handle);
        assert_eq!(session.run_once(), vec![id]);
        assert_eq!(*processed.borrow(), 0);
        assert!(session.is_empty());
    }

    #[test]
    fn test_key_handler_closes_window_on_next_iteration() {
        let (mut session, probe) = headless_session();
        let (id, handle) = open(&mut session, "escape");
        session.window_mut(id).unwrap().on_key.connect(|window, input| {
            if input.key == Key::ESCAPE && input.action == Action::Press {
                window.set_should_close(true);
            }
        });

        probe.push_event(handle, NativeEvent::Key { key: 256, scancode: 9, action: 1, mods: 0 });
        assert_eq!(session.run_once(), vec![id]);
    }

    #[test]
    fn test_run_returns_once_every_window_closed() {
        let (mut session, _probe) = headless_session();
        let (fast, _) = open(&mut session, "fast");
        let (slow, _) = open(&mut session, "slow");
        let frames = Rc::new(RefCell::new(BTreeMap::<WindowId, u32>::new()));

        let sink = Rc::clone(&frames);
        session.on_window_process.connect(move |window, id| {
            let mut frames = sink.borrow_mut();
            let count = frames.entry(*id).or_default();
            *count += 1;
            let limit = if *id == fast { 2 } else { 5 };
            if *count == limit {
                window.set_should_close(true);
            }
        });

        session.run();
        assert!(session.is_empty());
        assert_eq!(frames.borrow()[&fast], 2);
        assert_eq!(frames.borrow()[&slow], 5);
    }

    #[test]
    fn test_wait_variants_dispatch_pending_events() {
        let (mut session, probe) = headless_session();
        let (id, handle) = open(&mut session, "waiting");
        let refreshes = Rc::new(RefCell::new(0));

        let sink = Rc::clone(&refreshes);
        session.window_mut(id).unwrap().on_refresh.connect(move |_, ()| *sink.borrow_mut() += 1);

        probe.push_event(handle, NativeEvent::Refresh);
        session.wait_events();
        probe.push_event(handle, NativeEvent::Refresh);
        session.wait_events_timeout(0.5);
        session.post_empty_event();

        assert_eq!(*refreshes.borrow(), 2);
        assert_eq!(probe.wakeups(), 1);
    }
}

//! Session-level scenarios over the headless native layer

mod main_loop;
mod session_lifecycle;

use crate::backend::{HeadlessBackend, HeadlessProbe, NativeHandle};
use crate::foundation::logging;
use crate::{Session, WindowId};

/// Fresh session on a headless backend, plus the probe driving it
pub(crate) fn headless_session() -> (Session, HeadlessProbe) {
    logging::init_for_tests();
    let backend = HeadlessBackend::new();
    let probe = backend.probe();
    let session = Session::new(backend).expect("headless backend initializes");
    (session, probe)
}

/// Create a 640x480 window and return its id and native handle
pub(crate) fn open(session: &mut Session, title: &str) -> (WindowId, NativeHandle) {
    let window = session.create_window(640, 480, title, None, None).expect("headless window creation");
    (window.id(), window.handle())
}

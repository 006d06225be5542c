//! Multi-window session demo
//!
//! Opens a main window and a tool window sharing its context, echoes typed text
//! into the main window's title and closes a window on Escape. The loop ends
//! once both windows are closed.
//!
//! Built with `--features glfw` it opens real windows; otherwise it runs on the
//! headless backend for a fixed number of frames.
//!
//! An optional first argument names a `.toml` or `.ron` session config.

use std::cell::RefCell;
use std::rc::Rc;

use window_session::prelude::*;
use window_session::SessionResult;

/// Frames rendered per window before the headless run closes it
#[cfg(not(feature = "glfw"))]
const HEADLESS_FRAMES: u32 = 120;

#[cfg(feature = "glfw")]
fn open_session(config: &SessionConfig) -> SessionResult<Session> {
    Session::glfw(config)
}

#[cfg(not(feature = "glfw"))]
fn open_session(config: &SessionConfig) -> SessionResult<Session> {
    log::warn!("Built without the glfw feature, running headless");
    Session::with_config(HeadlessBackend::new(), config)
}

#[cfg(feature = "glfw")]
const fn scripted_close_due(_frames: u64) -> bool {
    false
}

#[cfg(not(feature = "glfw"))]
fn scripted_close_due(frames: u64) -> bool {
    frames >= u64::from(HEADLESS_FRAMES) * 2
}

fn wire_input(window: &mut Window) {
    let typed = Rc::new(RefCell::new(String::new()));

    let text = Rc::clone(&typed);
    window.on_char.connect(move |window, c| {
        text.borrow_mut().push(*c);
        window.set_title(&format!("Main - {}", text.borrow()));
    });

    let text = Rc::clone(&typed);
    window.on_key.connect(move |window, input| {
        match (input.key, input.action) {
            (Key::ESCAPE, Action::Press) => window.set_should_close(true),
            (Key::BACKSPACE, Action::Press | Action::Repeat) => {
                text.borrow_mut().pop();
                window.set_title(&format!("Main - {}", text.borrow()));
            }
            _ => {}
        }
    });

    window.on_framebuffer_size.connect(|window, (width, height)| {
        log::info!("{} framebuffer resized to {width}x{height}", window.id());
    });
    window.on_drop.connect(|window, paths| {
        for path in paths {
            log::info!("{} received {}", window.id(), path.display());
        }
    });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::load_from_file(&path)?,
        None => SessionConfig::default(),
    };
    let mut session = open_session(&config)?;

    for monitor in session.monitors() {
        let mode = session.current_video_mode(&monitor);
        log::info!(
            "Monitor {}: {}",
            monitor.name().unwrap_or("<unnamed>"),
            mode.map_or_else(|| "no video mode".to_string(), |mode| mode.to_string())
        );
    }

    session.set_next_window_hints(WindowHints::opengl_core(3, 3).with_swap_interval(1));
    let main_window = session.create_window(800, 600, "Main", None, None)?;
    wire_input(main_window);
    let main_id = main_window.id();

    let tools = session.create_window(320, 480, "Tools", None, Some(main_id))?;
    tools.on_key.connect(|window, input| {
        if input.key == Key::ESCAPE && input.action == Action::Press {
            window.set_should_close(true);
        }
    });
    tools.on_focus.connect(|window, focused| log::debug!("{} focused: {focused}", window.id()));

    let frames = Rc::new(RefCell::new(0_u64));
    let counter = Rc::clone(&frames);
    session.on_window_process.connect(move |window, _id| {
        *counter.borrow_mut() += 1;
        if scripted_close_due(*counter.borrow()) {
            window.set_should_close(true);
        }
    });

    session.run();
    log::info!("Processed {} window frames", frames.borrow());
    Ok(())
}

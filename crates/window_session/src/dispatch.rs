//! Native event dispatch
//!
//! Every native callback funnels into [`dispatch`]: one routine parameterized by
//! the event's kind instead of one hand-written trampoline per callback. It
//! resolves the owning window through the registry, checks that the resolved
//! window really owns the handle, decodes native arguments and fires the
//! matching signal.

use std::collections::BTreeMap;

use crate::backend::NativeHandle;
use crate::error::DispatchError;
use crate::event::{EventKind, NativeEvent, WindowEvent};
use crate::registry::HandleRegistry;
use crate::signal::emit_on;
use crate::window::{Window, WindowId};

/// Find the live window that owns `handle`
pub(crate) fn resolve<'w>(
    registry: &HandleRegistry,
    windows: &'w mut BTreeMap<WindowId, Window>,
    handle: NativeHandle,
) -> Result<&'w mut Window, DispatchError> {
    let id = registry.lookup(handle).map_err(|_| DispatchError::NotFound(handle))?;
    let window = windows.get_mut(&id).ok_or(DispatchError::NotFound(handle))?;
    if window.handle() != handle {
        return Err(DispatchError::HandleMismatch { dispatched: handle, window: id, owned: window.handle() });
    }
    Ok(window)
}

/// Route one native event to its window's signal
///
/// The registry is only consulted before handlers run; handlers may freely use
/// the window they receive.
pub(crate) fn dispatch(
    registry: &HandleRegistry,
    windows: &mut BTreeMap<WindowId, Window>,
    handle: NativeHandle,
    event: NativeEvent,
) -> Result<EventKind, DispatchError> {
    let kind = event.kind();
    let window = resolve(registry, windows, handle)?;
    let event = WindowEvent::try_from(event)?;
    log::trace!("{} <- {:?}", window.id(), event);
    deliver(window, &event);
    Ok(kind)
}

fn deliver(window: &mut Window, event: &WindowEvent) {
    match event {
        WindowEvent::Pos(x, y) => emit_on(window, |w| &w.on_pos, &(*x, *y)),
        WindowEvent::Size(width, height) => emit_on(window, |w| &w.on_size, &(*width, *height)),
        WindowEvent::Close => emit_on(window, |w| &w.on_close, &()),
        WindowEvent::Refresh => emit_on(window, |w| &w.on_refresh, &()),
        WindowEvent::Focus(focused) => emit_on(window, |w| &w.on_focus, focused),
        WindowEvent::Iconify(iconified) => emit_on(window, |w| &w.on_iconify, iconified),
        WindowEvent::Maximize(maximized) => emit_on(window, |w| &w.on_maximize, maximized),
        WindowEvent::FramebufferSize(width, height) => {
            emit_on(window, |w| &w.on_framebuffer_size, &(*width, *height));
        }
        WindowEvent::ContentScale(x, y) => emit_on(window, |w| &w.on_content_scale, &(*x, *y)),
        WindowEvent::Key(input) => emit_on(window, |w| &w.on_key, input),
        WindowEvent::Char(codepoint) => emit_on(window, |w| &w.on_char, codepoint),
        WindowEvent::CharMods(codepoint, mods) => emit_on(window, |w| &w.on_char_mods, &(*codepoint, *mods)),
        WindowEvent::MouseButton(input) => emit_on(window, |w| &w.on_mouse_button, input),
        WindowEvent::CursorPos(x, y) => emit_on(window, |w| &w.on_cursor_pos, &(*x, *y)),
        WindowEvent::CursorEnter(entered) => emit_on(window, |w| &w.on_cursor_enter, entered),
        WindowEvent::Scroll(x, y) => emit_on(window, |w| &w.on_scroll, &(*x, *y)),
        WindowEvent::Drop(paths) => emit_on(window, |w| &w.on_drop, paths),
    }
}

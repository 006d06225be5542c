//! Multi-subscriber signals
//!
//! A [`Signal`] calls every connected handler in connection order. Handlers get
//! mutable access to the window the event belongs to, which is why emission
//! works from a snapshot of the handler list: the signal itself lives inside
//! that window, and a handler may connect or disconnect handlers while it runs.
//! Such changes apply from the next emission on.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::window::Window;

type Handler<A> = Rc<RefCell<dyn FnMut(&mut Window, &A)>>;

/// Identifies one connected handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection(u64);

/// Multi-subscriber dispatch point carrying arguments of type `A`
pub struct Signal<A> {
    slots: Vec<(Connection, Handler<A>)>,
    next: u64,
}

impl<A: 'static> Signal<A> {
    /// Create a signal without handlers
    pub fn new() -> Self {
        Self { slots: Vec::new(), next: 0 }
    }

    /// Subscribe a handler, it runs after every handler connected before it
    pub fn connect<F>(&mut self, handler: F) -> Connection
    where
        F: FnMut(&mut Window, &A) + 'static,
    {
        let connection = Connection(self.next);
        self.next += 1;
        self.slots.push((connection, Rc::new(RefCell::new(handler))));
        connection
    }

    /// Unsubscribe a handler, `false` if it wasn't connected
    pub fn disconnect(&mut self, connection: Connection) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot, _)| *slot != connection);
        self.slots.len() != before
    }

    /// Unsubscribe every handler
    pub fn disconnect_all(&mut self) {
        self.slots.clear();
    }

    /// Number of connected handlers
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no handler is connected
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn snapshot(&self) -> Vec<Handler<A>> {
        self.slots.iter().map(|(_, handler)| Rc::clone(handler)).collect()
    }

    /// Invoke every handler, for signals stored outside `window`
    pub(crate) fn emit(&self, window: &mut Window, args: &A) {
        invoke(self.snapshot(), window, args);
    }
}

/// Invoke the window signal picked by `select`
pub(crate) fn emit_on<A, F>(window: &mut Window, select: F, args: &A)
where
    A: 'static,
    F: Fn(&Window) -> &Signal<A>,
{
    let handlers = select(window).snapshot();
    invoke(handlers, window, args);
}

fn invoke<A: 'static>(handlers: Vec<Handler<A>>, window: &mut Window, args: &A) {
    for handler in handlers {
        (&mut *handler.borrow_mut())(window, args);
    }
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("handlers", &self.slots.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_and_disconnect() {
        let mut signal: Signal<i32> = Signal::new();
        let first = signal.connect(|_, _| {});
        let second = signal.connect(|_, _| {});
        assert_eq!(signal.len(), 2);

        assert!(signal.disconnect(first));
        assert!(!signal.disconnect(first));
        assert_eq!(signal.len(), 1);

        signal.disconnect_all();
        assert!(signal.is_empty());
        assert!(!signal.disconnect(second));
    }

    #[test]
    fn test_connections_are_unique() {
        let mut signal: Signal<()> = Signal::new();
        let a = signal.connect(|_, _| {});
        signal.disconnect(a);
        let b = signal.connect(|_, _| {});
        assert_ne!(a, b);
    }
}

//! Change notification for curves.
//!
//! A [`Curve`] owns an ordered list of listeners and calls each of them, in
//! subscription order, after every mutation. Listeners receive the curve by
//! shared reference, so they can query it but not edit it from inside the
//! callback.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::spline::Curve;

pub trait CurveListener {
    fn curve_changed(&mut self, curve: &Curve);
}

/// Handle returned by [`ListenerRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub type SharedListener = Rc<RefCell<dyn CurveListener>>;

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(ListenerId, SharedListener)>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` at the end of the notification order. A listener that is
    /// already subscribed is moved to the end instead of being added twice.
    pub fn subscribe(&mut self, listener: SharedListener) -> ListenerId {
        self.unsubscribe_listener(&listener);
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn unsubscribe_listener(&mut self, listener: &SharedListener) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|(_, entry)| !same_listener(entry, listener));
        self.entries.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn notify(&self, curve: &Curve) {
        for (id, listener) in &self.entries {
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener.curve_changed(curve),
                Err(_) => log::warn!("listener {id:?} is busy; skipping curve notification"),
            }
        }
    }
}

/// Listeners belong to the curve instance they were registered with; a cloned
/// curve starts without any.
impl Clone for ListenerRegistry {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.entries.len())
            .finish()
    }
}

fn same_listener(a: &SharedListener, b: &SharedListener) -> bool {
    std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
}

//! Observer bus between the registry and its dependents.

use std::{cell::RefCell, rc::Rc};

use crate::model::{WindowId, WindowKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Created {
        id: WindowId,
        kind: WindowKind,
        folder: String,
    },
    Updated {
        id: WindowId,
    },
    Removed {
        id: WindowId,
        folder: String,
        remaining: usize,
    },
    RenderRequested,
    Notice(Notice),
}

type Listener<E> = Rc<dyn Fn(&E)>;

/// Synchronous multi-listener event bus. Listeners run in registration order and may
/// subscribe or emit re-entrantly.
pub struct EventBus<E> {
    listeners: RefCell<Vec<(u64, Listener<E>)>>,
    next_id: RefCell<u64>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: RefCell::new(1),
        }
    }
}

impl<E> EventBus<E> {
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> u64 {
        let mut next = self.next_id.borrow_mut();
        let id = *next;
        *next += 1;
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

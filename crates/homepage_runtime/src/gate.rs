use std::{cell::Cell, rc::Rc};

/// Single-owner busy marker. At most one [`GateGuard`] exists at a time; dropping it
/// releases the gate, including on early return.
#[derive(Debug, Clone, Default)]
pub struct BusyGate {
    busy: Rc<Cell<bool>>,
}

impl BusyGate {
    pub fn try_acquire(&self) -> Option<GateGuard> {
        if self.busy.replace(true) {
            return None;
        }
        Some(GateGuard {
            busy: Rc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

#[derive(Debug)]
pub struct GateGuard {
    busy: Rc<Cell<bool>>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}

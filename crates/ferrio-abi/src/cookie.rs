//! Cookie registry.
//!
//! A cookie is an opaque non-null handle to one live statement. The
//! registry maps cookie values to statement slots; EndIOStatement is
//! the only call that removes a slot, so use-after-End simply fails to
//! resolve instead of touching freed state.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use ferrio_core::IoStatement;

/// Opaque statement handle handed to generated code.
pub type Cookie = usize;

/// Where an internal output statement copies its records at End.
#[derive(Debug, Clone, Copy)]
pub enum CopyBack {
    /// Flat caller buffer: records flattened back in order.
    Flat { base: usize, len: usize },
    /// Array target: one record per descriptor element.
    Array(ferrio_core::descriptor::Descriptor),
}

pub struct StatementSlot {
    pub stmt: IoStatement,
    pub copy_back: Option<CopyBack>,
}

/// First cookie value; distinct from small integers and null.
const COOKIE_BASE: usize = 0x4000_0001;

static NEXT_COOKIE: Mutex<usize> = Mutex::new(COOKIE_BASE);

fn registry() -> &'static Mutex<HashMap<usize, StatementSlot>> {
    static REG: OnceLock<Mutex<HashMap<usize, StatementSlot>>> = OnceLock::new();
    REG.get_or_init(|| Mutex::new(HashMap::new()))
}

fn alloc_cookie() -> Cookie {
    let mut next = NEXT_COOKIE.lock().unwrap_or_else(|e| e.into_inner());
    let cookie = *next;
    *next = next.wrapping_add(1);
    cookie
}

/// Register a new statement and hand back its cookie.
pub fn register(stmt: IoStatement, copy_back: Option<CopyBack>) -> Cookie {
    let cookie = alloc_cookie();
    let mut reg = registry().lock().unwrap_or_else(|e| e.into_inner());
    reg.insert(cookie, StatementSlot { stmt, copy_back });
    cookie
}

/// Run `f` on the statement behind `cookie`; None if the cookie is
/// stale or was never issued.
pub fn with<R>(cookie: Cookie, f: impl FnOnce(&mut StatementSlot) -> R) -> Option<R> {
    let mut reg = registry().lock().unwrap_or_else(|e| e.into_inner());
    reg.get_mut(&cookie).map(f)
}

/// Remove and return the slot; the cookie is dead afterwards.
pub fn take(cookie: Cookie) -> Option<StatementSlot> {
    let mut reg = registry().lock().unwrap_or_else(|e| e.into_inner());
    reg.remove(&cookie)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrio_core::{Direction, Locus, Mode};

    fn statement() -> IoStatement {
        IoStatement::begin(
            Direction::Output,
            Mode::ListDirected,
            Locus::External(0x7fff_0001),
            None,
            0,
        )
    }

    #[test]
    fn test_register_with_take() {
        let cookie = register(statement(), None);
        assert!(with(cookie, |_| ()).is_some());
        assert!(take(cookie).is_some());
        // Dead after take.
        assert!(with(cookie, |_| ()).is_none());
        assert!(take(cookie).is_none());
    }

    #[test]
    fn test_cookies_are_distinct_and_nonzero() {
        let a = register(statement(), None);
        let b = register(statement(), None);
        assert_ne!(a, b);
        assert_ne!(a, 0);
        take(a);
        take(b);
    }
}

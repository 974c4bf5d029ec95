//! Scripted failures for the in-memory store, so tests can simulate a flaky backend

use crate::store::StoreError;

/// Describes how a [`MemoryStore`](crate::store::memory::MemoryStore) will (mis)behave
/// during a test.
///
/// For a given operation, `(m, n)` means "succeed _m_ times, then fail _n_ times,
/// then succeed forever".
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// When this is true, every operation is allowed
    pub is_suspended: bool,

    pub select_behaviour: (u32, u32),
    pub select_by_id_behaviour: (u32, u32),
    pub insert_behaviour: (u32, u32),
    pub update_behaviour: (u32, u32),
    pub delete_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails, `n_fails` times in a row
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            select_behaviour: (0, n_fails),
            select_by_id_behaviour: (0, n_fails),
            insert_behaviour: (0, n_fails),
            update_behaviour: (0, n_fails),
            delete_behaviour: (0, n_fails),
        }
    }

    /// Suspend this behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_select(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.select_behaviour, "select")
    }
    pub fn can_select_by_id(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.select_by_id_behaviour, "select_by_id")
    }
    pub fn can_insert(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.insert_behaviour, "insert")
    }
    pub fn can_update(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.update_behaviour, "update")
    }
    pub fn can_delete(&mut self) -> Result<(), StoreError> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.delete_behaviour, "delete")
    }
}

/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), StoreError> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(StoreError::Scripted(format!(
            "this {} is required to fail this time ({:?})",
            descr, value
        )))
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        for _ in 0..7 {
            assert!(ok.can_select().is_ok());
        }

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_select().is_err());
        assert!(now.can_insert().is_err());
        assert!(now.can_insert().is_err());
        assert!(now.can_select().is_err());
        assert!(now.can_select().is_ok());
        assert!(now.can_select().is_ok());
        assert!(now.can_insert().is_ok());

        let mut custom = MockBehaviour {
            select_behaviour: (0, 1),
            update_behaviour: (1, 3),
            ..MockBehaviour::default()
        };
        assert!(custom.can_select().is_err());
        assert!(custom.can_select().is_ok());
        assert!(custom.can_update().is_ok());
        assert!(custom.can_update().is_err());
        assert!(custom.can_update().is_err());
        assert!(custom.can_update().is_err());
        assert!(custom.can_update().is_ok());

        custom.suspend();
        assert!(custom.can_select().is_ok());
        custom.resume();
    }
}

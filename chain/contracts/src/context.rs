//! Per-call execution context supplied by the hosting ledger.

use offering_types::ids::AccountId;
use offering_types::numeric::{Amount, Timestamp};

/// Who is calling, at what ledger time, with how much native value attached.
///
/// Time windows are evaluated against `timestamp`, never the wall clock.
/// Attached native value is credited to the callee by the host before the
/// call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub timestamp: Timestamp,
    pub value: Amount,
}

impl CallContext {
    pub fn new(caller: AccountId, timestamp: Timestamp) -> Self {
        Self {
            caller,
            timestamp,
            value: 0,
        }
    }

    /// Attach native value to the call.
    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builders() {
        let alice = AccountId::from_label("alice");
        let ctx = CallContext::new(alice, 1_000).with_value(5);
        assert_eq!(ctx.value, 5);
        assert_eq!(ctx.caller, alice);
        assert_eq!(ctx.timestamp, 1_000);
        assert_eq!(CallContext::new(alice, 1_000).value, 0);
    }
}

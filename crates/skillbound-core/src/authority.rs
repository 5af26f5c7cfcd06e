//! # Authority Gate
//!
//! Single-account access control for administrative operations.

use crate::error::{LedgerError, Result};
use crate::Holder;
use serde::{Deserialize, Serialize};

/// Decides whether a caller may perform administrative operations.
pub trait AuthorityGate {
    fn is_authority(&self, caller: &Holder) -> bool;

    /// Hand the authority to another account. Only the current holder may.
    fn transfer_authority(&mut self, caller: &Holder, new_holder: Holder) -> Result<()>;

    /// Fail with `NotOwner` unless `caller` is the authority.
    fn require_authority(&self, caller: &Holder, action: &'static str) -> Result<()> {
        if self.is_authority(caller) {
            Ok(())
        } else {
            Err(LedgerError::not_owner(caller, action))
        }
    }
}

/// The default gate: exactly one designated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    holder: Holder,
}

impl Authority {
    #[must_use]
    pub fn new(holder: Holder) -> Self {
        Self { holder }
    }

    /// The current authority account.
    #[must_use]
    pub fn holder(&self) -> &Holder {
        &self.holder
    }
}

impl AuthorityGate for Authority {
    fn is_authority(&self, caller: &Holder) -> bool {
        &self.holder == caller
    }

    fn transfer_authority(&mut self, caller: &Holder, new_holder: Holder) -> Result<()> {
        self.require_authority(caller, "transfer authority")?;
        self.holder = new_holder;
        Ok(())
    }
}

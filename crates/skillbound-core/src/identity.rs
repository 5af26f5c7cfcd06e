//! # Identity Registry
//!
//! One non-transferable identity per holder. The ledger reaches the registry
//! only through [`IdentityRegistry`]; [`SoulboundRegistry`] is the in-memory
//! default.

use crate::error::{LedgerError, Result};
use crate::primitives::FIRST_IDENTITY_ID;
use crate::{Holder, IdentityId};
use std::collections::BTreeMap;

// =============================================================================
// TRAITS
// =============================================================================

/// Identity issuance and ownership lookup.
///
/// Identities can be created and destroyed but never moved between holders.
pub trait IdentityRegistry {
    /// Holder of an identity. Fails with `NotMinted` if absent.
    fn owner_of(&self, id: IdentityId) -> Result<&Holder>;

    /// Number of identities held (0 or 1).
    fn balance_of(&self, holder: &Holder) -> u64;

    /// Issue a new identity to `to`.
    fn mint(&mut self, to: Holder) -> Result<IdentityId>;

    /// Destroy an identity. Only its holder may do so.
    fn burn(&mut self, caller: &Holder, id: IdentityId) -> Result<()>;

    /// Always fails once the caller is shown to own the identity.
    fn transfer(&mut self, caller: &Holder, id: IdentityId, to: &Holder) -> Result<()>;

    /// Number of live identities.
    fn total_supply(&self) -> u64;

    /// Number of identities ever minted, burned ones included.
    fn minted_count(&self) -> u64;

    /// Identity held by `holder`, if any.
    fn identity_of(&self, holder: &Holder) -> Option<IdentityId>;

    /// Check that an identity exists.
    fn require_minted(&self, id: IdentityId) -> Result<()> {
        self.owner_of(id).map(|_| ())
    }
}

/// Capability check run before a mint completes.
pub trait ReceiverPolicy {
    /// Whether `holder` accepts the identity `id`.
    fn accepts(&self, holder: &Holder, id: IdentityId) -> bool;
}

/// Receiver policy accepting every holder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ReceiverPolicy for AcceptAll {
    fn accepts(&self, _holder: &Holder, _id: IdentityId) -> bool {
        true
    }
}

// =============================================================================
// SOULBOUND REGISTRY
// =============================================================================

/// In-memory registry of non-transferable identities.
#[derive(Debug, Clone)]
pub struct SoulboundRegistry<P = AcceptAll> {
    /// Live identities: id -> holder
    owners: BTreeMap<IdentityId, Holder>,

    /// Reverse lookup: holder -> id
    holdings: BTreeMap<Holder, IdentityId>,

    /// Next id to hand out. Ids are never reused.
    next_id: u64,

    receiver: P,
}

impl Default for SoulboundRegistry<AcceptAll> {
    fn default() -> Self {
        Self::with_receiver(AcceptAll)
    }
}

impl SoulboundRegistry<AcceptAll> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: ReceiverPolicy> SoulboundRegistry<P> {
    /// Create an empty registry with a custom receiver check.
    pub fn with_receiver(receiver: P) -> Self {
        Self {
            owners: BTreeMap::new(),
            holdings: BTreeMap::new(),
            next_id: FIRST_IDENTITY_ID,
            receiver,
        }
    }

    /// Rebuild a registry from persisted ownership, preserving ids.
    pub fn restore(
        owners: impl IntoIterator<Item = (IdentityId, Holder)>,
        next_id: u64,
        receiver: P,
    ) -> Result<Self> {
        let mut registry = Self::with_receiver(receiver);
        for (id, holder) in owners {
            if id.0 >= next_id {
                return Err(LedgerError::Format(format!(
                    "identity {} is not below next id {}",
                    id, next_id
                )));
            }
            if registry.holdings.contains_key(&holder) || registry.owners.contains_key(&id) {
                return Err(LedgerError::Format(format!(
                    "duplicate ownership for identity {}",
                    id
                )));
            }
            registry.holdings.insert(holder.clone(), id);
            registry.owners.insert(id, holder);
        }
        registry.next_id = next_id.max(FIRST_IDENTITY_ID);
        Ok(registry)
    }

    /// Live identities in id order.
    pub fn identities(&self) -> impl Iterator<Item = (IdentityId, &Holder)> {
        self.owners.iter().map(|(id, holder)| (*id, holder))
    }

    /// Next id that would be minted.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    fn require_holder(&self, caller: &Holder, id: IdentityId, action: &'static str) -> Result<()> {
        if self.owner_of(id)? != caller {
            return Err(LedgerError::not_owner(caller, action));
        }
        Ok(())
    }
}

impl<P: ReceiverPolicy> IdentityRegistry for SoulboundRegistry<P> {
    fn owner_of(&self, id: IdentityId) -> Result<&Holder> {
        self.owners.get(&id).ok_or(LedgerError::NotMinted(id))
    }

    fn balance_of(&self, holder: &Holder) -> u64 {
        u64::from(self.holdings.contains_key(holder))
    }

    fn mint(&mut self, to: Holder) -> Result<IdentityId> {
        if self.holdings.contains_key(&to) {
            return Err(LedgerError::AlreadyExists(to));
        }
        let id = IdentityId(self.next_id);
        if !self.receiver.accepts(&to, id) {
            return Err(LedgerError::ReceiverRejected(to));
        }
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow("identity counter"))?;
        self.holdings.insert(to.clone(), id);
        self.owners.insert(id, to);
        Ok(id)
    }

    fn burn(&mut self, caller: &Holder, id: IdentityId) -> Result<()> {
        self.require_holder(caller, id, "burn")?;
        self.owners.remove(&id);
        self.holdings.remove(caller);
        Ok(())
    }

    fn transfer(&mut self, caller: &Holder, id: IdentityId, _to: &Holder) -> Result<()> {
        self.require_holder(caller, id, "transfer")?;
        Err(LedgerError::NonTransferable(id))
    }

    fn total_supply(&self) -> u64 {
        self.owners.len() as u64
    }

    fn minted_count(&self) -> u64 {
        self.next_id.saturating_sub(FIRST_IDENTITY_ID)
    }

    fn identity_of(&self, holder: &Holder) -> Option<IdentityId> {
        self.holdings.get(holder).copied()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct DenyList(Vec<&'static str>);

    impl ReceiverPolicy for DenyList {
        fn accepts(&self, holder: &Holder, _id: IdentityId) -> bool {
            !self.0.contains(&holder.as_str())
        }
    }

    #[test]
    fn mint_assigns_sequential_ids() {
        let mut registry = SoulboundRegistry::new();
        let a = registry.mint(Holder::new("alice"));
        let b = registry.mint(Holder::new("bob"));

        assert_eq!(a, Ok(IdentityId(1)));
        assert_eq!(b, Ok(IdentityId(2)));
        assert_eq!(registry.total_supply(), 2);
        assert_eq!(registry.balance_of(&Holder::new("alice")), 1);
        assert_eq!(registry.balance_of(&Holder::new("carol")), 0);
    }

    #[test]
    fn second_mint_to_same_holder_fails() {
        let mut registry = SoulboundRegistry::new();
        let alice = Holder::new("alice");
        assert!(registry.mint(alice.clone()).is_ok());
        assert_eq!(
            registry.mint(alice.clone()),
            Err(LedgerError::AlreadyExists(alice))
        );
        assert_eq!(registry.next_id(), 2);
    }

    #[test]
    fn owner_of_unknown_is_not_minted() {
        let registry = SoulboundRegistry::new();
        assert_eq!(
            registry.owner_of(IdentityId(9)),
            Err(LedgerError::NotMinted(IdentityId(9)))
        );
    }

    #[test]
    fn transfer_is_refused() {
        let mut registry = SoulboundRegistry::new();
        let alice = Holder::new("alice");
        let bob = Holder::new("bob");
        let id = registry.mint(alice.clone()).unwrap_or(IdentityId(0));

        assert_eq!(
            registry.transfer(&alice, id, &bob),
            Err(LedgerError::NonTransferable(id))
        );
        assert!(matches!(
            registry.transfer(&bob, id, &bob),
            Err(LedgerError::NotOwner { .. })
        ));
        assert_eq!(registry.owner_of(id), Ok(&alice));
    }

    #[test]
    fn burn_frees_holder_but_not_id() {
        let mut registry = SoulboundRegistry::new();
        let alice = Holder::new("alice");
        let id = registry.mint(alice.clone()).unwrap_or(IdentityId(0));

        assert!(matches!(
            registry.burn(&Holder::new("bob"), id),
            Err(LedgerError::NotOwner { .. })
        ));
        assert_eq!(registry.burn(&alice, id), Ok(()));
        assert_eq!(registry.total_supply(), 0);
        assert_eq!(registry.minted_count(), 1);

        // Re-minting gives a fresh id
        assert_eq!(registry.mint(alice), Ok(IdentityId(2)));
    }

    #[test]
    fn receiver_policy_can_refuse() {
        let mut registry = SoulboundRegistry::with_receiver(DenyList(vec!["vault"]));
        let vault = Holder::new("vault");
        assert_eq!(
            registry.mint(vault.clone()),
            Err(LedgerError::ReceiverRejected(vault))
        );
        assert_eq!(registry.total_supply(), 0);
        assert_eq!(registry.next_id(), FIRST_IDENTITY_ID);
    }

    #[test]
    fn restore_preserves_ids() {
        let registry = SoulboundRegistry::restore(
            vec![(IdentityId(3), Holder::new("carol"))],
            5,
            AcceptAll,
        );
        let registry = registry.unwrap_or_default();
        assert_eq!(registry.owner_of(IdentityId(3)), Ok(&Holder::new("carol")));
        assert_eq!(registry.next_id(), 5);
    }

    #[test]
    fn restore_rejects_duplicate_holder() {
        let result = SoulboundRegistry::restore(
            vec![
                (IdentityId(1), Holder::new("carol")),
                (IdentityId(2), Holder::new("carol")),
            ],
            3,
            AcceptAll,
        );
        assert!(matches!(result, Err(LedgerError::Format(_))));
    }
}

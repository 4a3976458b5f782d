//! Compliance gate
//!
//! The identity registry is an external authority. Contracts consume it only
//! through [`ComplianceRegistry`]; [`InMemoryRegistry`] is a host-side
//! implementation used for local deployments and tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use offering_types::ids::{AccountId, ClassId};

use crate::errors::ComplianceError;

/// Yes/no authority over accounts, per compliance class.
pub trait ComplianceRegistry {
    /// Whether `class` is known to the registry.
    fn class_exists(&self, class: ClassId) -> bool;

    /// Whether `account` is currently approved in `class`.
    ///
    /// Lookups against an unknown class fail rather than answering `false`.
    fn is_approved(&self, class: ClassId, account: &AccountId) -> Result<bool, ComplianceError>;

    /// Fails unless `account` is currently approved in `class`.
    fn require_approved(&self, class: ClassId, account: &AccountId) -> Result<(), ComplianceError> {
        if self.is_approved(class, account)? {
            Ok(())
        } else {
            Err(ComplianceError::NotApproved {
                class,
                account: *account,
            })
        }
    }
}

/// Registry backed by in-process sets. Approvals can be granted and revoked
/// at any time, so holders can lose approval after tokens are issued.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    classes: RefCell<HashMap<ClassId, HashSet<AccountId>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class with no approved accounts.
    pub fn create_class(&self, class: ClassId) {
        self.classes.borrow_mut().entry(class).or_default();
    }

    /// Approve `account` in `class`, creating the class if needed.
    pub fn approve(&self, class: ClassId, account: AccountId) {
        self.classes
            .borrow_mut()
            .entry(class)
            .or_default()
            .insert(account);
    }

    /// Revoke an approval. Returns `false` if the account was not approved.
    pub fn revoke(&self, class: ClassId, account: &AccountId) -> bool {
        self.classes
            .borrow_mut()
            .get_mut(&class)
            .map_or(false, |members| members.remove(account))
    }
}

impl ComplianceRegistry for InMemoryRegistry {
    fn class_exists(&self, class: ClassId) -> bool {
        self.classes.borrow().contains_key(&class)
    }

    fn is_approved(&self, class: ClassId, account: &AccountId) -> Result<bool, ComplianceError> {
        self.classes
            .borrow()
            .get(&class)
            .map(|members| members.contains(account))
            .ok_or(ComplianceError::UnknownClass { class })
    }
}

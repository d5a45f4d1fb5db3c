// 👤 Patron Entity - Library user record + in-memory registry
//
// Identity: 7-digit id (never changes, no setter)
// Values: name, address, fine (setters re-validate)

use crate::error::{RegistryError, Result};
use crate::validation::{valid_address, valid_name, FieldRules};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

// ============================================================================
// PATRON ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patron {
    // ========================================================================
    // IDENTITY (immutable)
    // ========================================================================
    id: String,

    // ========================================================================
    // VALUES (can change)
    // ========================================================================
    name: String,
    address: String,
    fine: f64,
}

impl Patron {
    /// Create a patron, checking every field against `rules`.
    ///
    /// Text fields are trimmed before they are checked and stored.
    pub fn new(
        id: &str,
        name: &str,
        address: &str,
        fine: f64,
        rules: &FieldRules,
    ) -> Result<Self> {
        let id = id.trim();
        if !rules.valid_id(id) {
            return Err(RegistryError::invalid_field("id", id));
        }
        if !valid_name(name) {
            return Err(RegistryError::invalid_field("name", name));
        }
        if !valid_address(address) {
            return Err(RegistryError::invalid_field("address", address));
        }
        if !rules.fine_in_range(fine) {
            return Err(RegistryError::invalid_field("fine", fine.to_string()));
        }

        Ok(Self::from_validated(id, name.trim(), address.trim(), fine))
    }

    /// Caller has already run every field check.
    pub(crate) fn from_validated(id: &str, name: &str, address: &str, fine: f64) -> Self {
        Patron {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            fine,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn fine(&self) -> f64 {
        self.fine
    }

    /// Replace the name. An empty name leaves the patron unchanged.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if !valid_name(name) {
            return Err(RegistryError::invalid_field("name", name));
        }
        self.name = name.trim().to_string();
        Ok(())
    }

    pub fn set_address(&mut self, address: &str) -> Result<()> {
        if !valid_address(address) {
            return Err(RegistryError::invalid_field("address", address));
        }
        self.address = address.trim().to_string();
        Ok(())
    }

    pub fn set_fine(&mut self, fine: f64, rules: &FieldRules) -> Result<()> {
        if !rules.fine_in_range(fine) {
            return Err(RegistryError::invalid_field("fine", fine.to_string()));
        }
        self.fine = fine;
        Ok(())
    }
}

impl fmt::Display for Patron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | Name: {} | Address: {} | Fine: ${:.2}",
            self.id, self.name, self.address, self.fine
        )
    }
}

// ============================================================================
// PATRON REGISTRY
// ============================================================================

/// In-memory store keyed by patron id.
///
/// Ids are unique; `insert` never overwrites. Iteration order is unspecified.
#[derive(Debug, Default)]
pub struct PatronRegistry {
    patrons: HashMap<String, Patron>,
}

impl PatronRegistry {
    pub fn new() -> Self {
        PatronRegistry {
            patrons: HashMap::new(),
        }
    }

    /// Add a patron. Fails with `DuplicateId` if the id is taken.
    pub fn insert(&mut self, patron: Patron) -> Result<()> {
        if self.patrons.contains_key(patron.id()) {
            return Err(RegistryError::DuplicateId(patron.id().to_string()));
        }

        info!(id = patron.id(), name = patron.name(), "patron added");
        self.patrons.insert(patron.id().to_string(), patron);
        Ok(())
    }

    /// Remove by id. Returns the removed patron, if there was one.
    pub fn remove(&mut self, id: &str) -> Option<Patron> {
        let removed = self.patrons.remove(id);
        match &removed {
            Some(_) => info!(id, "patron removed"),
            None => debug!(id, "remove requested for unknown id"),
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.patrons.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Patron> {
        self.patrons.get(id)
    }

    /// Apply setters to a stored patron.
    pub fn update<F>(&mut self, id: &str, update_fn: F) -> Result<()>
    where
        F: FnOnce(&mut Patron) -> Result<()>,
    {
        let patron = self
            .patrons
            .get_mut(id)
            .ok_or_else(|| RegistryError::PatronNotFound(id.to_string()))?;

        update_fn(patron)
    }

    pub fn all(&self) -> impl Iterator<Item = &Patron> {
        self.patrons.values()
    }

    pub fn len(&self) -> usize {
        self.patrons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patrons.is_empty()
    }

    pub fn total_fines(&self) -> f64 {
        self.patrons.values().map(Patron::fine).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Patron {
        Patron::new("1234567", "Alice", "123 Main St", 10.5, &FieldRules::default()).unwrap()
    }

    fn bob() -> Patron {
        Patron::new("7654321", "Bob", "456 Oak St", 0.0, &FieldRules::default()).unwrap()
    }

    #[test]
    fn test_patron_creation() {
        let patron = alice();
        assert_eq!(patron.id(), "1234567");
        assert_eq!(patron.name(), "Alice");
        assert_eq!(patron.address(), "123 Main St");
        assert_eq!(patron.fine(), 10.5);
    }

    #[test]
    fn test_patron_creation_trims_fields() {
        let patron =
            Patron::new(" 1234567 ", "  Alice ", " 1 Elm ", 1.0, &FieldRules::default()).unwrap();
        assert_eq!(patron.id(), "1234567");
        assert_eq!(patron.name(), "Alice");
        assert_eq!(patron.address(), "1 Elm");
    }

    #[test]
    fn test_patron_creation_rejects_each_field() {
        let rules = FieldRules::default();
        assert!(Patron::new("12345", "A", "B", 1.0, &rules).is_err());
        assert!(Patron::new("1234567", " ", "B", 1.0, &rules).is_err());
        assert!(Patron::new("1234567", "A", "", 1.0, &rules).is_err());
        assert!(Patron::new("1234567", "A", "B", 250.5, &rules).is_err());
        assert!(Patron::new("1234567", "A", "B", -1.0, &rules).is_err());
    }

    #[test]
    fn test_display_format() {
        assert_eq!(
            alice().to_string(),
            "ID: 1234567 | Name: Alice | Address: 123 Main St | Fine: $10.50"
        );
        assert_eq!(
            bob().to_string(),
            "ID: 7654321 | Name: Bob | Address: 456 Oak St | Fine: $0.00"
        );
    }

    #[test]
    fn test_setters_validate() {
        let rules = FieldRules::default();
        let mut patron = alice();

        patron.set_name("Alicia").unwrap();
        patron.set_address("9 Birch Rd").unwrap();
        patron.set_fine(250.0, &rules).unwrap();
        assert_eq!(patron.name(), "Alicia");
        assert_eq!(patron.address(), "9 Birch Rd");
        assert_eq!(patron.fine(), 250.0);

        assert!(patron.set_name("").is_err());
        assert!(patron.set_address("  ").is_err());
        assert!(patron.set_fine(300.0, &rules).is_err());
        assert_eq!(patron.name(), "Alicia");
        assert_eq!(patron.address(), "9 Birch Rd");
        assert_eq!(patron.fine(), 250.0);
    }

    #[test]
    fn test_registry_insert_and_contains() {
        let mut registry = PatronRegistry::new();
        assert!(registry.is_empty());

        registry.insert(alice()).unwrap();
        assert!(registry.contains("1234567"));
        assert!(!registry.contains("7654321"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_insert_duplicate_does_not_overwrite() {
        let mut registry = PatronRegistry::new();
        registry.insert(alice()).unwrap();

        let impostor =
            Patron::new("1234567", "Mallory", "Nowhere", 1.0, &FieldRules::default()).unwrap();
        let result = registry.insert(impostor);

        assert!(matches!(result, Err(RegistryError::DuplicateId(id)) if id == "1234567"));
        assert_eq!(registry.get("1234567").unwrap().name(), "Alice");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_remove_existing_only_removes_that_record() {
        let mut registry = PatronRegistry::new();
        registry.insert(alice()).unwrap();
        registry.insert(bob()).unwrap();

        let removed = registry.remove("1234567");
        assert_eq!(removed.map(|p| p.name().to_string()), Some("Alice".to_string()));
        assert!(!registry.contains("1234567"));
        assert!(registry.contains("7654321"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_remove_missing_does_not_mutate() {
        let mut registry = PatronRegistry::new();
        registry.insert(alice()).unwrap();

        assert!(registry.remove("0000000").is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("1234567"));
    }

    #[test]
    fn test_registry_all() {
        let mut registry = PatronRegistry::new();
        registry.insert(alice()).unwrap();
        registry.insert(bob()).unwrap();

        let mut ids: Vec<&str> = registry.all().map(Patron::id).collect();
        ids.sort();
        assert_eq!(ids, vec!["1234567", "7654321"]);
    }

    #[test]
    fn test_registry_update() {
        let mut registry = PatronRegistry::new();
        registry.insert(alice()).unwrap();

        registry
            .update("1234567", |p| p.set_name("Alice Smith"))
            .unwrap();
        assert_eq!(registry.get("1234567").unwrap().name(), "Alice Smith");

        let result = registry.update("1234567", |p| p.set_name(""));
        assert!(result.is_err());
        assert_eq!(registry.get("1234567").unwrap().name(), "Alice Smith");
    }

    #[test]
    fn test_update_nonexistent_patron_fails() {
        let mut registry = PatronRegistry::new();
        let result = registry.update("0000000", |p| p.set_name("Ghost"));
        assert!(matches!(result, Err(RegistryError::PatronNotFound(_))));
    }

    #[test]
    fn test_total_fines() {
        let mut registry = PatronRegistry::new();
        assert_eq!(registry.total_fines(), 0.0);
        registry.insert(alice()).unwrap();
        registry.insert(bob()).unwrap();
        assert_eq!(registry.total_fines(), 10.5);
    }
}

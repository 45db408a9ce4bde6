// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Damage negotiation
//!
//! The collision world only dispatches damager/damageable overlaps. What a
//! hit is worth and what happens on impact belongs to the damageable side,
//! expressed through [`DamageNegotiator`].

use crate::ecs::Entity;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// A damager fixture touching a damageable fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageContact {
    /// Entity owning the damager fixture
    pub damager: Entity,
    /// Category of the damager
    pub damager_category: String,
    /// Entity owning the damageable fixture
    pub victim: Entity,
}

/// Decides how much damage a contact deals
pub trait DamageNegotiator {
    /// Handle one damage onset, returning the damage dealt (`0` if ignored)
    fn negotiate(&mut self, contact: &DamageContact) -> u32;
}

impl<F> DamageNegotiator for F
where
    F: FnMut(&DamageContact) -> u32,
{
    fn negotiate(&mut self, contact: &DamageContact) -> u32 {
        self(contact)
    }
}

type AmountFn = Box<dyn Fn(&DamageContact) -> u32>;
type SideEffect = Box<dyn FnMut(&DamageContact, u32)>;

/// Per-category damage amounts plus an on-damage side effect
///
/// # Examples
///
/// ```
/// use platformer_core::damage::{DamageContact, DamageNegotiator, DamageTable};
/// use platformer_core::Entity;
///
/// let mut table = DamageTable::new().with_fixed("bullet", 2);
/// let contact = DamageContact {
///     damager: Entity::new(1, 0),
///     damager_category: "bullet".into(),
///     victim: Entity::new(2, 0),
/// };
/// assert_eq!(table.negotiate(&contact), 2);
/// ```
#[derive(Default)]
pub struct DamageTable {
    amounts: HashMap<String, AmountFn>,
    on_damage: Option<SideEffect>,
}

impl DamageTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constant amount for `category`
    pub fn with_fixed(self, category: impl Into<String>, amount: u32) -> Self {
        self.with_amount(category, move |_| amount)
    }

    /// Register an amount function for `category`
    pub fn with_amount(
        mut self,
        category: impl Into<String>,
        amount: impl Fn(&DamageContact) -> u32 + 'static,
    ) -> Self {
        self.amounts.insert(category.into(), Box::new(amount));
        self
    }

    /// Run `effect` after every contact that dealt damage
    pub fn on_damage(mut self, effect: impl FnMut(&DamageContact, u32) + 'static) -> Self {
        self.on_damage = Some(Box::new(effect));
        self
    }

    /// True if `category` has an entry
    pub fn handles(&self, category: &str) -> bool {
        self.amounts.contains_key(category)
    }
}

impl DamageNegotiator for DamageTable {
    fn negotiate(&mut self, contact: &DamageContact) -> u32 {
        let Some(amount) = self.amounts.get(&contact.damager_category) else {
            debug!(category = %contact.damager_category, victim = %contact.victim, "damage_category_ignored");
            return 0;
        };
        let dealt = amount(contact);
        if dealt > 0 {
            if let Some(effect) = self.on_damage.as_mut() {
                effect(contact, dealt);
            }
        }
        dealt
    }
}

impl fmt::Debug for DamageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut categories: Vec<_> = self.amounts.keys().collect();
        categories.sort();
        f.debug_struct("DamageTable")
            .field("categories", &categories)
            .finish_non_exhaustive()
    }
}

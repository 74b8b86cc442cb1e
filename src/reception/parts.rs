//! Spare parts attached to a reception.
//!
//! Quantities are [`NonZeroU32`]: an entry whose quantity would drop to zero
//! leaves the ledger instead.

use std::{collections::HashMap, num::NonZeroU32};

use crate::api::{
    catalog::{Part, PartId},
    reception::ExtraInput,
};

/// Number of catalog matches offered for a search term.
pub const SEARCH_LIMIT: usize = 10;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartsLedger {
    entries: Vec<(PartId, NonZeroU32)>,
}

impl PartsLedger {
    /// Builds the ledger from the `pieces`/`pieceCounters` pair. A part
    /// without a counter counts once; non-positive counters are dropped.
    pub fn from_wire(pieces: &[PartId], counters: &HashMap<PartId, i64>) -> Self {
        let mut ledger = Self::default();
        for part in pieces {
            if ledger.position(part).is_some() {
                continue;
            }
            let count = counters.get(part).copied().unwrap_or(1);
            let quantity = u32::try_from(count)
                .unwrap_or(if count > 0 { u32::MAX } else { 0 });
            if let Some(quantity) = NonZeroU32::new(quantity) {
                ledger.entries.push((part.clone(), quantity));
            }
        }
        ledger
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartId, u32)> {
        self.entries.iter().map(|(part, q)| (part, q.get()))
    }

    pub fn quantity(&self, part: &PartId) -> u32 {
        self.position(part).map_or(0, |i| self.entries[i].1.get())
    }

    /// Adds one unit of `part`, inserting it when absent.
    pub fn add(&mut self, part: PartId) {
        if !self.increment(&part) {
            self.entries.push((part, NonZeroU32::MIN));
        }
    }

    pub fn increment(&mut self, part: &PartId) -> bool {
        match self.position(part) {
            Some(i) => {
                let quantity = &mut self.entries[i].1;
                *quantity = quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Removes one unit of `part`; the last unit removes the entry.
    pub fn decrement(&mut self, part: &PartId) -> bool {
        let Some(i) = self.position(part) else {
            return false;
        };
        match NonZeroU32::new(self.entries[i].1.get() - 1) {
            Some(quantity) => self.entries[i].1 = quantity,
            None => {
                self.entries.remove(i);
            }
        }
        true
    }

    /// Sets the quantity of `part`; zero removes it.
    pub fn set_quantity(&mut self, part: PartId, quantity: u32) {
        match (self.position(&part), NonZeroU32::new(quantity)) {
            (Some(i), Some(quantity)) => self.entries[i].1 = quantity,
            (Some(i), None) => {
                self.entries.remove(i);
            }
            (None, Some(quantity)) => self.entries.push((part, quantity)),
            (None, None) => {}
        }
    }

    pub fn remove(&mut self, part: &PartId) -> bool {
        match self.position(part) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn to_input(&self) -> ExtraInput {
        ExtraInput {
            pieces: self.entries.iter().map(|(part, _)| part.clone()).collect(),
            piece_counters: self
                .entries
                .iter()
                .map(|(part, q)| (part.clone(), q.get()))
                .collect(),
        }
    }

    /// Pairs every entry with its catalog part, `None` for unknown ids.
    pub fn resolve<'a>(
        &'a self,
        catalog: &'a [Part],
    ) -> Vec<(&'a PartId, Option<&'a Part>, u32)> {
        self.iter()
            .map(|(id, quantity)| {
                (id, catalog.iter().find(|p| &p.id == id), quantity)
            })
            .collect()
    }

    fn position(&self, part: &PartId) -> Option<usize> {
        self.entries.iter().position(|(p, _)| p == part)
    }
}

/// Catalog parts whose designation or reference contains `term`.
pub fn search<'a>(catalog: &'a [Part], term: &str) -> Vec<&'a Part> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|p| {
            p.designation.to_lowercase().contains(&term)
                || p.reference_article.to_lowercase().contains(&term)
        })
        .take(SEARCH_LIMIT)
        .collect()
}

/// Part matching a scanned barcode or a typed reference.
pub fn lookup_code<'a>(catalog: &'a [Part], code: &str) -> Option<&'a Part> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return None;
    }
    catalog.iter().find(|p| {
        p.bar_code.as_deref().is_some_and(|b| b.to_uppercase() == code)
            || p.reference_article.to_uppercase() == code
    })
}

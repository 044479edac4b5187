use rand::{seq::SliceRandom, Rng};

use crate::{
    ingredient::{Ingredient, CATALOG},
    Millis,
};

// Starts from 1, in spawn order
pub type OrderId = u32;

pub const MIN_INGREDIENTS: usize = 2;
pub const MAX_INGREDIENTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub required: Vec<Ingredient>,
    pub added: Vec<Ingredient>,
    pub start_time: Millis,
    pub completion_time: Option<Millis>,
}

impl Order {
    pub fn new(id: OrderId, required: Vec<Ingredient>, start_time: Millis) -> Self {
        Self {
            id,
            required,
            added: Vec::new(),
            start_time,
            completion_time: None,
        }
    }

    /// Creates an order asking for 2 to 5 distinct ingredients of the catalog.
    pub fn random<R: Rng + ?Sized>(id: OrderId, start_time: Millis, rng: &mut R) -> Self {
        let n = rng.gen_range(MIN_INGREDIENTS..=MAX_INGREDIENTS);
        let mut shuffled = CATALOG.to_vec();
        shuffled.shuffle(rng);
        shuffled.truncate(n);
        Self::new(id, shuffled, start_time)
    }

    pub fn requires(&self, ingredient: Ingredient) -> bool {
        self.required.contains(&ingredient)
    }

    pub fn has_added(&self, ingredient: Ingredient) -> bool {
        self.added.contains(&ingredient)
    }

    pub fn is_completed(&self) -> bool {
        self.completion_time.is_some()
    }

    // Open means it still shows up on the counter
    pub fn is_open(&self) -> bool {
        !self.is_completed()
    }

    // Started and not handed out yet, even when every ingredient is in
    pub fn is_in_progress(&self) -> bool {
        !self.added.is_empty() && !self.is_completed()
    }

    pub fn has_all_ingredients(&self) -> bool {
        self.required.iter().all(|i| self.added.contains(i))
    }

    pub fn missing(&self) -> impl Iterator<Item = &Ingredient> {
        self.required.iter().filter(move |i| !self.added.contains(i))
    }

    pub fn progress_percent(&self) -> u32 {
        if self.required.is_empty() {
            return 100;
        }
        ((self.added.len() as f64 / self.required.len() as f64) * 100.0).round() as u32
    }

    pub fn elapsed_secs(&self, now: Millis) -> u64 {
        now.saturating_sub(self.start_time) / 1000
    }

    pub fn duration_millis(&self) -> Option<Millis> {
        self.completion_time
            .map(|done| done.saturating_sub(self.start_time))
    }
}

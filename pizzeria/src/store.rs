use std::fmt::Display;

use tracing::debug;

use crate::{
    ingredient::Ingredient,
    mode::Eligibility,
    order::{Order, OrderId},
    Millis,
};

/// Why a player action was turned down. Nothing is mutated when one of
/// these comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotRunning,
    NoOpenOrder,
    UnknownOrder(OrderId),
    AlreadyCompleted(OrderId),
    NotRequired(Ingredient),
    AlreadyAdded(Ingredient),
    Locked(OrderId),
    NotOldest { order_id: OrderId, oldest: OrderId },
    NoSelection,
    NotSelected(OrderId),
    SelectionUnused,
    MissingIngredients { order_id: OrderId, missing: usize },
}

impl Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Rejection::*;
        match self {
            NotRunning => write!(f, "The game is not running. Type `start` first."),
            NoOpenOrder => write!(f, "There are no open orders right now."),
            UnknownOrder(id) => write!(f, "There is no order #{} on the counter.", id),
            AlreadyCompleted(id) => write!(f, "Order #{} is already completed.", id),
            NotRequired(i) => write!(f, "{} is not needed for this order!", i),
            AlreadyAdded(i) => write!(f, "{} has already been added!", i),
            Locked(id) => write!(f, "Order #{} is locked. Work on other orders!", id),
            NotOldest { order_id, oldest } => write!(
                f,
                "Order #{} has to wait. Finish order #{} first!",
                order_id, oldest
            ),
            NoSelection => write!(f, "Please select an order first!"),
            NotSelected(id) => write!(f, "Order #{} is not the selected order.", id),
            SelectionUnused => write!(f, "This game mode doesn't use order selection."),
            MissingIngredients { order_id, missing } => write!(
                f,
                "Please add all required ingredients before completing order #{} ({} missing)!",
                order_id, missing
            ),
        }
    }
}

impl std::error::Error for Rejection {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    // All ingredients are in, waiting for the player to confirm
    ReadyToComplete,
    Completed(Millis),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Touch {
    pub order_id: OrderId,
    pub at: Millis,
}

#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Vec<Order>,
    last_touched: Option<Touch>,
    selected: Option<OrderId>,
}

impl OrderStore {
    pub fn push(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_open())
    }

    pub fn oldest_open(&self) -> Option<OrderId> {
        self.open_orders().map(|o| o.id).min()
    }

    pub fn wip(&self) -> usize {
        self.orders.iter().filter(|o| o.is_in_progress()).count()
    }

    pub fn last_touched(&self) -> Option<Touch> {
        self.last_touched
    }

    pub fn selected(&self) -> Option<OrderId> {
        self.selected
    }

    pub fn touch(&mut self, order_id: OrderId, at: Millis) {
        self.last_touched = Some(Touch { order_id, at });
    }

    pub fn select(&mut self, id: OrderId) -> Result<(), Rejection> {
        let order = self.get(id).ok_or(Rejection::UnknownOrder(id))?;
        if order.is_completed() {
            return Err(Rejection::AlreadyCompleted(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    fn index_of(&self, id: OrderId) -> Result<usize, Rejection> {
        self.orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(Rejection::UnknownOrder(id))
    }

    pub fn add_ingredient(
        &mut self,
        policy: &dyn Eligibility,
        id: OrderId,
        ingredient: Ingredient,
        now: Millis,
    ) -> Result<AddOutcome, Rejection> {
        let index = self.index_of(id)?;
        let order = &self.orders[index];
        if order.is_completed() {
            return Err(Rejection::AlreadyCompleted(id));
        }
        policy.check(self, id, now)?;
        let order = &self.orders[index];
        if !order.requires(ingredient) {
            return Err(Rejection::NotRequired(ingredient));
        }
        if order.has_added(ingredient) {
            return Err(Rejection::AlreadyAdded(ingredient));
        }

        let order = &mut self.orders[index];
        order.added.push(ingredient);
        debug!("Added {} to order #{}", ingredient, id);
        let outcome = if !order.has_all_ingredients() {
            AddOutcome::Added
        } else if policy.completes_automatically() {
            order.completion_time = Some(now);
            AddOutcome::Completed(now)
        } else {
            AddOutcome::ReadyToComplete
        };
        self.touch(id, now);
        Ok(outcome)
    }

    /// Completes an order holding every required ingredient. Completing it
    /// again hands back the first completion time.
    pub fn mark_completed(&mut self, id: OrderId, now: Millis) -> Result<Millis, Rejection> {
        let index = self.index_of(id)?;
        let order = &mut self.orders[index];
        if let Some(done) = order.completion_time {
            return Ok(done);
        }
        if !order.has_all_ingredients() {
            return Err(Rejection::MissingIngredients {
                order_id: id,
                missing: order.missing().count(),
            });
        }
        order.completion_time = Some(now);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(now)
    }
}

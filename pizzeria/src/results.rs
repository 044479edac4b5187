use std::collections::HashSet;

use tracing::debug;

use crate::{
    mode::GameMode,
    order::{Order, OrderId},
    sampler::WipSample,
    stats::GameRunSubmission,
    Millis,
};

/// Completed orders, at most one entry per order id. The same completion
/// can be reported more than once, only the first one counts.
#[derive(Debug, Default)]
pub struct CompletedOrders {
    orders: Vec<Order>,
    ids: HashSet<OrderId>,
}

impl CompletedOrders {
    pub fn insert(&mut self, order: Order) -> bool {
        if !self.ids.insert(order.id) {
            debug!("Order #{} already completed, not adding again", order.id);
            return false;
        }
        self.orders.push(order);
        true
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn as_slice(&self) -> &[Order] {
        &self.orders
    }

    pub fn clear(&mut self) {
        self.orders.clear();
        self.ids.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTime {
    pub id: OrderId,
    pub seconds: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    pub total_time: u64,
    pub order_times: Vec<OrderTime>,
    pub average_time: u64,
    pub average_wip: Option<f64>,
}

impl Results {
    pub fn to_submission(&self, game_type: GameMode) -> GameRunSubmission {
        GameRunSubmission {
            total_time: self.total_time as f64,
            average_time: self.average_time as f64,
            game_type,
            average_wip: self.average_wip,
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn to_secs(millis: f64) -> u64 {
    (millis / 1000.0).round() as u64
}

/// Mean of the samples that saw at least one order in progress.
pub fn average_wip(samples: &[WipSample]) -> f64 {
    let busy: Vec<usize> = samples.iter().map(|s| s.wip).filter(|w| *w > 0).collect();
    if busy.is_empty() {
        return 0.0;
    }
    round2(busy.iter().sum::<usize>() as f64 / busy.len() as f64)
}

/// Returns `None` when there is nothing completed to report on.
pub fn compute_results(completed: &[Order], samples: Option<&[WipSample]>) -> Option<Results> {
    let durations: Vec<(OrderId, Millis)> = completed
        .iter()
        .map(|o| o.duration_millis().map(|d| (o.id, d)))
        .collect::<Option<Vec<_>>>()?;
    if durations.is_empty() {
        return None;
    }
    let first_start = completed.iter().map(|o| o.start_time).min()?;
    let last_done = completed.iter().filter_map(|o| o.completion_time).max()?;
    let mean = durations.iter().map(|(_, d)| *d as f64).sum::<f64>() / durations.len() as f64;

    Some(Results {
        total_time: to_secs(last_done.saturating_sub(first_start) as f64),
        order_times: durations
            .iter()
            .map(|(id, d)| OrderTime {
                id: *id,
                seconds: to_secs(*d as f64),
            })
            .collect(),
        average_time: to_secs(mean),
        average_wip: samples.map(average_wip),
    })
}

use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use serde_derive::{Deserialize, Serialize};

use crate::{
    order::OrderId,
    store::{OrderStore, Rejection},
    Millis,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Multitask,
    Singletask,
    Wip,
}

pub const MODES: [GameMode; 3] = [GameMode::Multitask, GameMode::Singletask, GameMode::Wip];

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Multitask => "multitask",
            GameMode::Singletask => "singletask",
            GameMode::Wip => "wip",
        }
    }

    /// Only the WIP game tracks work in progress over time.
    pub fn samples_wip(&self) -> bool {
        matches!(self, GameMode::Wip)
    }

    pub fn requires_selection(&self) -> bool {
        matches!(self, GameMode::Wip)
    }

    // `lock_cooldown` only matters for multitask
    pub fn policy(&self, lock_cooldown: Option<Millis>) -> Box<dyn Eligibility> {
        match self {
            GameMode::Multitask => Box::new(Multitask {
                cooldown: lock_cooldown,
            }),
            GameMode::Singletask => Box::new(Singletask),
            GameMode::Wip => Box::new(Wip),
        }
    }
}

impl Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "multitask" => Ok(GameMode::Multitask),
            "singletask" => Ok(GameMode::Singletask),
            "wip" => Ok(GameMode::Wip),
            m => Err(anyhow!("Unknown game type: {}", m)),
        }
    }
}

/// Decides whether an order can be worked on right now.
///
/// The store runs this check and the mutation inside the same `&mut` call,
/// so nothing can change the store between the two.
pub trait Eligibility: Send + Sync {
    fn check(&self, store: &OrderStore, order_id: OrderId, now: Millis) -> Result<(), Rejection>;

    /// Whether adding the last ingredient completes the order on its own.
    fn completes_automatically(&self) -> bool {
        true
    }
}

/// The last touched order is locked while another order is open.
/// Without a cooldown the lock holds until a different order is touched.
pub struct Multitask {
    pub cooldown: Option<Millis>,
}

impl Eligibility for Multitask {
    fn check(&self, store: &OrderStore, order_id: OrderId, now: Millis) -> Result<(), Rejection> {
        if store.open_orders().count() <= 1 {
            return Ok(());
        }
        match store.last_touched() {
            Some(touch) if touch.order_id == order_id => match self.cooldown {
                Some(cooldown) if now >= touch.at + cooldown => Ok(()),
                _ => Err(Rejection::Locked(order_id)),
            },
            _ => Ok(()),
        }
    }
}

/// Only the oldest open order can be worked on.
pub struct Singletask;

impl Eligibility for Singletask {
    fn check(&self, store: &OrderStore, order_id: OrderId, _now: Millis) -> Result<(), Rejection> {
        match store.oldest_open() {
            Some(oldest) if oldest != order_id => Err(Rejection::NotOldest { order_id, oldest }),
            _ => Ok(()),
        }
    }
}

/// No locking, but ingredients go to the selected order only
/// and completion has to be confirmed.
pub struct Wip;

impl Eligibility for Wip {
    fn check(&self, store: &OrderStore, order_id: OrderId, _now: Millis) -> Result<(), Rejection> {
        match store.selected() {
            None => Err(Rejection::NoSelection),
            Some(selected) if selected != order_id => Err(Rejection::NotSelected(order_id)),
            _ => Ok(()),
        }
    }

    fn completes_automatically(&self) -> bool {
        false
    }
}

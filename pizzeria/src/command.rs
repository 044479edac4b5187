use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, bail, Result};

use crate::{ingredient::Ingredient, order::OrderId};

trait MySplit<'a> {
    fn my_split<'b>(&'a self, p: &'b str) -> (Option<&'a str>, Option<&'a str>);
}

impl<'a> MySplit<'a> for &'a str {
    fn my_split<'b>(&'a self, p: &'b str) -> (Option<&'a str>, Option<&'a str>) {
        let mut iter = self.splitn(2, p);
        (iter.next(), iter.next())
    }
}

/// What the player can type at the counter.
///
/// ```text
/// start | reset | status | menu | quit
/// select order 2
/// add pepperoni to order 2
/// add pepperoni            (the selected order, WIP game)
/// complete order 2
/// complete                 (the selected order, WIP game)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Status,
    Menu,
    Quit,
    Select(OrderId),
    Add {
        ingredient: Ingredient,
        order_id: Option<OrderId>,
    },
    Complete(Option<OrderId>),
}

// Input: order N, or just N
fn parse_order_id(s: &str) -> Result<OrderId> {
    let s = s.trim();
    let s = s.strip_prefix("order").unwrap_or(s).trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    s.parse()
        .map_err(|_| anyhow!("error parsing order number {}", s))
}

// Input: ingredient to order N, or just ingredient
fn parse_add(s: &str) -> Result<Command> {
    let (ingredient, order) = s.my_split(" to ");
    let ingredient = ingredient
        .filter(|i| !i.trim().is_empty())
        .ok_or(anyhow!("add needs an ingredient"))?
        .parse()?;
    let order_id = order.map(parse_order_id).transpose()?;
    Ok(Command::Add {
        ingredient,
        order_id,
    })
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Command::*;
        let input = s.trim().to_ascii_lowercase();
        let input = input.as_str();
        let (word, rest) = input.my_split(" ");
        let rest = rest.map(str::trim).filter(|r| !r.is_empty());
        match (word.unwrap_or_default(), rest) {
            ("start", None) => Ok(Start),
            ("reset", None) => Ok(Reset),
            ("status", None) => Ok(Status),
            ("menu", None) => Ok(Menu),
            ("quit", None) | ("exit", None) => Ok(Quit),
            ("select", Some(order)) => Ok(Select(parse_order_id(order)?)),
            ("select", None) => bail!("select needs an order number"),
            ("add", Some(rest)) => parse_add(rest),
            ("add", None) => bail!("add needs an ingredient"),
            ("complete", order) => Ok(Complete(order.map(parse_order_id).transpose()?)),
            ("", _) => bail!("Command must not be an empty string."),
            (c, Some(_)) if ["start", "reset", "status", "menu", "quit"].contains(&c) => {
                bail!("{} needs nothing. Just only {}.", c, c)
            }
            (c, _) => Err(anyhow!("Unknown command: {}", c)),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Command::*;
        match self {
            Start => write!(f, "start"),
            Reset => write!(f, "reset"),
            Status => write!(f, "status"),
            Menu => write!(f, "menu"),
            Quit => write!(f, "quit"),
            Select(id) => write!(f, "select order {}", id),
            Add {
                ingredient,
                order_id: Some(id),
            } => write!(f, "add {} to order {}", ingredient, id),
            Add {
                ingredient,
                order_id: None,
            } => write!(f, "add {}", ingredient),
            Complete(Some(id)) => write!(f, "complete order {}", id),
            Complete(None) => write!(f, "complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Command::*;
    use super::*;
    use crate::ingredient::Ingredient::*;

    #[test]
    fn test_bad_string() {
        assert!("".parse::<Command>().is_err());
        assert!("asdfasdfjklasjdflkjaskldjfkljasjdkf".parse::<Command>().is_err());
        assert!("add pineapple to order 1".parse::<Command>().is_err());
        assert!("add pepperoni to order one".parse::<Command>().is_err());
        assert!("select".parse::<Command>().is_err());
        assert!("add".parse::<Command>().is_err());
        assert!("start order 1".parse::<Command>().is_err());
    }

    #[test]
    fn test_simple_words() {
        assert_eq!("start".parse::<Command>().unwrap(), Start);
        assert_eq!("  RESET ".parse::<Command>().unwrap(), Reset);
        assert_eq!("status".parse::<Command>().unwrap(), Status);
        assert_eq!("menu".parse::<Command>().unwrap(), Menu);
        assert_eq!("exit".parse::<Command>().unwrap(), Quit);
    }

    #[test]
    fn test_order_commands() {
        assert_eq!("select order 3".parse::<Command>().unwrap(), Select(3));
        assert_eq!("select #4".parse::<Command>().unwrap(), Select(4));
        assert_eq!(
            "add Tomato sauce to order 2".parse::<Command>().unwrap(),
            Add {
                ingredient: TomatoSauce,
                order_id: Some(2)
            }
        );
        assert_eq!(
            "add  bell ".parse::<Command>().unwrap(),
            Add {
                ingredient: BellPeppers,
                order_id: None
            }
        );
        assert_eq!("complete".parse::<Command>().unwrap(), Complete(None));
        assert_eq!(
            "complete order 5".parse::<Command>().unwrap(),
            Complete(Some(5))
        );
    }

    #[test]
    fn test_display_parses_back() {
        let commands = [
            Start,
            Select(2),
            Add {
                ingredient: FreshBasil,
                order_id: Some(1),
            },
            Add {
                ingredient: Mozzarella,
                order_id: None,
            },
            Complete(Some(3)),
            Complete(None),
        ];
        for command in commands {
            assert_eq!(command.to_string().parse::<Command>().unwrap(), command);
        }
    }
}

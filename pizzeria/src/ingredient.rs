use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ingredient {
    Mozzarella,
    TomatoSauce,
    Pepperoni,
    Mushrooms,
    Onions,
    BellPeppers,
    BlackOlives,
    ItalianSausage,
    FreshBasil,
    Garlic,
}

pub const CATALOG: [Ingredient; 10] = [
    Ingredient::Mozzarella,
    Ingredient::TomatoSauce,
    Ingredient::Pepperoni,
    Ingredient::Mushrooms,
    Ingredient::Onions,
    Ingredient::BellPeppers,
    Ingredient::BlackOlives,
    Ingredient::ItalianSausage,
    Ingredient::FreshBasil,
    Ingredient::Garlic,
];

impl Ingredient {
    pub fn name(&self) -> &'static str {
        use Ingredient::*;
        match self {
            Mozzarella => "Mozzarella cheese",
            TomatoSauce => "Tomato sauce",
            Pepperoni => "Pepperoni",
            Mushrooms => "Mushrooms",
            Onions => "Onions",
            BellPeppers => "Bell peppers",
            BlackOlives => "Black olives",
            ItalianSausage => "Italian sausage",
            FreshBasil => "Fresh basil",
            Garlic => "Garlic",
        }
    }

    // First word of the name, which is unique across the catalog
    pub fn short_name(&self) -> &'static str {
        self.name().split(' ').next().unwrap_or_else(|| self.name())
    }
}

impl Display for Ingredient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Ingredient {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CATALOG
            .iter()
            .find(|i| i.name().eq_ignore_ascii_case(s) || i.short_name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or(anyhow!("We don't have {} in the kitchen.", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_and_short_names() {
        assert_eq!("Mozzarella cheese".parse::<Ingredient>().unwrap(), Ingredient::Mozzarella);
        assert_eq!("  tomato SAUCE ".parse::<Ingredient>().unwrap(), Ingredient::TomatoSauce);
        assert_eq!("bell".parse::<Ingredient>().unwrap(), Ingredient::BellPeppers);
        assert!("pineapple".parse::<Ingredient>().is_err());
        assert!("".parse::<Ingredient>().is_err());
    }

    #[test]
    fn test_short_names_are_unique() {
        let mut shorts: Vec<_> = CATALOG.iter().map(|i| i.short_name()).collect();
        shorts.sort();
        shorts.dedup();
        assert_eq!(shorts.len(), CATALOG.len());
    }
}

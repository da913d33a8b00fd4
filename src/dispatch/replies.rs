//! Reply text for every dispatcher action.
//!
//! Replies are plain text, one line per result, so chat and terminal front-ends
//! can forward them verbatim.

use crate::catalog::{Discipline, Item, Recipe};
use crate::cost::CostValue;
use crate::engine::Plan;
use crate::validation::InputError;

pub const SHUTDOWN_ACK: &str = "Ok. Bye bye.";
pub const PLAN_SEPARATOR: &str = "==========================";

pub fn price_set(item: &Item) -> String {
    format!(
        "Price ({}) successfully set for item {} ({})",
        item.price.value,
        item.display_name(),
        item.id
    )
}

pub fn item_not_found(name: &str) -> String {
    format!("Item ({}) was not found.", name)
}

pub fn ambiguous_item(name: &str, matches: usize) -> String {
    format!("Item name \"{}\" matches {} items; price not changed.", name, matches)
}

pub fn invalid_price(name: &str, err: &InputError) -> String {
    format!("Invalid price for \"{}\": {}", name, err)
}

pub fn invalid_expression(pattern: &str, err: &InputError) -> String {
    format!("Invalid expression \"{}\": {}", pattern, err)
}

pub fn no_items_found(pattern: &str) -> String {
    format!("No items found following expression: \"{}\"", pattern)
}

pub fn plan_not_found(name: &str) -> String {
    format!("Item not found: \"{}\"", name)
}

/// `Type: Alchemy (Level 120), Item: Elixir (A), Price: 45`
pub fn crafted_price_line(discipline: Discipline, recipe: &Recipe, item: &Item, cost: &CostValue) -> String {
    with_uncertainty(
        format!(
            "Type: {} (Level {}), Item: {} ({}), Price: {}",
            discipline,
            recipe.level,
            item.display_name(),
            item.id,
            cost.value
        ),
        cost,
    )
}

/// `Type: Base, Item: Herb (B), Price: 10`
pub fn base_price_line(item: &Item) -> String {
    with_uncertainty(
        format!(
            "Type: Base, Item: {} ({}), Price: {}",
            item.display_name(),
            item.id,
            item.price.value
        ),
        &item.price,
    )
}

fn with_uncertainty(mut line: String, cost: &CostValue) -> String {
    if cost.is_uncertain() {
        line.push_str(" + <N/A>.");
    }
    line
}

/// Price lines followed, when any estimate is uncertain, by the list of prices to add.
pub fn price_report(lines: &[String], missing: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    if !missing.is_empty() {
        out.push_str("\nYou can improve estimation quality and get rid of <N/A>'s by adding the following prices:\n");
        out.push_str(&missing.join(", "));
        out.push('\n');
    }
    out
}

pub fn plan_section(discipline: Discipline, recipe: &Recipe, item: &Item, plan: &Plan) -> String {
    format!(
        "Type: {} (Level {}), Item: {}, Manual:\n{}{}\n",
        discipline,
        recipe.level,
        item.display_name(),
        plan,
        PLAN_SEPARATOR
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncertain_lines_are_flagged() {
        let item = Item::new("A").with_name("Elixir");
        let recipe = Recipe::new("R1", "A", 2).with_level(120);
        let cost = CostValue {
            value: 40,
            reasons: vec!["Water".into()],
        };
        assert_eq!(
            crafted_price_line(Discipline::Alchemy, &recipe, &item, &cost),
            "Type: Alchemy (Level 120), Item: Elixir (A), Price: 40 + <N/A>."
        );
        assert_eq!(
            base_price_line(&Item::new("B").with_name("Herb").with_price(10)),
            "Type: Base, Item: Herb (B), Price: 10"
        );
    }

    #[test]
    fn report_appends_hint_only_when_needed() {
        let lines = vec!["one".to_string(), "two".to_string()];
        assert_eq!(price_report(&lines, &[]), "one\ntwo\n");
        let with_hint = price_report(&lines, &["Flux", "Water"]);
        assert!(with_hint.starts_with("one\ntwo\n\nYou can improve"));
        assert!(with_hint.ends_with("prices:\nFlux, Water\n"));
    }

    #[test]
    fn set_reply_names_item_and_id() {
        let item = Item::new("160001").with_name("Iron Ore").with_price(3);
        assert_eq!(price_set(&item), "Price (3) successfully set for item Iron Ore (160001)");
        assert_eq!(item_not_found("unknownitem"), "Item (unknownitem) was not found.");
    }
}

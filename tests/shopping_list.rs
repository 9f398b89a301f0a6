use recipegram::actions::shopping::{aggregate_shopping_list, render_shopping_list};
use recipegram::schema::CartIngredientRow;

fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
    CartIngredientRow {
        name: String::from(name),
        measurement_unit: String::from(unit),
        amount,
    }
}

#[test]
fn two_recipe_cart_renders_summed_list() {
    // Recipe one: flour 200 g, milk 50 ml. Recipe two: flour 100 g, eggs 2 pc.
    let cart = vec![
        row("Flour", "g", 200),
        row("Milk", "ml", 50),
        row("Flour", "g", 100),
        row("Egg", "pc", 2),
    ];

    let rendered = render_shopping_list(&aggregate_shopping_list(&cart));

    assert_eq!(rendered, "Egg (pc) — 2\nFlour (g) — 300\nMilk (ml) — 50");
}

#[test]
fn empty_cart_renders_nothing() {
    assert_eq!(render_shopping_list(&aggregate_shopping_list(&[])), "");
}

#[test]
fn lines_are_sorted_by_ingredient_name() {
    let cart = vec![
        row("Zucchini", "pc", 1),
        row("Apple", "pc", 3),
        row("Milk", "ml", 200),
    ];

    let lines = aggregate_shopping_list(&cart);
    let names: Vec<&str> = lines.iter().map(|line| line.name.as_str()).collect();

    assert_eq!(names, ["Apple", "Milk", "Zucchini"]);
}

#[test]
fn conflicting_units_stay_on_separate_lines() {
    let cart = vec![row("Sugar", "g", 50), row("Sugar", "tbsp", 1)];

    let rendered = render_shopping_list(&aggregate_shopping_list(&cart));

    assert_eq!(rendered, "Sugar (g) — 50\nSugar (tbsp) — 1");
}

//! Расчёт маржи и фудкоста по рецептам.
//!
//! Все суммы целые. Проценты усекаются к нулю; при цене `<= 0` процент
//! считается равным нулю.

use serde::Serialize;

use crate::models::{Recipe, RecipeCost};

/// Маржа: цена продажи минус себестоимость.
pub fn margin(price: i64, ingredient_cost: i64) -> i64 {
    price.saturating_sub(ingredient_cost)
}

/// Маржа в процентах от цены.
pub fn margin_rate(price: i64, ingredient_cost: i64) -> i64 {
    percent_of(margin(price, ingredient_cost), price)
}

/// Себестоимость в процентах от цены (фудкост).
pub fn cost_rate(price: i64, ingredient_cost: i64) -> i64 {
    percent_of(ingredient_cost, price)
}

/// `part * 100 / total` с усечением к нулю, `0` при `total <= 0`.
pub(crate) fn percent_of(part: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    let scaled = i128::from(part) * 100 / i128::from(total);
    scaled.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Маржа одного блюда.
pub struct MarginLine {
    /// Рецепт.
    pub recipe_id: i64,
    /// Название блюда.
    pub name: String,
    /// Цена продажи.
    pub price: i64,
    /// Себестоимость.
    pub ingredient_cost: i64,
    /// Маржа.
    pub margin: i64,
    /// Маржа, %.
    pub margin_rate: i64,
    /// Фудкост, %.
    pub cost_rate: i64,
}

impl MarginLine {
    /// Считает строку по цене и себестоимости.
    pub fn new(recipe_id: i64, name: impl Into<String>, price: i64, ingredient_cost: i64) -> Self {
        Self {
            recipe_id,
            name: name.into(),
            price,
            ingredient_cost,
            margin: margin(price, ingredient_cost),
            margin_rate: margin_rate(price, ingredient_cost),
            cost_rate: cost_rate(price, ingredient_cost),
        }
    }
}

impl From<&Recipe> for MarginLine {
    fn from(recipe: &Recipe) -> Self {
        Self::new(
            recipe.id,
            recipe.name.clone(),
            recipe.price,
            recipe.ingredient_cost(),
        )
    }
}

impl From<RecipeCost> for MarginLine {
    fn from(row: RecipeCost) -> Self {
        Self::new(row.recipe_id, row.name, row.price, row.ingredient_cost)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
/// Сводка маржи по всем рецептам магазина.
pub struct MarginSummary {
    /// Строки в исходном порядке.
    pub lines: Vec<MarginLine>,
    /// Сумма цен.
    pub total_price: i64,
    /// Сумма себестоимостей.
    pub total_cost: i64,
    /// Сумма маржи.
    pub total_margin: i64,
    /// Маржа по итогам, %.
    pub overall_margin_rate: i64,
}

impl MarginSummary {
    /// Собирает сводку из готовых строк.
    pub fn from_lines(lines: Vec<MarginLine>) -> Self {
        let total_price = lines
            .iter()
            .fold(0i64, |acc, line| acc.saturating_add(line.price));
        let total_cost = lines
            .iter()
            .fold(0i64, |acc, line| acc.saturating_add(line.ingredient_cost));

        Self {
            lines,
            total_price,
            total_cost,
            total_margin: margin(total_price, total_cost),
            overall_margin_rate: margin_rate(total_price, total_cost),
        }
    }

    /// Сводка по рецептам с загруженными ингредиентами.
    pub fn from_recipes(recipes: &[Recipe]) -> Self {
        Self::from_lines(recipes.iter().map(MarginLine::from).collect())
    }

    /// Сводка по строкам `margin_summary` сервера.
    pub fn from_costs(rows: Vec<RecipeCost>) -> Self {
        Self::from_lines(rows.into_iter().map(MarginLine::from).collect())
    }

    /// Блюдо с наибольшей маржой в процентах. При равенстве побеждает первое.
    pub fn best(&self) -> Option<&MarginLine> {
        self.lines
            .iter()
            .rev()
            .max_by_key(|line| line.margin_rate)
    }

    /// Блюдо с наименьшей маржой в процентах. При равенстве побеждает первое.
    pub fn worst(&self) -> Option<&MarginLine> {
        self.lines.iter().min_by_key(|line| line.margin_rate)
    }

    /// Блюда, продающиеся в убыток.
    pub fn unprofitable(&self) -> impl Iterator<Item = &MarginLine> {
        self.lines.iter().filter(|line| line.margin < 0)
    }
}

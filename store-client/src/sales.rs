//! Агрегация записей о продажах.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::margin::percent_of;
use crate::models::Report;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Продажи одной позиции меню.
pub struct MenuSales {
    /// Позиция меню.
    pub menu_name: String,
    /// Количество.
    pub quantity: i64,
    /// Выручка.
    pub revenue: i64,
    /// Доля в общей выручке, %.
    pub share: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Выручка за день.
pub struct DailySales {
    /// День.
    pub date: NaiveDate,
    /// Количество.
    pub quantity: i64,
    /// Выручка.
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
/// Сводка продаж за период.
pub struct SalesSummary {
    /// Общая выручка.
    pub total_revenue: i64,
    /// Общее количество.
    pub total_quantity: i64,
    /// По позициям: по убыванию выручки, затем по имени.
    pub by_menu: Vec<MenuSales>,
    /// По дням: по возрастанию даты.
    pub by_day: Vec<DailySales>,
}

impl SalesSummary {
    /// Считает сводку по всем записям.
    pub fn from_reports(reports: &[Report]) -> Self {
        Self::collect(reports.iter())
    }

    /// Считает сводку по записям в интервале `[from, to]`. Пустая граница не ограничивает.
    pub fn for_period(reports: &[Report], from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self::collect(reports.iter().filter(|report| {
            from.is_none_or(|from| report.sale_date >= from)
                && to.is_none_or(|to| report.sale_date <= to)
        }))
    }

    fn collect<'a>(reports: impl Iterator<Item = &'a Report>) -> Self {
        let mut total_revenue = 0i64;
        let mut total_quantity = 0i64;
        let mut menus: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();

        for report in reports {
            total_revenue = total_revenue.saturating_add(report.amount);
            total_quantity = total_quantity.saturating_add(report.quantity);

            let menu = menus.entry(report.menu_name.trim()).or_default();
            menu.0 = menu.0.saturating_add(report.quantity);
            menu.1 = menu.1.saturating_add(report.amount);

            let day = days.entry(report.sale_date).or_default();
            day.0 = day.0.saturating_add(report.quantity);
            day.1 = day.1.saturating_add(report.amount);
        }

        let mut by_menu: Vec<MenuSales> = menus
            .into_iter()
            .map(|(menu_name, (quantity, revenue))| MenuSales {
                menu_name: menu_name.to_string(),
                quantity,
                revenue,
                share: percent_of(revenue, total_revenue),
            })
            .collect();
        // При равной выручке остаётся порядок по имени из BTreeMap.
        by_menu.sort_by(|a, b| b.revenue.cmp(&a.revenue));

        let by_day = days
            .into_iter()
            .map(|(date, (quantity, revenue))| DailySales {
                date,
                quantity,
                revenue,
            })
            .collect();

        Self {
            total_revenue,
            total_quantity,
            by_menu,
            by_day,
        }
    }

    /// Средняя выручка в день, `0` если продаж нет.
    pub fn average_daily_revenue(&self) -> i64 {
        match i64::try_from(self.by_day.len()) {
            Ok(days) if days > 0 => self.total_revenue / days,
            _ => 0,
        }
    }
}

//! Формы, которые пользователь заполняет на экранах. Проверяются локально до
//! отправки на сервер.

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::Serialize;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Validate)]
/// Регистрация.
pub struct SignupForm {
    /// Логин.
    #[validate(length(min = 4, max = 20, message = "4..20 characters"))]
    pub user_id: String,
    /// Пароль в открытом виде, сервер хранит его сам.
    #[validate(length(min = 6, max = 64, message = "6..64 characters"))]
    pub password: String,
    /// Отображаемое имя.
    #[validate(length(min = 1, max = 30, message = "1..30 characters"))]
    pub name: String,
    /// Телефон.
    #[validate(length(min = 9, max = 20, message = "9..20 characters"))]
    pub phone: String,
    /// Название магазина.
    #[validate(length(max = 50, message = "at most 50 characters"))]
    pub store_name: String,
    /// Регистрационный номер бизнеса (10 цифр), если уже проверен.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Изменение профиля.
pub struct ProfileForm {
    /// Отображаемое имя.
    #[validate(length(min = 1, max = 30, message = "1..30 characters"))]
    pub name: String,
    /// Телефон.
    #[validate(length(min = 9, max = 20, message = "9..20 characters"))]
    pub phone: String,
    /// Название магазина.
    #[validate(length(max = 50, message = "at most 50 characters"))]
    pub store_name: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Новый пост или изменение поста.
pub struct PostForm {
    /// Категория доски.
    #[validate(length(min = 1, max = 30, message = "must not be empty"))]
    pub category: String,
    /// Заголовок.
    #[validate(length(min = 1, max = 100, message = "1..100 characters"))]
    pub title: String,
    /// Текст.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Комментарий.
pub struct CommentForm {
    /// Текст.
    #[validate(length(min = 1, max = 500, message = "1..500 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Рецепт без ингредиентов.
pub struct RecipeForm {
    /// Название блюда.
    #[validate(length(min = 1, max = 50, message = "1..50 characters"))]
    pub name: String,
    /// Цена продажи.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Ингредиент рецепта.
pub struct IngredientForm {
    /// Название.
    #[validate(length(min = 1, max = 50, message = "1..50 characters"))]
    pub name: String,
    /// Количество.
    #[validate(
        custom(function = "finite_quantity"),
        range(min = 0.0, message = "must not be negative")
    )]
    pub quantity: f64,
    /// Единица измерения.
    #[validate(length(max = 10, message = "at most 10 characters"))]
    pub unit: String,
    /// Стоимость.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub cost: i64,
}

// `range` пропускает NaN, а JSON не умеет ни NaN, ни бесконечность.
fn finite_quantity(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        return Ok(());
    }
    Err(ValidationError::new("finite").with_message(Cow::Borrowed("must be a finite number")))
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Запись о продажах.
pub struct ReportForm {
    /// День продажи.
    pub sale_date: NaiveDate,
    /// Позиция меню.
    #[validate(length(min = 1, max = 50, message = "1..50 characters"))]
    pub menu_name: String,
    /// Количество.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: i64,
    /// Выручка.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub amount: i64,
    /// Заметка.
    #[validate(length(max = 200, message = "at most 200 characters"))]
    pub memo: String,
}

//! Модели данных сервера магазина и сторонних API.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Категория «все посты»: фильтр по ней не отбрасывает ничего.
pub const ALL_CATEGORY: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Профиль пользователя (владельца магазина).
pub struct User {
    /// Логин, он же идентификатор сессии.
    pub user_id: String,
    /// Отображаемое имя.
    pub name: String,
    /// Телефон.
    #[serde(default)]
    pub phone: String,
    /// Название магазина.
    #[serde(default)]
    pub store_name: String,
    /// Регистрационный номер бизнеса (10 цифр без дефисов).
    #[serde(default)]
    pub business_number: Option<String>,
    /// Дата регистрации.
    #[serde(default, with = "server_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Категория доски.
pub struct BoardCategory {
    /// Идентификатор категории.
    pub id: i64,
    /// Имя категории, по нему фильтруются посты.
    pub name: String,
}

impl BoardCategory {
    /// Набор категорий, который есть у сервера по умолчанию.
    pub fn defaults() -> Vec<BoardCategory> {
        ["free", "question", "tip", "market"]
            .into_iter()
            .zip(1..)
            .map(|(name, id)| BoardCategory {
                id,
                name: name.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Пост на доске.
pub struct Post {
    /// Идентификатор поста.
    pub id: i64,
    /// Автор.
    pub user_id: String,
    /// Категория доски.
    pub category: String,
    /// Заголовок.
    pub title: String,
    /// Текст.
    pub content: String,
    /// Количество лайков.
    #[serde(default)]
    pub like_count: u32,
    /// Количество комментариев.
    #[serde(default)]
    pub comment_count: u32,
    /// Количество просмотров.
    #[serde(default)]
    pub view_count: u32,
    /// Дата создания.
    #[serde(with = "server_datetime")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Комментарий к посту.
pub struct Comment {
    /// Идентификатор комментария.
    pub id: i64,
    /// Пост, к которому относится комментарий.
    pub post_id: i64,
    /// Автор.
    pub user_id: String,
    /// Текст.
    pub content: String,
    /// Дата создания.
    #[serde(with = "server_datetime")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Ингредиент рецепта.
pub struct Ingredient {
    /// Идентификатор ингредиента.
    pub id: i64,
    /// Рецепт-владелец.
    pub recipe_id: i64,
    /// Название.
    pub name: String,
    /// Количество в единицах `unit`.
    #[serde(default)]
    pub quantity: f64,
    /// Единица измерения (g, ml, ea).
    #[serde(default)]
    pub unit: String,
    /// Стоимость ингредиента в рецепте.
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Рецепт: блюдо с ценой продажи и списком ингредиентов.
pub struct Recipe {
    /// Идентификатор рецепта.
    pub id: i64,
    /// Владелец.
    pub user_id: String,
    /// Название блюда.
    pub name: String,
    /// Цена продажи.
    pub price: i64,
    /// Ингредиенты. Сервер может не присылать их в списке рецептов.
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    /// Себестоимость: сумма стоимостей ингредиентов.
    pub fn ingredient_cost(&self) -> i64 {
        self.ingredients
            .iter()
            .fold(0i64, |acc, ingredient| acc.saturating_add(ingredient.cost))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Строка сводки маржи, как её отдаёт сервер.
pub struct RecipeCost {
    /// Рецепт.
    pub recipe_id: i64,
    /// Название блюда.
    pub name: String,
    /// Цена продажи.
    pub price: i64,
    /// Себестоимость, посчитанная сервером.
    pub ingredient_cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Запись о продажах.
pub struct Report {
    /// Идентификатор записи.
    pub id: i64,
    /// Владелец.
    pub user_id: String,
    /// День продажи.
    pub sale_date: NaiveDate,
    /// Позиция меню.
    pub menu_name: String,
    /// Проданное количество.
    pub quantity: i64,
    /// Выручка.
    pub amount: i64,
    /// Заметка.
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Новость из внешнего поиска.
pub struct NewsArticle {
    /// Заголовок без разметки.
    pub title: String,
    /// Ссылка на оригинал (или на агрегатор, если оригинала нет).
    pub link: String,
    /// Краткое описание без разметки.
    pub description: String,
    /// Дата публикации в формате источника.
    pub published_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Состояние бизнеса по данным налогового реестра.
pub enum BusinessState {
    /// Действующий (`01`).
    Active,
    /// Приостановлен (`02`).
    Suspended,
    /// Закрыт (`03`).
    Closed,
    /// Номер в реестре не найден.
    NotRegistered,
}

impl BusinessState {
    /// Преобразует код реестра в состояние.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "01" => Self::Active,
            "02" => Self::Suspended,
            "03" => Self::Closed,
            _ => Self::NotRegistered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Результат проверки регистрационного номера бизнеса.
pub struct BusinessStatus {
    /// Нормализованный номер.
    pub business_number: String,
    /// Код состояния из реестра (`01`, `02`, `03` или пусто).
    pub status_code: String,
    /// Текст состояния из реестра.
    pub status_text: String,
    /// Тип налогообложения.
    pub tax_type: String,
    /// Дата закрытия, если бизнес закрыт.
    pub closed_at: Option<String>,
}

impl BusinessStatus {
    /// Состояние бизнеса по коду.
    pub fn state(&self) -> BusinessState {
        BusinessState::from_code(&self.status_code)
    }

    /// `true`, если бизнес действующий.
    pub fn is_active(&self) -> bool {
        self.state() == BusinessState::Active
    }
}

/// Формат дат сервера: `YYYY-MM-DD HH:MM:SS`.
pub(crate) mod server_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(crate) const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub(crate) fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), FORMAT).map_err(D::Error::custom)
    }

    pub(crate) mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        use super::FORMAT;

        pub(crate) fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_str(&value.format(FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(raw) => NaiveDateTime::parse_from_str(raw, FORMAT)
                    .map(Some)
                    .map_err(D::Error::custom),
            }
        }
    }
}

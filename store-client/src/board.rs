//! Логика доски: фильтрация постов и переключатель лайков.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{ALL_CATEGORY, Post};

/// Посты категории `category`. `None` и [`ALL_CATEGORY`] возвращают все посты.
///
/// Сравнение точное и регистрозависимое, пробелы по краям игнорируются.
pub fn filter_by_category<'a>(posts: &'a [Post], category: Option<&str>) -> Vec<&'a Post> {
    let wanted = category.map(str::trim).filter(|c| !c.is_empty() && *c != ALL_CATEGORY);
    posts
        .iter()
        .filter(|post| wanted.is_none_or(|wanted| post.category.trim() == wanted))
        .collect()
}

/// Поиск по заголовку и тексту без учёта регистра. Пустой запрос возвращает все посты.
pub fn search<'a>(posts: &'a [Post], query: &str) -> Vec<&'a Post> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return posts.iter().collect();
    }
    posts
        .iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&query)
                || post.content.to_lowercase().contains(&query)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Что нужно отправить на сервер после изменения лайка.
pub enum LikeAction {
    /// `post_like.php`.
    Increment(i64),
    /// `post_unlike.php`.
    Decrement(i64),
}

impl LikeAction {
    /// Пост, к которому относится действие.
    pub fn post_id(self) -> i64 {
        match self {
            Self::Increment(id) | Self::Decrement(id) => id,
        }
    }

    /// Обратное действие: им откатывается отклонённое сервером.
    pub fn inverse(self) -> Self {
        match self {
            Self::Increment(id) => Self::Decrement(id),
            Self::Decrement(id) => Self::Increment(id),
        }
    }

    /// Применяет действие к локальной копии поста. Счётчик не уходит ниже нуля.
    ///
    /// Возвращает `true`, если счётчик изменился.
    pub fn apply(self, post: &mut Post) -> bool {
        if post.id != self.post_id() {
            return false;
        }
        let before = post.like_count;
        post.like_count = match self {
            Self::Increment(_) => before.saturating_add(1),
            Self::Decrement(_) => before.saturating_sub(1),
        };
        post.like_count != before
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Посты, которые лайкнул текущий пользователь.
pub struct LikeBook {
    liked: BTreeSet<i64>,
}

impl LikeBook {
    /// Пустая книга лайков.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true`, если пост лайкнут.
    pub fn is_liked(&self, post_id: i64) -> bool {
        self.liked.contains(&post_id)
    }

    /// Ставит лайк. Повторный вызов ничего не делает и возвращает `None`.
    pub fn like(&mut self, post_id: i64) -> Option<LikeAction> {
        self.liked
            .insert(post_id)
            .then_some(LikeAction::Increment(post_id))
    }

    /// Снимает лайк. Для не лайкнутого поста ничего не делает и возвращает `None`.
    pub fn unlike(&mut self, post_id: i64) -> Option<LikeAction> {
        self.liked
            .remove(&post_id)
            .then_some(LikeAction::Decrement(post_id))
    }

    /// Переключает лайк и всегда возвращает действие.
    pub fn toggle(&mut self, post_id: i64) -> LikeAction {
        match self.unlike(post_id) {
            Some(action) => action,
            None => {
                self.liked.insert(post_id);
                LikeAction::Increment(post_id)
            }
        }
    }

    /// Откатывает действие, если сервер его не принял.
    pub fn revert(&mut self, action: LikeAction) {
        match action {
            LikeAction::Increment(id) => {
                self.liked.remove(&id);
            }
            LikeAction::Decrement(id) => {
                self.liked.insert(id);
            }
        }
    }

    /// Лайкнутые посты по возрастанию id.
    pub fn liked(&self) -> impl Iterator<Item = i64> + '_ {
        self.liked.iter().copied()
    }
}

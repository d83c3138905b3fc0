//! Клиентская библиотека приложения для управления магазином.
//!
//! Предоставляет единый API (`StoreClient`) поверх REST-сервера магазина:
//! - доска: посты, комментарии, лайки
//! - фудкост: рецепты, ингредиенты, маржа
//! - продажи: записи и их сводка
//! - профиль: регистрация, вход, изменение данных
//!
//! Клиент хранит логин после `login` и подставляет его в защищённые запросы.
//! Расчёты (маржа, сводка продаж, фильтр доски) выполняются локально.
#![warn(missing_docs)]

mod error;
mod http_client;

pub mod board;
pub mod business;
pub mod forms;
pub mod margin;
pub mod models;
pub mod news;
pub mod sales;
pub mod session;
pub mod view_state;

pub use error::{StoreClientError, StoreClientResult};
pub use http_client::{HttpClient, HttpOptions};

use validator::Validate;

use board::{LikeAction, LikeBook};
use forms::{
    CommentForm, IngredientForm, PostForm, ProfileForm, RecipeForm, ReportForm, SignupForm,
};
use margin::MarginSummary;
use models::{BoardCategory, Comment, Ingredient, Post, Recipe, Report, User};
use sales::SalesSummary;
use view_state::StateCell;

#[derive(Debug, Clone)]
/// Клиент сервера магазина с сессией пользователя.
pub struct StoreClient {
    http: HttpClient,
    login_id: Option<String>,
}

impl StoreClient {
    /// Создаёт клиент для сервера `base_url`.
    pub fn new(base_url: impl Into<String>, options: HttpOptions) -> StoreClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, options)?,
            login_id: None,
        })
    }

    /// Низкоуровневый HTTP-клиент.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Восстанавливает логин из сохранённой сессии.
    pub fn set_login_id(&mut self, login_id: impl Into<String>) {
        self.login_id = Some(login_id.into());
    }

    /// Текущий логин, если пользователь вошёл.
    pub fn login_id(&self) -> Option<&str> {
        self.login_id.as_deref()
    }

    /// Забывает логин (выход).
    pub fn logout(&mut self) {
        self.login_id = None;
    }

    fn require_login(&self) -> StoreClientResult<&str> {
        self.login_id.as_deref().ok_or(StoreClientError::Unauthorized)
    }

    // --- auth / profile ---

    /// Регистрирует пользователя. Форма проверяется до отправки.
    pub async fn signup(&self, form: &SignupForm) -> StoreClientResult<()> {
        form.validate()?;
        let mut form = form.clone();
        form.business_number = form
            .business_number
            .as_deref()
            .map(business::normalize_business_number)
            .transpose()?;
        self.http.signup(&form).await
    }

    /// Выполняет вход и запоминает логин.
    pub async fn login(&mut self, user_id: &str, password: &str) -> StoreClientResult<User> {
        let user_id = user_id.trim();
        if user_id.is_empty() || password.is_empty() {
            return Err(StoreClientError::Validation(
                "user_id and password are required".to_string(),
            ));
        }
        let user = self.http.login(user_id, password).await?;
        self.login_id = Some(user.user_id.clone());
        tracing::info!(user_id = %user.user_id, "logged in");
        Ok(user)
    }

    /// Профиль текущего пользователя.
    pub async fn profile(&self) -> StoreClientResult<User> {
        let login_id = self.require_login()?;
        self.http.get_profile(login_id).await
    }

    /// Меняет профиль и возвращает обновлённые данные.
    pub async fn update_profile(&self, form: &ProfileForm) -> StoreClientResult<User> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.update_profile(login_id, form).await?;
        self.http.get_profile(login_id).await
    }

    /// Меняет пароль.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        if new_password.chars().count() < 6 {
            return Err(StoreClientError::Validation(
                "new_password: at least 6 characters".to_string(),
            ));
        }
        if new_password == current_password {
            return Err(StoreClientError::Validation(
                "new_password: must differ from the current one".to_string(),
            ));
        }
        self.http
            .change_password(login_id, current_password, new_password)
            .await
    }

    // --- board ---

    /// Категории доски.
    ///
    /// Пустой ответ сервера заменяется стандартным набором
    /// ([`BoardCategory::defaults`]).
    pub async fn categories(&self) -> StoreClientResult<Vec<BoardCategory>> {
        let categories = self.http.list_categories().await?;
        if categories.is_empty() {
            tracing::debug!("server returned no categories, using defaults");
            return Ok(BoardCategory::defaults());
        }
        Ok(categories)
    }

    /// Посты категории; `None` или `"all"` возвращают все посты.
    ///
    /// Сервер фильтрует сам, результат дополнительно фильтруется локально.
    pub async fn posts(&self, category: Option<&str>) -> StoreClientResult<Vec<Post>> {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != models::ALL_CATEGORY);
        let posts = self.http.list_posts(category).await?;
        Ok(board::filter_by_category(&posts, category)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Пост по идентификатору.
    pub async fn post(&self, id: i64) -> StoreClientResult<Post> {
        self.http.get_post(id).await
    }

    /// Создаёт пост и возвращает его.
    pub async fn create_post(&self, form: &PostForm) -> StoreClientResult<Post> {
        let login_id = self.require_login()?;
        form.validate()?;
        let id = self.http.create_post(login_id, form).await?;
        self.http.get_post(id).await
    }

    /// Обновляет пост и возвращает его.
    pub async fn update_post(&self, id: i64, form: &PostForm) -> StoreClientResult<Post> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.update_post(login_id, id, form).await?;
        self.http.get_post(id).await
    }

    /// Удаляет пост.
    pub async fn delete_post(&self, id: i64) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        self.http.delete_post(login_id, id).await
    }

    /// Отправляет действие с лайком на сервер.
    pub async fn send_like(&self, action: LikeAction) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        match action {
            LikeAction::Increment(post_id) => self.http.like_post(login_id, post_id).await,
            LikeAction::Decrement(post_id) => self.http.unlike_post(login_id, post_id).await,
        }
    }

    /// Ставит лайк. Уже лайкнутый пост не трогает и возвращает `None`.
    ///
    /// Счётчик поста в `posts` меняется сразу и откатывается, если сервер
    /// отклонил запрос.
    pub async fn like(
        &self,
        book: &mut LikeBook,
        posts: &StateCell<Vec<Post>>,
        post_id: i64,
    ) -> StoreClientResult<Option<LikeAction>> {
        self.require_login()?;
        let Some(action) = book.like(post_id) else {
            return Ok(None);
        };
        self.commit_like(book, posts, action).await.map(Some)
    }

    /// Снимает лайк. Не лайкнутый пост не трогает и возвращает `None`.
    pub async fn unlike(
        &self,
        book: &mut LikeBook,
        posts: &StateCell<Vec<Post>>,
        post_id: i64,
    ) -> StoreClientResult<Option<LikeAction>> {
        self.require_login()?;
        let Some(action) = book.unlike(post_id) else {
            return Ok(None);
        };
        self.commit_like(book, posts, action).await.map(Some)
    }

    /// Переключает лайк.
    pub async fn toggle_like(
        &self,
        book: &mut LikeBook,
        posts: &StateCell<Vec<Post>>,
        post_id: i64,
    ) -> StoreClientResult<LikeAction> {
        self.require_login()?;
        let action = book.toggle(post_id);
        self.commit_like(book, posts, action).await
    }

    async fn commit_like(
        &self,
        book: &mut LikeBook,
        posts: &StateCell<Vec<Post>>,
        action: LikeAction,
    ) -> StoreClientResult<LikeAction> {
        let counted = apply_like(posts, action);
        if let Err(err) = self.send_like(action).await {
            book.revert(action);
            if counted {
                apply_like(posts, action.inverse());
            }
            return Err(err);
        }
        Ok(action)
    }

    /// Комментарии к посту.
    pub async fn comments(&self, post_id: i64) -> StoreClientResult<Vec<Comment>> {
        self.http.list_comments(post_id).await
    }

    /// Добавляет комментарий и возвращает его id.
    pub async fn create_comment(
        &self,
        post_id: i64,
        form: &CommentForm,
    ) -> StoreClientResult<i64> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.create_comment(login_id, post_id, form).await
    }

    /// Изменяет комментарий.
    pub async fn update_comment(&self, id: i64, form: &CommentForm) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.update_comment(login_id, id, form).await
    }

    /// Удаляет комментарий.
    pub async fn delete_comment(&self, id: i64) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        self.http.delete_comment(login_id, id).await
    }

    // --- pay management ---

    /// Записи о продажах текущего пользователя, новые первыми.
    pub async fn reports(&self) -> StoreClientResult<Vec<Report>> {
        let login_id = self.require_login()?;
        let mut reports = self.http.list_reports(login_id).await?;
        reports.sort_by(|a, b| b.sale_date.cmp(&a.sale_date).then(b.id.cmp(&a.id)));
        Ok(reports)
    }

    /// Сводка продаж за период `[from, to]`.
    pub async fn sales_summary(
        &self,
        from: Option<chrono::NaiveDate>,
        to: Option<chrono::NaiveDate>,
    ) -> StoreClientResult<SalesSummary> {
        let reports = self.reports().await?;
        Ok(SalesSummary::for_period(&reports, from, to))
    }

    /// Добавляет запись о продажах и возвращает её id.
    pub async fn create_report(&self, form: &ReportForm) -> StoreClientResult<i64> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.create_report(login_id, form).await
    }

    /// Изменяет запись о продажах.
    pub async fn update_report(&self, id: i64, form: &ReportForm) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.update_report(login_id, id, form).await
    }

    /// Удаляет запись о продажах.
    pub async fn delete_report(&self, id: i64) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        self.http.delete_report(login_id, id).await
    }

    // --- food cost ---

    /// Рецепты текущего пользователя.
    pub async fn recipes(&self) -> StoreClientResult<Vec<Recipe>> {
        let login_id = self.require_login()?;
        self.http.list_recipes(login_id).await
    }

    /// Рецепт с ингредиентами.
    ///
    /// Если сервер не вложил ингредиенты в ответ, они догружаются отдельно.
    pub async fn recipe(&self, id: i64) -> StoreClientResult<Recipe> {
        let mut recipe = self.http.get_recipe(id).await?;
        if recipe.ingredients.is_empty() {
            recipe.ingredients = self.http.list_ingredients(id).await?;
        }
        Ok(recipe)
    }

    /// Создаёт рецепт и возвращает его id.
    pub async fn create_recipe(&self, form: &RecipeForm) -> StoreClientResult<i64> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.create_recipe(login_id, form).await
    }

    /// Изменяет рецепт.
    pub async fn update_recipe(&self, id: i64, form: &RecipeForm) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.update_recipe(login_id, id, form).await
    }

    /// Удаляет рецепт.
    pub async fn delete_recipe(&self, id: i64) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        self.http.delete_recipe(login_id, id).await
    }

    /// Ингредиенты рецепта.
    pub async fn ingredients(&self, recipe_id: i64) -> StoreClientResult<Vec<Ingredient>> {
        self.http.list_ingredients(recipe_id).await
    }

    /// Добавляет ингредиент и возвращает его id.
    pub async fn create_ingredient(
        &self,
        recipe_id: i64,
        form: &IngredientForm,
    ) -> StoreClientResult<i64> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.create_ingredient(login_id, recipe_id, form).await
    }

    /// Изменяет ингредиент.
    pub async fn update_ingredient(
        &self,
        id: i64,
        form: &IngredientForm,
    ) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        form.validate()?;
        self.http.update_ingredient(login_id, id, form).await
    }

    /// Удаляет ингредиент.
    pub async fn delete_ingredient(&self, id: i64) -> StoreClientResult<()> {
        let login_id = self.require_login()?;
        self.http.delete_ingredient(login_id, id).await
    }

    /// Сводка маржи по данным сервера (`margin_summary`).
    pub async fn margin_summary(&self) -> StoreClientResult<MarginSummary> {
        let login_id = self.require_login()?;
        let rows = self.http.margin_summary(login_id).await?;
        Ok(MarginSummary::from_costs(rows))
    }
}

/// Применяет действие ко всем загруженным постам. `true`, если хоть один
/// счётчик изменился.
fn apply_like(posts: &StateCell<Vec<Post>>, action: LikeAction) -> bool {
    let mut changed = false;
    posts.update(|list| {
        for post in list.iter_mut() {
            changed |= action.apply(post);
        }
    });
    changed
}

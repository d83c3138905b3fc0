use reqwest::{Client, Method};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{StoreClientError, StoreClientResult};
use crate::forms::{
    CommentForm, IngredientForm, PostForm, ProfileForm, RecipeForm, ReportForm, SignupForm,
};
use crate::models::{BoardCategory, Comment, Ingredient, Post, Recipe, RecipeCost, Report, User};

#[derive(Debug, Serialize)]
struct LoginRequestDto<'a> {
    user_id: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordChangeRequestDto<'a> {
    user_id: &'a str,
    current_password: &'a str,
    new_password: &'a str,
}

/// Тело запроса с владельцем: `{"user_id": ..., ...form}`.
#[derive(Debug, Serialize)]
struct OwnedDto<'a, T> {
    user_id: &'a str,
    #[serde(flatten)]
    form: &'a T,
}

/// Тело запроса на изменение: `{"id": ..., "user_id": ..., ...form}`.
#[derive(Debug, Serialize)]
struct OwnedUpdateDto<'a, T> {
    id: i64,
    user_id: &'a str,
    #[serde(flatten)]
    form: &'a T,
}

#[derive(Debug, Serialize)]
struct CommentCreateDto<'a> {
    post_id: i64,
    user_id: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct IngredientCreateDto<'a> {
    recipe_id: i64,
    user_id: &'a str,
    #[serde(flatten)]
    form: &'a IngredientForm,
}

#[derive(Debug, Serialize)]
struct DeleteRequestDto<'a> {
    id: i64,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct LikeRequestDto<'a> {
    post_id: i64,
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    message: Option<String>,
    error: Option<String>,
}

/// Ответ на запись: `{"success": bool, "message": "..."}`, при создании ещё и `id`.
#[derive(Debug, Deserialize)]
struct StatusResponseDto {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LoginResponseDto {
    success: bool,
    #[serde(default)]
    message: String,
    user: Option<User>,
}

#[derive(Serialize)]
struct CategoryQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

#[derive(Serialize)]
struct IdQuery {
    id: i64,
}

#[derive(Serialize)]
struct UserQuery<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct PostQuery {
    post_id: i64,
}

#[derive(Serialize)]
struct RecipeQuery {
    recipe_id: i64,
}

impl StatusResponseDto {
    fn into_result(self) -> StoreClientResult<Option<i64>> {
        if !self.success {
            tracing::warn!(message = %self.message, "server rejected request");
            let message = if self.message.trim().is_empty() {
                "request rejected".to_string()
            } else {
                self.message
            };
            return Err(StoreClientError::InvalidRequest(message));
        }
        Ok(self.id)
    }

    fn created_id(self) -> StoreClientResult<i64> {
        self.into_result()?
            .ok_or_else(|| StoreClientError::Decode("response has no id".to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
/// Таймауты HTTP-клиента.
pub struct HttpOptions {
    /// Таймаут установки соединения.
    pub connect_timeout: Duration,
    /// Таймаут всего запроса.
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
        }
    }
}

pub(crate) fn build_reqwest(options: HttpOptions) -> StoreClientResult<Client> {
    Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.timeout)
        .build()
        .map_err(StoreClientError::Http)
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone)]
/// HTTP-клиент для REST API сервера магазина.
///
/// Все защищённые методы принимают `user_id` явно; сессией управляет
/// [`crate::StoreClient`].
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт клиент с базовым URL сервера.
    pub fn new(base_url: impl Into<String>, options: HttpOptions) -> StoreClientResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: build_reqwest(options)?,
        })
    }

    /// Базовый URL сервера.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub(crate) async fn decode_error(response: reqwest::Response) -> StoreClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body
                .message
                .or(body.error)
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        StoreClientError::from_http_status(status, Some(message))
    }

    async fn send<TRes>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> StoreClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(StoreClientError::from_reqwest)?;
        tracing::debug!(path, status = %response.status(), "store api response");
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response
            .json::<TRes>()
            .await
            .map_err(StoreClientError::from_reqwest)
    }

    async fn get_json<TQuery, TRes>(&self, path: &str, query: &TQuery) -> StoreClientResult<TRes>
    where
        TQuery: Serialize,
        TRes: DeserializeOwned,
    {
        let request = self.client.request(Method::GET, self.endpoint(path)).query(query);
        self.send(request, path).await
    }

    /// универсальный helper для отправки запросов с json-payload
    async fn post_json<TReq, TRes>(&self, path: &str, body: &TReq) -> StoreClientResult<TRes>
    where
        TReq: Serialize,
        TRes: DeserializeOwned,
    {
        let request = self.client.request(Method::POST, self.endpoint(path)).json(body);
        self.send(request, path).await
    }

    async fn post_status<TReq: Serialize>(
        &self,
        path: &str,
        body: &TReq,
    ) -> StoreClientResult<StatusResponseDto> {
        self.post_json(path, body).await
    }

    // --- auth / profile ---

    /// Регистрирует пользователя.
    pub async fn signup(&self, form: &SignupForm) -> StoreClientResult<()> {
        self.post_status("signup.php", form).await?.into_result()?;
        Ok(())
    }

    /// Проверяет логин и пароль, возвращает профиль.
    pub async fn login(&self, user_id: &str, password: &str) -> StoreClientResult<User> {
        let payload = LoginRequestDto { user_id, password };
        let dto: LoginResponseDto = self.post_json("login.php", &payload).await?;
        if !dto.success {
            tracing::warn!(user_id, "login rejected");
            return Err(StoreClientError::InvalidRequest(if dto.message.is_empty() {
                "invalid credentials".to_string()
            } else {
                dto.message
            }));
        }
        dto.user
            .ok_or_else(|| StoreClientError::Decode("login response has no user".to_string()))
    }

    /// Профиль пользователя.
    pub async fn get_profile(&self, user_id: &str) -> StoreClientResult<User> {
        self.get_json("profile.php", &UserQuery { user_id }).await
    }

    /// Меняет профиль пользователя.
    pub async fn update_profile(&self, user_id: &str, form: &ProfileForm) -> StoreClientResult<()> {
        self.post_status("profile_update.php", &OwnedDto { user_id, form })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Меняет пароль.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> StoreClientResult<()> {
        let payload = PasswordChangeRequestDto {
            user_id,
            current_password,
            new_password,
        };
        self.post_status("password_change.php", &payload)
            .await?
            .into_result()?;
        Ok(())
    }

    // --- board ---

    /// Категории доски.
    pub async fn list_categories(&self) -> StoreClientResult<Vec<BoardCategory>> {
        let path = "category_list.php";
        let request = self.client.request(Method::GET, self.endpoint(path));
        self.send(request, path).await
    }

    /// Посты; при `category = None` все посты.
    pub async fn list_posts(&self, category: Option<&str>) -> StoreClientResult<Vec<Post>> {
        self.get_json("post_list.php", &CategoryQuery { category })
            .await
    }

    /// Пост по идентификатору.
    pub async fn get_post(&self, id: i64) -> StoreClientResult<Post> {
        self.get_json("post_detail.php", &IdQuery { id }).await
    }

    /// Создаёт пост и возвращает его id.
    pub async fn create_post(&self, user_id: &str, form: &PostForm) -> StoreClientResult<i64> {
        self.post_status("post_insert.php", &OwnedDto { user_id, form })
            .await?
            .created_id()
    }

    /// Обновляет пост.
    pub async fn update_post(
        &self,
        user_id: &str,
        id: i64,
        form: &PostForm,
    ) -> StoreClientResult<()> {
        self.post_status("post_update.php", &OwnedUpdateDto { id, user_id, form })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Удаляет пост.
    pub async fn delete_post(&self, user_id: &str, id: i64) -> StoreClientResult<()> {
        self.post_status("post_delete.php", &DeleteRequestDto { id, user_id })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Увеличивает счётчик лайков.
    pub async fn like_post(&self, user_id: &str, post_id: i64) -> StoreClientResult<()> {
        self.post_status("post_like.php", &LikeRequestDto { post_id, user_id })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Уменьшает счётчик лайков.
    pub async fn unlike_post(&self, user_id: &str, post_id: i64) -> StoreClientResult<()> {
        self.post_status("post_unlike.php", &LikeRequestDto { post_id, user_id })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Комментарии к посту.
    pub async fn list_comments(&self, post_id: i64) -> StoreClientResult<Vec<Comment>> {
        self.get_json("comment_list.php", &PostQuery { post_id }).await
    }

    /// Добавляет комментарий и возвращает его id.
    pub async fn create_comment(
        &self,
        user_id: &str,
        post_id: i64,
        form: &CommentForm,
    ) -> StoreClientResult<i64> {
        let payload = CommentCreateDto {
            post_id,
            user_id,
            content: &form.content,
        };
        self.post_status("comment_insert.php", &payload)
            .await?
            .created_id()
    }

    /// Изменяет комментарий.
    pub async fn update_comment(
        &self,
        user_id: &str,
        id: i64,
        form: &CommentForm,
    ) -> StoreClientResult<()> {
        self.post_status("comment_update.php", &OwnedUpdateDto { id, user_id, form })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Удаляет комментарий.
    pub async fn delete_comment(&self, user_id: &str, id: i64) -> StoreClientResult<()> {
        self.post_status("comment_delete.php", &DeleteRequestDto { id, user_id })
            .await?
            .into_result()?;
        Ok(())
    }

    // --- pay management ---

    /// Записи о продажах пользователя.
    pub async fn list_reports(&self, user_id: &str) -> StoreClientResult<Vec<Report>> {
        self.get_json("report_list.php", &UserQuery { user_id }).await
    }

    /// Добавляет запись о продажах и возвращает её id.
    pub async fn create_report(&self, user_id: &str, form: &ReportForm) -> StoreClientResult<i64> {
        self.post_status("report_insert.php", &OwnedDto { user_id, form })
            .await?
            .created_id()
    }

    /// Изменяет запись о продажах.
    pub async fn update_report(
        &self,
        user_id: &str,
        id: i64,
        form: &ReportForm,
    ) -> StoreClientResult<()> {
        self.post_status("report_update.php", &OwnedUpdateDto { id, user_id, form })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Удаляет запись о продажах.
    pub async fn delete_report(&self, user_id: &str, id: i64) -> StoreClientResult<()> {
        self.post_status("report_delete.php", &DeleteRequestDto { id, user_id })
            .await?
            .into_result()?;
        Ok(())
    }

    // --- food cost ---

    /// Рецепты пользователя.
    pub async fn list_recipes(&self, user_id: &str) -> StoreClientResult<Vec<Recipe>> {
        self.get_json("recipe_list.php", &UserQuery { user_id }).await
    }

    /// Рецепт с ингредиентами.
    pub async fn get_recipe(&self, id: i64) -> StoreClientResult<Recipe> {
        self.get_json("recipe_detail.php", &IdQuery { id }).await
    }

    /// Создаёт рецепт и возвращает его id.
    pub async fn create_recipe(&self, user_id: &str, form: &RecipeForm) -> StoreClientResult<i64> {
        self.post_status("recipe_insert.php", &OwnedDto { user_id, form })
            .await?
            .created_id()
    }

    /// Изменяет рецепт.
    pub async fn update_recipe(
        &self,
        user_id: &str,
        id: i64,
        form: &RecipeForm,
    ) -> StoreClientResult<()> {
        self.post_status("recipe_update.php", &OwnedUpdateDto { id, user_id, form })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Удаляет рецепт вместе с ингредиентами.
    pub async fn delete_recipe(&self, user_id: &str, id: i64) -> StoreClientResult<()> {
        self.post_status("recipe_delete.php", &DeleteRequestDto { id, user_id })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Ингредиенты рецепта.
    pub async fn list_ingredients(&self, recipe_id: i64) -> StoreClientResult<Vec<Ingredient>> {
        self.get_json("ingredient_list.php", &RecipeQuery { recipe_id })
            .await
    }

    /// Добавляет ингредиент и возвращает его id.
    pub async fn create_ingredient(
        &self,
        user_id: &str,
        recipe_id: i64,
        form: &IngredientForm,
    ) -> StoreClientResult<i64> {
        let payload = IngredientCreateDto {
            recipe_id,
            user_id,
            form,
        };
        self.post_status("ingredient_insert.php", &payload)
            .await?
            .created_id()
    }

    /// Изменяет ингредиент.
    pub async fn update_ingredient(
        &self,
        user_id: &str,
        id: i64,
        form: &IngredientForm,
    ) -> StoreClientResult<()> {
        self.post_status("ingredient_update.php", &OwnedUpdateDto { id, user_id, form })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Удаляет ингредиент.
    pub async fn delete_ingredient(&self, user_id: &str, id: i64) -> StoreClientResult<()> {
        self.post_status("ingredient_delete.php", &DeleteRequestDto { id, user_id })
            .await?
            .into_result()?;
        Ok(())
    }

    /// Цены и себестоимости всех рецептов, посчитанные сервером.
    pub async fn margin_summary(&self, user_id: &str) -> StoreClientResult<Vec<RecipeCost>> {
        self.get_json("margin_summary.php", &UserQuery { user_id })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_slashes() {
        let client =
            HttpClient::new("http://localhost:8080/api/", HttpOptions::default()).expect("client");
        let full = client.endpoint("/post_list.php");
        assert_eq!(full, "http://localhost:8080/api/post_list.php");
    }

    #[test]
    fn rejected_status_carries_server_message() {
        let dto = StatusResponseDto {
            success: false,
            message: "이미 존재하는 아이디입니다".to_string(),
            id: None,
        };
        match dto.into_result() {
            Err(StoreClientError::InvalidRequest(message)) => {
                assert_eq!(message, "이미 존재하는 아이디입니다");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn created_id_requires_id() {
        let dto = StatusResponseDto {
            success: true,
            message: String::new(),
            id: None,
        };
        assert!(matches!(dto.created_id(), Err(StoreClientError::Decode(_))));
    }

    #[test]
    fn owned_update_flattens_form() {
        let form = RecipeForm {
            name: "kimbap".to_string(),
            price: 4000,
        };
        let json = serde_json::to_value(OwnedUpdateDto {
            id: 3,
            user_id: "kim",
            form: &form,
        })
        .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "user_id": "kim", "name": "kimbap", "price": 4000})
        );
    }
}

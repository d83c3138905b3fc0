use std::future::Future;
use std::process;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use store_client::business::BusinessRegistryClient;
use store_client::forms::{
    CommentForm, IngredientForm, PostForm, ProfileForm, RecipeForm, ReportForm, SignupForm,
};
use store_client::margin::MarginSummary;
use store_client::models::{Comment, Post};
use store_client::news::NewsClient;
use store_client::session::{Session, SessionStore};
use store_client::view_state::{ScreenScope, StateCell, ViewState};
use store_client::{StoreClient, StoreClientError, StoreClientResult, board};

mod infrastructure;
mod output;

use infrastructure::logging::{init_logging, log_level};
use infrastructure::settings::{Settings, normalize_server};

#[derive(Debug, Parser)]
#[command(name = "store-cli", version, about = "CLI клиент для управления магазином")]
struct Cli {
    /// Адрес сервера магазина (перекрывает STORE_API_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Печатать результат в JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Подробнее логи: -v info, -vv debug, -vvv trace.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Регистрация пользователя.
    Signup {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        store_name: String,
        /// Проверяется в налоговом реестре, если задан BUSINESS_SERVICE_KEY.
        #[arg(long)]
        business_number: Option<String>,
    },
    /// Вход пользователя.
    Login {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        password: String,
    },
    /// Выход: удаляет сохранённую сессию.
    Logout,
    /// Профиль текущего пользователя.
    Profile,
    /// Изменение профиля. Не указанные поля остаются прежними.
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        store_name: Option<String>,
    },
    /// Смена пароля.
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Доска: посты, комментарии, лайки.
    #[command(subcommand)]
    Board(BoardCommand),
    /// Рецепты.
    #[command(subcommand)]
    Recipe(RecipeCommand),
    /// Ингредиенты рецептов.
    #[command(subcommand)]
    Ingredient(IngredientCommand),
    /// Сводка маржи по рецептам.
    Margin {
        /// Считать локально по ингредиентам вместо сводки сервера.
        #[arg(long)]
        local: bool,
    },
    /// Учёт продаж.
    #[command(subcommand)]
    Sales(SalesCommand),
    /// Поиск новостей.
    News {
        query: String,
        #[arg(long, default_value_t = 10)]
        display: u32,
        #[arg(long, default_value_t = 1)]
        start: u32,
    },
    /// Проверка регистрационного номера бизнеса.
    VerifyBusiness { number: String },
}

#[derive(Debug, Subcommand)]
enum BoardCommand {
    /// Категории доски.
    Categories,
    /// Список постов.
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Пост с комментариями.
    Show { id: i64 },
    /// Создание поста (требует входа).
    Create {
        #[arg(long)]
        category: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Изменение поста. Не указанные поля берутся из текущего поста.
    Update {
        id: i64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Удаление поста.
    Delete { id: i64 },
    /// Лайк. Повторный лайк ничего не делает.
    Like { id: i64 },
    /// Снятие лайка.
    Unlike { id: i64 },
    /// Комментарий к посту.
    Comment {
        post_id: i64,
        #[arg(long)]
        content: String,
    },
    /// Изменение комментария.
    EditComment {
        id: i64,
        #[arg(long)]
        content: String,
    },
    /// Удаление комментария.
    DeleteComment { id: i64 },
}

#[derive(Debug, Subcommand)]
enum RecipeCommand {
    /// Мои рецепты.
    List,
    /// Рецепт с ингредиентами и маржой.
    Show { id: i64 },
    /// Новый рецепт.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: i64,
    },
    /// Изменение рецепта. Не указанные поля остаются прежними.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<i64>,
    },
    /// Удаление рецепта.
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum IngredientCommand {
    /// Добавление ингредиента в рецепт.
    Add {
        recipe_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0.0)]
        quantity: f64,
        #[arg(long, default_value = "")]
        unit: String,
        #[arg(long)]
        cost: i64,
    },
    /// Изменение ингредиента.
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0.0)]
        quantity: f64,
        #[arg(long, default_value = "")]
        unit: String,
        #[arg(long)]
        cost: i64,
    },
    /// Удаление ингредиента.
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum SalesCommand {
    /// Записи о продажах.
    List,
    /// Новая запись.
    Add {
        /// День продажи, YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        menu: String,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        amount: i64,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Изменение записи.
    Update {
        id: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        menu: String,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        amount: i64,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Удаление записи.
    Delete { id: i64 },
    /// Сводка за период.
    Summary {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    init_logging(log_level(cli.verbose, &settings.log_level))?;

    let server = cli
        .server
        .map(normalize_server)
        .unwrap_or_else(|| settings.store_api_url.clone());
    let mut client =
        StoreClient::new(server, settings.http_options()).map_err(map_client_error)?;

    let store = SessionStore::new(&settings.session_file);
    let mut session = store.load().context("не удалось прочитать сессию")?;
    if let Some(login_id) = &session.login_id {
        client.set_login_id(login_id.clone());
    }

    let json = cli.json;
    match cli.command {
        Command::Signup {
            user_id,
            password,
            name,
            phone,
            store_name,
            business_number,
        } => {
            if let Some(number) = &business_number {
                ensure_active_business(&settings, number).await?;
            }
            let form = SignupForm {
                user_id,
                password,
                name,
                phone,
                store_name,
                business_number,
            };
            client.signup(&form).await.map_err(map_client_error)?;
            println!("Регистрация успешна: {}", form.user_id);
        }
        Command::Login { user_id, password } => {
            let user = client
                .login(&user_id, &password)
                .await
                .map_err(map_client_error)?;
            session = Session {
                login_id: Some(user.user_id.clone()),
                user: Some(user.clone()),
                likes: store
                    .likes_for(&user.user_id)
                    .context("не удалось прочитать лайки")?,
            };
            store.save(&session).context("не удалось сохранить сессию")?;
            output::print_user("Вход выполнен", &user);
        }
        Command::Logout => {
            client.logout();
            store.clear().context("не удалось удалить сессию")?;
            println!("Выход выполнен");
        }
        Command::Profile => {
            let c = client.clone();
            let user = load_screen(async move { c.profile().await }).await?;
            emit(json, &user, |user| output::print_user("Профиль", user))?;
        }
        Command::UpdateProfile {
            name,
            phone,
            store_name,
        } => {
            let current = client.profile().await.map_err(map_client_error)?;
            let form = ProfileForm {
                name: name.unwrap_or(current.name),
                phone: phone.unwrap_or(current.phone),
                store_name: store_name.unwrap_or(current.store_name),
            };
            let user = client
                .update_profile(&form)
                .await
                .map_err(map_client_error)?;
            session.user = Some(user.clone());
            store.save(&session).context("не удалось сохранить сессию")?;
            output::print_user("Профиль обновлён", &user);
        }
        Command::Password { current, new } => {
            client
                .change_password(&current, &new)
                .await
                .map_err(map_client_error)?;
            println!("Пароль изменён");
        }
        Command::Board(command) => run_board(&client, &store, &mut session, command, json).await?,
        Command::Recipe(command) => run_recipe(&client, command, json).await?,
        Command::Ingredient(command) => run_ingredient(&client, command).await?,
        Command::Margin { local } => {
            let c = client.clone();
            let summary = if local {
                load_screen(async move { local_margin(&c).await }).await?
            } else {
                load_screen(async move { c.margin_summary().await }).await?
            };
            emit(json, &summary, output::print_margin)?;
        }
        Command::Sales(command) => run_sales(&client, command, json).await?,
        Command::News {
            query,
            display,
            start,
        } => {
            let news = NewsClient::new(
                settings.news_api_url.clone(),
                settings.news_client_id.clone().unwrap_or_default(),
                settings.news_client_secret.clone().unwrap_or_default(),
                settings.http_options(),
            )
            .map_err(map_client_error)?;
            let articles =
                load_screen(async move { news.search(&query, display, start).await }).await?;
            emit(json, &articles, |articles| output::print_news(articles))?;
        }
        Command::VerifyBusiness { number } => {
            let registry = business_registry(&settings)?;
            let status = registry.verify(&number).await.map_err(map_client_error)?;
            emit(json, &status, output::print_business)?;
        }
    }

    Ok(())
}

async fn run_board(
    client: &StoreClient,
    store: &SessionStore,
    session: &mut Session,
    command: BoardCommand,
    json: bool,
) -> Result<()> {
    match command {
        BoardCommand::Categories => {
            let c = client.clone();
            let categories = load_screen(async move { c.categories().await }).await?;
            emit(json, &categories, |categories| output::print_categories(categories))?;
        }
        BoardCommand::List { category, search } => {
            let c = client.clone();
            let posts = load_screen(async move { c.posts(category.as_deref()).await }).await?;
            let posts = board::search(&posts, search.as_deref().unwrap_or_default());
            emit(json, &posts, |posts| {
                output::print_posts(posts.iter().copied(), |id| session.likes.is_liked(id))
            })?;
        }
        BoardCommand::Show { id } => {
            let c = client.clone();
            let screen = load_screen(async move {
                let post = c.post(id).await?;
                let comments = c.comments(id).await?;
                Ok::<_, StoreClientError>(PostScreen { post, comments })
            })
            .await?;
            emit(json, &screen, |screen| {
                output::print_post("Пост", &screen.post, &screen.comments)
            })?;
        }
        BoardCommand::Create {
            category,
            title,
            content,
        } => {
            let form = PostForm {
                category,
                title,
                content,
            };
            let post = client.create_post(&form).await.map_err(map_client_error)?;
            output::print_post("Пост создан", &post, &[]);
        }
        BoardCommand::Update {
            id,
            category,
            title,
            content,
        } => {
            // Не переданные поля берём из текущей версии поста.
            let current = client.post(id).await.map_err(map_client_error)?;
            let form = PostForm {
                category: category.unwrap_or(current.category),
                title: title.unwrap_or(current.title),
                content: content.unwrap_or(current.content),
            };
            let post = client
                .update_post(id, &form)
                .await
                .map_err(map_client_error)?;
            output::print_post("Пост обновлён", &post, &[]);
        }
        BoardCommand::Delete { id } => {
            client.delete_post(id).await.map_err(map_client_error)?;
            println!("Пост удалён: id={id}");
        }
        BoardCommand::Like { id } => change_like(client, store, session, id, true).await?,
        BoardCommand::Unlike { id } => change_like(client, store, session, id, false).await?,
        BoardCommand::Comment { post_id, content } => {
            let id = client
                .create_comment(post_id, &CommentForm { content })
                .await
                .map_err(map_client_error)?;
            println!("Комментарий добавлен: id={id}");
        }
        BoardCommand::EditComment { id, content } => {
            client
                .update_comment(id, &CommentForm { content })
                .await
                .map_err(map_client_error)?;
            println!("Комментарий изменён: id={id}");
        }
        BoardCommand::DeleteComment { id } => {
            client.delete_comment(id).await.map_err(map_client_error)?;
            println!("Комментарий удалён: id={id}");
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
struct PostScreen {
    post: Post,
    comments: Vec<Comment>,
}

/// Лайк с экрана поста: счётчик меняется локально и печатается итоговым.
async fn change_like(
    client: &StoreClient,
    store: &SessionStore,
    session: &mut Session,
    id: i64,
    like: bool,
) -> Result<()> {
    let post = client.post(id).await.map_err(map_client_error)?;
    let posts = StateCell::new();
    posts.set(ViewState::Loaded(vec![post]));

    let action = if like {
        client.like(&mut session.likes, &posts, id).await
    } else {
        client.unlike(&mut session.likes, &posts, id).await
    }
    .map_err(map_client_error)?;
    store.save(session).context("не удалось сохранить сессию")?;

    let likes = like_count(&posts, id);
    match (like, action.is_some()) {
        (true, true) => println!("Лайк поставлен: id={id}, лайков {likes}"),
        (true, false) => println!("Пост уже лайкнут: id={id}, лайков {likes}"),
        (false, true) => println!("Лайк снят: id={id}, лайков {likes}"),
        (false, false) => println!("Пост не был лайкнут: id={id}, лайков {likes}"),
    }
    Ok(())
}

fn like_count(posts: &StateCell<Vec<Post>>, id: i64) -> u32 {
    posts
        .get()
        .data()
        .and_then(|list| list.iter().find(|post| post.id == id))
        .map_or(0, |post| post.like_count)
}

async fn run_recipe(client: &StoreClient, command: RecipeCommand, json: bool) -> Result<()> {
    match command {
        RecipeCommand::List => {
            let c = client.clone();
            let recipes = load_screen(async move { c.recipes().await }).await?;
            emit(json, &recipes, |recipes| output::print_recipes(recipes))?;
        }
        RecipeCommand::Show { id } => {
            let c = client.clone();
            let recipe = load_screen(async move { c.recipe(id).await }).await?;
            emit(json, &recipe, output::print_recipe)?;
        }
        RecipeCommand::Create { name, price } => {
            let id = client
                .create_recipe(&RecipeForm { name, price })
                .await
                .map_err(map_client_error)?;
            println!("Рецепт создан: id={id}");
        }
        RecipeCommand::Update { id, name, price } => {
            let current = client.recipe(id).await.map_err(map_client_error)?;
            let form = RecipeForm {
                name: name.unwrap_or(current.name),
                price: price.unwrap_or(current.price),
            };
            client
                .update_recipe(id, &form)
                .await
                .map_err(map_client_error)?;
            println!("Рецепт обновлён: id={id}");
        }
        RecipeCommand::Delete { id } => {
            client.delete_recipe(id).await.map_err(map_client_error)?;
            println!("Рецепт удалён: id={id}");
        }
    }
    Ok(())
}

async fn run_ingredient(client: &StoreClient, command: IngredientCommand) -> Result<()> {
    match command {
        IngredientCommand::Add {
            recipe_id,
            name,
            quantity,
            unit,
            cost,
        } => {
            let form = IngredientForm {
                name,
                quantity,
                unit,
                cost,
            };
            let id = client
                .create_ingredient(recipe_id, &form)
                .await
                .map_err(map_client_error)?;
            println!("Ингредиент добавлен: id={id}");
        }
        IngredientCommand::Update {
            id,
            name,
            quantity,
            unit,
            cost,
        } => {
            let form = IngredientForm {
                name,
                quantity,
                unit,
                cost,
            };
            client
                .update_ingredient(id, &form)
                .await
                .map_err(map_client_error)?;
            println!("Ингредиент изменён: id={id}");
        }
        IngredientCommand::Delete { id } => {
            client.delete_ingredient(id).await.map_err(map_client_error)?;
            println!("Ингредиент удалён: id={id}");
        }
    }
    Ok(())
}

async fn run_sales(client: &StoreClient, command: SalesCommand, json: bool) -> Result<()> {
    match command {
        SalesCommand::List => {
            let c = client.clone();
            let reports = load_screen(async move { c.reports().await }).await?;
            emit(json, &reports, |reports| output::print_reports(reports))?;
        }
        SalesCommand::Add {
            date,
            menu,
            quantity,
            amount,
            memo,
        } => {
            let form = ReportForm {
                sale_date: date,
                menu_name: menu,
                quantity,
                amount,
                memo,
            };
            let id = client.create_report(&form).await.map_err(map_client_error)?;
            println!("Запись добавлена: id={id}");
        }
        SalesCommand::Update {
            id,
            date,
            menu,
            quantity,
            amount,
            memo,
        } => {
            let form = ReportForm {
                sale_date: date,
                menu_name: menu,
                quantity,
                amount,
                memo,
            };
            client
                .update_report(id, &form)
                .await
                .map_err(map_client_error)?;
            println!("Запись изменена: id={id}");
        }
        SalesCommand::Delete { id } => {
            client.delete_report(id).await.map_err(map_client_error)?;
            println!("Запись удалена: id={id}");
        }
        SalesCommand::Summary { from, to } => {
            if let (Some(from), Some(to)) = (from, to) {
                if from > to {
                    return Err(anyhow!("--from ({from}) позже --to ({to})"));
                }
            }
            let c = client.clone();
            let summary = load_screen(async move { c.sales_summary(from, to).await }).await?;
            emit(json, &summary, output::print_sales)?;
        }
    }
    Ok(())
}

/// Маржа по рецептам с ингредиентами, без серверной сводки.
async fn local_margin(client: &StoreClient) -> StoreClientResult<MarginSummary> {
    let mut recipes = client.recipes().await?;
    for recipe in &mut recipes {
        if recipe.ingredients.is_empty() {
            recipe.ingredients = client.ingredients(recipe.id).await?;
        }
    }
    Ok(MarginSummary::from_recipes(&recipes))
}

/// Выполняет запрос как экран: через наблюдаемое состояние и задачу экрана.
async fn load_screen<T, F>(request: F) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
    F: Future<Output = StoreClientResult<T>> + Send + 'static,
{
    let cell = StateCell::new();
    let mut scope = ScreenScope::new();
    scope.launch(&cell, request);
    scope.settle().await;

    match cell.get() {
        ViewState::Loaded(data) => Ok(data),
        ViewState::Failed(message) => Err(anyhow!(message)),
        ViewState::Idle | ViewState::Loading => Err(anyhow!("экран закрыт до получения данных")),
    }
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, print: impl FnOnce(&T)) -> Result<()> {
    if json {
        let raw = serde_json::to_string_pretty(value).context("не удалось сериализовать ответ")?;
        println!("{raw}");
    } else {
        print(value);
    }
    Ok(())
}

fn business_registry(settings: &Settings) -> Result<BusinessRegistryClient> {
    BusinessRegistryClient::new(
        settings.business_api_url.clone(),
        settings.business_service_key.clone().unwrap_or_default(),
        settings.http_options(),
    )
    .map_err(map_client_error)
}

async fn ensure_active_business(settings: &Settings, number: &str) -> Result<()> {
    if settings.business_service_key.is_none() {
        tracing::warn!("BUSINESS_SERVICE_KEY is not set, skipping business number check");
        return Ok(());
    }
    let status = business_registry(settings)?
        .verify(number)
        .await
        .map_err(map_client_error)?;
    if !status.is_active() {
        return Err(anyhow!(
            "бизнес {} не действует: {:?}",
            status.business_number,
            status.state()
        ));
    }
    Ok(())
}

fn map_client_error(err: StoreClientError) -> anyhow::Error {
    let message = match err {
        StoreClientError::Unauthorized => {
            "требуется авторизация: выполните `store-cli login ...`".to_string()
        }
        StoreClientError::NotFound => "ресурс не найден".to_string(),
        StoreClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        StoreClientError::Validation(message) => format!("проверьте поля: {message}"),
        StoreClientError::Server(message) => format!("ошибка сервера: {message}"),
        StoreClientError::Decode(message) => format!("некорректный ответ сервера: {message}"),
        StoreClientError::Http(err) => format!("ошибка HTTP: {err}"),
        StoreClientError::Storage(message) => format!("ошибка хранилища: {message}"),
        StoreClientError::NotConfigured(service) => {
            format!("{service} не настроен: задайте ключи в .env")
        }
    };
    anyhow!(message)
}

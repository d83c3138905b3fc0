//! Состояние экранов: наблюдаемые контейнеры и задачи, привязанные к экрану.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::error::StoreClientResult;

#[derive(Debug, Clone, PartialEq)]
/// Что показывает экран.
pub enum ViewState<T> {
    /// Запрос ещё не выполнялся.
    Idle,
    /// Идёт запрос.
    Loading,
    /// Данные получены.
    Loaded(T),
    /// Запрос не удался; строка для пользователя.
    Failed(String),
}

impl<T> ViewState<T> {
    /// Данные, если они загружены.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }

    /// Строка ошибки, если запрос не удался.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// `true`, пока идёт запрос.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Преобразует результат запроса в состояние.
    pub fn from_result(result: StoreClientResult<T>) -> Self {
        match result {
            Ok(data) => Self::Loaded(data),
            Err(err) => Self::Failed(err.user_message()),
        }
    }
}

#[derive(Debug)]
/// Наблюдаемый контейнер состояния экрана.
pub struct StateCell<T> {
    tx: watch::Sender<ViewState<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Default for StateCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StateCell<T> {
    /// Контейнер в состоянии [`ViewState::Idle`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ViewState::Idle);
        Self { tx }
    }

    /// Подписка на изменения.
    pub fn subscribe(&self) -> watch::Receiver<ViewState<T>> {
        self.tx.subscribe()
    }

    /// Заменяет состояние и оповещает подписчиков.
    pub fn set(&self, state: ViewState<T>) {
        self.tx.send_replace(state);
    }

    /// Меняет загруженные данные на месте. В других состояниях ничего не делает.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_if_modified(|state| match state {
            ViewState::Loaded(data) => {
                f(data);
                true
            }
            _ => false,
        });
    }
}

impl<T: Clone> StateCell<T> {
    /// Текущее состояние.
    pub fn get(&self) -> ViewState<T> {
        self.tx.borrow().clone()
    }
}

#[derive(Debug, Default)]
/// Задачи одного экрана. При уничтожении экрана (drop) все незавершённые
/// запросы отменяются.
pub struct ScreenScope {
    tasks: JoinSet<()>,
}

impl ScreenScope {
    /// Пустой набор задач.
    pub fn new() -> Self {
        Self::default()
    }

    /// Запускает запрос: ставит `Loading`, по завершении пишет `Loaded` или `Failed`.
    ///
    /// Должен вызываться внутри tokio-рантайма.
    pub fn launch<T, F>(&mut self, cell: &StateCell<T>, request: F)
    where
        T: Send + Sync + 'static,
        F: Future<Output = StoreClientResult<T>> + Send + 'static,
    {
        cell.set(ViewState::Loading);
        let cell = cell.clone();
        self.tasks.spawn(async move {
            let state = ViewState::from_result(request.await);
            if let ViewState::Failed(message) = &state {
                tracing::debug!(%message, "screen request failed");
            }
            cell.set(state);
        });
    }

    /// Количество незавершённых задач.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Дожидается завершения всех запущенных запросов.
    pub async fn settle(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    /// Отменяет все запросы экрана.
    pub fn close(&mut self) {
        self.tasks.abort_all();
    }
}

//! Локальное хранилище сессии: простой key-value файл в JSON.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::board::LikeBook;
use crate::error::{StoreClientError, StoreClientResult};
use crate::models::User;

const LOGIN_ID_KEY: &str = "login_id";
const USER_KEY: &str = "user";
const LIKES_KEY: &str = "liked_posts";

#[derive(Debug, Clone)]
/// Key-value хранилище поверх одного JSON-файла.
///
/// Запись идёт через временный файл и `rename`, поэтому прерванная запись не
/// портит уже сохранённые значения.
pub struct KeyValueStore {
    path: PathBuf,
}

impl KeyValueStore {
    /// Хранилище в файле `path`. Файл создаётся при первой записи.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Путь к файлу хранилища.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StoreClientResult<BTreeMap<String, serde_json::Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(storage_error(&self.path, err)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "session file is corrupted, starting fresh"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, map: &BTreeMap<String, serde_json::Value>) -> StoreClientResult<()> {
        let raw = serde_json::to_string_pretty(map)
            .map_err(|err| StoreClientError::Storage(err.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(|err| storage_error(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| storage_error(&self.path, err))
    }

    /// Значение по ключу. Нечитаемое значение считается отсутствующим.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreClientResult<Option<T>> {
        let mut map = self.read_all()?;
        Ok(map
            .remove(key)
            .and_then(|value| serde_json::from_value(value).ok()))
    }

    /// Записывает значение по ключу.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> StoreClientResult<()> {
        let value =
            serde_json::to_value(value).map_err(|err| StoreClientError::Storage(err.to_string()))?;
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value);
        self.write_all(&map)
    }

    /// Удаляет ключ. Отсутствующий ключ не ошибка.
    pub fn remove(&self, key: &str) -> StoreClientResult<()> {
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

fn storage_error(path: &Path, err: io::Error) -> StoreClientError {
    StoreClientError::Storage(format!("{}: {err}", path.display()))
}

fn parse_login_id(raw: &str) -> Option<String> {
    let login_id = raw.trim().to_string();
    if login_id.is_empty() {
        return None;
    }
    Some(login_id)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Состояние сессии между запусками.
pub struct Session {
    /// Логин вошедшего пользователя.
    pub login_id: Option<String>,
    /// Профиль, полученный при входе.
    pub user: Option<User>,
    /// Лайки текущего пользователя.
    pub likes: LikeBook,
}

impl Session {
    /// `true`, если пользователь вошёл.
    pub fn is_logged_in(&self) -> bool {
        self.login_id.is_some()
    }
}

#[derive(Debug, Clone)]
/// Сохранение и загрузка [`Session`] через [`KeyValueStore`].
pub struct SessionStore {
    store: KeyValueStore,
}

impl SessionStore {
    /// Хранилище сессии в файле `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: KeyValueStore::new(path),
        }
    }

    /// Загружает сессию. Отсутствующий файл даёт пустую сессию.
    pub fn load(&self) -> StoreClientResult<Session> {
        let login_id = self
            .store
            .get::<String>(LOGIN_ID_KEY)?
            .as_deref()
            .and_then(parse_login_id);
        let user = self.store.get::<User>(USER_KEY)?;
        let likes = match &login_id {
            Some(login_id) => self.likes_for(login_id)?,
            None => LikeBook::new(),
        };

        Ok(Session {
            login_id,
            user,
            likes,
        })
    }

    /// Сохраняет сессию целиком.
    pub fn save(&self, session: &Session) -> StoreClientResult<()> {
        match &session.login_id {
            Some(login_id) => self.store.set(LOGIN_ID_KEY, login_id)?,
            None => self.store.remove(LOGIN_ID_KEY)?,
        }
        match &session.user {
            Some(user) => self.store.set(USER_KEY, user)?,
            None => self.store.remove(USER_KEY)?,
        }
        if let Some(login_id) = &session.login_id {
            self.store.set(&likes_key(login_id), &session.likes)?;
        }
        Ok(())
    }

    /// Лайки пользователя `login_id`. Хранятся отдельно для каждого
    /// пользователя и переживают выход из аккаунта.
    pub fn likes_for(&self, login_id: &str) -> StoreClientResult<LikeBook> {
        Ok(self
            .store
            .get::<LikeBook>(&likes_key(login_id))?
            .unwrap_or_default())
    }

    /// Сбрасывает сессию (выход из аккаунта). Лайки пользователя остаются.
    pub fn clear(&self) -> StoreClientResult<()> {
        self.store.remove(LOGIN_ID_KEY)?;
        self.store.remove(USER_KEY)
    }
}

fn likes_key(login_id: &str) -> String {
    format!("{LIKES_KEY}:{login_id}")
}

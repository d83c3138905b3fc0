use std::time::Duration;

use store_client::StoreClientError;
use store_client::view_state::{ScreenScope, StateCell, ViewState};

#[tokio::test]
async fn launch_moves_through_loading_to_loaded() {
    let cell: StateCell<Vec<i64>> = StateCell::new();
    let mut rx = cell.subscribe();
    let mut scope = ScreenScope::new();

    scope.launch(&cell, async { Ok(vec![1, 2, 3]) });
    assert!(cell.get().is_loading());

    scope.settle().await;
    assert_eq!(cell.get().data(), Some(&vec![1, 2, 3]));
    assert!(rx.has_changed().expect("sender alive"));
    assert_eq!(*rx.borrow_and_update(), ViewState::Loaded(vec![1, 2, 3]));
}

#[tokio::test]
async fn failure_is_stored_as_user_message() {
    let cell: StateCell<()> = StateCell::new();
    let mut scope = ScreenScope::new();

    scope.launch(&cell, async { Err(StoreClientError::NotFound) });
    scope.settle().await;

    assert_eq!(cell.get().error(), Some("Данные не найдены"));
}

#[tokio::test]
async fn dropping_scope_cancels_pending_requests() {
    let cell: StateCell<u32> = StateCell::new();
    let mut scope = ScreenScope::new();

    scope.launch(&cell, async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(1)
    });
    assert_eq!(scope.pending(), 1);

    drop(scope);
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Экран ушёл до ответа: состояние так и осталось «загрузка».
    assert_eq!(cell.get(), ViewState::Loading);
}

#[tokio::test]
async fn close_aborts_and_settle_returns() {
    let cell: StateCell<u32> = StateCell::new();
    let mut scope = ScreenScope::new();

    scope.launch(&cell, async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(1)
    });
    scope.close();
    tokio::time::timeout(Duration::from_secs(1), scope.settle())
        .await
        .expect("aborted tasks must settle quickly");
    assert_eq!(scope.pending(), 0);
}

#[tokio::test]
async fn update_only_touches_loaded_data() {
    let cell: StateCell<u32> = StateCell::new();
    cell.update(|n| *n += 1);
    assert_eq!(cell.get(), ViewState::Idle);

    cell.set(ViewState::Loaded(1));
    cell.update(|n| *n += 1);
    assert_eq!(cell.get(), ViewState::Loaded(2));
}

//! TUIのイベントループと、エンジン状態の購読。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

use crate::{
    credentials::{CredentialStore, FileCredentialStore},
    engine::{EngineState, StateEngine},
    events::{CredentialForm, Screen, UiState},
    input::InputBoxState,
    shortcuts::Shortcuts,
    ui::Tui,
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// 状態の書き込みと更新要求を受け持つエンジン。
    pub engine: StateEngine,
    /// エンジン状態の変更通知。
    pub state_rx: watch::Receiver<EngineState>,
    /// 設定画面から保存・削除する認証情報ストア。
    pub store: Arc<FileCredentialStore>,
    /// 画面やステータス文言などUI固有の状態。
    pub ui: UiState,
    /// 設定画面の編集バッファ。
    pub form: CredentialForm,
    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

impl App {
    /// エンジンを購読した初期状態を作る。
    pub fn new(engine: StateEngine, store: Arc<FileCredentialStore>, shortcuts: Shortcuts) -> Self {
        Self {
            state_rx: engine.subscribe(),
            engine,
            store,
            ui: UiState::default(),
            form: CredentialForm::default(),
            input_box: None,
            shortcuts,
        }
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(
    terminal: &mut Tui,
    engine: StateEngine,
    store: Arc<FileCredentialStore>,
    shortcuts: Shortcuts,
) -> Result<()> {
    // 認証情報が未保存なら設定画面から始める。
    let first_run = !store.has_stored_credentials().await;
    let mut app = App::new(engine, store, shortcuts);
    if first_run {
        handlers::open_settings(&mut app).await;
        app.ui.status = "Enter your Tempo credentials".into();
    }

    let mut needs_draw = true;
    loop {
        // 状態が更新されたか入力があった時だけ描画し直す。
        if needs_draw || app.state_rx.has_changed().unwrap_or(false) {
            let snapshot = app.state_rx.borrow_and_update().clone();
            terminal.draw(|f| draw(f, &app, &snapshot))?;
            needs_draw = false;
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => {
                // どの画面でもCtrl+Cで終了できるようにする。
                if is_ctrl_c(&k) || handle_key(&mut app, k).await? {
                    break;
                }
                needs_draw = true;
            }
            Event::Resize(_, _) => needs_draw = true,
            _ => {}
        }
    }
    Ok(())
}

//! キー入力ハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    credentials::{CredentialError, CredentialStore},
    events::{CredentialForm, Screen},
    input::{InputBoxState, InputCallbackId},
    shortcuts,
};

use super::App;

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが開いていれば最優先で処理する。
    if app.input_box.is_some() {
        return Ok(handle_input_box_key(app, k));
    }

    // 画面ごとのハンドラへ委譲する。
    match app.ui.screen {
        Screen::Main => handle_main_key(app, k).await,
        Screen::Settings => handle_settings_key(app, k).await,
    }
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// メイン画面のキー処理。
async fn handle_main_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.main;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.refresh) {
        // 認証情報が無ければエンジンは何もしないので案内だけ出す。
        if app.engine.snapshot().has_credentials {
            tracing::info!("manual refresh requested");
            app.engine.refresh();
            app.ui.status = "Refreshing...".into();
        } else {
            app.ui.status = "Credentials required (press t)".into();
        }
    } else if shortcuts::matches_shortcut(&k, &sc.details) {
        // 詳細ポップオーバーを開閉する。
        app.ui.show_details = !app.ui.show_details;
    } else if shortcuts::matches_shortcut(&k, &sc.settings) {
        open_settings(app).await;
    }

    Ok(false)
}

/// 保存済みの認証情報を編集バッファへ読み込み、設定画面へ遷移する。
pub async fn open_settings(app: &mut App) {
    app.ui.error = None;
    app.form = match app.store.load_credentials().await {
        Ok(creds) => CredentialForm::from_credentials(&creds),
        Err(CredentialError::NoStoredCredentials) => CredentialForm::default(),
        Err(e) => {
            // 読めない場合は空のフォームで上書き保存できるようにする。
            tracing::warn!("stored credentials unreadable: {e}");
            app.ui.error = Some(format!("Stored credentials unreadable: {e}"));
            CredentialForm::default()
        }
    };
    app.ui.show_details = false;
    app.ui.screen = Screen::Settings;
    app.ui.status = "Settings".into();
}

/// 設定画面を閉じ、認証情報を再確認させる。
fn close_settings(app: &mut App, status: &str) {
    app.ui.screen = Screen::Main;
    app.ui.error = None;
    app.ui.status = status.into();
    app.engine.check_credentials_and_refresh();
}

/// 設定画面のキー処理。
async fn handle_settings_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.settings;

    if shortcuts::matches_shortcut(&k, &sc.cancel) {
        // 編集内容を破棄してメイン画面へ戻る。
        close_settings(app, "Settings closed");
    } else if shortcuts::matches_shortcut(&k, &sc.save) {
        // 入力値を検証してから保存する。
        match app.form.to_credentials() {
            Ok(creds) => match app.store.save(&creds).await {
                Ok(()) => close_settings(app, "Saved credentials"),
                Err(e) => {
                    tracing::error!("saving credentials failed: {e}");
                    app.ui.error = Some(format!("Save failed: {e}"));
                }
            },
            Err(msg) => app.ui.error = Some(msg),
        }
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        // 保存済みの認証情報と表示中のデータを消す。
        match app.store.delete().await {
            Ok(()) => {
                app.engine.clear_data();
                app.form = CredentialForm::default();
                app.ui.error = None;
                app.ui.status = "Credentials deleted".into();
            }
            Err(e) => app.ui.error = Some(format!("Delete failed: {e}")),
        }
    } else if shortcuts::matches_shortcut(&k, &sc.api_token) {
        app.input_box = Some(InputBoxState::open(
            "Tempo API token:",
            &app.form.api_token,
            InputCallbackId::ApiToken,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.account_id) {
        app.input_box = Some(InputBoxState::open(
            "Atlassian account ID (blank = look up via Jira):",
            &app.form.account_id,
            InputCallbackId::AccountId,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.jira_url) {
        app.input_box = Some(InputBoxState::open(
            "Jira base URL:",
            &app.form.jira_base_url,
            InputCallbackId::JiraBaseUrl,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.threshold) {
        app.input_box = Some(InputBoxState::open(
            "Warning threshold (days):",
            &app.form.warning_threshold_days,
            InputCallbackId::WarningThreshold,
        ));
    }

    Ok(false)
}

/// 入力ボックスのキー処理。Ctrl+Cでの終了はループ側で扱う。
fn handle_input_box_key(app: &mut App, k: KeyEvent) -> bool {
    let Some(input_state) = &mut app.input_box else {
        return false;
    };
    let sc = &app.shortcuts.input_box;

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // 入力ボックスを閉じる前に値とコールバック種別を取り出す。
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;
        apply_input_callback(app, callback_id, value);
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        // コントロールキーでない通常の文字だけを挿入する。
        input_state.insert_char(c);
    }

    false
}

/// 入力ボックスの値を編集バッファへ反映する。
fn apply_input_callback(app: &mut App, callback_id: InputCallbackId, value: String) {
    match callback_id {
        InputCallbackId::ApiToken => app.form.api_token = value,
        InputCallbackId::AccountId => app.form.account_id = value,
        InputCallbackId::JiraBaseUrl => app.form.jira_base_url = value,
        InputCallbackId::WarningThreshold => app.form.warning_threshold_days = value,
    }
}

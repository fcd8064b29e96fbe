//! レイアウト計算のヘルパー関数

use ratatui::prelude::*;

/// 画面共通の3つの領域
pub struct MainLayout {
    /// 概要または設定フォームの領域
    pub body: Rect,
    /// HELPバーの領域
    pub help_bar: Rect,
    /// STATUSバー（ワークログ状態）の領域
    pub status_bar: Rect,
}

/// 画面を3つの領域に分割（Body + HELP + STATUS）
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Body
            Constraint::Length(3), // HELPバー
            Constraint::Length(3), // STATUSバー
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

//! 画面描画のヘルパー関数。

use chrono::NaiveDateTime;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::{
    engine::{EngineState, StatusColor},
    events::Screen,
    input::{centered_popup, render_input_box},
    layout::create_main_layout,
    shortcuts::Shortcuts,
};

use super::App;

/// 現在の状態を画面全体に描画する。
pub fn draw(f: &mut Frame, app: &App, state: &EngineState) {
    let layout = create_main_layout(f.area());

    match app.ui.screen {
        Screen::Main => draw_summary(f, layout.body, state),
        Screen::Settings => draw_settings(f, layout.body, app),
    }

    // ヘルプバーには現在画面のキーと一時メッセージを並べる。
    let help = Paragraph::new(format!(
        "{} | {}",
        get_help_text(&app.ui.screen, &app.shortcuts),
        app.ui.status
    ))
    .block(Block::default().borders(Borders::ALL).title("HELP"))
    .wrap(Wrap { trim: true });
    f.render_widget(help, layout.help_bar);

    f.render_widget(build_status_bar(state), layout.status_bar);

    if app.ui.show_details && app.ui.screen == Screen::Main {
        draw_details_popover(f, state);
    }

    // 入力ボックスは最前面に描画する。
    if let Some(input) = &app.input_box {
        render_input_box(f, input);
    }
}

/// メイン画面の本文（状態の要約）を描画する。
fn draw_summary(f: &mut Frame, area: Rect, state: &EngineState) {
    let mut lines = vec![
        Line::from(Span::styled(
            state.status_bar_title(),
            Style::default()
                .fg(status_color(state.color_bucket()))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(state.status_bar_tooltip()),
        Line::from(format!(
            "Warning after {} day(s) without a worklog",
            state.warning_threshold_days
        )),
    ];
    if !state.has_credentials {
        lines.push(Line::from("No credentials configured. Press t to open settings."));
    }
    let title = format!("Worklog {}", state.status_emoji());
    let summary = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.trim_end().to_string()))
        .wrap(Wrap { trim: true });
    f.render_widget(summary, area);
}

/// 詳細ポップオーバーを中央に描画する。
fn draw_details_popover(f: &mut Frame, state: &EngineState) {
    let lines = detail_lines(state);
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let area = centered_popup(f.area(), 70, height);
    f.render_widget(Clear, area);
    let popover = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .wrap(Wrap { trim: false });
    f.render_widget(popover, area);
}

/// 設定画面の編集バッファを描画する。
fn draw_settings(f: &mut Frame, area: Rect, app: &App) {
    let form = &app.form;
    let account = if form.account_id.is_empty() {
        "(look up via Jira)"
    } else {
        form.account_id.as_str()
    };
    let mut text = format!(
        "API token:          {}\nAccount ID:         {}\nJira base URL:      {}\nWarning threshold:  {} day(s)",
        form.masked_token(),
        account,
        form.jira_base_url,
        form.warning_threshold_days
    );
    if let Some(err) = &app.ui.error {
        text.push_str(&format!("\n\nERROR: {err}"));
    }
    let mut widget = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Settings"))
        .wrap(Wrap { trim: false });
    // エラー時は赤色で強調表示する。
    if app.ui.error.is_some() {
        widget = widget.style(Style::default().fg(Color::Red));
    }
    f.render_widget(widget, area);
}

/// ステータスバーを状態に応じた色で作る。
fn build_status_bar(state: &EngineState) -> Paragraph<'static> {
    let color = if state.error_message.is_some() {
        Color::Red
    } else {
        status_color(state.color_bucket())
    };
    Paragraph::new(status_line(state))
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
}

/// ステータスバーの文言（ラベル | ツールチップ | 取得中 | エラー）。
pub fn status_line(state: &EngineState) -> String {
    let mut parts = vec![state.status_bar_title(), state.status_bar_tooltip()];
    if state.is_loading {
        parts.push("refreshing...".into());
    }
    if let Some(err) = &state.error_message {
        parts.push(err.clone());
    }
    parts.join(" | ")
}

/// 詳細ポップオーバーに表示する行。
pub fn detail_lines(state: &EngineState) -> Vec<String> {
    if !state.has_credentials {
        let mut lines = vec!["No credentials configured.".to_string()];
        if let Some(err) = &state.error_message {
            lines.push(err.clone());
        }
        lines.push("Press t to open settings.".into());
        return lines;
    }

    let mut lines = vec![state.status_bar_tooltip()];
    if let Some(w) = &state.latest_worklog {
        lines.push(format!("Started:   {}", format_started(&w.started_at)));
        lines.push(format!("Logged:    {}", format_duration(w.time_spent_seconds)));
        if let Some(issue) = &w.issue {
            match &issue.summary {
                Some(summary) => lines.push(format!("Issue:     {} {}", issue.key, summary)),
                None => lines.push(format!("Issue:     {}", issue.key)),
            }
        }
        if let Some(comment) = &w.comment {
            lines.push(format!("Comment:   {comment}"));
        }
    } else if state.error_message.is_none() && !state.is_loading {
        lines.push("No worklogs found in the search window.".into());
    }
    lines.push(format!(
        "Threshold: {} day(s)",
        state.warning_threshold_days
    ));
    if state.is_loading {
        lines.push("Refreshing...".into());
    }
    if let Some(err) = &state.error_message {
        lines.push(format!("Last refresh failed: {err}"));
    }
    lines
}

/// 開始日時を分単位で表示する。
fn format_started(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

/// 秒数を「1h 30m」形式にする。
pub fn format_duration(seconds: u64) -> String {
    let minutes = seconds / 60;
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// 状態の色区分を端末色へ変換する。
fn status_color(bucket: StatusColor) -> Color {
    match bucket {
        StatusColor::Green => Color::Green,
        StatusColor::Orange => Color::Yellow,
        StatusColor::Red => Color::Red,
        StatusColor::Neutral => Color::Gray,
    }
}

/// 現在画面に応じたヘルプ文字列を返す。
fn get_help_text(screen: &Screen, shortcuts: &Shortcuts) -> String {
    match screen {
        Screen::Main => format!(
            "{}: quit | {}: refresh | {}: details | {}: settings",
            format_keys(&shortcuts.main.quit),
            format_keys(&shortcuts.main.refresh),
            format_keys(&shortcuts.main.details),
            format_keys(&shortcuts.main.settings)
        ),
        Screen::Settings => format!(
            "{}: token | {}: account | {}: Jira URL | {}: threshold | {}: save | {}: delete | {}: close",
            format_keys(&shortcuts.settings.api_token),
            format_keys(&shortcuts.settings.account_id),
            format_keys(&shortcuts.settings.jira_url),
            format_keys(&shortcuts.settings.threshold),
            format_keys(&shortcuts.settings.save),
            format_keys(&shortcuts.settings.delete),
            format_keys(&shortcuts.settings.cancel)
        ),
    }
}

/// ショートカットキーの配列を表示用文字列に変換する。
fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        credentials::FileCredentialStore,
        engine::StateEngine,
        test_support::{FakeWorklogClient, sample_worklog},
    };
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    fn loaded_state() -> EngineState {
        EngineState {
            days_since_last_worklog: Some(8),
            latest_worklog: Some(sample_worklog()),
            has_credentials: true,
            ..EngineState::default()
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(45 * 60), "45m");
        assert_eq!(format_duration(2 * 3600), "2h");
        assert_eq!(format_duration(5400), "1h 30m");
    }

    #[test]
    fn test_status_line() {
        // ラベルとツールチップ、取得中・エラーを連結する。
        let mut state = loaded_state();
        assert_eq!(status_line(&state), "⏰ 8 | Last worklog: 8 days ago");

        state.is_loading = true;
        assert!(status_line(&state).ends_with("refreshing..."));

        let state = EngineState {
            error_message: Some("Tempo error: access forbidden".into()),
            has_credentials: true,
            ..EngineState::default()
        };
        assert_eq!(
            status_line(&state),
            "⏱️ | No worklog data available | Tempo error: access forbidden"
        );
    }

    #[test]
    fn test_detail_lines_for_worklog() {
        // 最新ワークログの内容を一通り表示する。
        let lines = detail_lines(&loaded_state());
        assert_eq!(lines[0], "Last worklog: 8 days ago");
        assert!(lines.contains(&"Started:   2024-05-07 09:30".to_string()));
        assert!(lines.contains(&"Logged:    1h 30m".to_string()));
        assert!(lines.contains(&"Issue:     PROJ-42 Planning".to_string()));
        assert!(lines.contains(&"Comment:   Sprint planning".to_string()));
        assert!(lines.contains(&"Threshold: 7 day(s)".to_string()));
    }

    #[test]
    fn test_detail_lines_without_credentials() {
        // 認証情報が無い場合は案内と直近のエラーを出す。
        let state = EngineState {
            error_message: Some("No credentials configured".into()),
            ..EngineState::default()
        };
        let lines = detail_lines(&state);
        assert_eq!(lines[0], "No credentials configured.");
        assert_eq!(lines.last().unwrap(), "Press t to open settings.");
    }

    #[test]
    fn test_detail_lines_for_empty_window() {
        // 期間内にワークログが無い場合の表示。
        let state = EngineState {
            has_credentials: true,
            ..EngineState::default()
        };
        let lines = detail_lines(&state);
        assert!(lines.contains(&"No worklogs found in the search window.".to_string()));
    }

    #[tokio::test]
    async fn test_draw_renders_status_bar() {
        // TestBackendに描画し、ステータスとヘルプが出ることを確認する。
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));
        let client = Arc::new(FakeWorklogClient::returning(Ok(None), None));
        let engine = StateEngine::new(store.clone(), client);
        let mut app = App::new(engine, store, Shortcuts::default());
        app.ui.show_details = true;

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app, &loaded_state())).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("STATUS"));
        assert!(text.contains("Details"));
        assert!(text.contains("refresh"));
    }
}

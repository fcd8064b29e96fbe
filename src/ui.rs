//! TUI用端末の初期化と復元。

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};

/// アプリ全体で使う端末型。
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// 代替画面へ切り替え、rawモードを有効化する。
pub fn init_terminal() -> Result<Tui> {
    // パニック時にも端末を壊さないようフックを先に入れる。
    install_panic_hook();
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

/// 終了時に端末状態を元に戻す。
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// UIスレッドのパニック時、既定の表示の前に端末を復元する。
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("panic: {info}");
        // ワーカースレッドのパニックはエンジン側で回収されるので端末は維持する。
        if std::thread::current().name() == Some("main") {
            let _ = restore_terminal();
            default_hook(info);
        }
    }));
}

//! 画面遷移用のUI状態と画面種別。

use crate::credentials::{Credentials, DEFAULT_WARNING_THRESHOLD_DAYS};

/// TUIで現在表示中の画面。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// ステータスバーと詳細ポップオーバーの画面。
    Main,
    /// 認証情報の編集画面。
    Settings,
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 現在の画面。
    pub screen: Screen,
    /// 詳細ポップオーバーを表示中か。
    pub show_details: bool,
    /// ヘルプバー横に出す一時的な案内文言。
    pub status: String,
    /// UI操作のエラー（保存失敗など）。
    pub error: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Main,
            show_details: false,
            status: "Ready".into(),
            error: None,
        }
    }
}

/// 設定画面で編集する認証情報のバッファ。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialForm {
    /// TempoのAPIトークン。
    pub api_token: String,
    /// AtlassianアカウントID（空ならJiraから解決）。
    pub account_id: String,
    /// JiraサイトのURL。
    pub jira_base_url: String,
    /// 警告までの日数（文字列で保持し保存時に検証）。
    pub warning_threshold_days: String,
}

impl Default for CredentialForm {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            account_id: String::new(),
            jira_base_url: String::new(),
            warning_threshold_days: DEFAULT_WARNING_THRESHOLD_DAYS.to_string(),
        }
    }
}

impl CredentialForm {
    /// 保存済みの認証情報から編集バッファを作る。
    pub fn from_credentials(creds: &Credentials) -> Self {
        Self {
            api_token: creds.api_token.clone(),
            account_id: creds.account_id.clone().unwrap_or_default(),
            jira_base_url: creds.jira_base_url.clone(),
            warning_threshold_days: creds.warning_threshold_days.to_string(),
        }
    }

    /// 入力値を検証して保存用の認証情報へ変換する。
    pub fn to_credentials(&self) -> Result<Credentials, String> {
        let api_token = self.api_token.trim();
        if api_token.is_empty() {
            return Err("API token is required".into());
        }
        let jira_base_url = self.jira_base_url.trim();
        if jira_base_url.is_empty() {
            return Err("Jira base URL is required".into());
        }
        let warning_threshold_days = match self.warning_threshold_days.trim().parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => return Err("Warning threshold must be a whole number of days (1 or more)".into()),
        };
        let account_id = Some(self.account_id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        Ok(Credentials {
            api_token: api_token.to_string(),
            account_id,
            jira_base_url: jira_base_url.to_string(),
            warning_threshold_days,
        })
    }

    /// 画面表示用に末尾4文字以外を伏せたトークン。
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.api_token.chars().collect();
        if chars.is_empty() {
            return "(not set)".into();
        }
        let visible: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("{}{}", "*".repeat(chars.len().saturating_sub(4).min(12)), visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> CredentialForm {
        CredentialForm {
            api_token: " tok-123456 ".into(),
            account_id: "".into(),
            jira_base_url: "https://example.atlassian.net".into(),
            warning_threshold_days: "5".into(),
        }
    }

    #[test]
    fn test_to_credentials_trims_and_drops_empty_account() {
        // 前後の空白は取り除き、空のアカウントIDはNoneにする。
        let creds = filled().to_credentials().unwrap();
        assert_eq!(creds.api_token, "tok-123456");
        assert_eq!(creds.account_id, None);
        assert_eq!(creds.warning_threshold_days, 5);
    }

    #[test]
    fn test_to_credentials_rejects_bad_input() {
        // 必須項目の欠落と不正な閾値を検出する。
        let mut form = filled();
        form.warning_threshold_days = "0".into();
        assert!(form.to_credentials().is_err());
        form.warning_threshold_days = "seven".into();
        assert!(form.to_credentials().is_err());

        let mut form = filled();
        form.api_token = "  ".into();
        assert!(form.to_credentials().is_err());

        let mut form = filled();
        form.jira_base_url.clear();
        assert!(form.to_credentials().is_err());
    }

    #[test]
    fn test_form_round_trips_stored_credentials() {
        // 保存済みの値から作ったフォームは同じ値へ戻る。
        let creds = Credentials {
            api_token: "abc".into(),
            account_id: Some("acc".into()),
            jira_base_url: "https://x.atlassian.net".into(),
            warning_threshold_days: 3,
        };
        let form = CredentialForm::from_credentials(&creds);
        assert_eq!(form.to_credentials().unwrap(), creds);
    }

    #[test]
    fn test_masked_token() {
        // 末尾4文字だけを表示する。
        let mut form = CredentialForm::default();
        assert_eq!(form.masked_token(), "(not set)");
        form.api_token = "abcdefgh".into();
        assert_eq!(form.masked_token(), "****efgh");
        form.api_token = "xyz".into();
        assert_eq!(form.masked_token(), "xyz");
    }
}

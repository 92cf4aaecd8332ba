//! Helpers shared by the command tests.

use std::fs;
use std::path::PathBuf;

use commission_manager::{UserId, UserIdentity};
use tempfile::TempDir;

use super::context::CommandContext;
use crate::config::AppConfig;

/// Complete commission document with `transfer.USD.SW` and `exchange`
/// configurable.
pub(crate) fn document_json(usd_sw: &str, exchange: &str) -> String {
    format!(
        r#"{{
    "transfer": {{
        "USD": {{ "SW": "{usd_sw}", "PM": "1.5" }},
        "EUR": {{ "SW": "0", "PM": "1" }},
        "BTC": {{ "BTC": "0.0005" }},
        "ETH": {{ "ERC20": "0.008" }},
        "USDT": {{ "ERC20": "25", "TRC20": "1", "BEP20": "0.8" }},
        "TRX": {{ "TRC20": "1" }},
        "BNB": {{ "BEP20": "0.01" }},
        "SWP": {{ "BEP20": "1", "SS": "0.5" }},
        "SWCT": {{ "BEP20": "2" }}
    }},
    "exchange": "{exchange}",
    "custom_exchange_commission": "0.995",
    "custom2_exchange_commission": "0.99",
    "replenishment": "2.3"
}}"#
    )
}

/// A command context over a data file inside a temporary directory.
pub(crate) struct TestWorkspace {
    pub dir: TempDir,
    pub context: CommandContext,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let context = CommandContext::from_config(
            AppConfig::default(),
            dir.path().join("commissions.json"),
        );
        Self { dir, context }
    }

    /// Writes `content` to a file in the workspace and returns its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub async fn register(&self, user_id: i64, email: &str) {
        self.context
            .repository
            .register_user(UserIdentity::new(UserId::new(user_id), email), true)
            .await
            .expect("Failed to register user");
    }
}

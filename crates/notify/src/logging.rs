use async_trait::async_trait;
use intraday_core::traits::Notifier;

/// Writes alerts to the tracing log instead of an external channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        tracing::info!(alert = text, "Alert");
        Ok(())
    }
}

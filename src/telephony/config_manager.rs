//! Storage for the configs of calls in progress.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::call::CallConfig;
use super::error::TelephonyResult;

/// Keeps a `CallConfig` from the moment a call is set up until its media
/// stream ends. Implementations must be safe to share across handlers.
#[async_trait]
pub trait ConfigManager: Send + Sync {
    async fn save_config(&self, conversation_id: &str, config: CallConfig) -> TelephonyResult<()>;

    async fn get_config(&self, conversation_id: &str) -> TelephonyResult<Option<CallConfig>>;

    async fn delete_config(&self, conversation_id: &str) -> TelephonyResult<()>;
}

/// How long a saved config waits for its media stream before it is dropped.
pub const DEFAULT_CALL_CONFIG_TTL: Duration = Duration::from_secs(10 * 60);

/// Process-local store. Configs are lost on restart.
///
/// Calls that are never answered never open a media stream, so nothing would
/// delete their config. Entries older than the TTL are treated as gone and are
/// swept on every save.
#[derive(Debug)]
pub struct InMemoryConfigManager {
    configs: DashMap<String, (CallConfig, Instant)>,
    ttl: Duration,
}

impl Default for InMemoryConfigManager {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_CALL_CONFIG_TTL)
    }
}

impl InMemoryConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            configs: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Ids of every stored conversation.
    pub fn conversation_ids(&self) -> Vec<String> {
        self.configs.iter().map(|e| e.key().clone()).collect()
    }

    /// Drop every config older than the TTL. Returns how many were removed.
    pub fn remove_expired(&self) -> usize {
        let before = self.configs.len();
        self.configs.retain(|_, (_, saved_at)| saved_at.elapsed() < self.ttl);
        let removed = before.saturating_sub(self.configs.len());
        if removed > 0 {
            debug!(removed, "Dropped call configs that never connected");
        }
        removed
    }
}

#[async_trait]
impl ConfigManager for InMemoryConfigManager {
    async fn save_config(&self, conversation_id: &str, config: CallConfig) -> TelephonyResult<()> {
        self.remove_expired();
        self.configs
            .insert(conversation_id.to_string(), (config, Instant::now()));
        Ok(())
    }

    async fn get_config(&self, conversation_id: &str) -> TelephonyResult<Option<CallConfig>> {
        Ok(self
            .configs
            .get(conversation_id)
            .filter(|e| e.value().1.elapsed() < self.ttl)
            .map(|e| e.value().0.clone()))
    }

    async fn delete_config(&self, conversation_id: &str) -> TelephonyResult<()> {
        self.configs.remove(conversation_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telephony::call::CallDirection;
    use crate::telephony::call::tests::inbound_profile;
    use crate::telephony::twilio::TwilioConfig;

    fn config(id: &str) -> CallConfig {
        let profile = inbound_profile("/inbound_call", "es-CO-GonzaloNeural");
        CallConfig {
            conversation_id: id.to_string(),
            direction: CallDirection::Inbound,
            from_phone: "+573001112233".into(),
            to_phone: "+15202239830".into(),
            twilio_sid: Some("CA1".into()),
            transcriber_config: profile.transcriber_config,
            synthesizer_config: profile.synthesizer_config,
            agent_config: profile.agent_config,
            twilio_config: TwilioConfig::new("AC1", "token"),
        }
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let manager = InMemoryConfigManager::new();
        manager.save_config("a", config("a")).await.unwrap();

        let stored = manager.get_config("a").await.unwrap().unwrap();
        assert_eq!(stored.twilio_sid.as_deref(), Some("CA1"));
        assert!(manager.get_config("b").await.unwrap().is_none());

        manager.delete_config("a").await.unwrap();
        assert!(manager.is_empty());
        // Deleting twice is fine.
        manager.delete_config("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_saves() {
        let manager = std::sync::Arc::new(InMemoryConfigManager::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("c-{i}");
                manager.save_config(&id, config(&id)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(manager.len(), 16);
    }

    #[tokio::test]
    async fn test_expired_config_is_gone_and_swept() {
        let manager = InMemoryConfigManager::with_ttl(Duration::from_millis(50));
        manager.save_config("stale", config("stale")).await.unwrap();
        assert!(manager.get_config("stale").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(manager.get_config("stale").await.unwrap().is_none());

        manager.save_config("fresh", config("fresh")).await.unwrap();
        assert_eq!(manager.conversation_ids(), vec!["fresh".to_string()]);
        assert!(manager.get_config("fresh").await.unwrap().is_some());
    }

    #[test]
    fn test_remove_expired_keeps_recent_configs() {
        let manager = InMemoryConfigManager::new();
        manager
            .configs
            .insert("new".into(), (config("new"), Instant::now()));
        let old = Instant::now()
            .checked_sub(DEFAULT_CALL_CONFIG_TTL + Duration::from_secs(1));
        if let Some(old) = old {
            manager.configs.insert("old".into(), (config("old"), old));
            assert_eq!(manager.remove_expired(), 1);
        }
        assert_eq!(manager.conversation_ids(), vec!["new".to_string()]);
    }
}

//! Per-Provider Governor Registry
//!
//! Every category of remote generation call goes through a governor; none of
//! them ride an unguarded path. Categories billed against the same upstream
//! quota share a single governor instance, so text, diagram, and video
//! generation (one upstream quota) cannot collectively exceed it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::config::GovernorConfig;
use super::governor::AdmissionGovernor;
use super::stats::GovernorStats;

/// Category of remote generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Lesson text and quiz generation
    TextGeneration,
    /// Concept diagram generation
    DiagramGeneration,
    /// Lesson video generation
    VideoGeneration,
    /// Text-to-speech narration
    AudioSynthesis,
    /// Illustration generation
    ImageGeneration,
}

impl ProviderKind {
    /// Upstream quota pool this category is billed against. Kinds sharing a
    /// pool share one governor.
    pub fn quota_pool(&self) -> &'static str {
        match self {
            ProviderKind::TextGeneration
            | ProviderKind::DiagramGeneration
            | ProviderKind::VideoGeneration => "gemini",
            ProviderKind::AudioSynthesis => "groq",
            ProviderKind::ImageGeneration => "stability",
        }
    }
}

/// Registry of governors, one per upstream quota pool.
#[derive(Debug, Clone)]
pub struct GovernorRegistry {
    governors: Arc<RwLock<HashMap<&'static str, Arc<AdmissionGovernor>>>>,
    default_config: GovernorConfig,
}

impl GovernorRegistry {
    /// Create a registry whose governors start from `default_config`.
    pub fn new(default_config: GovernorConfig) -> Self {
        Self {
            governors: Arc::new(RwLock::new(HashMap::new())),
            default_config,
        }
    }

    /// Create a registry with default limits.
    pub fn default_config() -> Self {
        Self::new(GovernorConfig::default())
    }

    /// Governor for the given call category, created on first use.
    pub async fn governor_for(&self, kind: ProviderKind) -> Arc<AdmissionGovernor> {
        let pool = kind.quota_pool();

        {
            let governors = self.governors.read().await;
            if let Some(governor) = governors.get(pool) {
                return Arc::clone(governor);
            }
        }

        let mut governors = self.governors.write().await;
        let governor = governors
            .entry(pool)
            .or_insert_with(|| Arc::new(AdmissionGovernor::new(self.default_config.clone())));
        Arc::clone(governor)
    }

    /// Replace the governor for a category's pool (admin limit override).
    pub async fn set(&self, kind: ProviderKind, config: GovernorConfig) {
        let mut governors = self.governors.write().await;
        governors.insert(
            kind.quota_pool(),
            Arc::new(AdmissionGovernor::new(config)),
        );
    }

    /// Stats snapshot per pool, for the admin dashboard.
    pub async fn snapshots(&self) -> HashMap<String, GovernorStats> {
        let governors = self.governors.read().await;
        governors
            .iter()
            .map(|(pool, governor)| (pool.to_string(), governor.snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn kinds_sharing_a_quota_share_a_governor() {
        let registry = GovernorRegistry::default_config();

        let text = registry.governor_for(ProviderKind::TextGeneration).await;
        let diagram = registry.governor_for(ProviderKind::DiagramGeneration).await;
        let video = registry.governor_for(ProviderKind::VideoGeneration).await;

        assert!(Arc::ptr_eq(&text, &diagram));
        assert!(Arc::ptr_eq(&text, &video));
    }

    #[tokio::test]
    async fn distinct_quotas_get_distinct_governors() {
        let registry = GovernorRegistry::default_config();

        let text = registry.governor_for(ProviderKind::TextGeneration).await;
        let audio = registry.governor_for(ProviderKind::AudioSynthesis).await;
        let image = registry.governor_for(ProviderKind::ImageGeneration).await;

        assert!(!Arc::ptr_eq(&text, &audio));
        assert!(!Arc::ptr_eq(&text, &image));
        assert!(!Arc::ptr_eq(&audio, &image));
    }

    #[tokio::test]
    async fn set_replaces_pool_governor() {
        let registry = GovernorRegistry::default_config();
        let before = registry.governor_for(ProviderKind::AudioSynthesis).await;

        let mut looser = GovernorConfig::default();
        looser.max_per_minute = 30;
        registry.set(ProviderKind::AudioSynthesis, looser.clone()).await;

        let after = registry.governor_for(ProviderKind::AudioSynthesis).await;
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.config().max_per_minute, 30);
    }

    #[tokio::test]
    async fn snapshots_cover_created_pools() {
        let registry = GovernorRegistry::default_config();
        registry.governor_for(ProviderKind::TextGeneration).await;
        registry.governor_for(ProviderKind::ImageGeneration).await;

        let snapshots = registry.snapshots().await;
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.contains_key("gemini"));
        assert!(snapshots.contains_key("stability"));
    }
}

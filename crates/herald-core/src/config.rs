use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{HeraldError, Result};
use crate::registry::EndpointRegistry;
use crate::types::{CampaignKind, Endpoint, EndpointKind};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_CLIENT_HEADER: &str = "Community-Client";
pub const DEFAULT_CLIENT_IDENTITY: &str = "LivreMagique-Agent";
/// Rejected response bodies are cut to this many characters in outcomes.
pub const DEFAULT_MAX_DETAIL_CHARS: usize = 100;

/// Top-level config (herald.toml + HERALD_* env overrides).
///
/// Built once at startup and handed to the orchestrator; nothing reads
/// configuration from globals after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default = "default_broadcast_registry")]
    pub broadcast: RegistryConfig,
    #[serde(default = "default_lead_registry")]
    pub leads: RegistryConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            history: HistoryConfig::default(),
            broadcast: default_broadcast_registry(),
            leads: default_lead_registry(),
            context: ContextConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-attempt hard timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on concurrent attempts within one campaign.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_client_header")]
    pub client_header: String,
    #[serde(default = "default_client_identity")]
    pub client_identity: String,
    /// Bearer credential sent to endpoints with `auth_required = true`.
    pub auth_token: Option<String>,
    #[serde(default = "default_max_detail_chars")]
    pub max_detail_chars: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            client_header: default_client_header(),
            client_identity: default_client_identity(),
            auth_token: None,
            max_detail_chars: DEFAULT_MAX_DETAIL_CHARS,
        }
    }
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// History file for progress broadcasts and invitations.
    #[serde(default = "default_history_path")]
    pub path: String,
    /// History file for lead-generation campaigns.
    #[serde(default = "default_lead_history_path")]
    pub lead_path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            lead_path: default_lead_history_path(),
        }
    }
}

impl HistoryConfig {
    pub fn path_for(&self, kind: CampaignKind) -> &str {
        match kind {
            CampaignKind::Progress | CampaignKind::Invitation => &self.path,
            CampaignKind::Lead => &self.lead_path,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Fixed contextual metadata attached to every outbound record of a kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignContext {
    /// Free-text context tag (e.g. the market or audience).
    pub context: String,
    pub call_to_action: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Originating system label; lead records carry it as `lead_source`.
    pub source: Option<String>,
    /// Contact copy; only lead records carry it.
    pub templates: Option<ContactTemplates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactTemplates {
    pub email: String,
    pub message: String,
    pub follow_up: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_progress_context")]
    pub progress: CampaignContext,
    #[serde(default = "default_invitation_context")]
    pub invitation: CampaignContext,
    #[serde(default = "default_lead_context")]
    pub lead: CampaignContext,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            progress: default_progress_context(),
            invitation: default_invitation_context(),
            lead: default_lead_context(),
        }
    }
}

impl ContextConfig {
    pub fn for_kind(&self, kind: CampaignKind) -> &CampaignContext {
        match kind {
            CampaignKind::Progress => &self.progress,
            CampaignKind::Invitation => &self.invitation,
            CampaignKind::Lead => &self.lead,
        }
    }
}

impl HeraldConfig {
    /// Load config from a TOML file with HERALD_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.herald/herald.toml
    ///
    /// A missing file is not an error; built-in defaults apply. Nested keys
    /// in env vars use a double underscore: `HERALD_DISPATCH__TIMEOUT_SECS=5`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::extract(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed("HERALD_").split("__")),
        )
    }

    /// Parse config from an in-memory TOML document (no env overrides).
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::extract(Figment::new().merge(Toml::string(toml)))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| HeraldError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.dispatch.timeout_secs == 0 {
            return Err(HeraldError::Config(
                "dispatch.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Registry used by progress broadcasts and collaboration invitations.
    pub fn broadcast_registry(&self) -> Result<EndpointRegistry> {
        EndpointRegistry::new("broadcast", self.broadcast.endpoints.clone())
    }

    pub fn lead_registry(&self) -> Result<EndpointRegistry> {
        EndpointRegistry::new("leads", self.leads.endpoints.clone())
    }

    pub fn registry_for(&self, kind: CampaignKind) -> Result<EndpointRegistry> {
        match kind {
            CampaignKind::Progress | CampaignKind::Invitation => self.broadcast_registry(),
            CampaignKind::Lead => self.lead_registry(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}
fn default_client_header() -> String {
    DEFAULT_CLIENT_HEADER.to_string()
}
fn default_client_identity() -> String {
    DEFAULT_CLIENT_IDENTITY.to_string()
}
fn default_max_detail_chars() -> usize {
    DEFAULT_MAX_DETAIL_CHARS
}

fn herald_home() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.herald", home)
}
fn default_config_path() -> String {
    format!("{}/herald.toml", herald_home())
}
fn default_history_path() -> String {
    format!("{}/broadcasts.json", herald_home())
}
fn default_lead_history_path() -> String {
    format!("{}/leads.json", herald_home())
}

fn default_broadcast_registry() -> RegistryConfig {
    RegistryConfig {
        endpoints: vec![
            Endpoint::new(
                "OpenClaw Main Community",
                "https://community.openclaw.ai/api/broadcast",
                EndpointKind::Main,
                true,
            ),
            Endpoint::new(
                "French Community Chat",
                "https://fr.openclaw.community/api/messages",
                EndpointKind::Regional,
                true,
            ),
            Endpoint::new(
                "Moltbook Community",
                "https://moltbook.openclaw.com/api/posts",
                EndpointKind::Social,
                true,
            ),
            Endpoint::new(
                "Community Discord",
                "https://discord.com/api/webhooks/openclaw-community",
                EndpointKind::Webhook,
                true,
            ),
        ],
    }
}

fn default_lead_registry() -> RegistryConfig {
    RegistryConfig {
        endpoints: vec![
            Endpoint::new(
                "OpenClaw French Community",
                "https://community.openclaw.ai/api/leads",
                EndpointKind::Regional,
                true,
            ),
            Endpoint::new(
                "Moltbook French Parents",
                "https://moltbook.openclaw.com/api/leads/french",
                EndpointKind::Social,
                true,
            ),
            Endpoint::new(
                "French Community Discord",
                "https://discord.com/api/webhooks/french-parents",
                EndpointKind::Webhook,
                true,
            ),
            Endpoint::new(
                "OpenClaw Main Community",
                "https://openclaw.ai/api/leads",
                EndpointKind::Main,
                true,
            ),
        ],
    }
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

fn default_progress_context() -> CampaignContext {
    CampaignContext {
        context: "Livre Magique France Market Entry".into(),
        call_to_action: "Want to collaborate? Join us!".into(),
        tags: tags(&["#Collaboration", "#OpenClaw", "#France", "#PersonalizedStories"]),
        source: None,
        templates: None,
    }
}

fn default_invitation_context() -> CampaignContext {
    CampaignContext {
        context: "Livre Magique Personal Books".into(),
        call_to_action: "Accept invitation and join collaborative project".into(),
        tags: tags(&["#CollaborationInvitation", "#OpenClaw", "#PersonalBooks"]),
        source: None,
        templates: None,
    }
}

fn default_lead_context() -> CampaignContext {
    CampaignContext {
        context: "French parents interested in personalized children's books".into(),
        call_to_action: "Create your personalized children's story now!".into(),
        tags: tags(&["#LeadGeneration", "#OpenClaw", "#FrenchParents", "#PersonalizedBooks"]),
        source: Some("Livre Magique Lead Generation".into()),
        templates: Some(ContactTemplates {
            email: "Bonjour parent français !\n\n\
                    Transformez les moments précieux de votre famille en une histoire \
                    de livre personnalisée magique !\n\n\
                    Créez maintenant votre histoire → [LIEN]\n\n\
                    Cordialement,\nÉquipe Livre Magique"
                .into(),
            message: "Nous avons le plaisir de vous offrir\n\n[OFFRE]".into(),
            follow_up: "Rappel: Nous pensions que ceci pourrait vous intéresser\n\n[RAPPEL]"
                .into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_registries() {
        let config = HeraldConfig::from_toml_str("").unwrap();
        assert_eq!(config.dispatch.timeout(), Duration::from_secs(30));
        assert_eq!(config.dispatch.max_concurrency, 4);
        assert_eq!(config.broadcast_registry().unwrap().len(), 4);
        assert_eq!(config.lead_registry().unwrap().len(), 4);
        assert!(config.context.lead.templates.is_some());
    }

    #[test]
    fn toml_overrides_dispatch_and_endpoints() {
        let config = HeraldConfig::from_toml_str(
            r#"
            [dispatch]
            timeout_secs = 5
            auth_token = "secret"

            [[broadcast.endpoints]]
            name = "local"
            url = "http://127.0.0.1:9000/hook"
            kind = "webhook"
            "#,
        )
        .unwrap();
        assert_eq!(config.dispatch.timeout_secs, 5);
        assert_eq!(config.dispatch.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.dispatch.client_identity, DEFAULT_CLIENT_IDENTITY);

        let registry = config.broadcast_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!registry.endpoints()[0].auth_required);
        // Lead registry keeps its defaults when only broadcast is overridden.
        assert_eq!(config.lead_registry().unwrap().len(), 4);
    }

    #[test]
    fn explicitly_empty_registry_fails_at_build() {
        let config = HeraldConfig::from_toml_str("[leads]\nendpoints = []\n").unwrap();
        assert!(config.broadcast_registry().is_ok());
        let err = config.registry_for(CampaignKind::Lead).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = HeraldConfig::from_toml_str("[dispatch]\ntimeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, HeraldError::Config(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = HeraldConfig::from_toml_str("[dispatch]\ntimeout_secs = 0").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("timeout_secs"));
    }

    // Only test in this crate that touches HERALD_* env vars.
    #[test]
    fn env_overrides_win_over_defaults() {
        std::env::set_var("HERALD_DISPATCH__TIMEOUT_SECS", "7");
        std::env::set_var("HERALD_DISPATCH__AUTH_TOKEN", "tok");
        let loaded = HeraldConfig::load(Some("/nonexistent/herald.toml"));
        std::env::remove_var("HERALD_DISPATCH__TIMEOUT_SECS");
        std::env::remove_var("HERALD_DISPATCH__AUTH_TOKEN");

        let config = loaded.unwrap();
        assert_eq!(config.dispatch.timeout(), Duration::from_secs(7));
        assert_eq!(config.dispatch.auth_token.as_deref(), Some("tok"));
        assert_eq!(config.dispatch.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(config.dispatch.client_header, DEFAULT_CLIENT_HEADER);
        assert_eq!(config.broadcast_registry().unwrap().len(), 4);
    }

    #[test]
    fn history_paths_split_by_kind() {
        let config = HeraldConfig::from_toml_str(
            "[history]\npath = \"/data/b.json\"\nlead_path = \"/data/l.json\"",
        )
        .unwrap();
        assert_eq!(config.history.path_for(CampaignKind::Invitation), "/data/b.json");
        assert_eq!(config.history.path_for(CampaignKind::Lead), "/data/l.json");
    }
}

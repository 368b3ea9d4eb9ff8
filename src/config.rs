use serde::{Deserialize, Serialize};

use crate::trust::TrustEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub audit: AuditConfig,
    pub trusted_domains: Vec<TrustEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// JSON artifact exported by the offline training step
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub path: String,
}

impl ServerConfig {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
            },
            model: ModelConfig {
                path: "model/scorer.json".to_string(),
            },
            audit: AuditConfig {
                path: "scan_logs.csv".to_string(),
            },
            trusted_domains: vec![
                trust_entry("google.com", &["no-reply@google.com", "security@google.com"]),
                trust_entry("apple.com", &["no-reply@apple.com", "id@apple.com"]),
                trust_entry("linkedin.com", &["@linkedin.com"]),
                trust_entry("github.com", &["noreply@github.com"]),
                trust_entry("amazon.com", &["no-reply@amazon.com"]),
                trust_entry(
                    "microsoft.com",
                    &["account-security-noreply@account.microsoft.com"],
                ),
                trust_entry("supabase.com", &["team@supabase.com"]),
                trust_entry("indeed.com", &["@indeed.com"]),
                trust_entry("openai.com", &["@openai.com"]),
            ],
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn trust_entry(domain: &str, senders: &[&str]) -> TrustEntry {
    TrustEntry {
        domain: domain.to_string(),
        allowed_senders: senders.iter().map(|s| s.to_string()).collect(),
    }
}

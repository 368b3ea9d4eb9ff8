use mailwatch::audit::MemoryAuditLog;
use mailwatch::engine::{DecisionEngine, EmailSubmission};
use mailwatch::scorer::{ScorerArtifact, TfidfScorer};
use mailwatch::trust::TrustRegistry;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Running two submissions through the decision engine...");
    println!();

    // Tiny inline model so the demo runs without a trained artifact
    let artifact_json = r#"{
        "vocabulary": {
            "prize": 0, "claim": 1, "urgent": 2, "claim your": 3,
            "sign": 4, "security": 5
        },
        "idf": [2.1, 1.9, 2.4, 3.0, 1.2, 1.4],
        "coef": [2.2, 1.8, 2.5, 3.1, -0.4, -0.6],
        "intercept": -1.0
    }"#;
    let artifact: ScorerArtifact = serde_json::from_str(artifact_json)?;
    let scorer = TfidfScorer::from_artifact(artifact)?;

    let registry = TrustRegistry::new(mailwatch::Config::default().trusted_domains);
    let audit = Arc::new(MemoryAuditLog::new());
    let engine = DecisionEngine::new(registry, Some(Arc::new(scorer)), audit.clone());

    let scam = EmailSubmission {
        sender: "winner@lucky-draw.example".to_string(),
        subject: "URGENT: claim your prize".to_string(),
        body: "Claim your prize now, urgent".to_string(),
    };
    let result = engine.scan(&scam)?;
    println!("Scam-looking submission from {}:", scam.sender);
    println!("{}", serde_json::to_string_pretty(&result)?);
    println!();

    let trusted = EmailSubmission {
        sender: "no-reply@accounts.google.com".to_string(),
        subject: "URGENT: claim your prize".to_string(),
        body: "Claim your prize now, urgent".to_string(),
    };
    let result = engine.scan(&trusted)?;
    println!("Same text from trusted sender {}:", trusted.sender);
    println!("{}", serde_json::to_string_pretty(&result)?);
    println!();

    println!("Audit trail rows written: {}", audit.len());

    Ok(())
}

use anyhow::Context;
use chrono::Local;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crpt_api::config::Config;
use crpt_api::{Description, DocType, Document, DocumentSubmitter, Product};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load Config
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    info!(
        "Starting document submitter: {} requests per {:?}",
        config.request_limit,
        config.period()
    );

    let submitter = DocumentSubmitter::from_config(&config)?;

    let document = demo_document("7700000000");
    submitter.create_document(&document).await?;
    info!("Document {} queued for dispatch", document.doc_id);

    // Keep the refill timer alive until interrupted
    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("Shutting down...");
    submitter.shutdown().await?;

    Ok(())
}

fn demo_document(inn: &str) -> Document {
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

    Document {
        description: Description {
            participant_inn: inn.to_string(),
        },
        doc_id: Uuid::new_v4().to_string(),
        doc_status: "NEW".to_string(),
        doc_type: DocType::LpIntroduceGoods,
        import_request: false,
        owner_inn: inn.to_string(),
        participant_inn: inn.to_string(),
        producer_inn: inn.to_string(),
        production_date: today.clone(),
        production_type: "OWN_PRODUCTION".to_string(),
        products: vec![Product {
            certificate_document: "CONFORMITY_CERTIFICATE".to_string(),
            certificate_document_date: today.clone(),
            certificate_document_number: "0".to_string(),
            owner_inn: inn.to_string(),
            producer_inn: inn.to_string(),
            production_date: today.clone(),
            tnved_code: "6401100000".to_string(),
            uit_code: String::new(),
            uitu_code: String::new(),
            reg_date: today,
            reg_number: String::new(),
        }],
    }
}

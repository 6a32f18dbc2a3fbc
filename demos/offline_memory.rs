// demos/offline_memory.rs
// Run with: cargo run --example offline_memory
//
// Exercises every operation against the in-memory backend — no server
// needed. Useful as a quick tour of the API surface.

use std::sync::Arc;
use std::time::Duration;

use rusty_ftp::{
    CancelSignal, FilterCriteria, FtpClient, FtpClientConfig, MemoryDialer, MemoryFs,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    // Seed a fake remote file store.
    let fs = MemoryFs::new();
    fs.insert_dir("in");
    fs.insert_file("in/report.json", br#"{"status":"new"}"#);
    fs.insert_file("in/notes.txt", b"plain text");

    let config = FtpClientConfig::new("memory:21", "demo", "demo").with_io_size(4);
    let client = FtpClient::with_dialer(config, Arc::new(MemoryDialer::new(fs.clone())));
    let signal = CancelSignal::new();

    // Filtered listing: only .json files.
    let criteria = FilterCriteria::new(vec!["json".into()], "");
    println!("📂 JSON files under in/:");
    for entry in client.ls(&signal, "in", &criteria).await {
        println!("  - {} ({} bytes)", entry.name, entry.size);
    }

    // Existence checks cost a filtered listing each.
    println!("exists(in/report.json) = {}", client.exists(&signal, "in/report.json").await?);
    println!("exists(in/absent.json) = {}", client.exists(&signal, "in/absent.json").await?);

    // Download into a temp file, then push it back under a new folder.
    let dir = tempfile::tempdir()?;
    let local = dir.path().join("report.json");
    let copied = client
        .get(&signal, "in/report.json", local.to_str().unwrap())
        .await?;
    println!("⬇️  Downloaded {copied} bytes");

    client.ensure_folder(&signal, "out/processed").await?;
    client
        .put(&signal, local.to_str().unwrap(), "out/processed/report.json")
        .await?;
    println!("⬆️  Uploaded to out/processed/report.json");

    // A deadline-bound signal: this one has already expired, so the
    // operation aborts before dialing.
    let expired = CancelSignal::with_timeout(Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(5)).await;
    match client.get(&expired, "in/report.json", local.to_str().unwrap()).await {
        Err(err) => println!("⏱️  Expired signal: {err}"),
        Ok(_) => unreachable!(),
    }

    // Every operation dialed its own connection and released it.
    println!("dials={} quits={}", fs.dials(), fs.quits());

    Ok(())
}

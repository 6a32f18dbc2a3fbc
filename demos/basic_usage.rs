// demos/basic_usage.rs
// Run with: cargo run --example basic_usage
//
// Walks through the client API against a real FTP server. Adjust the
// configuration below (or load it from a file) before running.

use std::time::Duration;

use rusty_ftp::{CancelSignal, FilterCriteria, FtpClient, FtpClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    // 1. Configure the client; the timeout bounds the dial of every
    //    per-operation connection. A config can equally come from JSON:
    //    serde_json::from_str::<FtpClientConfig>(&std::fs::read_to_string("ftp.json")?)?
    let config = FtpClientConfig::new("ftp.example.com:21", "your_username", "your_password")
        .with_timeout(Duration::from_secs(10));
    let client = FtpClient::new(config);

    // 2. Wire ctrl-c to the cancellation signal so a long transfer can be
    //    aborted from the terminal.
    let signal = CancelSignal::new();
    let ctrlc = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("received ctrl-c, cancelling");
            ctrlc.cancel();
        }
    });

    // 3. List JSON files in the inbox
    println!("📂 Listing in/ ...");
    let criteria = FilterCriteria::new(vec!["json".into()], "");
    for entry in client.ls(&signal, "in", &criteria).await {
        println!("  - {} ({} bytes)", entry.name, entry.size);
    }

    // 4. Download one of them
    println!("⬇️  Downloading in/report.json ...");
    let copied = client
        .get(&signal, "in/report.json", "/tmp/report.json")
        .await?;
    println!("✅ Downloaded {copied} bytes");

    // 5. Upload a processed copy, creating the destination folder first
    //    (put does not create parent directories on its own)
    println!("⬆️  Uploading /tmp/report.json ...");
    client.ensure_folder(&signal, "out/processed").await?;
    let copied = client
        .put(&signal, "/tmp/report.json", "out/processed/report.json")
        .await?;
    println!("✅ Uploaded {copied} bytes");

    // 6. Mark the original as done
    client
        .rename(&signal, "in/report.json", "done/report.json")
        .await?;
    println!("✅ Moved to done/");

    Ok(())
}

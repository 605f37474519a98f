use anyhow::Result;
use clap::{Parser, Subcommand};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/app.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CheckEmail {
        email: String,
    },
    InsertRecord {
        name: String,
        description: String,
    },
    ListRecords,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CheckEmail { email } => {
            let exists = storage.email_exists(&email).await?;
            println!("email={} registered={exists}", email.trim());
        }
        Command::InsertRecord { name, description } => {
            let record = storage.insert_record(&name, &description).await?;
            println!("created record_id={}", record.id.0);
        }
        Command::ListRecords => {
            for record in storage.list_records().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.id.0,
                    record.created_at.to_rfc3339(),
                    record.name,
                    record.description
                );
            }
        }
    }

    storage.close().await;
    Ok(())
}

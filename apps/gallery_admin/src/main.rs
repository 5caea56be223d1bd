use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use curation::{AdminPrincipal, CurationController, CurationOptions, GalleryStore};
use media::{LocalMediaStore, MediaStore};
use server_api::{mint_admin_token, IdentityConfig};
use shared::domain::{GalleryItem, ItemId, ServiceHeader};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gallery_admin", about = "Curate the portfolio gallery")]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/gallery.db")]
    database_url: String,
    #[arg(long, default_value = "./data/media")]
    media_root: PathBuf,
    #[arg(long, default_value = "http://127.0.0.1:8443/media")]
    media_public_url: String,
    /// Recorded as the acting admin in logs.
    #[arg(long, default_value = "gallery_admin")]
    admin: String,
    /// Keep media files that no row references any more.
    #[arg(long)]
    keep_media: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the service headers in display order.
    Headers,
    List {
        #[arg(long)]
        header: Option<ServiceHeader>,
    },
    Create {
        #[arg(long)]
        header: ServiceHeader,
        #[arg(long)]
        description: String,
        /// Position in IMAGES of the main image; defaults to the first.
        #[arg(long)]
        main: Option<usize>,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Without IMAGES the main image is kept and secondary images are cleared.
    Edit {
        item_id: i64,
        #[arg(long)]
        header: Option<ServiceHeader>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        main: Option<usize>,
        images: Vec<PathBuf>,
    },
    Delete {
        item_id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    MintToken {
        #[arg(long)]
        subject: String,
        #[arg(long, env = "APP__ADMIN_TOKEN_SECRET", default_value = "devsecret")]
        secret: String,
        #[arg(long, env = "APP__ADMIN_TOKEN_ISSUER", default_value = "gallery")]
        issuer: String,
        #[arg(long, default_value_t = 12 * 3600)]
        ttl_seconds: i64,
    },
}

type Controller = CurationController<Storage, Arc<dyn MediaStore>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Headers => {
            for header in ServiceHeader::ALL {
                println!("{header}");
            }
            return Ok(());
        }
        Command::MintToken {
            ref subject,
            ref secret,
            ref issuer,
            ttl_seconds,
        } => {
            let token = mint_admin_token(
                &IdentityConfig {
                    secret: secret.clone(),
                    issuer: issuer.clone(),
                    ttl_seconds,
                },
                subject,
            )?;
            println!("{token}");
            return Ok(());
        }
        _ => {}
    }

    let mut controller = open_controller(&cli).await?;
    match cli.command {
        Command::List { header } => {
            let items = controller.store().list_items(header).await?;
            for item in &items {
                print_item(item);
            }
        }
        Command::Create {
            header,
            description,
            main,
            images,
        } => {
            controller.begin_new()?;
            controller.set_header(header)?;
            controller.set_description(description)?;
            stage_files(&mut controller, &images, main).await?;
            let item = controller.submit().await?;
            print_item(&item);
        }
        Command::Edit {
            item_id,
            header,
            description,
            main,
            images,
        } => {
            let item_id = ItemId(item_id);
            let existing = controller
                .store()
                .get_item(item_id)
                .await?
                .with_context(|| format!("gallery item {item_id} not found"))?;
            controller.begin_edit(&existing)?;
            if let Some(header) = header {
                controller.set_header(header)?;
            }
            if let Some(description) = description {
                controller.set_description(description)?;
            }
            stage_files(&mut controller, &images, main).await?;
            let item = controller.submit().await?;
            print_item(&item);
        }
        Command::Delete { item_id, yes } => {
            let item_id = ItemId(item_id);
            controller.request_delete(item_id)?;
            let prompt = format!("Delete gallery item {item_id} and its images? [y/N] ");
            if !yes && !ask(&prompt)? {
                controller.cancel()?;
                println!("cancelled");
                return Ok(());
            }
            let removed = controller.confirm_delete().await?;
            println!("deleted item_id={}", removed.id);
        }
        Command::Headers | Command::MintToken { .. } => {}
    }

    Ok(())
}

async fn open_controller(cli: &Cli) -> Result<Controller> {
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open database '{}'", cli.database_url))?;
    let media = LocalMediaStore::new(&cli.media_root, &cli.media_public_url)
        .with_context(|| format!("invalid media public url '{}'", cli.media_public_url))?;
    info!(database_url = %cli.database_url, media_root = %cli.media_root.display(), "gallery admin ready");

    let media: Arc<dyn MediaStore> = Arc::new(media);
    Ok(CurationController::with_options(
        storage,
        media,
        AdminPrincipal::new(cli.admin.clone()),
        CurationOptions {
            cleanup_media: !cli.keep_media,
        },
    ))
}

async fn stage_files(
    controller: &mut Controller,
    paths: &[PathBuf],
    main: Option<usize>,
) -> Result<()> {
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        controller.stage_image(file_name(path)?, bytes)?;
    }
    if let Some(index) = main {
        if index >= paths.len() {
            bail!("--main {index} is out of range for {} images", paths.len());
        }
        controller.toggle_main(index)?;
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("'{}' has no usable file name", path.display()))
}

fn ask(prompt: &str) -> Result<bool> {
    let mut stdout = io::stdout();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_item(item: &GalleryItem) {
    println!(
        "item_id={} header=\"{}\" images={} created_at={}",
        item.id,
        item.header,
        item.sequence_len(),
        item.created_at.to_rfc3339()
    );
    println!("  description: {}", item.description);
    for url in item.image_sequence() {
        println!("  {url}");
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

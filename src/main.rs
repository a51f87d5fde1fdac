use tracing::info;

use cove::db::ActivityRepository;
use cove::{Actor, Config, FileStorage, LibraryService, TreeBuilder, TreeOptions};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = cove::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        cove::logging::init_console_only(&config.logging.level);
    }

    info!("cove - private file library");
    info!("Database at {}", config.database.path);
    info!("Blob storage at {}", config.storage.root);

    let db = match cove::Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    match db.schema_version().await {
        Ok(version) => info!("Schema version {version}"),
        Err(e) => {
            eprintln!("Failed to read schema version: {e}");
            std::process::exit(1);
        }
    }

    let mut reserved_folder_id = config.library.reserved_folder_id;
    if !config.library.reserved_folder_name.is_empty() {
        let service = LibraryService::new(db.pool(), FileStorage::new(&config.storage.root));
        match service
            .ensure_root_folder(&Actor::admin(0), &config.library.reserved_folder_name)
            .await
        {
            Ok(folder) => {
                info!("Reserved folder \"{}\" is folder {}", folder.name, folder.id);
                reserved_folder_id = folder.id;
            }
            Err(e) => {
                eprintln!("Failed to ensure reserved folder: {e}");
                std::process::exit(1);
            }
        }
    }

    let options = TreeOptions { reserved_folder_id };
    match TreeBuilder::new(db.pool(), options)
        .visible_tree(&Actor::admin(0))
        .await
    {
        Ok(forest) => {
            let total: usize = forest.iter().map(|n| n.len()).sum();
            info!("{total} folders in the library tree");
        }
        Err(e) => {
            eprintln!("Failed to build folder tree: {e}");
            std::process::exit(1);
        }
    }

    match ActivityRepository::new(db.pool()).recent(5).await {
        Ok(entries) => {
            info!("{} recent activity entries", entries.len());
            for entry in entries {
                info!(
                    "  [{}] user {} {} {} {}",
                    entry.created_at, entry.actor_user_id, entry.action, entry.entity_type, entry.entity_id
                );
            }
        }
        Err(e) => {
            eprintln!("Failed to read activity log: {e}");
            std::process::exit(1);
        }
    }
}

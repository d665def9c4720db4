use notedex::chunk::{ChunkConfig, ChunkStrategy};
use notedex::cli::{Cli, Commands, ConfigAction};
use notedex::config::{Config, ConfigValidator};
use notedex::engine::Engine;
use notedex::error::{NotedexError, Result};
use notedex::ingest::IngestRequest;
use notedex::store::{CollectionKind, DocumentSet};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Ingest {
            file,
            name,
            images_file,
            strategy,
        } => {
            cmd_ingest(cli.config, &file, name, images_file, strategy)?;
        }
        Commands::Query {
            query,
            documents,
            k,
            min_score,
            images,
            json,
        } => {
            cmd_query(cli.config, &query, documents, k, min_score, images, json)?;
        }
        Commands::List => {
            cmd_list(cli.config)?;
        }
        Commands::Delete { ids } => {
            cmd_delete(cli.config, ids)?;
        }
        Commands::Stats => {
            cmd_stats(cli.config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "notedex=debug" } else { "notedex=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

/// Load the config file, falling back to defaults when none exists yet
fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if path.exists() {
        Config::load(&path)
    } else {
        tracing::debug!("No config file at {:?}, using defaults", path);
        Ok(Config::default())
    }
}

fn cmd_ingest(
    config_path: Option<PathBuf>,
    file: &Path,
    name: Option<String>,
    images_file: Option<PathBuf>,
    strategy: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;

    let text = std::fs::read_to_string(file).map_err(|e| NotedexError::Io {
        source: e,
        context: format!("Failed to read document text: {}", file.display()),
    })?;

    let image_descriptions = match images_file {
        Some(path) => {
            let content = std::fs::read_to_string(&path).map_err(|e| NotedexError::Io {
                source: e,
                context: format!("Failed to read image descriptions: {}", path.display()),
            })?;
            content.lines().map(str::to_string).collect()
        }
        None => Vec::new(),
    };

    let document_name = name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string())
    });

    let chunk_config = strategy.map(|s| ChunkConfig {
        strategy: match s.as_str() {
            "paragraph" => ChunkStrategy::Paragraph,
            _ => ChunkStrategy::FixedWindow,
        },
        ..config.chunking.clone()
    });

    let engine = Engine::open(config)?;
    let report = engine.ingest(&IngestRequest {
        document_id: None,
        document_name: document_name.clone(),
        text,
        image_descriptions,
        chunk_config,
    })?;

    println!("✓ Ingested '{}'", document_name);
    println!("  Document id: {}", report.document_id);
    println!("  Text chunks: {}", report.text_chunks);
    println!("  Image descriptions: {}", report.images);

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_query(
    config_path: Option<PathBuf>,
    query: &str,
    documents: Vec<String>,
    k: Option<usize>,
    min_score: Option<f32>,
    images: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::open(config)?;

    let kind = if images {
        CollectionKind::Image
    } else {
        CollectionKind::Text
    };

    let allowed: DocumentSet = documents.into_iter().collect();
    let mut retrieval_query = engine.default_query(kind, query, allowed);
    if let Some(k) = k {
        retrieval_query.k = k;
    }
    if let Some(floor) = min_score {
        retrieval_query.min_score = Some(floor);
    }

    let results = engine.retrieve(kind, &retrieval_query)?;
    let (sufficiency, mean_score) = engine.sufficiency(&results);

    if json {
        let payload = serde_json::json!({
            "query": query,
            "collection": kind.collection_name(),
            "sufficiency": sufficiency,
            "mean_score": mean_score,
            "results": results,
        });
        let rendered =
            serde_json::to_string_pretty(&payload).map_err(|e| NotedexError::Json {
                source: e,
                context: "Failed to render query results".to_string(),
            })?;
        println!("{}", rendered);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!(
        "{} results (sufficiency: {:?}, mean score {:.3}):\n",
        results.len(),
        sufficiency,
        mean_score
    );
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} (chunk {} of '{}')",
            i + 1,
            result.score,
            result.document_id,
            result.sequence_index,
            result.document_name
        );
        println!("   {}\n", result.text.replace('\n', "\n   "));
    }

    Ok(())
}

fn cmd_list(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::open(config)?;

    let documents = engine.list_documents()?;
    if documents.is_empty() {
        println!("No documents ingested.");
        return Ok(());
    }

    println!("{} documents:", documents.len());
    for doc in documents {
        println!("  {}  {}", doc.document_id, doc.document_name);
    }

    Ok(())
}

fn cmd_delete(config_path: Option<PathBuf>, ids: Vec<String>) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::open(config)?;

    let targets: DocumentSet = ids.into_iter().collect();
    let report = engine.delete(&targets)?;

    println!(
        "✓ Removed {} documents ({} text chunks, {} image descriptions)",
        report.documents, report.text_entries, report.image_entries
    );

    Ok(())
}

fn cmd_stats(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::open(config)?;

    let stats = engine.stats()?;
    println!("Documents:          {}", stats.documents);
    println!("Text chunks:        {}", stats.text_entries);
    println!("Image descriptions: {}", stats.image_entries);

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    let path = match &config_path {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                println!("Config already exists at {:?} (use --force to overwrite)", path);
                return Ok(());
            }
            Config::default().save(&path)?;
            println!("✓ Wrote default config to {:?}", path);
        }
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Validate => {
            let config = Config::load(&path)?;
            ConfigValidator::validate(&config)?;
            println!("✓ Configuration is valid");
        }
    }

    Ok(())
}

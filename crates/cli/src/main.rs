use api_shared::auth::current_user;
use api_shared::SearchQuery;
use ayush_core::ayush_types::{CurrentUser, MappingRecord, SourceKind, Term, TerminologySystem};
use ayush_core::config::{
    debounce_from_env_value, max_pages_from_env_value, timeout_from_env_value,
};
use ayush_core::constants::DEFAULT_DOCUMENT_DIR;
use ayush_core::search::SourcePage;
use ayush_core::{
    ClientConfig, CsvUploader, DashboardReader, DetailAggregator, FileDocumentStore,
    HttpTerminologyClient, SearchOrchestrator, SharedApi, SlotSource, SuggestionFetcher,
    UploadGate,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ayush")]
#[command(about = "AYUSH terminology client CLI")]
struct Cli {
    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Identity forwarded to the upload gate.
#[derive(Args, Debug, Clone, Default)]
struct IdentityArgs {
    /// User id
    #[arg(long, default_value = "cli")]
    user_id: String,
    /// Display name
    #[arg(long)]
    user_name: Option<String>,
    /// Email address
    #[arg(long)]
    user_email: Option<String>,
}

impl IdentityArgs {
    fn user(&self) -> Option<CurrentUser> {
        current_user(
            Some(&self.user_id),
            self.user_name.as_deref(),
            self.user_email.as_deref(),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search every source for a term
    Search {
        /// Free-text query
        query: String,
        /// System filter carried with the request
        #[arg(long)]
        system: Option<String>,
        /// Minimum confidence between 0 and 1
        #[arg(long)]
        threshold: Option<f64>,
        /// Disable fuzzy matching
        #[arg(long)]
        exact: bool,
        /// Enable full-text search
        #[arg(long)]
        full_text: bool,
    },
    /// Show one display page of one source
    Page {
        /// combined, icd11, ayurveda, siddha or unani
        source: String,
        /// Free-text query
        query: String,
        /// 1-based display page
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Suggestions for partial input
    Suggest {
        input: String,
    },
    /// Per-system autocomplete labels
    Autocomplete {
        system: String,
        input: String,
    },
    /// Cross-system detail view of a term
    Detail {
        name: String,
        /// Wait for background paging to finish
        #[arg(long)]
        complete: bool,
    },
    /// Look up a single term by code
    Lookup {
        system: String,
        code: String,
    },
    /// Show the stored mapping for an ICD-11 code
    Mapping {
        code: String,
    },
    /// Mapping statistics
    Stats,
    /// Doctor dashboard
    Dashboard {
        /// Doctor uid
        uid: String,
        /// Directory holding users/ and patients/ documents
        #[arg(long)]
        documents: Option<PathBuf>,
    },
    /// Check whether an identity may upload CSV files
    CanUpload {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Upload a CSV file of terms for one system
    Upload {
        system: String,
        file: PathBuf,
        /// Rebuild full-text search vectors after import
        #[arg(long)]
        update_search_vector: bool,
        #[command(flatten)]
        identity: IdentityArgs,
    },
}

fn client_config() -> Result<ClientConfig, Box<dyn Error>> {
    let cfg = match std::env::var("AYUSH_API_BASE_URL") {
        Ok(url) => ClientConfig::new(&url)?,
        Err(_) => ClientConfig::default(),
    };
    Ok(cfg
        .with_suggest_debounce(debounce_from_env_value(
            std::env::var("AYUSH_SUGGEST_DEBOUNCE_MS").ok(),
        )?)
        .with_detail_max_pages(max_pages_from_env_value(
            std::env::var("AYUSH_DETAIL_MAX_PAGES").ok(),
        )?)
        .with_request_timeout(timeout_from_env_value(
            std::env::var("AYUSH_REQUEST_TIMEOUT_SECS").ok(),
        )?))
}

fn mapped_marker(source: Option<SlotSource>) -> &'static str {
    match source {
        Some(SlotSource::Mapped) => " (mapped)",
        _ => "",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn term_line(term: &Term) -> String {
    match term.score {
        Some(score) => format!("{:<12} {} ({:.2})", term.code, term.display_name(), score),
        None => format!("{:<12} {}", term.code, term.display_name()),
    }
}

fn mapping_line(record: &MappingRecord) -> String {
    let slot = |system: TerminologySystem| {
        record
            .slot(system)
            .map(|m| format!("{}={}", system.slug(), m.code))
            .unwrap_or_else(|| format!("{}=-", system.slug()))
    };
    format!(
        "{:<12} {:<32} {} {} {} confidence={:.2}",
        record.source_term.code,
        record.source_term.display_name(),
        slot(TerminologySystem::Ayurveda),
        slot(TerminologySystem::Siddha),
        slot(TerminologySystem::Unani),
        record.confidence_score
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ayush_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'ayush --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(client_config()?);
    let api: SharedApi = Arc::new(HttpTerminologyClient::new(&cfg)?);

    match command {
        Commands::Search {
            query,
            system,
            threshold,
            exact,
            full_text,
        } => {
            let request = SearchQuery {
                q: query,
                system,
                threshold,
                fuzzy: Some(!exact),
                full_text: Some(full_text),
                page: None,
            }
            .to_request(&cfg)?;
            let view = SearchOrchestrator::new(api, cfg).search(&request).await;
            if cli.json {
                return print_json(&view);
            }

            println!("Results for \"{}\"", view.query);
            println!("\nMappings ({}):", view.mapping_results.len());
            for record in &view.mapping_results {
                println!("  {}", mapping_line(record));
            }
            for system in TerminologySystem::ALL {
                let page = view.system(system);
                println!(
                    "\n{} ({} total){}:",
                    system.label(),
                    page.count,
                    mapped_marker(view.slot_source(system))
                );
                for term in &page.results {
                    println!("  {}", term_line(term));
                }
            }
        }
        Commands::Page {
            source,
            query,
            page,
        } => {
            let source: SourceKind = source.parse()?;
            let request = SearchQuery {
                q: query,
                ..Default::default()
            }
            .to_request(&cfg)?;
            let result = SearchOrchestrator::new(api, cfg)
                .source_page(&request, source, page)
                .await?;
            if cli.json {
                return print_json(&result);
            }

            let (lines, page, total_pages, window) = match result {
                SourcePage::Combined(view) => (
                    view.items
                        .iter()
                        .map(|r| term_line(&r.term))
                        .collect::<Vec<_>>(),
                    view.page,
                    view.total_pages,
                    view.window,
                ),
                SourcePage::System(view) => (
                    view.items.iter().map(term_line).collect(),
                    view.page,
                    view.total_pages,
                    view.window,
                ),
            };
            for line in lines {
                println!("{}", line);
            }
            println!("\nPage {} of {} {:?}", page, total_pages, window);
        }
        Commands::Suggest { input } => {
            let list = SuggestionFetcher::new(api, cfg).fetch(&input).await;
            if cli.json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No suggestions.");
            }
            for suggestion in &list.suggestions {
                let marker = if list.recommendations.contains(suggestion) {
                    "*"
                } else {
                    " "
                };
                println!("{} {:<12} {}", marker, suggestion.code, suggestion.label);
            }
        }
        Commands::Autocomplete { system, input } => {
            let system: TerminologySystem = system.parse()?;
            let labels = SuggestionFetcher::new(api, cfg)
                .autocomplete(system, &input)
                .await?;
            if cli.json {
                return print_json(&labels);
            }
            for label in labels {
                println!("{}", label);
            }
        }
        Commands::Detail { name, complete } => {
            let aggregator = DetailAggregator::new(api, cfg);
            let detail = if complete {
                aggregator.open(&name).await?.complete().await
            } else {
                aggregator.load(&name).await?
            };
            if cli.json {
                return print_json(&detail);
            }

            println!("{}", detail.term_name);
            if let Some(mapping) = &detail.mapping {
                println!("  mapping   {}", mapping_line(mapping));
            }
            for system in TerminologySystem::ALL {
                match detail.system(system) {
                    Some(term) => println!(
                        "  {:<9} {}{}",
                        system.slug(),
                        term_line(term),
                        mapped_marker(detail.slot_source(system))
                    ),
                    None => println!("  {:<9} -", system.slug()),
                }
            }
        }
        Commands::Lookup { system, code } => {
            let system: TerminologySystem = system.parse()?;
            let term = DetailAggregator::new(api, cfg).lookup(system, &code).await?;
            if cli.json {
                return print_json(&term);
            }
            println!("{}", term_line(&term));
            if let Some(local) = term.local_name(system) {
                println!("  local name: {}", local);
            }
            if let Some(definition) = &term.definition {
                println!("  {}", definition);
            }
        }
        Commands::Mapping { code } => {
            let mapping = DetailAggregator::new(api, cfg).mapping(&code).await?;
            print_json(&mapping)?;
        }
        Commands::Stats => {
            let store = Arc::new(FileDocumentStore::new(DEFAULT_DOCUMENT_DIR));
            let stats = DashboardReader::new(api, store).stats().await;
            if cli.json {
                return print_json(&stats);
            }
            if stats.placeholder {
                println!("(placeholder values: statistics endpoint unavailable)");
            }
            println!("Total mappings:   {}", stats.total_mappings);
            println!("Ayurveda:         {}", stats.ayurveda_mappings);
            println!("Siddha:           {}", stats.siddha_mappings);
            println!("Unani:            {}", stats.unani_mappings);
            println!("High confidence:  {}", stats.high_confidence_mappings);
            println!("Avg confidence:   {:.2}", stats.average_confidence);
        }
        Commands::Dashboard { uid, documents } => {
            let dir = documents
                .or_else(|| std::env::var("AYUSH_DOCUMENT_DIR").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_DIR));
            let dashboard = DashboardReader::new(api, Arc::new(FileDocumentStore::new(dir)))
                .load(&uid)
                .await?;
            if cli.json {
                return print_json(&dashboard);
            }

            match &dashboard.doctor {
                Some(doctor) => println!(
                    "Doctor: {}",
                    doctor.display_name.as_deref().unwrap_or(&doctor.uid)
                ),
                None => println!("Doctor profile not found."),
            }
            println!("Patients ({}):", dashboard.patients.len());
            for patient in &dashboard.patients {
                println!(
                    "  {:<10} {} {}",
                    patient.id,
                    patient.name,
                    patient.diagnosis.as_deref().unwrap_or("")
                );
            }
            println!(
                "Mappings: {}{}",
                dashboard.stats.total_mappings,
                if dashboard.stats.placeholder {
                    " (placeholder)"
                } else {
                    ""
                }
            );
        }
        Commands::CanUpload { identity } => {
            let permission = UploadGate::check(identity.user().as_ref());
            if cli.json {
                return print_json(&permission);
            }
            match permission.tooltip() {
                None => println!("Upload enabled."),
                Some(reason) => println!("Upload disabled: {}", reason),
            }
        }
        Commands::Upload {
            system,
            file,
            update_search_vector,
            identity,
        } => {
            let system: TerminologySystem = system.parse()?;
            let receipt = CsvUploader::new(api)
                .upload_file(
                    identity.user().as_ref(),
                    system,
                    &file,
                    update_search_vector,
                )
                .await?;
            if cli.json {
                return print_json(&receipt);
            }
            println!(
                "Uploaded {} to {}: {} created, {} updated",
                file.display(),
                system.label(),
                receipt.created,
                receipt.updated
            );
            for error in &receipt.errors {
                eprintln!("  {}", error);
            }
        }
    }

    Ok(())
}

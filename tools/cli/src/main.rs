//! arcadio CLI - encrypted document archives from the command line.
//!
//! Each arc is a password-protected collection of encrypted documents.
//! Passwords are taken from the session cache, the system keyring, or an
//! interactive prompt, in that order.

mod config;
mod prompt;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use std::sync::Arc as Shared;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

use arcadio_arc::{ArcManager, ArcSession, DocumentStore};
use arcadio_auth::{CredentialResolver, KeyringStore, Prompter, SecretStore, SessionCache};
use arcadio_common::Error;

use crate::config::Settings;
use crate::prompt::{read_line, TerminalPrompter};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "arc")]
#[command(about = "arcadio - Secure encrypted document archives")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the arcs (default: ~/.arcadio/arcs).
    #[arg(long, env = "ARCADIO_BASE_DIR", global = true)]
    base_dir: Option<PathBuf>,

    /// Do not read or write the system keyring.
    #[arg(long, global = true)]
    no_keyring: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new arc.
    Create {
        /// Arc name.
        name: String,
    },

    /// List all arcs.
    List,

    /// Show arc details.
    Info {
        /// Arc name or id.
        arc: String,
    },

    /// Delete an arc and all of its documents.
    Delete {
        /// Arc name or id.
        arc: String,

        /// Skip the confirmation.
        #[arg(short, long)]
        force: bool,
    },

    /// Add a file to an arc.
    Add {
        /// Arc name or id.
        arc: String,

        /// File to add.
        file: PathBuf,

        /// Tags for the document (comma separated).
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Remove a document from an arc.
    Remove {
        /// Arc name or id.
        arc: String,

        /// Document id.
        doc: String,
    },

    /// Decrypt a document to a file.
    Export {
        /// Arc name or id.
        arc: String,

        /// Document id.
        doc: String,

        /// Destination file.
        output: PathBuf,
    },

    /// List the documents of an arc.
    #[command(alias = "list-docs")]
    Docs {
        /// Arc name or id.
        arc: String,
    },

    /// Search documents by filename.
    Search {
        /// Arc name or id.
        arc: String,

        /// Case-insensitive filename fragment.
        query: String,
    },

    /// Add or remove document tags.
    Tag {
        /// Arc name or id.
        arc: String,

        /// Document id.
        doc: String,

        /// Tags to apply.
        #[arg(required = true)]
        tags: Vec<String>,

        /// Remove the tags instead of adding them.
        #[arg(short, long)]
        remove: bool,
    },

    /// Check the answer to an arc's security question.
    Recover {
        /// Arc name or id.
        arc: String,
    },

    /// Manage passwords stored in the system keyring.
    Keyring {
        #[command(subcommand)]
        command: KeyringCommands,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum KeyringCommands {
    /// List arcs with a stored password.
    List,

    /// Verify and store an arc's password.
    Save {
        /// Arc name or id.
        arc: String,
    },

    /// Delete an arc's stored password.
    Delete {
        /// Arc name or id.
        arc: String,
    },

    /// Clear cached passwords.
    ClearSession,
}

/// Handles shared by every command.
struct App {
    manager: ArcManager,
    resolver: CredentialResolver,
    prompter: TerminalPrompter,
}

impl App {
    fn open(settings: &Settings) -> Result<Self> {
        let manager = ArcManager::open(&settings.base_dir)
            .with_context(|| format!("Failed to open {}", settings.base_dir.display()))?;

        let store: Option<Shared<dyn SecretStore>> = if settings.use_keyring {
            Some(Shared::new(KeyringStore::default()) as Shared<dyn SecretStore>)
        } else {
            None
        };
        let resolver =
            CredentialResolver::new(SessionCache::default(), store, Box::new(TerminalPrompter));

        Ok(Self {
            manager,
            resolver,
            prompter: TerminalPrompter,
        })
    }

    fn unlock(&mut self, id_or_name: &str) -> Result<ArcSession> {
        unlock_arc(&self.manager, &mut self.resolver, id_or_name)
    }

    fn documents(&self) -> DocumentStore<'_> {
        DocumentStore::new(&self.manager)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "arc", &mut std::io::stdout());
        return Ok(());
    }

    let settings = Settings::resolve(cli.base_dir, cli.no_keyring)?;
    let mut app = App::open(&settings)?;

    match cli.command {
        Commands::Create { name } => cmd_create(&mut app, &name),
        Commands::List => cmd_list(&app),
        Commands::Info { arc } => cmd_info(&mut app, &arc),
        Commands::Delete { arc, force } => cmd_delete(&mut app, &arc, force),
        Commands::Add { arc, file, tags } => cmd_add(&mut app, &arc, &file, &tags),
        Commands::Remove { arc, doc } => cmd_remove(&mut app, &arc, &doc),
        Commands::Export { arc, doc, output } => cmd_export(&mut app, &arc, &doc, &output),
        Commands::Docs { arc } => cmd_docs(&mut app, &arc),
        Commands::Search { arc, query } => cmd_search(&mut app, &arc, &query),
        Commands::Tag {
            arc,
            doc,
            tags,
            remove,
        } => cmd_tag(&mut app, &arc, &doc, &tags, remove),
        Commands::Recover { arc } => cmd_recover(&app, &arc),
        Commands::Keyring { command } => match command {
            KeyringCommands::List => cmd_keyring_list(&app),
            KeyringCommands::Save { arc } => cmd_keyring_save(&mut app, &arc),
            KeyringCommands::Delete { arc } => cmd_keyring_delete(&mut app, &arc),
            KeyringCommands::ClearSession => {
                app.resolver.clear_session();
                println!("Session cache cleared");
                Ok(())
            }
        },
        Commands::Completions { .. } => Ok(()),
    }
}

/// Resolve the password and unlock an arc.
///
/// A refused password is dropped from the cache and the keyring, so the
/// next attempt prompts again.
fn unlock_arc(
    manager: &ArcManager,
    resolver: &mut CredentialResolver,
    id_or_name: &str,
) -> Result<ArcSession> {
    let entry = manager.find_arc(id_or_name)?;
    let password = resolver.get_password(&entry.id, &entry.name, true)?;

    match manager.unlock(&entry.id, &password) {
        Ok(session) => Ok(session),
        Err(Error::InvalidPassword) => match resolver.reject_password(&entry.id) {
            Ok(true) => bail!(
                "Invalid password for arc '{}'; the stored password was removed from the keyring",
                entry.name
            ),
            Ok(false) => bail!("Invalid password for arc '{}'", entry.name),
            Err(err) => {
                warn!(error = %err, "Failed to remove stored password");
                bail!(
                    "Invalid password for arc '{}'; remove it with: arc keyring delete {}",
                    entry.name,
                    entry.name
                )
            }
        },
        Err(err) => Err(err).with_context(|| format!("Failed to unlock '{}'", entry.name)),
    }
}

/// Create a new arc.
fn cmd_create(app: &mut App, name: &str) -> Result<()> {
    info!("Creating arc: {}", name);

    let password = Zeroizing::new(app.prompter.prompt_secret("Enter password: ")?);
    if password.len() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {} characters", MIN_PASSWORD_LEN);
    }
    let confirm = Zeroizing::new(app.prompter.prompt_secret("Confirm password: ")?);
    if *password != *confirm {
        bail!("Passwords do not match");
    }

    let question = read_line("Security question: ")?;
    if question.trim().is_empty() {
        bail!("Security question cannot be empty");
    }
    let answer = Zeroizing::new(app.prompter.prompt_secret("Answer: ")?);
    if answer.is_empty() {
        bail!("Security answer cannot be empty");
    }

    let session = app
        .manager
        .create(name, &password, question.trim(), &answer)
        .context("Failed to create arc")?;

    println!("Arc created successfully!");
    println!("  ID: {}", session.id());
    println!("  Name: {}", session.name());
    println!("  Created: {}", format_time(session.arc().created_at));

    Ok(())
}

/// List registered arcs, oldest first.
fn cmd_list(app: &App) -> Result<()> {
    let mut arcs = app.manager.list_arcs();
    if arcs.is_empty() {
        println!("No arcs found. Create one with: arc create <name>");
        return Ok(());
    }

    arcs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    println!("{:<24} {:<10} CREATED", "NAME", "ID");
    for entry in arcs {
        println!(
            "{:<24} {:<10} {}",
            entry.name,
            short_id(&entry.id),
            format_time(entry.created_at)
        );
    }

    let orphans = app.manager.find_orphans()?;
    if !orphans.is_empty() {
        println!("\nUnregistered arc directories ({}):", orphans.len());
        for orphan in orphans {
            println!("  {}", orphan);
        }
    }

    Ok(())
}

/// Show arc details.
fn cmd_info(app: &mut App, id_or_name: &str) -> Result<()> {
    let session = app.unlock(id_or_name)?;
    let arc = session.arc();
    let stats = arc.stats();

    println!("Name:        {}", arc.name);
    println!("ID:          {}", arc.id);
    println!("Created:     {}", format_time(arc.created_at));
    println!("Modified:    {}", format_time(arc.modified_at));
    println!("Documents:   {}", stats.documents);
    println!("Tags:        {} unique", stats.unique_tags);
    println!("Encryption:  {}", arc.encryption_version);
    println!("Total size:  {}", format_size(stats.total_size));

    Ok(())
}

/// Delete an arc after the user retypes its name.
fn cmd_delete(app: &mut App, id_or_name: &str, force: bool) -> Result<()> {
    let entry = app.manager.find_arc(id_or_name)?;

    if !force {
        println!(
            "WARNING: This will permanently delete arc '{}' and all its documents!",
            entry.name
        );
        let typed = read_line("Type the arc name to confirm: ")?;
        if typed.trim() != entry.name {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    app.manager
        .delete(&entry.id)
        .context("Failed to delete arc")?;
    if let Err(err) = app.resolver.delete_password(&entry.id) {
        warn!(error = %err, "Failed to remove stored password");
    }

    println!("Arc '{}' deleted", entry.name);
    Ok(())
}

/// Add a file to an arc.
fn cmd_add(app: &mut App, id_or_name: &str, file: &Path, tags: &[String]) -> Result<()> {
    if file.is_dir() {
        bail!("{} is a directory; add files one at a time", file.display());
    }

    let mut session = app.unlock(id_or_name)?;
    let doc = app
        .documents()
        .add_file(&mut session, file, tags)
        .with_context(|| format!("Failed to add {}", file.display()))?;

    println!("Document added: {}", doc.filename);
    println!("  ID: {}", doc.id);
    println!("  Size: {}", format_size(doc.size));
    let doc_tags = session.arc().tags_for(&doc.id);
    if !doc_tags.is_empty() {
        println!("  Tags: {}", doc_tags.join(", "));
    }

    Ok(())
}

/// Remove a document.
fn cmd_remove(app: &mut App, id_or_name: &str, doc_id: &str) -> Result<()> {
    let mut session = app.unlock(id_or_name)?;
    let doc = app
        .documents()
        .remove_document(&mut session, doc_id)
        .context("Failed to remove document")?;

    println!("Document removed: {}", doc.filename);
    Ok(())
}

/// Decrypt a document to a file.
fn cmd_export(app: &mut App, id_or_name: &str, doc_id: &str, output: &Path) -> Result<()> {
    let session = app.unlock(id_or_name)?;
    let written = app
        .documents()
        .export_document(&session, doc_id, output)
        .context("Failed to export document")?;

    println!("Exported {} to {}", format_size(written), output.display());
    Ok(())
}

/// List documents sorted by filename.
fn cmd_docs(app: &mut App, id_or_name: &str) -> Result<()> {
    let session = app.unlock(id_or_name)?;
    let store = app.documents();
    let mut docs = store.list_documents(&session);

    if docs.is_empty() {
        println!("No documents in this arc.");
        return Ok(());
    }

    docs.sort_by(|a, b| a.filename.cmp(&b.filename));
    println!("Arc: {} ({} documents)\n", session.name(), docs.len());
    print_documents(&session, &docs);
    Ok(())
}

/// Search documents by filename.
fn cmd_search(app: &mut App, id_or_name: &str, query: &str) -> Result<()> {
    let session = app.unlock(id_or_name)?;
    let store = app.documents();
    let mut results = store.search_documents(&session, query);

    if results.is_empty() {
        println!("No documents found matching: {}", query);
        return Ok(());
    }

    results.sort_by(|a, b| a.filename.cmp(&b.filename));
    println!("Found {} document(s) matching: {}\n", results.len(), query);
    print_documents(&session, &results);
    Ok(())
}

/// Add or remove tags.
fn cmd_tag(
    app: &mut App,
    id_or_name: &str,
    doc_id: &str,
    tags: &[String],
    remove: bool,
) -> Result<()> {
    let mut session = app.unlock(id_or_name)?;
    let store = app.documents();

    let current = if remove {
        store.remove_tags(&mut session, doc_id, tags)
    } else {
        store.add_tags(&mut session, doc_id, tags)
    }
    .context("Failed to update tags")?;

    if current.is_empty() {
        println!("Document has no tags");
    } else {
        let current: Vec<&str> = current.iter().map(String::as_str).collect();
        println!("Tags: {}", current.join(", "));
    }
    Ok(())
}

/// Ask the security question and check the answer.
fn cmd_recover(app: &App, id_or_name: &str) -> Result<()> {
    let entry = app.manager.find_arc(id_or_name)?;
    let question = app.manager.security_question(&entry.id)?;

    println!("Security question: {}", question);
    let answer = Zeroizing::new(app.prompter.prompt_secret("Answer: ")?);

    match app.manager.verify_answer(&entry.id, &answer) {
        Ok(()) => {
            println!("Answer accepted for arc '{}'", entry.name);
            Ok(())
        }
        Err(Error::InvalidPassword) => bail!("Incorrect answer"),
        Err(err) => Err(err.into()),
    }
}

/// List arcs with a stored password.
fn cmd_keyring_list(app: &App) -> Result<()> {
    if !app.resolver.has_store() {
        bail!("Keyring is disabled (--no-keyring)");
    }

    let mut arcs = app.manager.list_arcs();
    arcs.sort_by(|a, b| a.name.cmp(&b.name));

    println!("Arcs with stored passwords:");
    let mut count = 0;
    for entry in arcs {
        if app.resolver.has_stored_password(&entry.id)? {
            println!("  {} ({})", entry.name, short_id(&entry.id));
            count += 1;
        }
    }
    if count == 0 {
        println!("  No passwords stored in keyring");
    }
    Ok(())
}

/// Verify a password by unlocking, then store it.
fn cmd_keyring_save(app: &mut App, id_or_name: &str) -> Result<()> {
    let entry = app.manager.find_arc(id_or_name)?;
    let password = Zeroizing::new(app.prompter.prompt_secret("Enter password: ")?);

    match app.manager.unlock(&entry.id, &password) {
        Ok(_) => {}
        Err(Error::InvalidPassword) => bail!("Invalid password"),
        Err(err) => return Err(err).context("Failed to verify password"),
    }

    app.resolver
        .save_password(&entry.id, &password)
        .context("Failed to save password")?;
    println!("Password saved to keyring: {}", entry.name);
    Ok(())
}

/// Delete a stored password.
fn cmd_keyring_delete(app: &mut App, id_or_name: &str) -> Result<()> {
    let entry = app.manager.find_arc(id_or_name)?;
    app.resolver
        .delete_password(&entry.id)
        .context("Failed to delete password")?;

    println!("Password deleted from keyring: {}", entry.name);
    Ok(())
}

fn print_documents(session: &ArcSession, docs: &[&arcadio_arc::Document]) {
    for doc in docs {
        println!("{}", doc.filename);
        println!("  ID:    {}", doc.id);
        println!("  Size:  {}", format_size(doc.size));
        println!("  Added: {}", format_time(doc.added_at));
        let tags = session.arc().tags_for(&doc.id);
        if !tags.is_empty() {
            println!("  Tags:  {}", tags.join(", "));
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn format_time(time: chrono::DateTime<chrono::Utc>) -> String {
    time.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn format_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= UNIT as f64 && unit < 4 {
        value /= UNIT as f64;
        unit += 1;
    }
    format!("{:.1} {}", value, ["B", "KB", "MB", "GB", "TB"][unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcadio_auth::MemorySecretStore;
    use arcadio_crypto::KdfParams;
    use tempfile::TempDir;

    /// Fails every prompt; unlocking must not reach it.
    struct NoPrompt;

    impl Prompter for NoPrompt {
        fn prompt_secret(&self, _prompt: &str) -> arcadio_common::Result<String> {
            Err(Error::InvalidInput("unexpected prompt".to_string()))
        }

        fn confirm(&self, _question: &str) -> arcadio_common::Result<bool> {
            Err(Error::InvalidInput("unexpected prompt".to_string()))
        }
    }

    fn resolver_with(store: &Shared<MemorySecretStore>) -> CredentialResolver {
        CredentialResolver::new(
            SessionCache::default(),
            Some(store.clone() as Shared<dyn SecretStore>),
            Box::new(NoPrompt),
        )
    }

    #[test]
    fn test_wrong_stored_password_is_removed() {
        let temp = TempDir::new().unwrap();
        let mut manager = ArcManager::open(temp.path().join("arcs"))
            .unwrap()
            .with_kdf_params(KdfParams::moderate());
        let session = manager.create("Invoices", "correcthorse", "q", "a").unwrap();

        let store = Shared::new(MemorySecretStore::new());
        store.set(session.id(), "batterystaple").unwrap();
        let mut resolver = resolver_with(&store);

        let err = unlock_arc(&manager, &mut resolver, "Invoices").unwrap_err();
        assert!(err.to_string().contains("Invalid password"));
        assert_eq!(store.get(session.id()).unwrap(), None);
    }

    #[test]
    fn test_stored_password_unlocks() {
        let temp = TempDir::new().unwrap();
        let mut manager = ArcManager::open(temp.path().join("arcs"))
            .unwrap()
            .with_kdf_params(KdfParams::moderate());
        let session = manager.create("Invoices", "correcthorse", "q", "a").unwrap();

        let store = Shared::new(MemorySecretStore::new());
        store.set(session.id(), "correcthorse").unwrap();
        let mut resolver = resolver_with(&store);

        let unlocked = unlock_arc(&manager, &mut resolver, "Invoices").unwrap();
        assert_eq!(unlocked.id(), session.id());
        assert!(store.get(session.id()).unwrap().is_some());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tag_command() {
        let cli = Cli::try_parse_from(["arc", "tag", "Invoices", "doc-1", "a", "b", "--remove"])
            .unwrap();
        match cli.command {
            Commands::Tag { tags, remove, .. } => {
                assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
                assert!(remove);
            }
            _ => panic!("expected tag command"),
        }
    }

    #[test]
    fn test_parse_add_tags() {
        let cli = Cli::try_parse_from(["arc", "add", "Invoices", "scan.pdf", "-t", "tax,2024"])
            .unwrap();
        match cli.command {
            Commands::Add { tags, .. } => {
                assert_eq!(tags, vec!["tax".to_string(), "2024".to_string()]);
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(3), "3 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0f6c2a9e-1111"), "0f6c2a9e");
        assert_eq!(short_id("abc"), "abc");
    }
}

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, warn};
use trs_import::{export_rows, read_csv_file, write_csv, ImportResult, TranslationImporter};
use trs_resolve::{having_implicit_overrides, StaticStoreProvider, StoreRegistry};
use trs_stack::{StackEvent, StackListener, TranslationStoreStack};
use trs_store::{BackedTranslationStore, FilteredTranslationStore, NullProgress, TranslationStore};
use trs_types::{Language, Translation};
use trs_validate::{validate_key, Validation, TranslationValidator};

use crate::cli::*;
use crate::config::TrsConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = TrsConfig::load(&cli.config)?;
    let module = std::path::absolute(&cli.module)
        .with_context(|| format!("invalid module path {}", cli.module.display()))?;
    let stack = open_stack(&config, &module)?;
    let format = cli.format;

    match cli.command {
        Command::Stores => cmd_stores(&stack, format),
        Command::List(args) => cmd_list(&stack, args, format),
        Command::Show(args) => cmd_show(&stack, args, format),
        Command::Add(args) => cmd_add(&stack, args),
        Command::Set(args) => cmd_set(&stack, args),
        Command::Rename(args) => cmd_rename(&stack, args),
        Command::Remove(args) => cmd_remove(&stack, args),
        Command::AddLanguage(args) => cmd_add_language(&stack, args),
        Command::Import(args) => cmd_import(&stack, &config, args),
        Command::Export(args) => cmd_export(&stack, &config, args),
        Command::GenerateKey(args) => {
            println!("{}", stack.generate_new_key(&args.text.join(" "))?);
            Ok(())
        }
        Command::ValidateKey(args) => cmd_validate_key(&stack, args),
    }
}

/// Open the configured JSON stores and stack those visible from `module`.
/// Stores that cannot be read are left out.
pub fn open_stack(config: &TrsConfig, module: &Path) -> anyhow::Result<TranslationStoreStack> {
    let mut opened: HashMap<String, Arc<dyn TranslationStore>> = HashMap::new();
    let mut provider = StaticStoreProvider::new("json-files");
    for entry in &config.stores {
        let store = match opened.get(&entry.identity) {
            Some(store) => store.clone(),
            None => {
                let store: Arc<dyn TranslationStore> = match BackedTranslationStore::open_json(
                    entry.identity.clone(),
                    entry.order,
                    entry.editable,
                    entry.path.clone(),
                    &NullProgress,
                ) {
                    Ok(store) => store,
                    Err(e) => {
                        warn!(store = %entry.identity, path = %entry.path.display(), error = %e, "skipping unreadable store");
                        continue;
                    }
                };
                opened.insert(entry.identity.clone(), store.clone());
                store
            }
        };
        let store: Arc<dyn TranslationStore> = match &entry.keys {
            Some(keys) => Arc::new(FilteredTranslationStore::new(store, keys.iter().cloned())),
            None => store,
        };
        provider = match &entry.module {
            Some(root) => provider.with_module_store(root.clone(), entry.scope, store),
            None => provider.with_store(entry.scope, store),
        };
    }

    let registry = StoreRegistry::new();
    registry.register_provider(Arc::new(provider))?;
    let logger: Arc<dyn StackListener> = Arc::new(|events: &[StackEvent]| {
        for event in events {
            debug!(kind = %event.kind(), key = ?event.key(), language = ?event.language(), "stack changed");
        }
    });
    registry.register_listener(logger)?;
    Ok(registry.create_stack(module, &config.environment, &NullProgress)?)
}

fn parse_language(tag: &str) -> anyhow::Result<Language> {
    Language::parse(tag).ok_or_else(|| anyhow!("invalid language {tag:?}"))
}

/// Parse `LANGUAGE=TEXT`.
fn parse_text_arg(arg: &str) -> anyhow::Result<(Language, String)> {
    let (tag, text) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected LANGUAGE=TEXT, got {arg:?}"))?;
    Ok((parse_language(tag)?, text.to_string()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a non-OK result; fail on errors.
fn report(subject: &str, result: Validation) -> anyhow::Result<()> {
    if result.is_error() {
        bail!("{subject}: {result}");
    }
    if result.is_warning() {
        println!("{} {}: {}", "warning".yellow().bold(), subject, result);
    }
    Ok(())
}

fn flush(stack: &TranslationStoreStack) -> anyhow::Result<()> {
    if stack.is_dirty() {
        stack.flush_all(&NullProgress)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct StoreRow {
    identity: String,
    order: f64,
    editable: bool,
    filtered: bool,
    languages: Vec<String>,
    translations: usize,
}

fn cmd_stores(stack: &TranslationStoreStack, format: OutputFormat) -> anyhow::Result<()> {
    let mut rows = Vec::new();
    for store in stack.stores() {
        rows.push(StoreRow {
            identity: store.identity().to_string(),
            order: store.order(),
            editable: store.is_editable(),
            filtered: store.as_filtered().is_some(),
            languages: store.languages()?.iter().map(Language::to_string).collect(),
            translations: store.len()?,
        });
    }
    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    for row in &rows {
        let access = if row.editable { "editable".green() } else { "read-only".dimmed() };
        let filtered = if row.filtered { " (filtered)" } else { "" };
        println!(
            "{:>8}  {}  {}{}  {} translations  [{}]",
            row.order,
            row.identity.bold(),
            access,
            filtered,
            row.translations,
            row.languages.join(", ")
        );
    }
    for (order, identity) in stack.duplicate_stores() {
        println!("{} store {} appears more than once at order {}", "warning".yellow().bold(), identity, order);
    }
    for found in having_implicit_overrides(stack.stores())? {
        println!(
            "{} stores {} share order {} and {} key(s)",
            "warning".yellow().bold(),
            found.stores.join(", "),
            found.order,
            found.keys.len()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct EntryRow<'a> {
    key: &'a str,
    store: &'a str,
    text: Option<&'a str>,
}

fn cmd_list(stack: &TranslationStoreStack, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let language = match &args.language {
        Some(tag) => parse_language(tag)?,
        None => Language::DEFAULT,
    };
    let entries = if args.editable {
        stack.all_editable_entries()?
    } else {
        stack.all_entries()?
    };
    let rows: Vec<EntryRow<'_>> = entries
        .iter()
        .map(|e| EntryRow {
            key: e.key(),
            store: e.store_identity(),
            text: e.text(&language),
        })
        .collect();
    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    for row in &rows {
        println!(
            "{}  {}  {}",
            row.key.bold(),
            format!("[{}]", row.store).dimmed(),
            row.text.unwrap_or("")
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct LayerRow {
    store: String,
    order: f64,
    editable: bool,
    governing: bool,
    texts: BTreeMap<String, String>,
}

fn cmd_show(stack: &TranslationStoreStack, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let stacked = stack
        .stacked(&args.key)?
        .ok_or_else(|| anyhow!("key {:?} not found", args.key))?;
    let rows: Vec<LayerRow> = stacked
        .layers()
        .iter()
        .enumerate()
        .map(|(i, layer)| LayerRow {
            store: layer.store_identity.clone(),
            order: layer.order,
            editable: layer.editable,
            governing: i == 0,
            texts: layer
                .entry
                .translation()
                .texts()
                .iter()
                .map(|(l, t)| (l.to_string(), t.clone()))
                .collect(),
        })
        .collect();
    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    println!("{}", stacked.key().bold());
    for row in &rows {
        let marker = if row.governing { "*".green().bold() } else { " ".normal() };
        println!("{} {} (order {})", marker, row.store.bold(), row.order);
        for (language, text) in &row.texts {
            println!("    {:<10} {}", language.cyan(), text);
        }
    }
    Ok(())
}

fn cmd_add(stack: &TranslationStoreStack, args: AddArgs) -> anyhow::Result<()> {
    let mut translation = Translation::new(args.key.as_str()).with_text(Language::DEFAULT, args.text);
    for arg in &args.translations {
        let (language, text) = parse_text_arg(arg)?;
        translation.set_text(language, text);
    }

    let validation = TranslationValidator::new(stack).validate_translation(&translation, args.store.as_deref(), false)?;
    report(&format!("key {}", args.key), validation.key)?;
    for (language, result) in &validation.texts {
        report(&format!("{} text", language), *result)?;
    }

    let entry = stack.add_new_translation(&translation, args.store.as_deref())?;
    flush(stack)?;
    println!("{} Added {} to {}", "✓".green().bold(), entry.key().yellow(), entry.store_identity().bold());
    Ok(())
}

fn cmd_set(stack: &TranslationStoreStack, args: SetArgs) -> anyhow::Result<()> {
    let language = parse_language(&args.language)?;
    let store = match args.store.as_deref() {
        Some(identity) => stack
            .member(identity)
            .ok_or_else(|| anyhow!("no store {identity:?} in the stack"))?,
        None => {
            let mut found = None;
            for store in stack.editable_stores() {
                if store.contains_key(&args.key)? {
                    found = Some(store);
                    break;
                }
            }
            found.ok_or_else(|| anyhow!("no editable store defines {:?}", args.key))?
        }
    };
    let existing = store
        .get(&args.key)?
        .ok_or_else(|| anyhow!("store {} does not define {:?}", store.identity(), args.key))?;

    let result = TranslationValidator::new(stack).validate_text(&args.key, &language, &args.text, Some(store.identity()))?;
    report(&format!("{} text", language), result)?;

    let mut translation = existing.into_translation();
    if args.text.trim().is_empty() {
        translation.remove_text(&language);
    } else {
        translation.set_text(language.clone(), args.text);
    }
    stack.update_translation(&translation, Some(store.identity()))?;
    flush(stack)?;
    println!("{} Updated {} ({}) in {}", "✓".green().bold(), args.key.yellow(), language, store.identity().bold());
    Ok(())
}

fn cmd_rename(stack: &TranslationStoreStack, args: RenameArgs) -> anyhow::Result<()> {
    report(&format!("key {}", args.new_key), validate_key(&args.new_key))?;
    let entry = stack.change_key(&args.old_key, &args.new_key)?;
    flush(stack)?;
    println!(
        "{} Renamed {} to {} in {}",
        "✓".green().bold(),
        args.old_key.yellow(),
        entry.key().yellow(),
        entry.store_identity().bold()
    );
    if stack.contains_key(&args.old_key)? {
        println!("  {} is still defined by a lower store", args.old_key.yellow());
    }
    Ok(())
}

fn cmd_remove(stack: &TranslationStoreStack, args: RemoveArgs) -> anyhow::Result<()> {
    let removed = stack.remove_translations(&args.keys)?;
    flush(stack)?;
    for entry in &removed {
        println!("{} Removed {} from {}", "✓".green().bold(), entry.key().yellow(), entry.store_identity().bold());
    }
    Ok(())
}

fn cmd_add_language(stack: &TranslationStoreStack, args: AddLanguageArgs) -> anyhow::Result<()> {
    let language = parse_language(&args.language)?;
    stack.add_new_language(language.clone(), args.store.as_deref())?;
    flush(stack)?;
    println!("{} Added language {}", "✓".green().bold(), language.to_string().cyan());
    Ok(())
}

fn cmd_import(stack: &TranslationStoreStack, config: &TrsConfig, args: ImportArgs) -> anyhow::Result<()> {
    let rows = read_csv_file(&args.file)?;
    let mut import_config = config.import.clone();
    if let Some(store) = args.store {
        import_config.target_store = Some(store);
    }
    if let Some(column) = args.key_column {
        import_config.key_column_name = column;
    }

    let mut importer = TranslationImporter::new(stack, import_config);
    let result = importer.import(&rows)?;
    for (column, name) in importer.ignored_columns() {
        println!("{} ignored column {} ({:?})", "warning".yellow().bold(), column + 1, name);
    }
    for row in importer.invalid_row_indices() {
        println!("{} skipped invalid row {}", "warning".yellow().bold(), row + 1);
    }
    for key in importer.duplicate_keys() {
        println!("{} key {} occurs more than once, last row used", "warning".yellow().bold(), key.yellow());
    }

    match result {
        ImportResult::Imported(count) => {
            flush(stack)?;
            println!("{} Imported {} translation(s)", "✓".green().bold(), count);
            Ok(())
        }
        ImportResult::NoData => bail!("{} contains no importable rows", args.file.display()),
        ImportResult::NoKeyOrDefaultLangColumn => bail!(
            "{} has no header with a {:?} and a {:?} column",
            args.file.display(),
            importer.config().key_column_name,
            Language::DEFAULT.to_string()
        ),
    }
}

fn cmd_export(stack: &TranslationStoreStack, config: &TrsConfig, args: ExportArgs) -> anyhow::Result<()> {
    let rows = export_rows(stack, &config.import.key_column_name)?;
    match &args.file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
            write_csv(file, &rows)?;
            println!("{} Exported {} translation(s) to {}", "✓".green().bold(), rows.len() - 1, path.display());
        }
        None => write_csv(std::io::stdout().lock(), &rows)?,
    }
    Ok(())
}

fn cmd_validate_key(stack: &TranslationStoreStack, args: ValidateKeyArgs) -> anyhow::Result<()> {
    let result = TranslationValidator::new(stack).validate_key(&args.key, args.store.as_deref(), args.existing)?;
    report(&format!("key {}", args.key), result)?;
    if result.is_ok() {
        println!("{} {} is valid", "✓".green().bold(), args.key.yellow());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use trs_resolve::{Environment, Scope};
    use trs_store::EditableTranslationStore;

    fn store_config(identity: &str, path: &Path, order: f64) -> StoreConfig {
        StoreConfig {
            identity: identity.to_string(),
            path: path.to_path_buf(),
            order,
            editable: true,
            scope: Scope::Compile,
            module: None,
            keys: None,
        }
    }

    #[test]
    fn parses_language_text_pairs() {
        let (language, text) = parse_text_arg("de_AT=Servus = Hallo").unwrap();
        assert_eq!(language.to_string(), "de_AT");
        assert_eq!(text, "Servus = Hallo");
        assert!(parse_text_arg("no separator").is_err());
        assert!(parse_text_arg("1x=text").is_err());
    }

    #[test]
    fn edits_persist_across_openings() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrsConfig {
            stores: vec![store_config("app", &dir.path().join("app.json"), 1.0)],
            ..Default::default()
        };

        let stack = open_stack(&config, dir.path()).unwrap();
        stack
            .add_new_translation(&Translation::new("hello").with_text(Language::DEFAULT, "Hello"), None)
            .unwrap();
        flush(&stack).unwrap();
        assert!(!stack.is_dirty());

        let reopened = open_stack(&config, dir.path()).unwrap();
        let entry = reopened.translation("hello").unwrap().unwrap();
        assert_eq!(entry.text(&Language::DEFAULT), Some("Hello"));
    }

    #[test]
    fn unreadable_store_is_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let config = TrsConfig {
            stores: vec![
                store_config("broken", &broken, 1.0),
                store_config("app", &dir.path().join("app.json"), 2.0),
            ],
            ..Default::default()
        };

        let stack = open_stack(&config, dir.path()).unwrap();
        let identities: Vec<&str> = stack.stores().iter().map(|s| s.identity()).collect();
        assert_eq!(identities, vec!["app"]);
    }

    #[test]
    fn keyed_views_in_several_scopes_are_combined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.json");
        let lib = BackedTranslationStore::open_json("lib", 1.0, true, path.clone(), &NullProgress).unwrap();
        for key in ["a", "b", "c"] {
            lib.add_translation(&Translation::new(key).with_text(Language::DEFAULT, key))
                .unwrap();
        }
        lib.flush(&NullProgress).unwrap();

        let mut compile = store_config("lib", &path, 1.0);
        compile.keys = Some(vec!["a".to_string()]);
        let mut runtime = store_config("lib", &path, 1.0);
        runtime.scope = Scope::Runtime;
        runtime.keys = Some(vec!["b".to_string()]);
        let config = TrsConfig {
            stores: vec![compile, runtime],
            environment: Environment::default(),
            ..Default::default()
        };

        let stack = open_stack(&config, dir.path()).unwrap();
        assert_eq!(stack.stores().len(), 1);
        let keys: Vec<String> = stack.keys().unwrap().into_iter().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}

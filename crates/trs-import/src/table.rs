//! CSV reading and writing, and the export of a stack as a table.
//!
//! Tables are plain rows of cells. Rows may differ in length and no row is
//! treated as a header at this level; header detection is the importer's job.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use trs_stack::{StackResult, TranslationStoreStack};
use trs_types::Language;

use crate::error::Result;

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

/// Read every record of a CSV document.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut reader = reader_builder().from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn read_csv_file(path: &Path) -> Result<Vec<Vec<String>>> {
    read_csv(File::open(path).map_err(csv::Error::from)?)
}

/// Write rows as CSV. Rows of different lengths are allowed.
pub fn write_csv<W: Write, R: AsRef<[String]>>(writer: W, rows: &[R]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for row in rows {
        writer.write_record(row.as_ref())?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// The merged view of `stack` as a table the importer reads back: a header
/// of `key_column_name`, the default language and every other language of
/// the stack, then one row per visible key.
pub fn export_rows(stack: &TranslationStoreStack, key_column_name: &str) -> StackResult<Vec<Vec<String>>> {
    let languages: Vec<Language> = stack
        .languages()?
        .into_iter()
        .filter(|l| !l.is_default())
        .collect();

    let mut header = vec![
        key_column_name.to_string(),
        Language::DEFAULT.to_string(),
    ];
    header.extend(languages.iter().map(Language::to_string));

    let mut rows = vec![header];
    for entry in stack.all_entries()? {
        let mut row = vec![
            entry.key().to_string(),
            entry.text(&Language::DEFAULT).unwrap_or_default().to_string(),
        ];
        row.extend(
            languages
                .iter()
                .map(|l| entry.text(l).unwrap_or_default().to_string()),
        );
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trs_store::{BackedTranslationStore, TranslationStore};
    use trs_types::Translation;

    use crate::{ImportConfig, ImportResult, TranslationImporter};

    #[test]
    fn reads_ragged_rows_without_header() {
        let rows = read_csv("Key,default,de\nk,\"a, b\"\n".as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["Key".to_string(), "default".to_string(), "de".to_string()],
                vec!["k".to_string(), "a, b".to_string()],
            ]
        );
    }

    #[test]
    fn written_csv_reads_back() {
        let rows = vec![
            vec!["Key".to_string(), "default".to_string()],
            vec!["quote".to_string(), "say \"hi\"\nthen leave".to_string()],
        ];
        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();
        assert_eq!(read_csv(out.as_slice()).unwrap(), rows);
    }

    #[test]
    fn missing_file_is_a_csv_error() {
        let dir = std::env::temp_dir().join("trs-import-missing-dir");
        assert!(read_csv_file(&dir.join("nope.csv")).is_err());
    }

    #[test]
    fn exported_stack_imports_into_empty_stack() {
        let de = Language::parse("de").unwrap();
        let source = BackedTranslationStore::builder("source", 1.0)
            .language(Language::DEFAULT)
            .translation(
                Translation::new("a")
                    .with_text(Language::DEFAULT, "A")
                    .with_text(de.clone(), "Ah"),
            )
            .text("b", "B")
            .build();
        let source = TranslationStoreStack::new([source as Arc<dyn TranslationStore>]);
        let rows = export_rows(&source, "Key").unwrap();
        assert_eq!(rows[0], vec!["Key", "default", "de"]);
        assert_eq!(rows[2], vec!["b", "B", ""]);

        let target = BackedTranslationStore::builder("target", 1.0)
            .language(Language::DEFAULT)
            .build();
        let stack = TranslationStoreStack::new([target as Arc<dyn TranslationStore>]);
        let mut importer = TranslationImporter::new(&stack, ImportConfig::default());
        assert_eq!(importer.import(&rows).unwrap(), ImportResult::Imported(2));
        let a = stack.translation("a").unwrap().unwrap();
        assert_eq!(a.text(&de), Some("Ah"));
    }
}

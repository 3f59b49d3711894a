//! Text tables are stored as comma separated files, one row per text id
//! below a header of language codes.

use csv::{ReaderBuilder, Terminator, WriterBuilder};

use crate::error::StorageError;

pub fn parse(input: &str) -> Result<Vec<Vec<String>>, StorageError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn write(rows: &[Vec<String>]) -> Result<String, StorageError> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_cells() {
        let rows = parse("en,fr\r\n\"Hello, world\",\"Dit \"\"bonjour\"\"\"\nline\nbreak,x\n").unwrap();
        assert_eq!(rows[0], ["en", "fr"]);
        assert_eq!(rows[1], ["Hello, world", "Dit \"bonjour\""]);
        assert_eq!(rows[2], ["line"]);
        assert_eq!(rows[3], ["break", "x"]);
    }

    #[test]
    fn multiline_and_empty_cells_survive_rewrite() {
        let rows = vec![
            vec!["en".to_string(), "fr".to_string()],
            vec!["two\nlines".to_string(), "a, b".to_string()],
            vec![String::new()],
        ];
        let text = write(&rows).unwrap();
        assert_eq!(parse(&text).unwrap(), rows);
    }

    #[test]
    fn strips_byte_order_mark() {
        let rows = parse("\u{feff}en\nPotion").unwrap();
        assert_eq!(rows, vec![vec!["en".to_string()], vec!["Potion".to_string()]]);
    }
}

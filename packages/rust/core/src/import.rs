//! CSV contact import.
//!
//! Parsing is all-or-nothing per file: one malformed record rejects the whole
//! file before anything reaches the store. Rows that parse but lack an email
//! are dropped individually.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use dealdesk_shared::{
    Contact, ContactDraft, ContactList, ContactListDraft, ContactListId, ContactStatus,
    DealDeskError, Result,
};
use dealdesk_storage::Store;

use crate::repository::{Repository, clean};

/// One parsed record keyed by normalized header.
pub type RawRow = BTreeMap<String, String>;

/// `type` given to lists created by an import.
pub const IMPORT_LIST_TYPE: &str = "import";

/// Lower-case a header and drop spaces, underscores, and hyphens, so
/// `First Name`, `first_name`, and `first-name` all become `firstname`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn malformed(err: csv::Error) -> DealDeskError {
    let line = err.position().map(|p| p.line());
    DealDeskError::malformed_import(line, err.to_string())
}

/// Parse CSV with a header row into [`RawRow`]s.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(normalize_header)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(DealDeskError::malformed_import(Some(1), "missing header row"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        let mut row = RawRow::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            if header.is_empty() {
                continue;
            }
            // `Email` and `E-mail` share a key; the first non-empty cell wins
            let cell = row.entry(header.clone()).or_default();
            if cell.is_empty() {
                *cell = value.to_string();
            }
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), columns = headers.len(), "csv parsed");
    Ok(rows)
}

pub fn parse_csv_file(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path).map_err(|e| DealDeskError::io(path, e))?;
    parse_csv(file)
}

fn field(row: &RawRow, key: &str) -> Option<String> {
    clean(row.get(key).cloned())
}

/// `$250,000` style amounts. Unparseable text is ignored.
fn parse_amount(raw: &str) -> Option<f64> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if digits.is_empty() {
        return None;
    }
    match digits.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(value = raw, "ignoring unparseable amount");
            None
        }
    }
}

/// Map one row onto a contact draft, or `None` when it has no email.
///
/// A row with an email but no name fields uses the email as its name.
pub fn row_to_draft(row: &RawRow, source: Option<&str>) -> Option<ContactDraft> {
    let email = field(row, "email")?;

    let first_name = field(row, "firstname");
    let last_name = field(row, "lastname");
    let name = field(row, "name").or_else(|| {
        (first_name.is_none() && last_name.is_none()).then(|| email.clone())
    });

    let status = field(row, "status").and_then(|s| match s.parse::<ContactStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            debug!(status = %s, "unknown status, using default");
            None
        }
    });

    Some(ContactDraft {
        name,
        first_name,
        last_name,
        email: Some(email),
        phone: field(row, "phone"),
        company: field(row, "company"),
        title: field(row, "title"),
        status,
        stage: field(row, "stage"),
        source: field(row, "source").or_else(|| source.map(str::to_string)),
        notes: field(row, "notes"),
        value: field(row, "value").as_deref().and_then(parse_amount),
        deal_value: field(row, "dealvalue").as_deref().and_then(parse_amount),
        ..ContactDraft::default()
    })
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Create a list of the imported contacts under this name.
    pub list_name: Option<String>,
    /// `source` for rows that do not carry one.
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<Contact>,
    /// Rows skipped for lacking an email.
    pub dropped: usize,
    pub list_id: Option<ContactListId>,
}

/// Store parsed rows as contacts, in one write.
///
/// The optional list is a second write. If it fails the contacts remain.
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn import_contacts(store: &mut Store, rows: &[RawRow], options: &ImportOptions) -> Result<ImportReport> {
    let mut drafts = Vec::with_capacity(rows.len());
    let mut dropped = 0;
    for (index, row) in rows.iter().enumerate() {
        match row_to_draft(row, options.source.as_deref()) {
            Some(draft) => drafts.push(draft),
            None => {
                // +2: header is line 1, records start at line 2
                warn!(line = index + 2, "dropping import row without email");
                dropped += 1;
            }
        }
    }

    let imported = if drafts.is_empty() {
        Vec::new()
    } else {
        Repository::<Contact>::new(store).create_many(drafts)?
    };

    let list_id = match &options.list_name {
        Some(name) => {
            let list = Repository::<ContactList>::new(store).create(ContactListDraft {
                name: Some(name.clone()),
                list_type: Some(IMPORT_LIST_TYPE.to_string()),
                contact_ids: imported.iter().map(|c| c.id).collect(),
                ..ContactListDraft::default()
            })?;
            Some(list.id)
        }
        None => None,
    };

    info!(imported = imported.len(), dropped, "import finished");
    Ok(ImportReport {
        imported,
        dropped,
        list_id,
    })
}

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use log::debug;
use rsvp_shared::models::{is_valid_email, normalize_email};
use serde::Serialize;
use std::collections::HashSet;
use std::io::Cursor;
use thiserror::Error;

use crate::models::{NewGuestRequest, RejectedGuest};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Uploaded file is empty")]
    Empty,

    #[error("File is not a readable .xlsx workbook: {0}")]
    Workbook(String),

    #[error("Workbook has no worksheets")]
    NoWorksheet,
}

/// Guests read from a spreadsheet, not yet saved.
#[derive(Serialize, Debug, Default)]
pub struct ImportPreview {
    pub guests: Vec<NewGuestRequest>,
    pub invalid: Vec<RejectedGuest>,
}

/// Reads the first worksheet: a header row, then name, email and an
/// optional phone per row.
pub fn parse_guest_workbook(bytes: &[u8]) -> Result<ImportPreview, ImportError> {
    if bytes.is_empty() {
        return Err(ImportError::Empty);
    }

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| ImportError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoWorksheet)?
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let mut preview = ImportPreview::default();
    let mut seen = HashSet::new();

    for row in range.rows().skip(1) {
        let name = row.first().map(cell_text).unwrap_or_default();
        let raw_email = row.get(1).map(cell_text).unwrap_or_default();
        let phone = row.get(2).map(cell_text).filter(|p| !p.is_empty());

        if name.is_empty() && raw_email.is_empty() && phone.is_none() {
            continue;
        }

        let email = normalize_email(&raw_email);
        let rejection = if name.is_empty() {
            Some("missing name")
        } else if !is_valid_email(&email) {
            Some("invalid email")
        } else if !seen.insert(email.clone()) {
            Some("duplicate email in file")
        } else {
            None
        };

        match rejection {
            Some(reason) => preview.invalid.push(RejectedGuest {
                name: Some(name).filter(|n| !n.is_empty()),
                email: raw_email,
                reason: reason.to_string(),
            }),
            None => preview.guests.push(NewGuestRequest { name, email, phone }),
        }
    }

    debug!(
        "Parsed guest workbook: {} valid rows, {} rejected",
        preview.guests.len(),
        preview.invalid.len()
    );
    Ok(preview)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        // Phone numbers typed into a spreadsheet usually arrive as floats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

use crate::error::{AdvisoryError, Result};
use crate::schema::{AccountRecord, ParseStatus, ParsedStatement, RawTransaction, TransactionType};
use crate::utils::{parse_flexible_date, parse_stripped_amount};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};

pub const UNKNOWN_ACCOUNT: &str = "UNKNOWN";

const PDF_PLACEHOLDER_ERROR: &str =
    "PDF statement parsing is not implemented; a placeholder transaction was produced";

/// Statement formats the parser understands, keyed by mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    Csv,
    Pdf,
}

impl StatementFormat {
    pub fn from_mime_type(mime_type: &str) -> Result<Self> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match essence.as_str() {
            "text/csv" | "application/csv" | "text/plain" | "application/vnd.ms-excel" => {
                Ok(Self::Csv)
            }
            "application/pdf" => Ok(Self::Pdf),
            _ => Err(AdvisoryError::UnsupportedMedia(mime_type.to_string())),
        }
    }
}

pub fn parse_statement(bytes: &[u8], mime_type: &str) -> Result<ParsedStatement> {
    match StatementFormat::from_mime_type(mime_type)? {
        StatementFormat::Csv => parse_csv(bytes),
        StatementFormat::Pdf => Ok(parse_pdf_placeholder()),
    }
}

/// Parses a `date,description,amount,balance` CSV with a header row.
///
/// Fields are split on every comma, quoted or not. Malformed rows are skipped;
/// a file with no usable rows is an error.
pub fn parse_csv(bytes: &[u8]) -> Result<ParsedStatement> {
    let text = String::from_utf8_lossy(bytes);
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut transactions = Vec::new();
    let mut range: Option<(NaiveDate, NaiveDate)> = None;

    for record in rdr.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable CSV row: {}", e);
                continue;
            }
        };

        match parse_csv_row(&record) {
            Some(txn) => {
                range = Some(match range {
                    Some((start, end)) => (start.min(txn.date), end.max(txn.date)),
                    None => (txn.date, txn.date),
                });
                transactions.push(txn);
            }
            None => debug!(
                "Skipping malformed CSV row at line {}: {:?}",
                record.position().map_or(0, |p| p.line()),
                record
            ),
        }
    }

    if transactions.is_empty() {
        return Err(AdvisoryError::InvalidInput(
            "no valid transactions found".to_string(),
        ));
    }

    info!("Parsed {} transactions from CSV statement", transactions.len());

    Ok(ParsedStatement {
        total_transactions: transactions.len(),
        date_range_start: range.map(|r| r.0),
        date_range_end: range.map(|r| r.1),
        accounts: vec![AccountRecord {
            account_number: UNKNOWN_ACCOUNT.to_string(),
            transactions,
        }],
        status: ParseStatus::Completed,
        errors: Vec::new(),
    })
}

fn parse_csv_row(record: &StringRecord) -> Option<RawTransaction> {
    let columns: Vec<&str> = record.iter().map(strip_quotes).collect();
    if columns.len() < 4 {
        return None;
    }

    let date = parse_flexible_date(columns[0])?;
    let signed_amount = parse_stripped_amount(columns[2])?;
    let balance = parse_stripped_amount(columns[3]);

    Some(RawTransaction {
        date,
        description: columns[1].to_string(),
        amount: signed_amount.abs(),
        transaction_type: Some(TransactionType::from_signed_amount(signed_amount)),
        balance,
        category: None,
        counterparty: None,
    })
}

fn strip_quotes(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

/// PDF extraction is not available; the result is flagged `partial` so callers
/// know the single transaction it carries is a stand-in.
fn parse_pdf_placeholder() -> ParsedStatement {
    let today = chrono::Utc::now().date_naive();

    ParsedStatement {
        total_transactions: 1,
        date_range_start: Some(today),
        date_range_end: Some(today),
        accounts: vec![AccountRecord {
            account_number: UNKNOWN_ACCOUNT.to_string(),
            transactions: vec![RawTransaction {
                date: today,
                description: "PDF statement (content not extracted)".to_string(),
                amount: 0.0,
                transaction_type: Some(TransactionType::Credit),
                balance: None,
                category: None,
                counterparty: None,
            }],
        }],
        status: ParseStatus::Partial,
        errors: vec![PDF_PLACEHOLDER_ERROR.to_string()],
    }
}

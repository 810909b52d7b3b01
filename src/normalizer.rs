use crate::schema::{ParseResult, RawTransaction, Transaction, TransactionPage, TransactionType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;

pub const DEFAULT_CATEGORY: &str = "Other";

/// Ordered keyword rules; the first rule with a matching keyword wins.
const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("Payroll", &["payroll", "salary", "wage"]),
    ("Transfers", &["transfer", "wire"]),
    ("Vendor Payments", &["vendor", "supplier", "payment"]),
    ("Investment Income", &["interest", "dividend"]),
    ("Bank Fees", &["fee", "charge"]),
    ("Financing", &["loan", "credit"]),
    ("Taxes", &["tax", "irs"]),
    ("Utilities", &["utilities", "electric", "gas"]),
    ("Rent & Facilities", &["rent", "lease"]),
];

static COUNTERPARTY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"FROM\s+([A-Z\s]+)",
        r"TO\s+([A-Z\s]+)",
        r"^([A-Z\s]+)\s+PAYMENT",
        r"WIRE\s+([A-Z\s]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Infers a spending category from a free-text description.
pub fn categorize(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Pulls a counterparty name out of an upper-case bank description.
pub fn extract_counterparty(description: &str) -> Option<String> {
    COUNTERPARTY_PATTERNS.iter().find_map(|re| {
        re.captures(description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

fn normalize_one(raw: &RawTransaction, id: String, account_id: &str) -> Transaction {
    let transaction_type = raw
        .transaction_type
        .unwrap_or_else(|| TransactionType::from_signed_amount(raw.amount));

    let category = match &raw.category {
        Some(c) if !c.trim().is_empty() => c.clone(),
        _ => categorize(&raw.description).to_string(),
    };

    let counterparty = match &raw.counterparty {
        Some(c) if !c.trim().is_empty() => Some(c.clone()),
        _ => extract_counterparty(&raw.description),
    };

    Transaction {
        id,
        date: raw.date,
        amount: raw.amount.abs(),
        transaction_type,
        category,
        description: raw.description.clone(),
        counterparty,
        balance_after: raw.balance,
        account_id: account_id.to_string(),
    }
}

/// Flattens every account of every parse result into one transaction list,
/// in parse-result, account, then row order.
pub fn normalize(parse_results: &[ParseResult]) -> Vec<Transaction> {
    let mut transactions = Vec::new();

    for result in parse_results {
        for account in &result.statement.accounts {
            for (index, raw) in account.transactions.iter().enumerate() {
                let id = format!("{}-{}-{}", result.id, account.account_number, index);
                transactions.push(normalize_one(raw, id, &account.account_number));
            }
        }
    }

    transactions
}

/// Newest-first ordering. The sort is stable, so same-day transactions keep
/// their flattened order.
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|t| Reverse(t.date));
}

/// Returns the 1-based `page` of `limit` transactions, newest first.
pub fn paginate(mut transactions: Vec<Transaction>, page: usize, limit: usize) -> TransactionPage {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = transactions.len();

    sort_newest_first(&mut transactions);

    let start = (page - 1).saturating_mul(limit).min(total);
    let end = page.saturating_mul(limit).min(total);

    TransactionPage {
        transactions: transactions.drain(start..end).collect(),
        page,
        limit,
        total,
        total_pages: total.div_ceil(limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AccountRecord, ParseStatus, ParsedStatement};
    use chrono::NaiveDate;

    fn raw(day: u32, description: &str, amount: f64) -> RawTransaction {
        RawTransaction {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description: description.to_string(),
            amount,
            transaction_type: None,
            balance: Some(1000.0),
            category: None,
            counterparty: None,
        }
    }

    fn parse_result(id: &str, accounts: Vec<AccountRecord>) -> ParseResult {
        ParseResult {
            id: id.to_string(),
            statement_file_id: format!("file-{}", id),
            statement: ParsedStatement {
                total_transactions: accounts.iter().map(|a| a.transactions.len()).sum(),
                date_range_start: None,
                date_range_end: None,
                accounts,
                status: ParseStatus::Completed,
                errors: Vec::new(),
            },
        }
    }

    #[test]
    fn test_categorize_rule_order() {
        assert_eq!(categorize("vendor payment"), "Vendor Payments");
        assert_eq!(categorize("Quarterly TAX PAYMENT"), "Vendor Payments");
        assert_eq!(categorize("IRS estimated tax"), "Taxes");
        assert_eq!(categorize("Monthly Salary run"), "Payroll");
        assert_eq!(categorize("Wire transfer out"), "Transfers");
        assert_eq!(categorize("Dividend received"), "Investment Income");
        assert_eq!(categorize("Office lease"), "Rent & Facilities");
        assert_eq!(categorize("Lunch"), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_categorize_is_deterministic() {
        let description = "ACH DEBIT ELECTRIC CO";
        assert_eq!(categorize(description), categorize(description));
        assert_eq!(categorize(description), "Utilities");
    }

    #[test]
    fn test_extract_counterparty() {
        assert_eq!(
            extract_counterparty("INCOMING WIRE FROM ACME CORP").as_deref(),
            Some("ACME CORP")
        );
        assert_eq!(
            extract_counterparty("TRANSFER TO GLOBEX LLC").as_deref(),
            Some("GLOBEX LLC")
        );
        assert_eq!(
            extract_counterparty("INITECH PAYMENT").as_deref(),
            Some("INITECH")
        );
        assert_eq!(
            extract_counterparty("WIRE HOOLI INC").as_deref(),
            Some("HOOLI INC")
        );
        assert_eq!(extract_counterparty("card purchase 1234"), None);
    }

    #[test]
    fn test_normalize_flattens_and_infers() {
        let mut explicit = raw(3, "misc", 40.0);
        explicit.transaction_type = Some(TransactionType::Debit);
        explicit.category = Some("Travel".to_string());
        explicit.counterparty = Some("Airline".to_string());

        let results = vec![
            parse_result(
                "pr1",
                vec![AccountRecord {
                    account_number: "ACC-1".to_string(),
                    transactions: vec![raw(1, "PAYROLL RUN", -5000.0), explicit],
                }],
            ),
            parse_result(
                "pr2",
                vec![AccountRecord {
                    account_number: "ACC-2".to_string(),
                    transactions: vec![raw(2, "WIRE FROM ACME", 800.0)],
                }],
            ),
        ];

        let txns = normalize(&results);
        assert_eq!(txns.len(), 3);

        assert_eq!(txns[0].id, "pr1-ACC-1-0");
        assert_eq!(txns[0].amount, 5000.0);
        assert_eq!(txns[0].transaction_type, TransactionType::Debit);
        assert_eq!(txns[0].category, "Payroll");

        assert_eq!(txns[1].id, "pr1-ACC-1-1");
        assert_eq!(txns[1].category, "Travel");
        assert_eq!(txns[1].counterparty.as_deref(), Some("Airline"));
        assert_eq!(txns[1].transaction_type, TransactionType::Debit);

        assert_eq!(txns[2].id, "pr2-ACC-2-0");
        assert_eq!(txns[2].transaction_type, TransactionType::Credit);
        assert_eq!(txns[2].category, "Transfers");
        assert_eq!(txns[2].counterparty.as_deref(), Some("ACME"));
        assert_eq!(txns[2].account_id, "ACC-2");
    }

    #[test]
    fn test_paginate_newest_first_with_stable_ties() {
        let results = vec![parse_result(
            "pr",
            vec![AccountRecord {
                account_number: "A".to_string(),
                transactions: vec![
                    raw(1, "a", 1.0),
                    raw(5, "b", 2.0),
                    raw(5, "c", 3.0),
                    raw(3, "d", 4.0),
                    raw(2, "e", 5.0),
                ],
            }],
        )];
        let txns = normalize(&results);

        let first = paginate(txns.clone(), 1, 2);
        assert_eq!(first.total, 5);
        assert_eq!(first.total_pages, 3);
        let ids: Vec<&str> = first.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["pr-A-1", "pr-A-2"]);

        let last = paginate(txns.clone(), 3, 2);
        assert_eq!(last.transactions.len(), 1);
        assert_eq!(last.transactions[0].id, "pr-A-0");

        let beyond = paginate(txns, 9, 2);
        assert!(beyond.transactions.is_empty());
    }

    #[test]
    fn test_paginate_huge_page_and_limit() {
        let results = vec![parse_result(
            "pr",
            vec![AccountRecord {
                account_number: "A".to_string(),
                transactions: vec![raw(1, "a", 1.0), raw(2, "b", 2.0)],
            }],
        )];
        let txns = normalize(&results);

        let far = paginate(txns.clone(), usize::MAX, 2);
        assert!(far.transactions.is_empty());
        assert_eq!(far.page, usize::MAX);
        assert_eq!(far.total, 2);

        let all = paginate(txns.clone(), 1, usize::MAX);
        assert_eq!(all.transactions.len(), 2);
        assert_eq!(all.total_pages, 1);

        let both = paginate(txns, usize::MAX, usize::MAX);
        assert!(both.transactions.is_empty());
    }
}

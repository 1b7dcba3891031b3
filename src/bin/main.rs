// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The points-ledger authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use points_ledger::{
    AccountId, Engine, Principal, Role, TransactionId, TransactionRequest,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Points Ledger - Replay a transaction CSV against a fresh engine
///
/// Reads transactions from a CSV file and outputs final account balances
/// to stdout. Supports purchases, redemptions, transfers, and adjustments;
/// accounts are registered as members on first reference. Purchases and
/// adjustments run under a batch superuser principal; redemptions and
/// transfers run as the member they act for.
#[derive(Parser, Debug)]
#[command(name = "points-ledger")]
#[command(about = "Replays a loyalty transaction CSV and prints balances", long_about = None)]
struct Args {
    /// Path to CSV file with transactions
    ///
    /// Expected format: type,account,counterpart,amount,remark
    /// Example: cargo run -- transactions.csv > balances.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

/// Batch operations run under this console principal.
const BATCH_PRINCIPAL: Principal = Principal {
    account: AccountId(0),
    role: Role::Superuser,
};

fn main() {
    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let engine = match process_transactions(BufReader::new(file)) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing transactions: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = write_balances(&engine, std::io::stdout()) {
        eprintln!("Error writing balances: {e}");
        process::exit(1);
    }
}

/// One row of the input CSV. `counterpart` is the recipient for transfers
/// and the related transaction id for adjustments; `amount` is a currency
/// spend for purchases and a point count otherwise.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "type")]
    kind: String,
    account: u32,
    counterpart: Option<u64>,
    amount: Option<Decimal>,
    remark: Option<String>,
}

fn process_transactions<R: Read>(reader: R) -> Result<Engine, Box<dyn std::error::Error>> {
    let engine = Engine::new();
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    for (line, result) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                eprintln!("Skipping malformed row {}: {}", line + 1, e);
                continue;
            }
        };

        match build_request(&engine, &row) {
            Ok(request) => {
                let principal = principal_for(&request);
                if let Err(e) = engine.submit(request, principal) {
                    // Deterministic rejections are reported, not retried.
                    eprintln!("Row {} rejected: {}", line + 1, e);
                }
            }
            Err(e) => eprintln!("Skipping row {}: {}", line + 1, e),
        }
    }

    Ok(engine)
}

/// Registers the row's account on first sight and maps it to a request.
fn build_request(engine: &Engine, row: &CsvRow) -> Result<TransactionRequest, String> {
    let account = AccountId(row.account);
    ensure_registered(engine, account);
    let remark = row.remark.clone().unwrap_or_default();

    match row.kind.as_str() {
        "purchase" => Ok(TransactionRequest::Purchase {
            account,
            spend: row.amount.ok_or("purchase requires an amount")?,
            promotion_ids: vec![],
            remark,
        }),
        "redemption" => Ok(TransactionRequest::Redemption {
            account,
            amount: points(row.amount)?,
            remark,
        }),
        "transfer" => {
            let recipient = AccountId(
                row.counterpart.ok_or("transfer requires a counterpart")? as u32,
            );
            ensure_registered(engine, recipient);
            Ok(TransactionRequest::Transfer {
                sender: account,
                recipient,
                amount: points(row.amount)?,
                remark,
            })
        }
        "adjustment" => Ok(TransactionRequest::Adjustment {
            account,
            related: TransactionId(
                row.counterpart.ok_or("adjustment requires a related transaction")?,
            ),
            delta: points(row.amount)?,
            remark,
        }),
        other => Err(format!("unknown transaction type '{other}'")),
    }
}

fn principal_for(request: &TransactionRequest) -> Principal {
    match request {
        // Member-initiated kinds act as the member itself.
        TransactionRequest::Redemption { account, .. } => Principal::new(*account, Role::Member),
        TransactionRequest::Transfer { sender, .. } => Principal::new(*sender, Role::Member),
        _ => BATCH_PRINCIPAL,
    }
}

fn ensure_registered(engine: &Engine, id: AccountId) {
    // Duplicate registration just means the account already exists.
    let _ = engine.register(id, Role::Member);
}

fn points(amount: Option<Decimal>) -> Result<i64, String> {
    amount
        .and_then(|a| a.to_i64())
        .ok_or_else(|| "amount must be a whole point count".to_string())
}

fn write_balances<W: Write>(engine: &Engine, writer: W) -> Result<(), Box<dyn std::error::Error>> {
    let mut csv_writer = Writer::from_writer(writer);
    for summary in engine.balances() {
        csv_writer.serialize(summary)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_purchases_and_transfers() {
        let input = "\
type,account,counterpart,amount,remark
purchase,1,,100,coffee run
purchase,2,,50,
transfer,1,2,30,thanks
";
        let engine = process_transactions(input.as_bytes()).unwrap();
        assert_eq!(engine.balance(AccountId(1)).unwrap().balance, 70);
        assert_eq!(engine.balance(AccountId(2)).unwrap().balance, 80);
    }

    #[test]
    fn rejected_rows_do_not_abort_the_batch() {
        let input = "\
type,account,counterpart,amount,remark
purchase,1,,100,
transfer,1,2,5000,too much
purchase,1,,10,
";
        let engine = process_transactions(input.as_bytes()).unwrap();
        // The oversized transfer was rejected; both purchases landed.
        assert_eq!(engine.balance(AccountId(1)).unwrap().balance, 110);
    }

    #[test]
    fn writes_balances_as_csv() {
        let input = "\
type,account,counterpart,amount,remark
purchase,7,,25,
";
        let engine = process_transactions(input.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_balances(&engine, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("account"));
        assert!(text.contains("7"));
        assert!(text.contains("25"));
    }
}

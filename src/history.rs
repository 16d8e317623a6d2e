use std::io;

use color_eyre::eyre::{Result, eyre};
use csv::WriterBuilder;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::api::{TransactionRecord, WalletApi};

#[derive(Debug, Serialize, PartialEq)]
struct HistoryRow<'a> {
    #[serde(rename = "tx")]
    id: &'a str,
    #[serde(rename = "type")]
    transaction_type: &'a str,
    amount: Option<Decimal>,
    status: &'a str,
    date: &'a str,
    description: &'a str,
}

impl<'a> From<&'a TransactionRecord> for HistoryRow<'a> {
    fn from(r: &'a TransactionRecord) -> Self {
        HistoryRow {
            id: &r.id,
            transaction_type: &r.transaction_type,
            amount: r.amount,
            status: &r.status,
            date: &r.created_at,
            description: &r.description,
        }
    }
}

pub fn write_history_csv<W: io::Write>(records: &[TransactionRecord], out: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(out);

    for record in records {
        csv_writer.serialize(HistoryRow::from(record))?;
    }
    csv_writer.flush().map_err(|e| eyre!(e))?;

    Ok(())
}

pub async fn print_history_csv(api: &dyn WalletApi) -> Result<()> {
    let records = api
        .transactions()
        .await
        .map_err(|e| eyre!("Could not fetch transactions: {}", e.user_message()))?;

    write_history_csv(&records, io::stdout())
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use crate::{api::TransactionRecord, history::write_history_csv};

    #[test]
    fn writes_rows_with_header() {
        let records = vec![
            TransactionRecord {
                id: "t1".to_owned(),
                transaction_type: "debit".to_owned(),
                amount: Some(dec!(20.5)),
                description: "snacks, drinks".to_owned(),
                status: "completed".to_owned(),
                created_at: "2024-05-01".to_owned(),
            },
            TransactionRecord {
                id: "t2".to_owned(),
                transaction_type: "credit".to_owned(),
                amount: None,
                description: "".to_owned(),
                status: "pending".to_owned(),
                created_at: "".to_owned(),
            },
        ];

        let mut out = vec![];
        write_history_csv(&records, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "tx,type,amount,status,date,description\n\
             t1,debit,20.5,completed,2024-05-01,\"snacks, drinks\"\n\
             t2,credit,,pending,,\n"
        );
    }

    #[test]
    fn empty_history_writes_nothing() {
        let mut out = vec![];
        write_history_csv(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }
}

use crate::error::CliError;
use model::job::JobReceipt;

pub fn print_receipt_json(receipt: &JobReceipt) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(receipt)?;
    println!("{json}");
    Ok(())
}

pub fn print_receipt_table(label: &str, receipt: &JobReceipt) {
    println!("Bulk job '{label}':");
    println!("-----------------------------");
    println!("{:<16} {}", "Status", receipt.status);
    println!("{:<16} {}", "Count", receipt.count);
    println!("{:<16} {}", "Failed docs", receipt.failed.len());
    println!("{:<16} {}", "Completed at", receipt.completed_at.to_rfc3339());

    for failure in &receipt.failed {
        println!("  {:<14} {:?}: {}", failure.id, failure.kind, failure.reason);
    }
}

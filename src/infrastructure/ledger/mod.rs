mod memory_ledger;
mod pg_ledger;

pub use memory_ledger::MemoryLedger;
pub use pg_ledger::PgLedger;

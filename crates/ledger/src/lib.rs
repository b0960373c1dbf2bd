//! Credit ledger: atomic, bounded-balance credit movements.

pub mod ledger;

pub use ledger::{CreditLedger, DeductOutcome, TransferOutcome};

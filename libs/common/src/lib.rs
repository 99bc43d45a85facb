pub mod extract;
pub mod redeem;

pub use extract::extract_voucher_code;
pub use redeem::{RedeemClient, RedeemOutcome};

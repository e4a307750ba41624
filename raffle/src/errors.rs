use near_sdk::Balance;

use crate::interfaces::raffle::RaffleState;

pub const ERR_ENTRANCE_FEE_ZERO: &str = "Entrance fee must be positive";
pub const ERR_INTERVAL_ZERO: &str = "Interval must be positive";
pub const ERR_ROUND_NOT_OPEN: &str = "Raffle is not open";
pub const ERR_INSUFFICIENT_PAYMENT: &str = "Attached deposit is below the entrance fee";
pub const ERR_UPKEEP_NOT_NEEDED: &str = "Upkeep is not needed";
pub const ERR_ONLY_COORDINATOR: &str = "Only the VRF coordinator can fulfill random words";
pub const ERR_UNKNOWN_REQUEST: &str = "Unknown randomness request";
pub const ERR_NO_RANDOM_WORDS: &str = "No random words were provided";
pub const ERR_PAYOUT_FAILED: &str = "Account balance cannot cover the prize payout";
pub const ERR_INDEX_OUT_OF_RANGE: &str = "Player index is out of range";
pub const ERR_NOT_OWNER: &str = "Only the owner can call this method";
pub const ERR_NO_PENDING_REQUEST: &str = "No randomness request is pending";
pub const ERR_REQUEST_NOT_STALLED: &str = "Pending randomness request is not stalled yet";

pub fn upkeep_not_needed(prize_pool: Balance, num_players: u64, state: &RaffleState) -> String {
    return format!(
        "{}: prize pool {}, players {}, state {:?}",
        ERR_UPKEEP_NOT_NEEDED, prize_pool, num_players, state
    );
}

pub mod raffle {
    use common::types::{RandomWord, RequestId, RoundId};
    use near_sdk::json_types::{Base64VecU8, U128};
    use near_sdk::{borsh::{self, BorshDeserialize, BorshSerialize}, serde::{Serialize, Deserialize}};
    use near_sdk::AccountId;

    /// Lifecycle of a round. Entries are accepted only while `Open`;
    /// a randomness request is outstanding while `Calculating`.
    #[derive(Clone, Copy, Debug, PartialEq)]
    #[derive(BorshDeserialize, BorshSerialize)]
    #[derive(Serialize, Deserialize)]
    #[serde(crate = "near_sdk::serde")]
    pub enum RaffleState {
        Open,
        Calculating,
    }

    /// A completed round, kept in the round history buffer.
    #[derive(Clone, Debug, PartialEq)]
    #[derive(BorshDeserialize, BorshSerialize)]
    #[derive(Serialize, Deserialize)]
    #[serde(crate = "near_sdk::serde")]
    pub struct RoundResult {
        pub round_id: RoundId,
        pub request_id: RequestId,
        pub winner: AccountId,
        pub prize: U128,
        pub players: Vec<AccountId>,
        pub started_at: u64,
        pub completed_at: u64,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(crate = "near_sdk::serde")]
    pub struct UpkeepCheck {
        pub upkeep_needed: bool,
        pub perform_data: Base64VecU8,
    }

    pub trait RaffleEntry{
        fn enter(&mut self);
    }

    pub trait RaffleUpkeep{
        fn check_upkeep(&self, check_data: Option<Base64VecU8>) -> UpkeepCheck;
        fn perform_upkeep(&mut self, perform_data: Option<Base64VecU8>);
    }

    pub trait RandomnessConsumer{
        fn fulfill_random_words(&mut self, request_id: RequestId, random_words: Vec<RandomWord>);
    }

    pub trait RoundBuffer{
        fn get_round(&self, round_id: RoundId) -> Option<RoundResult>;
    }

    pub trait RoundRegister{
        fn get_rounds(&self, from_index: u32, limit: u32) -> Vec<RoundResult>;
    }
}

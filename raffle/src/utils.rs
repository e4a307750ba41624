use near_sdk::require;

use crate::errors;
use crate::Contract;
use crate::env;

pub mod storage_keys{
    use near_sdk::BorshStorageKey;
    use near_sdk::borsh::{self, BorshSerialize};

    #[derive(BorshStorageKey, BorshSerialize)]
    pub enum StorageKeys {
        Players,
    }
}

impl Contract{
    pub(crate) fn assert_owner(&self){
        require!(self.owner_id == env::signer_account_id(), errors::ERR_NOT_OWNER);
    }
}

pub mod gas{
    use near_sdk::{Gas};

    pub const REQUEST_RANDOM_WORDS: Gas = Gas(25_000_000_000_000);
    pub const ON_RANDOM_WORDS_REQUESTED: Gas = Gas(10_000_000_000_000);
}

use near_sdk::AccountId;
use near_sdk::Balance;

pub fn raffle() -> AccountId {
    "raffle".parse().unwrap()
}

pub fn coordinator() -> AccountId {
    "coordinator".parse().unwrap()
}

pub fn owner() -> AccountId {
    "owner".parse().unwrap()
}

pub fn alice() -> AccountId {
    "alice".parse().unwrap()
}
pub fn bob() -> AccountId {
    "bob".parse().unwrap()
}
pub fn charlie() -> AccountId {
    "charlie".parse().unwrap()
}

pub fn player(idx: u64) -> AccountId {
    format!("player{}", idx).parse().unwrap()
}

pub fn ntoy(near_amount: Balance) -> Balance {
    near_amount * 10u128.pow(24)
}

#[cfg(test)]
pub mod tests {
    use near_sdk::json_types::U128;
    use near_sdk::test_utils::VMContextBuilder;
    use near_sdk::{testing_env, VMContext};

    use crate::*;

    use super::*;

    pub const ENTRANCE_FEE: Balance = 10u128.pow(24);
    pub const INTERVAL_SECONDS: u64 = 10;
    pub const CALLBACK_GAS: u64 = 50_000_000_000_000;
    pub const CONTRACT_STORAGE_BYTES: u64 = 1_000;

    pub struct Emulator {
        pub contract: Contract,
        pub block_timestamp: u64,
        pub account_balance: Balance,
        pub context: VMContext,
    }

    impl Emulator {
        pub fn new() -> Self {
            let context = VMContextBuilder::new()
                .current_account_id(raffle())
                .account_balance(ntoy(10))
                .build();
            testing_env!(context.clone());
            let contract = Contract::new(
                owner(),
                coordinator(),
                U128(ENTRANCE_FEE),
                INTERVAL_SECONDS,
                CALLBACK_GAS,
            );
            Emulator {
                contract,
                block_timestamp: 0,
                account_balance: ntoy(10),
                context,
            }
        }

        pub fn update_context(&mut self, caller: AccountId, deposit: Balance) {
            self.context = VMContextBuilder::new()
                .current_account_id(raffle())
                .predecessor_account_id(caller.clone())
                .signer_account_id(caller)
                .attached_deposit(deposit)
                .account_balance(self.account_balance)
                .storage_usage(CONTRACT_STORAGE_BYTES)
                .block_timestamp(self.block_timestamp)
                .build();
            testing_env!(self.context.clone());
        }

        /// block timestamps only move forward
        pub fn skip_time(&mut self, seconds: u64) {
            self.block_timestamp += seconds * 1_000_000_000;
            self.update_context(raffle(), 0);
        }

        pub fn enter(&mut self, player: AccountId, deposit: Balance) {
            self.update_context(player, deposit);
            self.contract.enter();
            self.account_balance += deposit;
        }

        /// performs upkeep as an arbitrary third party, the trigger is untrusted
        pub fn run_upkeep(&mut self) {
            self.update_context(alice(), 0);
            self.contract.perform_upkeep(None);
        }

        pub fn fulfill(&mut self, request_id: RequestId, words: Vec<u64>) {
            self.update_context(coordinator(), 0);
            self.contract
                .fulfill_random_words(request_id, words.into_iter().map(RandomWord::from).collect());
        }
    }
}

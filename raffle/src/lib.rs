use common::generic_ring_buffer::{GenericRingBuffer, RingBuffer, Identifier};
use common::types::{RandomWord, RequestId, RoundId};
use near_sdk::collections::Vector;
use near_sdk::json_types::{Base64VecU8, U128};
use near_sdk::{env, ext_contract, log, near_bindgen, require, AccountId, Balance, Gas, PanicOnDefault, Promise, PromiseError};
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use interfaces::raffle::{RaffleEntry, RaffleState, RaffleUpkeep, RandomnessConsumer, RoundBuffer, RoundRegister, RoundResult, UpkeepCheck};
use utils::storage_keys::StorageKeys;
use utils::gas;

pub mod external;
pub use crate::external::*;

mod errors;
mod events;
mod interfaces;
mod utils;

/// Random words requested from the coordinator per round. Winner selection
/// only consumes the first word.
pub const NUM_WORDS: u32 = 1;

const ROUND_BUFFER_CAPACITY: usize = 16;
const REQUEST_STALL_TIMEOUT_MS: u64 = 60 * 60 * 1000;

#[cfg(test)]
mod test_utils;

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Contract{
    owner_id: AccountId,
    vrf_coordinator: AccountId,
    entrance_fee: Balance,
    /// minimum round duration in seconds
    interval: u64,
    callback_gas_limit: Gas,
    state: RaffleState,
    players: Vector<AccountId>,
    /// sum of all entry deposits of the current round
    prize_pool: Balance,
    /// when the current round started, in ms
    last_time_stamp: u64,
    recent_winner: Option<AccountId>,
    pending_request_id: Option<RequestId>,
    request_issued_at: u64,
    request_counter: RequestId,
    round_id: RoundId,
    rounds: GenericRingBuffer<RoundResult, ROUND_BUFFER_CAPACITY>,
}

impl Identifier<RoundId> for RoundResult{
    fn id(&self) -> RoundId {
        self.round_id
    }
}

#[near_bindgen]
impl Contract{
    #[init]
    pub fn new(
        owner_id: AccountId,
        vrf_coordinator: AccountId,
        entrance_fee: U128,
        interval: u64,
        callback_gas_limit: u64,
    ) -> Self{
        require!(entrance_fee.0 > 0, errors::ERR_ENTRANCE_FEE_ZERO);
        require!(interval > 0, errors::ERR_INTERVAL_ZERO);

        Self {
            owner_id,
            vrf_coordinator,
            entrance_fee: entrance_fee.0,
            interval,
            callback_gas_limit: Gas(callback_gas_limit),
            state: RaffleState::Open,
            players: Vector::new(StorageKeys::Players),
            prize_pool: 0,
            last_time_stamp: env::block_timestamp_ms(),
            recent_winner: None,
            pending_request_id: None,
            request_issued_at: 0,
            request_counter: 0,
            round_id: 0,
            rounds: GenericRingBuffer::new(),
        }
    }

    /// Owner escape hatch for a coordinator that accepted a request and then
    /// went silent. Reopens the round without touching players or the prize
    /// pool; the cleared request id makes any late fulfillment fail.
    pub fn recover_stalled_request(&mut self){
        self.assert_owner();
        require!(self.state == RaffleState::Calculating, errors::ERR_NO_PENDING_REQUEST);
        require!(
            env::block_timestamp_ms() >= self.request_issued_at + REQUEST_STALL_TIMEOUT_MS,
            errors::ERR_REQUEST_NOT_STALLED
        );

        let request_id = self
            .pending_request_id
            .unwrap_or_else(|| env::panic_str(errors::ERR_NO_PENDING_REQUEST));

        self.reopen_round();
        events::events::raffle_round_recovered(request_id);
    }

    pub fn get_entrance_fee(&self) -> U128{
        U128(self.entrance_fee)
    }

    pub fn get_interval(&self) -> u64{
        self.interval
    }

    pub fn get_raffle_state(&self) -> RaffleState{
        self.state
    }

    pub fn get_player(&self, index: u32) -> AccountId{
        return self
            .players
            .get(index as u64)
            .unwrap_or_else(|| env::panic_str(errors::ERR_INDEX_OUT_OF_RANGE));
    }

    pub fn get_number_of_players(&self) -> u32{
        self.players.len() as u32
    }

    pub fn get_recent_winner(&self) -> Option<AccountId>{
        self.recent_winner.clone()
    }

    pub fn get_latest_time_stamp(&self) -> u64{
        self.last_time_stamp
    }

    pub fn get_prize_pool(&self) -> U128{
        U128(self.prize_pool)
    }

    pub fn get_pending_request_id(&self) -> Option<RequestId>{
        self.pending_request_id
    }

    pub fn get_num_words(&self) -> u32{
        NUM_WORDS
    }

    pub fn get_vrf_coordinator(&self) -> AccountId{
        self.vrf_coordinator.clone()
    }

    pub fn get_callback_gas_limit(&self) -> u64{
        self.callback_gas_limit.0
    }

    pub fn get_owner_id(&self) -> AccountId{
        self.owner_id.clone()
    }
}

impl Contract{
    fn is_upkeep_needed(&self) -> bool{
        let is_open = self.state == RaffleState::Open;
        let interval_elapsed = env::block_timestamp_ms() >= self.last_time_stamp + self.interval * 1000;
        let has_players = !self.players.is_empty();
        let has_balance = self.prize_pool > 0;

        return is_open && interval_elapsed && has_players && has_balance;
    }

    pub(crate) fn reopen_round(&mut self){
        self.state = RaffleState::Open;
        self.pending_request_id = None;
        self.request_issued_at = 0;
    }
}

#[near_bindgen]
impl RaffleEntry for Contract{
    #[payable]
    fn enter(&mut self) {
        require!(self.state == RaffleState::Open, errors::ERR_ROUND_NOT_OPEN);
        require!(env::attached_deposit() >= self.entrance_fee, errors::ERR_INSUFFICIENT_PAYMENT);

        let player = env::predecessor_account_id();
        self.players.push(&player);
        self.prize_pool += env::attached_deposit();

        events::events::raffle_enter(&player, env::attached_deposit());
    }
}

#[near_bindgen]
impl RaffleUpkeep for Contract{
    fn check_upkeep(&self, _check_data: Option<Base64VecU8>) -> UpkeepCheck {
        UpkeepCheck {
            upkeep_needed: self.is_upkeep_needed(),
            perform_data: Base64VecU8::from(vec![]),
        }
    }

    fn perform_upkeep(&mut self, _perform_data: Option<Base64VecU8>) {
        if !self.is_upkeep_needed(){
            env::panic_str(&errors::upkeep_not_needed(
                self.prize_pool,
                self.players.len(),
                &self.state,
            ));
        }

        self.state = RaffleState::Calculating;
        self.request_counter += 1;
        let request_id = self.request_counter;
        self.pending_request_id = Some(request_id);
        self.request_issued_at = env::block_timestamp_ms();

        events::events::requested_raffle_winner(request_id);

        ext_vrf_coordinator::request_random_words(
            request_id,
            NUM_WORDS,
            self.callback_gas_limit.0,
            self.vrf_coordinator.clone(),
            0,
            gas::REQUEST_RANDOM_WORDS,
        )
        .then(this_contract::on_random_words_requested(
            request_id,
            env::current_account_id(),
            0,
            gas::ON_RANDOM_WORDS_REQUESTED,
        ));
    }
}

#[near_bindgen]
impl RandomnessConsumer for Contract{
    fn fulfill_random_words(&mut self, request_id: RequestId, random_words: Vec<RandomWord>) {
        require!(
            env::predecessor_account_id() == self.vrf_coordinator,
            errors::ERR_ONLY_COORDINATOR
        );
        require!(
            self.state == RaffleState::Calculating && self.pending_request_id == Some(request_id),
            errors::ERR_UNKNOWN_REQUEST
        );
        require!(!random_words.is_empty(), errors::ERR_NO_RANDOM_WORDS);

        let winner_index = (random_words[0] % RandomWord::from(self.players.len())).as_u64();
        let winner = self
            .players
            .get(winner_index)
            .unwrap_or_else(|| env::panic_str(errors::ERR_INDEX_OUT_OF_RANGE));

        // The payout must be known to be coverable before any state is
        // mutated, so a failure here rolls the whole fulfillment back and the
        // round stays claimable under the same request id.
        let prize = self.prize_pool;
        let storage_cost = env::storage_byte_cost() * Balance::from(env::storage_usage());
        require!(env::account_balance() >= prize + storage_cost, errors::ERR_PAYOUT_FAILED);

        let completed_at = env::block_timestamp_ms();
        self.round_id += 1;
        self.rounds.add(&RoundResult {
            round_id: self.round_id,
            request_id,
            winner: winner.clone(),
            prize: U128(prize),
            players: self.players.to_vec(),
            started_at: self.last_time_stamp,
            completed_at,
        });

        self.recent_winner = Some(winner.clone());
        self.players.clear();
        self.prize_pool = 0;
        self.pending_request_id = None;
        self.request_issued_at = 0;
        self.state = RaffleState::Open;
        self.last_time_stamp = completed_at;

        events::events::winner_picked(&winner, prize);

        Promise::new(winner).transfer(prize);
    }
}

#[near_bindgen]
impl RoundBuffer for Contract{
    fn get_round(&self, round_id: RoundId) -> Option<RoundResult>{
        return self.rounds.get_by_identifier(round_id);
    }
}

#[near_bindgen]
impl RoundRegister for Contract{
    fn get_rounds(&self, from_index: u32, limit: u32) -> Vec<RoundResult>{
        return self.rounds.values
            .iter()
            .cloned()
            .skip(from_index as usize)
            .take(limit as usize)
            .collect::<Vec<RoundResult>>();
    }
}

#[cfg(test)]
pub mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use near_sdk::test_utils::{get_logs, VMContextBuilder};
    use near_sdk::testing_env;
    use rand::Rng;

    use super::*;
    use crate::test_utils::tests::*;
    use crate::test_utils::*;

    #[test]
    fn test_new_starts_open_round(){
        let emulator = Emulator::new();

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Open);
        assert_eq!(emulator.contract.get_number_of_players(), 0);
        assert_eq!(emulator.contract.get_prize_pool(), U128(0));
        assert_eq!(emulator.contract.get_entrance_fee(), U128(ENTRANCE_FEE));
        assert_eq!(emulator.contract.get_interval(), INTERVAL_SECONDS);
        assert_eq!(emulator.contract.get_recent_winner(), None);
        assert_eq!(emulator.contract.get_pending_request_id(), None);
        assert_eq!(emulator.contract.get_latest_time_stamp(), 0);
        assert_eq!(emulator.contract.get_num_words(), 1);
        assert_eq!(emulator.contract.get_vrf_coordinator(), coordinator());
        assert_eq!(emulator.contract.get_owner_id(), owner());
        assert_eq!(emulator.contract.get_callback_gas_limit(), CALLBACK_GAS);
    }

    #[test]
    #[should_panic(expected = "Entrance fee must be positive")]
    fn test_new_rejects_zero_entrance_fee(){
        testing_env!(VMContextBuilder::new().current_account_id(raffle()).build());
        Contract::new(owner(), coordinator(), U128(0), INTERVAL_SECONDS, CALLBACK_GAS);
    }

    #[test]
    #[should_panic(expected = "Interval must be positive")]
    fn test_new_rejects_zero_interval(){
        testing_env!(VMContextBuilder::new().current_account_id(raffle()).build());
        Contract::new(owner(), coordinator(), U128(ENTRANCE_FEE), 0, CALLBACK_GAS);
    }

    #[test]
    fn test_enter_records_player_and_deposit(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(bob(), ENTRANCE_FEE * 2);

        assert_eq!(emulator.contract.get_number_of_players(), 2);
        assert_eq!(emulator.contract.get_player(0), alice());
        assert_eq!(emulator.contract.get_player(1), bob());
        assert_eq!(emulator.contract.get_prize_pool(), U128(ENTRANCE_FEE * 3));
    }

    #[test]
    fn test_enter_emits_event(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);

        let logs = get_logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].starts_with("EVENT_JSON:"));
        assert!(logs[0].contains("raffle_enter"));
        assert!(logs[0].contains("alice"));
    }

    #[test]
    #[should_panic(expected = "Attached deposit is below the entrance fee")]
    fn test_enter_with_insufficient_deposit(){
        let mut emulator = Emulator::new();
        emulator.enter(alice(), ENTRANCE_FEE - 1);
    }

    #[test]
    fn test_enter_twice_records_two_entries(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(alice(), ENTRANCE_FEE);

        assert_eq!(emulator.contract.get_number_of_players(), 2);
        assert_eq!(emulator.contract.get_player(0), alice());
        assert_eq!(emulator.contract.get_player(1), alice());
    }

    #[test]
    #[should_panic(expected = "Raffle is not open")]
    fn test_enter_while_calculating(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        // full fee attached, rejected anyway
        emulator.enter(bob(), ENTRANCE_FEE);
    }

    #[test]
    #[should_panic(expected = "Player index is out of range")]
    fn test_get_player_out_of_range(){
        let mut emulator = Emulator::new();
        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.contract.get_player(1);
    }

    #[test]
    fn test_check_upkeep_needs_players(){
        let mut emulator = Emulator::new();

        emulator.skip_time(INTERVAL_SECONDS + 1);
        assert_eq!(emulator.contract.check_upkeep(None).upkeep_needed, false);
    }

    #[test]
    fn test_check_upkeep_needs_elapsed_interval(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS - 1);
        assert_eq!(emulator.contract.check_upkeep(None).upkeep_needed, false);

        // the boundary itself counts as elapsed
        emulator.skip_time(1);
        assert_eq!(emulator.contract.check_upkeep(None).upkeep_needed, true);
    }

    #[test]
    fn test_check_upkeep_needs_open_state(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.skip_time(INTERVAL_SECONDS + 1);
        assert_eq!(emulator.contract.check_upkeep(None).upkeep_needed, false);
    }

    #[test]
    fn test_check_upkeep_needs_prize_pool(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.contract.prize_pool = 0;

        assert_eq!(emulator.contract.check_upkeep(None).upkeep_needed, false);
    }

    #[test]
    fn test_check_upkeep_when_all_conditions_hold(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);

        let check = emulator.contract.check_upkeep(None);
        assert_eq!(check.upkeep_needed, true);
        assert!(check.perform_data.0.is_empty());
    }

    #[test]
    fn test_perform_upkeep_requests_randomness(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Calculating);
        assert_eq!(emulator.contract.get_pending_request_id(), Some(1));
        assert_eq!(emulator.contract.request_issued_at, (INTERVAL_SECONDS + 1) * 1000);

        let logs = get_logs();
        assert!(logs.iter().any(|l| l.contains("requested_raffle_winner")));
        assert!(logs.iter().any(|l| l.contains("\"request_id\":1")));
    }

    #[test]
    #[should_panic(expected = "Upkeep is not needed")]
    fn test_perform_upkeep_too_early(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS - 1);
        emulator.run_upkeep();
    }

    #[test]
    #[should_panic(expected = "Upkeep is not needed")]
    fn test_perform_upkeep_while_calculating(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();
    }

    #[test]
    fn test_perform_upkeep_failure_keeps_state(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(1);

        let result = catch_unwind(AssertUnwindSafe(|| emulator.contract.perform_upkeep(None)));
        assert!(result.is_err());

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Open);
        assert_eq!(emulator.contract.get_number_of_players(), 1);
        assert_eq!(emulator.contract.get_prize_pool(), U128(ENTRANCE_FEE));
        assert_eq!(emulator.contract.get_pending_request_id(), None);
    }

    #[test]
    #[should_panic(expected = "Only the VRF coordinator can fulfill random words")]
    fn test_fulfill_rejects_unknown_caller(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.update_context(alice(), 0);
        emulator.contract.fulfill_random_words(1, vec![RandomWord::from(7u64)]);
    }

    #[test]
    #[should_panic(expected = "Unknown randomness request")]
    fn test_fulfill_rejects_unknown_request_id(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.fulfill(2, vec![7]);
    }

    #[test]
    #[should_panic(expected = "Unknown randomness request")]
    fn test_fulfill_before_request(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.fulfill(1, vec![7]);
    }

    #[test]
    #[should_panic(expected = "No random words were provided")]
    fn test_fulfill_requires_words(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.fulfill(1, vec![]);
    }

    #[test]
    fn test_fulfill_picks_winner_by_modulo(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(bob(), ENTRANCE_FEE);
        emulator.enter(charlie(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);

        assert_eq!(emulator.contract.check_upkeep(None).upkeep_needed, true);
        emulator.run_upkeep();
        assert_eq!(emulator.contract.get_pending_request_id(), Some(1));

        // 17 % 3 == 2
        emulator.fulfill(1, vec![17]);

        assert_eq!(emulator.contract.get_recent_winner(), Some(charlie()));
        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Open);
        assert_eq!(emulator.contract.get_number_of_players(), 0);
        assert_eq!(emulator.contract.get_prize_pool(), U128(0));
        assert_eq!(emulator.contract.get_pending_request_id(), None);
        assert_eq!(emulator.contract.get_latest_time_stamp(), (INTERVAL_SECONDS + 1) * 1000);

        let logs = get_logs();
        assert!(logs.iter().any(|l| l.contains("winner_picked") && l.contains("charlie")));
    }

    #[test]
    fn test_fulfill_records_round_history(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(bob(), ENTRANCE_FEE);
        emulator.enter(charlie(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();
        emulator.fulfill(1, vec![17]);

        let round = emulator.contract.get_round(1).unwrap();
        assert_eq!(round.round_id, 1);
        assert_eq!(round.request_id, 1);
        assert_eq!(round.winner, charlie());
        assert_eq!(round.prize, U128(ENTRANCE_FEE * 3));
        assert_eq!(round.players, vec![alice(), bob(), charlie()]);
        assert_eq!(round.started_at, 0);
        assert_eq!(round.completed_at, (INTERVAL_SECONDS + 1) * 1000);

        assert_eq!(emulator.contract.get_round(2), None);
        assert_eq!(emulator.contract.get_rounds(0, 10), vec![round]);
    }

    #[test]
    fn test_round_ids_and_request_ids_increment(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();
        emulator.fulfill(1, vec![0]);

        emulator.enter(bob(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();
        assert_eq!(emulator.contract.get_pending_request_id(), Some(2));
        emulator.fulfill(2, vec![0]);

        assert_eq!(emulator.contract.get_round(1).unwrap().winner, alice());
        assert_eq!(emulator.contract.get_round(2).unwrap().winner, bob());
        assert_eq!(emulator.contract.get_rounds(0, 10).len(), 2);
        assert_eq!(emulator.contract.get_rounds(1, 10).len(), 1);
    }

    #[test]
    #[should_panic(expected = "Unknown randomness request")]
    fn test_fulfill_replay_is_rejected(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(bob(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.fulfill(1, vec![3]);
        emulator.fulfill(1, vec![3]);
    }

    #[test]
    fn test_fulfill_failure_keeps_round_intact(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(bob(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.update_context(coordinator(), 0);
        let result = catch_unwind(AssertUnwindSafe(|| {
            emulator.contract.fulfill_random_words(99, vec![RandomWord::from(3u64)])
        }));
        assert!(result.is_err());

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Calculating);
        assert_eq!(emulator.contract.get_number_of_players(), 2);
        assert_eq!(emulator.contract.get_prize_pool(), U128(ENTRANCE_FEE * 2));
        assert_eq!(emulator.contract.get_pending_request_id(), Some(1));

        // the original request id still completes the round
        emulator.fulfill(1, vec![3]);
        assert_eq!(emulator.contract.get_recent_winner(), Some(bob()));
    }

    #[test]
    fn test_fulfill_payout_guard_keeps_round(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(bob(), ENTRANCE_FEE);
        emulator.enter(charlie(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        // drain the account below the pot, the payout guard must hold
        emulator.account_balance = ntoy(1);
        emulator.update_context(coordinator(), 0);
        let result = catch_unwind(AssertUnwindSafe(|| {
            emulator.contract.fulfill_random_words(1, vec![RandomWord::from(17u64)])
        }));
        assert!(result.is_err());

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Calculating);
        assert_eq!(emulator.contract.get_number_of_players(), 3);
        assert_eq!(emulator.contract.get_prize_pool(), U128(ENTRANCE_FEE * 3));
        assert_eq!(emulator.contract.get_pending_request_id(), Some(1));
        assert_eq!(emulator.contract.get_recent_winner(), None);

        // once the account is funded again the same request succeeds
        emulator.account_balance = ntoy(13);
        emulator.fulfill(1, vec![17]);
        assert_eq!(emulator.contract.get_recent_winner(), Some(charlie()));
    }

    #[test]
    fn test_single_player_always_wins(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        let word = rand::thread_rng().gen::<u64>();
        emulator.fulfill(1, vec![word]);

        assert_eq!(emulator.contract.get_recent_winner(), Some(alice()));
    }

    #[test]
    fn test_winner_index_stays_in_bounds(){
        let mut rng = rand::thread_rng();

        for num_players in 1..=5u64 {
            let mut emulator = Emulator::new();
            for idx in 0..num_players {
                emulator.enter(player(idx), ENTRANCE_FEE);
            }
            emulator.skip_time(INTERVAL_SECONDS + 1);
            emulator.run_upkeep();

            let word = rng.gen::<u64>();
            let expected = player(word % num_players);
            emulator.fulfill(1, vec![word]);

            assert_eq!(emulator.contract.get_recent_winner(), Some(expected));
        }
    }

    #[test]
    fn test_recover_stalled_request(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(bob(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.skip_time(60 * 60);
        emulator.update_context(owner(), 0);
        emulator.contract.recover_stalled_request();

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Open);
        assert_eq!(emulator.contract.get_pending_request_id(), None);
        assert_eq!(emulator.contract.get_number_of_players(), 2);
        assert_eq!(emulator.contract.get_prize_pool(), U128(ENTRANCE_FEE * 2));
        assert!(get_logs().iter().any(|l| l.contains("raffle_round_recovered")));

        // the round start was not advanced, upkeep can fire again right away
        assert_eq!(emulator.contract.check_upkeep(None).upkeep_needed, true);
        emulator.run_upkeep();
        assert_eq!(emulator.contract.get_pending_request_id(), Some(2));

        // a late fulfillment for the abandoned request must be rejected
        emulator.update_context(coordinator(), 0);
        let result = catch_unwind(AssertUnwindSafe(|| {
            emulator.contract.fulfill_random_words(1, vec![RandomWord::from(0u64)])
        }));
        assert!(result.is_err());
        assert_eq!(emulator.contract.get_pending_request_id(), Some(2));

        emulator.fulfill(2, vec![3]);
        assert_eq!(emulator.contract.get_recent_winner(), Some(bob()));
    }

    #[test]
    #[should_panic(expected = "Only the owner can call this method")]
    fn test_recover_requires_owner(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.skip_time(60 * 60);
        emulator.update_context(alice(), 0);
        emulator.contract.recover_stalled_request();
    }

    #[test]
    #[should_panic(expected = "Pending randomness request is not stalled yet")]
    fn test_recover_before_timeout(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.skip_time(30 * 60);
        emulator.update_context(owner(), 0);
        emulator.contract.recover_stalled_request();
    }

    #[test]
    #[should_panic(expected = "No randomness request is pending")]
    fn test_recover_without_pending_request(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.update_context(owner(), 0);
        emulator.contract.recover_stalled_request();
    }

    #[test]
    fn test_request_callback_failure_reopens_round(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.enter(bob(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.update_context(raffle(), 0);
        emulator.contract.on_random_words_requested(1, Err(PromiseError::Failed));

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Open);
        assert_eq!(emulator.contract.get_pending_request_id(), None);
        assert_eq!(emulator.contract.get_number_of_players(), 2);
        assert_eq!(emulator.contract.get_prize_pool(), U128(ENTRANCE_FEE * 2));
        assert!(get_logs().iter().any(|l| l.contains("raffle_request_failed")));

        // and the retry goes out under a fresh id
        emulator.skip_time(1);
        emulator.run_upkeep();
        assert_eq!(emulator.contract.get_pending_request_id(), Some(2));
    }

    #[test]
    fn test_request_callback_success_keeps_round_calculating(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.update_context(raffle(), 0);
        emulator.contract.on_random_words_requested(1, Ok(()));

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Calculating);
        assert_eq!(emulator.contract.get_pending_request_id(), Some(1));
    }

    #[test]
    fn test_request_callback_ignores_stale_request_id(){
        let mut emulator = Emulator::new();

        emulator.enter(alice(), ENTRANCE_FEE);
        emulator.skip_time(INTERVAL_SECONDS + 1);
        emulator.run_upkeep();

        emulator.skip_time(60 * 60);
        emulator.update_context(owner(), 0);
        emulator.contract.recover_stalled_request();
        emulator.run_upkeep();
        assert_eq!(emulator.contract.get_pending_request_id(), Some(2));

        // the failure report for the abandoned request arrives late
        emulator.update_context(raffle(), 0);
        emulator.contract.on_random_words_requested(1, Err(PromiseError::Failed));

        assert_eq!(emulator.contract.get_raffle_state(), RaffleState::Calculating);
        assert_eq!(emulator.contract.get_pending_request_id(), Some(2));
    }

    #[test]
    fn test_round_history_is_bounded(){
        let mut emulator = Emulator::new();

        for round in 1..=(ROUND_BUFFER_CAPACITY as u64 + 2) {
            emulator.enter(alice(), ENTRANCE_FEE);
            emulator.skip_time(INTERVAL_SECONDS + 1);
            emulator.run_upkeep();
            emulator.fulfill(round, vec![0]);
        }

        assert_eq!(
            emulator.contract.get_rounds(0, 100).len(),
            ROUND_BUFFER_CAPACITY
        );
        assert_eq!(emulator.contract.get_round(1), None);
        assert_eq!(emulator.contract.get_round(2), None);
        assert!(emulator.contract.get_round(3).is_some());
        assert!(emulator
            .contract
            .get_round(ROUND_BUFFER_CAPACITY as u32 + 2)
            .is_some());
    }
}

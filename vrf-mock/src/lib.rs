use common::types::{RandomWord, RequestId};
use near_sdk::collections::UnorderedMap;
use near_sdk::{env, ext_contract, log, near_bindgen, require, AccountId, Gas, PanicOnDefault, Promise};
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::serde::{Serialize, Deserialize};

pub const ERR_NONEXISTENT_REQUEST: &str = "nonexistent request";
pub const ERR_DUPLICATE_REQUEST: &str = "Request id is already in use by this consumer";
pub const ERR_NO_WORDS_REQUESTED: &str = "At least one random word must be requested";
pub const ERR_WRONG_WORD_COUNT: &str = "Override must contain exactly the requested number of words";

#[ext_contract(ext_consumer)]
pub trait ExtRandomnessConsumer {
    fn fulfill_random_words(&mut self, request_id: RequestId, random_words: Vec<RandomWord>);
}

#[derive(BorshDeserialize, BorshSerialize)]
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct PendingRequest {
    pub request_id: RequestId,
    pub consumer: AccountId,
    pub num_words: u32,
    pub callback_gas_limit: u64,
}

/// Coordinator stand-in for local networks. Requests are recorded when a
/// consumer contract calls in, and an operator later pushes the fulfillment
/// back to the consumer, with derived or hand-picked words.
#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Contract{
    requests: UnorderedMap<(AccountId, RequestId), PendingRequest>,
}

/// Words for a request, derived from the request id and the word index.
/// Stable across calls so a fulfillment can be replayed while debugging.
pub fn derive_words(request_id: RequestId, num_words: u32) -> Vec<RandomWord>{
    return (0..num_words)
        .map(|word_index| {
            let bytes = [&request_id.to_be_bytes()[..], &word_index.to_be_bytes()[..]].concat();
            RandomWord::from_little_endian(&env::keccak256_array(&bytes))
        })
        .collect();
}

#[near_bindgen]
impl Contract{
    #[init]
    pub fn new() -> Self{
        Self {
            requests: UnorderedMap::new(b"r".to_vec()),
        }
    }

    pub fn request_random_words(&mut self, request_id: RequestId, num_words: u32, callback_gas_limit: u64){
        require!(num_words > 0, ERR_NO_WORDS_REQUESTED);

        let consumer = env::predecessor_account_id();
        let key = (consumer.clone(), request_id);
        require!(self.requests.get(&key).is_none(), ERR_DUPLICATE_REQUEST);

        self.requests.insert(
            &key,
            &PendingRequest {
                request_id,
                consumer: consumer.clone(),
                num_words,
                callback_gas_limit,
            },
        );

        log!("Recorded randomness request {} from {}", request_id, consumer);
    }

    pub fn fulfill_random_words(&mut self, request_id: RequestId, consumer: AccountId) -> Promise{
        return self.fulfill(request_id, consumer, Vec::new());
    }

    pub fn fulfill_random_words_with_override(&mut self, request_id: RequestId, consumer: AccountId, words: Vec<RandomWord>) -> Promise{
        return self.fulfill(request_id, consumer, words);
    }

    pub fn get_request(&self, consumer: AccountId, request_id: RequestId) -> Option<PendingRequest>{
        return self.requests.get(&(consumer, request_id));
    }
}

impl Contract{
    fn fulfill(&mut self, request_id: RequestId, consumer: AccountId, words: Vec<RandomWord>) -> Promise{
        let key = (consumer.clone(), request_id);
        let request = self
            .requests
            .get(&key)
            .unwrap_or_else(|| env::panic_str(ERR_NONEXISTENT_REQUEST));

        let words = if words.is_empty(){
            derive_words(request_id, request.num_words)
        }else{
            require!(words.len() as u32 == request.num_words, ERR_WRONG_WORD_COUNT);
            words
        };

        self.requests.remove(&key);

        log!("Fulfilling randomness request {} for {}", request_id, consumer);

        return ext_consumer::fulfill_random_words(
            request_id,
            words,
            consumer,
            0,
            Gas(request.callback_gas_limit),
        );
    }
}

#[cfg(test)]
mod tests {
    use near_sdk::test_utils::VMContextBuilder;
    use near_sdk::testing_env;

    use super::*;

    fn vrf() -> AccountId {
        "vrf".parse().unwrap()
    }
    fn consumer() -> AccountId {
        "consumer".parse().unwrap()
    }
    fn operator() -> AccountId {
        "operator".parse().unwrap()
    }

    fn set_caller(caller: AccountId) {
        testing_env!(VMContextBuilder::new()
            .current_account_id(vrf())
            .predecessor_account_id(caller)
            .build());
    }

    #[test]
    fn test_request_is_recorded() {
        set_caller(consumer());
        let mut contract = Contract::new();

        contract.request_random_words(1, 1, 50_000_000_000_000);

        let request = contract.get_request(consumer(), 1).unwrap();
        assert_eq!(request.request_id, 1);
        assert_eq!(request.consumer, consumer());
        assert_eq!(request.num_words, 1);
        assert_eq!(request.callback_gas_limit, 50_000_000_000_000);

        assert_eq!(contract.get_request(consumer(), 2), None);
        assert_eq!(contract.get_request(operator(), 1), None);
    }

    #[test]
    #[should_panic(expected = "Request id is already in use")]
    fn test_duplicate_request_is_rejected() {
        set_caller(consumer());
        let mut contract = Contract::new();

        contract.request_random_words(1, 1, 50_000_000_000_000);
        contract.request_random_words(1, 1, 50_000_000_000_000);
    }

    #[test]
    #[should_panic(expected = "At least one random word")]
    fn test_zero_words_request_is_rejected() {
        set_caller(consumer());
        let mut contract = Contract::new();

        contract.request_random_words(1, 0, 50_000_000_000_000);
    }

    #[test]
    #[should_panic(expected = "nonexistent request")]
    fn test_fulfill_unknown_request() {
        set_caller(operator());
        let mut contract = Contract::new();

        contract.fulfill_random_words(1, consumer());
    }

    #[test]
    fn test_fulfill_consumes_the_request() {
        set_caller(consumer());
        let mut contract = Contract::new();
        contract.request_random_words(7, 1, 50_000_000_000_000);

        set_caller(operator());
        contract.fulfill_random_words(7, consumer());

        assert_eq!(contract.get_request(consumer(), 7), None);
    }

    #[test]
    fn test_override_consumes_the_request() {
        set_caller(consumer());
        let mut contract = Contract::new();
        contract.request_random_words(7, 2, 50_000_000_000_000);

        set_caller(operator());
        contract.fulfill_random_words_with_override(
            7,
            consumer(),
            vec![RandomWord::from(17u64), RandomWord::from(3u64)],
        );

        assert_eq!(contract.get_request(consumer(), 7), None);
    }

    #[test]
    #[should_panic(expected = "exactly the requested number of words")]
    fn test_override_word_count_is_checked() {
        set_caller(consumer());
        let mut contract = Contract::new();
        contract.request_random_words(7, 2, 50_000_000_000_000);

        set_caller(operator());
        contract.fulfill_random_words_with_override(7, consumer(), vec![RandomWord::from(17u64)]);
    }

    #[test]
    fn test_derived_words_are_deterministic() {
        set_caller(operator());

        let words = derive_words(7, 3);
        assert_eq!(words.len(), 3);
        assert_eq!(words, derive_words(7, 3));
        assert_ne!(words[0], words[1]);
        assert_ne!(derive_words(8, 3)[0], words[0]);
    }
}

use crate::*;

// Callback
#[ext_contract(this_contract)]
pub trait ExtSelf {
    fn on_random_words_requested(&mut self, request_id: RequestId, #[callback_result] call_result: Result<(), PromiseError>);
}

#[ext_contract(ext_vrf_coordinator)]
pub trait ExtVrfCoordinator {
    fn request_random_words(&mut self, request_id: RequestId, num_words: u32, callback_gas_limit: u64);
}

#[near_bindgen]
impl Contract{
    /// Observes the outcome of the randomness request receipt. The round stays
    /// `Calculating` only while the coordinator actually holds the request, so a
    /// failed receipt reopens the round with players and prize pool intact.
    #[private]
    pub fn on_random_words_requested(&mut self, request_id: RequestId, #[callback_result] call_result: Result<(), PromiseError>){
        if call_result.is_err(){
            log!("Randomness request {} was not accepted by the coordinator", request_id);

            if self.state == RaffleState::Calculating && self.pending_request_id == Some(request_id){
                self.reopen_round();
                events::events::raffle_request_failed(request_id);
            }
        }
    }
}

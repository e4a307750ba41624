pub mod events{
    use common::types::RequestId;
    use near_sdk::json_types::U128;
    use near_sdk::{AccountId, Balance, log};
    use near_sdk::serde::{Serialize};
    use near_sdk::serde_json::json;

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct EntryData<'a> {
        pub account_id: &'a AccountId,
        pub amount: U128,
    }

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct RequestData {
        pub request_id: RequestId,
    }

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct WinnerData<'a> {
        pub winner: &'a AccountId,
        pub prize: U128,
    }

    fn log_event<T: Serialize>(event: &str, data: T) {
        let event = json!({
            "standard": "raffle",
            "version": "1.0.0",
            "event": event,
            "data": [data]
        });

        log!("EVENT_JSON:{}", event.to_string());
    }

    pub fn raffle_enter(account_id: &AccountId, amount: Balance){
        log_event(
            "raffle_enter",
            EntryData {
                account_id: &account_id,
                amount: U128(amount),
            }
        );
    }

    pub fn requested_raffle_winner(request_id: RequestId){
        log_event("requested_raffle_winner", RequestData { request_id });
    }

    pub fn winner_picked(winner: &AccountId, prize: Balance){
        log_event(
            "winner_picked",
            WinnerData {
                winner: &winner,
                prize: U128(prize),
            }
        );
    }

    pub fn raffle_request_failed(request_id: RequestId){
        log_event("raffle_request_failed", RequestData { request_id });
    }

    pub fn raffle_round_recovered(request_id: RequestId){
        log_event("raffle_round_recovered", RequestData { request_id });
    }
}

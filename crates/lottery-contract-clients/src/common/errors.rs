use alloy::{
    contract::Error as ContractError,
    hex,
    sol_types::{Panic, Revert, SolError, decode_revert_reason},
};

/// Decode raw revert data into a readable reason.
///
/// `Error(string)` and `Panic(uint256)` are decoded in full; any other
/// selector is reported by its selector since the lottery ABI declares no
/// custom errors.
pub fn decode_revert_data(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    if data.len() >= 4 {
        let selector = &data[..4];
        if selector != Revert::SELECTOR && selector != Panic::SELECTOR {
            return Some(format!("custom error 0x{}", hex::encode(selector)));
        }
    }
    decode_revert_reason(data)
}

/// Revert reason carried by a failed call, if any.
pub fn revert_reason(error: &ContractError) -> Option<String> {
    error
        .as_revert_data()
        .and_then(|data| decode_revert_data(&data))
}

/// Human-readable description of a failed contract call or send.
pub fn describe_error(error: &ContractError) -> String {
    if let Some(reason) = revert_reason(error) {
        return format!("execution reverted ({reason})");
    }
    let message = error.to_string();
    match friendly_rpc_message(&message) {
        Some(friendly) => friendly.to_string(),
        None => message,
    }
}

/// Map common RPC provider failures to an actionable message.
pub fn friendly_rpc_message(message: &str) -> Option<&'static str> {
    if message.contains("insufficient funds") {
        Some("Insufficient ETH for value and gas. Please fund the account.")
    } else if message.contains("replacement transaction underpriced") {
        Some("Transaction underpriced. A pending transaction may be blocking.")
    } else if message.contains("nonce too low") {
        Some("Nonce too low. A transaction may have been confirmed already.")
    } else {
        None
    }
}

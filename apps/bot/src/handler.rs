//! Inbound message handling: voucher extraction, duplicate suppression,
//! redeem, and reporting.

use futures_util::future::join_all;

use sniper_common::{extract_voucher_code, RedeemOutcome};

use crate::gateway::events::MessageCreate;
use crate::{notify, qr, AppState};

pub async fn handle_message(state: AppState, message: MessageCreate) {
    if message.author.as_ref().is_some_and(|a| a.bot) {
        return;
    }

    if handle_command(&state, &message) {
        return;
    }

    if let Some(code) = extract_voucher_code(&message.content) {
        let code = code.to_string();
        process_code(&state, &message, &code, false).await;
    }

    // Image attachments fan out concurrently and are awaited jointly;
    // ordering between them is unspecified.
    let decodes = message
        .attachments
        .iter()
        .filter(|a| a.is_image())
        .map(|a| qr::decode_from_url(&state.http, &a.url));
    for payload in join_all(decodes).await.into_iter().flatten() {
        if let Some(code) = extract_voucher_code(&payload) {
            let code = code.to_string();
            process_code(&state, &message, &code, true).await;
        }
    }
}

fn handle_command(state: &AppState, message: &MessageCreate) -> bool {
    match message.content.as_str() {
        "!ping" => {
            state.notifier.send("🏓 Pong! Bot is online");
            true
        }
        "!stats" => {
            let snapshot = state.stats.snapshot();
            state.notifier.send(notify::stats_message(
                &snapshot,
                state.redeemed.len(),
                state.config.redeem_proxy_url.is_some(),
            ));
            true
        }
        "!help" => {
            state.notifier.send(notify::help_message());
            true
        }
        _ => false,
    }
}

async fn process_code(state: &AppState, message: &MessageCreate, code: &str, from_qr: bool) {
    // Atomic insert-if-absent: a present entry means the code was already
    // submitted, or is in flight right now.
    if state.redeemed.insert(code.to_string(), ()).is_some() {
        return;
    }

    tracing::info!(code, from_qr, "voucher found");
    match state.redeemer.redeem(code).await {
        RedeemOutcome::Success { amount, owner_name } => {
            state.stats.record_success(amount);
            tracing::info!(code, amount, owner = %owner_name, "voucher redeemed");
            state.notifier.send(notify::success_message(
                amount,
                &owner_name,
                &message.channel_id,
                from_qr,
            ));
        }
        RedeemOutcome::Failure {
            code: reason,
            message: detail,
        } => {
            // Failed codes stay retryable; successes never do.
            state.redeemed.remove(code);
            state.stats.record_failure();
            tracing::warn!(code, reason = %reason, detail = %detail, "redeem failed");
            if state.config.send_fail_message {
                state.notifier.send(notify::failure_message(&reason, &detail));
            }
        }
    }

    let snapshot = state.stats.snapshot();
    tracing::info!(
        success = snapshot.success,
        failed = snapshot.failed,
        total_baht = snapshot.total_baht,
        "running totals"
    );
}

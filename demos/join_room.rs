//! Join a room and print what the server sends.
//!
//! Demonstrates:
//! - Building a SignalClient from a base URL and token
//! - Registering transport and server listeners
//! - Answering the server's subscriber offer
//! - Leaving cleanly on Ctrl+C
//!
//! Usage:
//!   ROOM_URL=wss://rooms.example.com ROOM_TOKEN=... cargo run --example join_room
//!   cargo run --example join_room -- --debug
//!   cargo run --example join_room -- --no-wait

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rtc_signal_client::protocol::{
    ConnectionQualityUpdate, JoinResponse, LeaveRequest, MuteTrackRequest, ParticipantUpdate,
    Pong, ReconnectResponse, RequestResponse, RoomUpdate, SessionDescription, SpeakersChanged,
    StreamStateUpdate, SubscribedQualityUpdate, SubscriptionPermissionUpdate,
    SubscriptionResponse, TrackPublishedResponse, TrackSubscribed, TrackUnpublishedResponse,
    TrickleRequest,
};
use rtc_signal_client::{
    ConnectionState, SignalClient, SignalClientId, SignalOptions, SignalServerListener,
    SignalTransportListener,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Arguments
// ============================================================================

struct Args {
    debug: bool,
    no_wait: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "rtc_signal_client=debug"
    } else {
        "rtc_signal_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Listeners
// ============================================================================

/// Prints state changes.
struct StatePrinter;

impl SignalTransportListener for StatePrinter {
    fn on_transport_state_changed(&self, client_id: SignalClientId, state: ConnectionState) {
        println!("[client {client_id}] state: {state}");
    }

    fn on_transport_error(&self, client_id: SignalClientId, message: &str) {
        println!("[client {client_id}] transport error: {message}");
    }
}

/// Prints server messages and keeps the offers for answering.
#[derive(Default)]
struct RoomPrinter {
    offers: Mutex<Vec<SessionDescription>>,
}

impl SignalServerListener for RoomPrinter {
    fn on_join(&self, _client_id: SignalClientId, join: &JoinResponse) {
        let room = join.room.as_ref().map(|r| r.name.as_str()).unwrap_or("?");
        let me = join
            .participant
            .as_ref()
            .map(|p| p.identity.as_str())
            .unwrap_or("?");
        println!(
            "    ✓ Joined '{room}' as '{me}' ({} others, server {})",
            join.other_participants.len(),
            join.server_version
        );
    }

    fn on_offer(&self, _client_id: SignalClientId, offer: &SessionDescription) {
        println!("    offer ({} bytes of SDP)", offer.sdp.len());
        self.offers.lock().push(offer.clone());
    }

    fn on_answer(&self, _client_id: SignalClientId, _answer: &SessionDescription) {
        println!("    answer");
    }

    fn on_trickle(&self, _client_id: SignalClientId, trickle: &TrickleRequest) {
        println!("    trickle for {:?}", trickle.target());
    }

    fn on_participant_update(&self, _client_id: SignalClientId, update: &ParticipantUpdate) {
        for participant in &update.participants {
            println!("    participant {} is {:?}", participant.identity, participant.state());
        }
    }

    fn on_track_published(&self, _client_id: SignalClientId, published: &TrackPublishedResponse) {
        println!("    track published: {}", published.cid);
    }

    fn on_track_unpublished(
        &self,
        _client_id: SignalClientId,
        unpublished: &TrackUnpublishedResponse,
    ) {
        println!("    track unpublished: {}", unpublished.track_sid);
    }

    fn on_leave(&self, _client_id: SignalClientId, leave: &LeaveRequest) {
        println!("    server asked us to leave: {:?}", leave.reason());
    }

    fn on_mute(&self, _client_id: SignalClientId, mute: &MuteTrackRequest) {
        println!("    mute {} = {}", mute.sid, mute.muted);
    }

    fn on_speakers_changed(&self, _client_id: SignalClientId, speakers: &SpeakersChanged) {
        println!("    {} active speaker(s)", speakers.speakers.len());
    }

    fn on_room_update(&self, _client_id: SignalClientId, update: &RoomUpdate) {
        if let Some(room) = &update.room {
            println!("    room now has {} participant(s)", room.num_participants);
        }
    }

    fn on_connection_quality(&self, _client_id: SignalClientId, _update: &ConnectionQualityUpdate) {
    }

    fn on_stream_state_update(&self, _client_id: SignalClientId, _update: &StreamStateUpdate) {}

    fn on_subscribed_quality_update(
        &self,
        _client_id: SignalClientId,
        _update: &SubscribedQualityUpdate,
    ) {
    }

    fn on_subscription_permission_update(
        &self,
        _client_id: SignalClientId,
        _update: &SubscriptionPermissionUpdate,
    ) {
    }

    fn on_refresh_token(&self, _client_id: SignalClientId, _token: &str) {
        println!("    token refreshed");
    }

    fn on_reconnect(&self, _client_id: SignalClientId, _reconnect: &ReconnectResponse) {
        println!("    session resumed");
    }

    fn on_pong(&self, _client_id: SignalClientId, _pong: &Pong) {}

    fn on_subscription_response(&self, _client_id: SignalClientId, response: &SubscriptionResponse) {
        println!("    subscription to {} failed: {:?}", response.track_sid, response.err());
    }

    fn on_request_response(&self, _client_id: SignalClientId, response: &RequestResponse) {
        if response.is_error() {
            println!("    request {} rejected: {}", response.request_id, response.message);
        }
    }

    fn on_track_subscribed(&self, _client_id: SignalClientId, subscribed: &TrackSubscribed) {
        println!("    first subscriber on {}", subscribed.track_sid);
    }

    fn on_signal_parse_error(&self, client_id: SignalClientId) {
        println!("[client {client_id}] dropped a malformed frame");
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Join Room ===\n");

    let url = std::env::var("ROOM_URL").unwrap_or_else(|_| "ws://localhost:7880".to_string());
    let token = std::env::var("ROOM_TOKEN").context("ROOM_TOKEN must hold an access token")?;

    // ========================================================================
    // Build Client
    // ========================================================================

    println!("[1] Building client for {url}...");

    let client = SignalClient::builder()
        .url(&url)
        .token(token)
        .options(SignalOptions::new().with_adaptive_stream())
        .build()
        .context("building signal client")?;

    let room = Arc::new(RoomPrinter::default());
    client.add_transport_listener(Arc::new(StatePrinter));
    client.add_server_listener(room.clone());

    println!("    ✓ Client {} ready\n", client.id());

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[2] Connecting...");
    anyhow::ensure!(client.connect(), "connect was rejected");

    // ========================================================================
    // Run
    // ========================================================================

    println!("[3] Listening (Ctrl+C to leave)...\n");

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let deadline = tokio::time::sleep(Duration::from_secs(if args.no_wait { 5 } else { 3_600 }));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut deadline => break,
            _ = ticker.tick() => {
                // No media engine here, so echo the offer SDP back as the answer
                let offers: Vec<_> = room.offers.lock().drain(..).collect();
                for offer in offers {
                    client.send_answer(SessionDescription::answer(offer.sdp));
                }

                if client.transport_state() == ConnectionState::Disconnected {
                    println!("    connection ended");
                    break;
                }
            }
        }
    }

    // ========================================================================
    // Leave
    // ========================================================================

    println!("\n[4] Leaving (rtt was {} ms)...", client.rtt());
    client.disconnect();
    println!("    ✓ Done");

    Ok(())
}

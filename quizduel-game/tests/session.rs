//! Sessions running over an in-memory link with a fast tick.

use quizduel_core::{BidLimits, MatchConfig, MemoryTransport, Outcome, Participant, QuestionBank, Role, Transport};
use quizduel_game::{
    session, ClientController, GamePhase, HostController, Message, SessionHandle, UserAction,
    ViewEvent,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::time::timeout;

const TICK: Duration = Duration::from_millis(5);

fn host(rounds: u32) -> HostController {
    HostController::with_rng(
        Participant::new(Role::Host, "Ana", "seed1"),
        MatchConfig::new(rounds, "all"),
        &QuestionBank::bundled().unwrap(),
        StdRng::seed_from_u64(21),
    )
    .unwrap()
}

fn client() -> ClientController {
    ClientController::with_participant(
        Participant::new(Role::Client, "Sam", "seed2"),
        BidLimits::default(),
    )
}

async fn wait_for(handle: &mut SessionHandle, pred: impl Fn(&ViewEvent) -> bool) -> ViewEvent {
    timeout(Duration::from_secs(5), async {
        loop {
            match handle.next_view().await {
                Some(view) if pred(&view) => return view,
                Some(_) => continue,
                None => panic!("session ended early"),
            }
        }
    })
    .await
    .expect("timed out waiting for view")
}

#[tokio::test]
async fn test_match_over_memory_link() {
    let (host_link, client_link) = MemoryTransport::pair();
    let mut host = session::spawn(host(1), host_link, TICK);
    let mut client = session::spawn(client(), client_link, TICK);

    wait_for(&mut host, |v| matches!(v, ViewEvent::OpponentJoined(p) if p.display_name == "Sam")).await;
    host.act(UserAction::StartGame).unwrap();

    wait_for(&mut client, |v| matches!(v, ViewEvent::BiddingOpened { round: 1, .. })).await;
    client.act(UserAction::AdjustBid(2)).unwrap();
    client.act(UserAction::LockBid).unwrap();

    wait_for(&mut host, |v| *v == ViewEvent::OpponentBidLocked(2)).await;
    host.act(UserAction::AdjustBid(10)).unwrap();
    host.act(UserAction::LockBid).unwrap();

    let started = wait_for(&mut client, |v| matches!(v, ViewEvent::ExecutionStarted { .. })).await;
    assert!(matches!(
        started,
        ViewEvent::ExecutionStarted {
            active_player: Role::Client,
            my_turn: true,
            time: 2,
            ..
        }
    ));

    // the client never answers; the host's countdown runs out
    wait_for(&mut client, |v| *v == ViewEvent::TimerUpdated(0)).await;
    let finished = wait_for(&mut client, |v| matches!(v, ViewEvent::RoundFinished(_))).await;
    match finished {
        ViewEvent::RoundFinished(summary) => {
            assert!(!summary.correct);
            assert_eq!(summary.points, 25);
            assert_eq!(summary.scores.host_score, 25);
        }
        other => panic!("unexpected {:?}", other),
    }

    host.act(UserAction::NextRound).unwrap();
    wait_for(&mut client, |v| {
        matches!(v, ViewEvent::MatchFinished { outcome: Outcome::Host, .. })
    })
    .await;

    let host_state = host.finish().await.unwrap();
    assert_eq!(host_state.phase(), GamePhase::GameOver);
    assert_eq!(host_state.scores().host_score, 25);

    wait_for(&mut client, |v| *v == ViewEvent::Disconnected).await;
    let client_state = client.finish().await.unwrap();
    assert_eq!(client_state.outcome(), Some(Outcome::Host));
    assert!(client_state.is_disconnected());
}

#[tokio::test]
async fn test_peer_leaving_mid_round() {
    let (host_link, client_link) = MemoryTransport::pair();
    let mut host = session::spawn(host(3), host_link, Duration::from_millis(50));
    let mut client = session::spawn(client(), client_link, Duration::from_millis(50));

    wait_for(&mut host, |v| matches!(v, ViewEvent::OpponentJoined(_))).await;
    host.act(UserAction::StartGame).unwrap();
    wait_for(&mut client, |v| matches!(v, ViewEvent::BiddingOpened { .. })).await;
    client.act(UserAction::AdjustBid(30)).unwrap();
    client.act(UserAction::LockBid).unwrap();
    wait_for(&mut host, |v| matches!(v, ViewEvent::OpponentBidLocked(_))).await;
    host.act(UserAction::LockBid).unwrap();
    wait_for(&mut client, |v| matches!(v, ViewEvent::ExecutionStarted { .. })).await;

    client.finish().await.unwrap();

    let (_actions, mut views, task) = host.into_parts();
    let mut disconnects = 0;
    let mut ticks_after = 0;
    let drained = timeout(Duration::from_secs(5), async {
        while let Some(view) = views.recv().await {
            match view {
                ViewEvent::Disconnected => disconnects += 1,
                ViewEvent::TimerUpdated(_) if disconnects > 0 => ticks_after += 1,
                _ => {}
            }
        }
    })
    .await;
    assert!(drained.is_ok(), "host session kept running");

    assert_eq!(disconnects, 1);
    assert_eq!(ticks_after, 0);

    let state = task.await.unwrap();
    assert!(state.is_disconnected());
    assert_eq!(state.phase(), GamePhase::Execution);
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    let (host_link, mut raw) = MemoryTransport::pair();
    let mut host = session::spawn(host(2), host_link, TICK);

    let hello = Message::decode(&raw.recv().await.unwrap().unwrap()).unwrap();
    assert!(matches!(hello, Message::Hello(h) if h.name == "Ana"));

    raw.send("not json at all".to_string()).await.unwrap();
    raw.send(r#"{"type":"PING","payload":{}}"#.to_string()).await.unwrap();
    raw.send(r#"{"type":"HELLO","payload":{"name":"Raw","avatar":"seed5"}}"#.to_string())
        .await
        .unwrap();

    wait_for(&mut host, |v| matches!(v, ViewEvent::OpponentJoined(p) if p.display_name == "Raw")).await;
    let ack = Message::decode(&raw.recv().await.unwrap().unwrap()).unwrap();
    assert!(matches!(ack, Message::AckJoin(a) if a.host_name == "Ana"));

    // refused actions surface as views instead of ending the session
    host.act(UserAction::NextRound).unwrap();
    wait_for(&mut host, |v| matches!(v, ViewEvent::ActionRejected(_))).await;

    raw.close().await.unwrap();
    wait_for(&mut host, |v| *v == ViewEvent::Disconnected).await;
    let state = host.finish().await.unwrap();
    assert_eq!(state.phase(), GamePhase::Lobby);
}

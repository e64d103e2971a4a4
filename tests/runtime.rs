//! Session runtime integration tests

use std::time::Duration;

use tokio::sync::mpsc;
use voice_concierge::config::Config;
use voice_concierge::session::{GREETING, REPROMPT, SessionState};
use voice_concierge::voice::RecognitionError;
use voice_concierge::{Assistant, Error, route_text};

mod common;
use common::{FakeRecognizer, FakeSynthesizer, RecordingSurface, SurfaceCall, wait_for};

fn spoken_texts(synth: &FakeSynthesizer) -> Vec<String> {
    synth.spoken().into_iter().map(|(_, text)| text).collect()
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.session.echo_delay = Duration::from_millis(5);
    config.session.reveal_interval = Duration::from_millis(1);
    config
}

#[tokio::test]
async fn test_runtime_completes_a_turn() {
    let surface = RecordingSurface::default();
    let synth = FakeSynthesizer::auto();
    let recognizer = FakeRecognizer::scripted([Ok("¿Cuál es el precio?")]);

    let assistant = Assistant::with_backends(
        &fast_config(),
        Box::new(surface.clone()),
        Some(Box::new(synth.clone())),
        Some(Box::new(recognizer.clone())),
    );
    let handle = assistant.handle();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(async move { assistant.run(&mut shutdown_rx).await });

    handle.activate().unwrap();

    let pricing = route_text("precio").response;
    assert!(wait_for(|| surface.rendered(pricing)).await);
    assert!(surface.rendered("“¿Cuál es el precio?”"));

    let spoken = spoken_texts(&synth);
    assert_eq!(spoken[0], GREETING);
    assert_eq!(spoken[1], pricing);
    assert!(!surface.overlap_seen());

    shutdown_tx.send(()).await.unwrap();
    let session = task.await.unwrap();
    assert_eq!(session.state(), &SessionState::Closed);
    assert!(surface.calls().contains(&SurfaceCall::Hide));
}

#[tokio::test]
async fn test_runtime_waits_after_repeated_silence() {
    let surface = RecordingSurface::default();
    let synth = FakeSynthesizer::auto();
    let recognizer = FakeRecognizer::scripted([
        Err(RecognitionError::NoSpeech),
        Err(RecognitionError::NoSpeech),
    ]);

    let assistant = Assistant::with_backends(
        &fast_config(),
        Box::new(surface.clone()),
        Some(Box::new(synth.clone())),
        Some(Box::new(recognizer.clone())),
    );
    let handle = assistant.handle();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(async move { assistant.run(&mut shutdown_rx).await });

    handle.activate().unwrap();
    assert!(wait_for(|| recognizer.started().len() == 2).await);

    // Nothing more should happen once the session is waiting
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recognizer.started().len(), 2);
    assert_eq!(synth.spoken().len(), 2);

    drop(shutdown_tx);
    let session = task.await.unwrap();
    assert_eq!(session.state(), &SessionState::Closed);
}

#[tokio::test]
async fn test_close_control_hides_surface() {
    let surface = RecordingSurface::default();
    let assistant = Assistant::with_backends(
        &fast_config(),
        Box::new(surface.clone()),
        Some(Box::new(FakeSynthesizer::default())),
        Some(Box::new(FakeRecognizer::default())),
    );
    let handle = assistant.handle();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(async move { assistant.run(&mut shutdown_rx).await });

    handle.activate().unwrap();
    assert!(wait_for(|| surface.calls().contains(&SurfaceCall::Open)).await);

    handle.close().unwrap();
    assert!(wait_for(|| surface.calls().contains(&SurfaceCall::Hide)).await);

    shutdown_tx.send(()).await.unwrap();
    let session = task.await.unwrap();
    assert!(!session.is_active());
    assert!(!session.speaking_indicator());
    assert!(!session.listening_indicator());
}

#[tokio::test]
async fn test_handle_reports_stopped_runtime() {
    let assistant = Assistant::with_backends(
        &fast_config(),
        Box::new(RecordingSurface::default()),
        None,
        None,
    );
    let handle = assistant.handle();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    shutdown_tx.send(()).await.unwrap();
    drop(assistant.run(&mut shutdown_rx).await);

    assert!(matches!(handle.activate(), Err(Error::SessionGone)));
}

#[tokio::test]
async fn test_waiting_session_reactivates_through_handle() {
    let surface = RecordingSurface::default();
    let synth = FakeSynthesizer::auto();
    let recognizer = FakeRecognizer::scripted([
        Err(RecognitionError::NoSpeech),
        Err(RecognitionError::NoSpeech),
        Ok("precio"),
    ]);

    let assistant = Assistant::with_backends(
        &fast_config(),
        Box::new(surface.clone()),
        Some(Box::new(synth.clone())),
        Some(Box::new(recognizer.clone())),
    );
    let handle = assistant.handle();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(async move { assistant.run(&mut shutdown_rx).await });

    handle.activate().unwrap();
    assert!(wait_for(|| recognizer.started().len() == 2).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(synth.spoken().len(), 2);

    // Manual activation from the waiting state starts a fresh turn
    handle.activate().unwrap();
    let pricing = route_text("precio").response;
    assert!(wait_for(|| surface.rendered(pricing)).await);
    assert_eq!(
        spoken_texts(&synth),
        vec![GREETING, REPROMPT, GREETING, pricing]
    );

    shutdown_tx.send(()).await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_reactivation_during_echo_delay_drops_pending_answer() {
    let surface = RecordingSurface::default();
    let synth = FakeSynthesizer::auto();
    let recognizer = FakeRecognizer::scripted([Ok("precio")]);

    let mut config = fast_config();
    config.session.echo_delay = Duration::from_millis(100);
    let assistant = Assistant::with_backends(
        &config,
        Box::new(surface.clone()),
        Some(Box::new(synth.clone())),
        Some(Box::new(recognizer.clone())),
    );
    let handle = assistant.handle();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(async move { assistant.run(&mut shutdown_rx).await });

    handle.activate().unwrap();
    assert!(wait_for(|| surface.rendered("“precio”")).await);

    handle.activate().unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(spoken_texts(&synth), vec![GREETING, GREETING]);
    assert!(!surface.rendered(route_text("precio").response));

    shutdown_tx.send(()).await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reveal_starts_at_its_own_pace() {
    let surface = RecordingSurface::default();
    let mut config = fast_config();
    config.session.reveal_interval = Duration::from_millis(30);

    let assistant = Assistant::with_backends(
        &config,
        Box::new(surface.clone()),
        Some(Box::new(FakeSynthesizer::default())),
        Some(Box::new(FakeRecognizer::default())),
    );
    let handle = assistant.handle();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(async move { assistant.run(&mut shutdown_rx).await });

    // Let the idle runtime miss a few reveal periods
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.activate().unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(surface.rendered("¡"));
    assert!(!surface.rendered("¡H"));

    tokio::time::sleep(Duration::from_millis(31)).await;
    assert!(surface.rendered("¡H"));
    assert!(!surface.rendered("¡Ho"));

    shutdown_tx.send(()).await.unwrap();
    task.await.unwrap();
}

//! Behavioural tests covering transport startup and graceful shutdown.

use std::cell::RefCell;
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rpc_agent_config::TransportKind;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

use crate::process::LaunchError;
use crate::process::launch::{LaunchPlan, ServiceDeps, run_agent_with};
use crate::transport::{StreamClient, datagram_exchange};

use super::support::{
    HealthEvent, ManualShutdown, RecordingHealthReporter, TestConfigLoader, TestExtensions,
};

const WAIT_TIMEOUT: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

type StepResult = Result<(), String>;

struct LifecycleWorld {
    loader: TestConfigLoader,
    extensions: TestExtensions,
    reporter: Arc<RecordingHealthReporter>,
    shutdown: ManualShutdown,
    run: Option<JoinHandle<Result<(), LaunchError>>>,
    outcome: Option<Result<(), LaunchError>>,
    occupied: Option<TcpListener>,
    occupied_datagram: Option<UdpSocket>,
    blocked_client: Option<TcpStream>,
}

impl LifecycleWorld {
    fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            extensions: TestExtensions::default(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            shutdown: ManualShutdown::default(),
            run: None,
            outcome: None,
            occupied: None,
            occupied_datagram: None,
            blocked_client: None,
        }
    }

    fn start(&mut self) -> StepResult {
        let plan = LaunchPlan {
            services: ServiceDeps {
                loader: self.loader.clone(),
                reporter: self.reporter.clone(),
                extensions: self.extensions.clone(),
            },
            shutdown: self.shutdown.clone(),
        };
        self.run = Some(thread::spawn(move || run_agent_with(plan)));
        wait_until(|| self.transports_settled())
    }

    fn transports_settled(&self) -> bool {
        let settled = |kind| {
            self.reporter.events().iter().any(|event| match event {
                HealthEvent::TransportStarted { kind: started, .. } => *started == kind,
                HealthEvent::TransportFailed(failed) => *failed == kind,
                _ => false,
            })
        };
        settled(TransportKind::Stream) && settled(TransportKind::Datagram)
    }

    fn addr(&self, kind: TransportKind) -> Result<SocketAddr, String> {
        self.reporter
            .started_addr(kind)
            .ok_or_else(|| format!("{kind} transport did not start"))
    }

    fn stop(&mut self) -> StepResult {
        self.shutdown.trigger();
        let run = self.run.take().ok_or("agent was not started")?;
        let outcome = run.join().map_err(|_| "agent thread panicked".to_owned())?;
        self.outcome = Some(outcome);
        Ok(())
    }
}

impl Drop for LifecycleWorld {
    fn drop(&mut self) {
        if self.run.is_some() {
            let _ = self.stop();
        }
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> StepResult {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return Ok(());
        }
        thread::sleep(POLL_INTERVAL);
    }
    Err("timed out waiting for condition".into())
}

#[fixture]
fn world() -> RefCell<LifecycleWorld> {
    RefCell::new(LifecycleWorld::new())
}

#[given("an agent configured with ephemeral ports")]
fn given_agent(world: &RefCell<LifecycleWorld>) {
    let _ = world;
}

#[given("the stream port is already taken")]
fn given_stream_port_taken(world: &RefCell<LifecycleWorld>) {
    let occupied = TcpListener::bind("127.0.0.1:0").expect("occupy a port");
    let port = occupied.local_addr().expect("occupied address").port();
    let mut world = world.borrow_mut();
    world.loader = world.loader.clone().with_stream_port(port);
    world.occupied = Some(occupied);
}

#[given("the datagram port is already taken")]
fn given_datagram_port_taken(world: &RefCell<LifecycleWorld>) {
    let occupied = UdpSocket::bind("127.0.0.1:0").expect("occupy a port");
    let port = occupied.local_addr().expect("occupied address").port();
    let mut world = world.borrow_mut();
    world.loader = world.loader.clone().with_datagram_port(port);
    world.occupied_datagram = Some(occupied);
}

#[given("a method that outlives the shutdown grace period")]
fn given_blocking_method(world: &RefCell<LifecycleWorld>) {
    let mut world = world.borrow_mut();
    world.extensions = world
        .extensions
        .clone()
        .with_blocking(Duration::from_secs(2));
    world.loader = world
        .loader
        .clone()
        .with_call_timeout_ms(10_000)
        .with_shutdown_grace_ms(100);
}

#[when("the agent starts")]
fn when_agent_starts(world: &RefCell<LifecycleWorld>) -> StepResult {
    world.borrow_mut().start()
}

#[when("a client calls the blocking method")]
fn when_client_blocks(world: &RefCell<LifecycleWorld>) -> StepResult {
    let addr = world.borrow().addr(TransportKind::Stream)?;
    let mut stream = TcpStream::connect(addr).map_err(|error| error.to_string())?;
    stream
        .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"test.block\",\"id\":1}\n")
        .map_err(|error| error.to_string())?;
    world.borrow_mut().blocked_client = Some(stream);
    let extensions = world.borrow().extensions.clone();
    wait_until(|| extensions.block_entered())
}

#[when("shutdown is requested")]
fn when_shutdown(world: &RefCell<LifecycleWorld>) -> StepResult {
    world.borrow_mut().stop()
}

#[then("the stream transport answers")]
fn then_stream_answers(world: &RefCell<LifecycleWorld>) -> StepResult {
    let addr = world.borrow().addr(TransportKind::Stream)?;
    let mut client = StreamClient::connect(addr);
    client.send_line(r#"{"jsonrpc":"2.0","method":"echo.echo","params":{"message":"tcp"},"id":1}"#);
    let response = client.read_response();
    assert_eq!(response["result"]["message"], json!("tcp"));
    Ok(())
}

#[then("the datagram transport answers")]
fn then_datagram_answers(world: &RefCell<LifecycleWorld>) -> StepResult {
    let addr = world.borrow().addr(TransportKind::Datagram)?;
    let reply = datagram_exchange(addr, br#"{"jsonrpc":"2.0","method":"date.now","id":2}"#);
    assert_eq!(reply["id"], json!(2));
    Ok(())
}

#[then("the stream transport failed to start")]
fn then_stream_failed(world: &RefCell<LifecycleWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        events.contains(&HealthEvent::TransportFailed(TransportKind::Stream)),
        "missing stream failure event: {events:?}"
    );
}

#[then("the datagram transport failed to start")]
fn then_datagram_failed(world: &RefCell<LifecycleWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        events.contains(&HealthEvent::TransportFailed(TransportKind::Datagram)),
        "missing datagram failure event: {events:?}"
    );
}

#[then("the agent exits cleanly")]
fn then_clean_exit(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    let outcome = world.outcome.as_ref().expect("agent still running");
    assert!(outcome.is_ok(), "unexpected launch error: {outcome:?}");
}

#[then("the agent reports an expired grace period")]
fn then_grace_expired(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    let outcome = world.outcome.as_ref().expect("agent still running");
    assert!(
        matches!(outcome, Err(LaunchError::GraceExpired { in_flight: 1 })),
        "expected grace expiry, got {outcome:?}"
    );
}

#[scenario(path = "tests/features/agent_lifecycle.feature")]
fn agent_lifecycle(world: RefCell<LifecycleWorld>) {
    let _ = world;
}

//! Behavioural tests for the datagram transport.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::time::Duration;

use rpc_agent_config::TransportEndpoint;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use crate::transport::{DatagramListener, ListenerHandle, datagram_exchange, test_dispatcher};

#[derive(Default)]
struct DatagramWorld {
    addr: Option<SocketAddr>,
    handle: Option<ListenerHandle>,
    reply: Option<Value>,
}

impl Drop for DatagramWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

#[fixture]
fn world() -> RefCell<DatagramWorld> {
    RefCell::new(DatagramWorld::default())
}

#[given("a running datagram listener")]
fn given_listener(world: &RefCell<DatagramWorld>) {
    let listener = DatagramListener::bind(&TransportEndpoint::datagram("127.0.0.1", 0))
        .expect("bind datagram");
    let addr = listener.local_addr();
    let handle = listener
        .start(test_dispatcher(Duration::from_millis(100)))
        .expect("start datagram");
    let mut world = world.borrow_mut();
    world.addr = addr;
    world.handle = Some(handle);
}

#[when("a datagram carries {payload}")]
fn when_datagram_sent(world: &RefCell<DatagramWorld>, payload: String) {
    let addr = world.borrow().addr.expect("listener not started");
    let reply = datagram_exchange(addr, payload.as_bytes());
    world.borrow_mut().reply = Some(reply);
}

#[then("the reply has id {id}")]
fn then_reply_id(world: &RefCell<DatagramWorld>, id: u64) {
    let world = world.borrow();
    let reply = world.reply.as_ref().expect("no reply");
    assert_eq!(reply["id"], json!(id));
    assert!(reply.get("result").is_some(), "expected a result: {reply}");
}

#[then("the reply has error code {code} and a null id")]
fn then_reply_error(world: &RefCell<DatagramWorld>, code: i64) {
    let world = world.borrow();
    let reply = world.reply.as_ref().expect("no reply");
    assert_eq!(reply["error"]["code"], json!(code));
    assert_eq!(reply["id"], Value::Null);
}

#[then("the reply reports error code {code}")]
fn then_reply_code(world: &RefCell<DatagramWorld>, code: i64) {
    let world = world.borrow();
    let reply = world.reply.as_ref().expect("no reply");
    assert_eq!(reply["error"]["code"], json!(code));
}

#[scenario(path = "tests/features/datagram_transport.feature")]
fn datagram_transport(world: RefCell<DatagramWorld>) {
    let _ = world;
}

//! The transactional delivery protocol: the whole dedup-handle-ack
//! step runs inside the injected transaction scope, and interceptors
//! observe the handle path.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use consumed_rust::{
    Channel, Destination, Envelope, InMemoryBroker, MessageConsumer, MessageInterceptor,
    MessageProducer, TransactionScope,
};
use support::{eventually_default, Delivered};

#[derive(Default)]
struct CountingScope {
    commits: AtomicUsize,
}

impl TransactionScope for CountingScope {
    fn run_in_transaction(&self, work: &mut dyn FnMut()) {
        work();
        self.commits.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct HandleHooks {
    pre: AtomicUsize,
    post: AtomicUsize,
}

impl MessageInterceptor for HandleHooks {
    fn pre_handle(&self, _subscriber_id: &str, _envelope: &Envelope) {
        self.pre.fetch_add(1, Ordering::SeqCst);
    }

    fn post_handle(&self, _subscriber_id: &str, _envelope: &Envelope) {
        self.post.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn each_delivery_runs_in_one_transaction_scope() {
    let broker = Arc::new(InMemoryBroker::new());
    let scope = Arc::new(CountingScope::default());
    let consumer = MessageConsumer::new(Arc::clone(&broker))
        .with_transaction_scope(Arc::clone(&scope) as Arc<dyn TransactionScope>);
    let producer = MessageProducer::new(Arc::clone(&broker));

    let orders = Channel::point_to_point("orders");
    let delivered = Delivered::new();
    consumer
        .subscribe("billing", std::slice::from_ref(&orders), delivered.handler())
        .unwrap();

    let dest = Destination::for_producer(&orders);
    for i in 0..3 {
        producer
            .send(
                &dest,
                None,
                Envelope::with_string_payload(format!("m{}", i), "{}"),
            )
            .unwrap();
    }

    eventually_default("three deliveries", || delivered.len() == 3);
    eventually_default("one commit per delivery", || {
        scope.commits.load(Ordering::SeqCst) == 3
    });

    consumer.shutdown();
}

#[test]
fn interceptors_bracket_every_handled_message() {
    let broker = Arc::new(InMemoryBroker::new());
    let hooks = Arc::new(HandleHooks::default());
    let consumer = MessageConsumer::new(Arc::clone(&broker))
        .with_interceptor(Arc::clone(&hooks) as Arc<dyn MessageInterceptor>);
    let producer = MessageProducer::new(Arc::clone(&broker));

    let orders = Channel::point_to_point("orders");
    let delivered = Delivered::new();
    consumer
        .subscribe("billing", std::slice::from_ref(&orders), delivered.handler())
        .unwrap();

    let dest = Destination::for_producer(&orders);
    producer
        .send(&dest, None, Envelope::with_string_payload("m1", "{}"))
        .unwrap();
    producer
        .send(&dest, None, Envelope::with_string_payload("m2", "{}"))
        .unwrap();

    eventually_default("two deliveries", || delivered.len() == 2);
    eventually_default("hooks saw both", || {
        hooks.pre.load(Ordering::SeqCst) == 2 && hooks.post.load(Ordering::SeqCst) == 2
    });

    consumer.shutdown();
}

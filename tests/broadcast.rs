//! Broadcast channels: every subscriber group gets its own full copy
//! of the stream, independent of the others.

mod support;

use std::sync::Arc;

use consumed_rust::{
    Channel, Destination, Envelope, InMemoryBroker, MessageConsumer, MessageProducer,
};
use support::{eventually_default, Delivered};

#[test]
fn one_envelope_reaches_each_subscriber_identity_once() {
    let broker = Arc::new(InMemoryBroker::new());
    let consumer = MessageConsumer::new(Arc::clone(&broker));
    let producer = MessageProducer::new(Arc::clone(&broker));

    let prices = Channel::broadcast("prices");
    let subscribers = ["audit", "cache", "alerts"];
    let collectors: Vec<Delivered> = subscribers.iter().map(|_| Delivered::new()).collect();

    for (id, collector) in subscribers.iter().zip(&collectors) {
        consumer
            .subscribe(id, std::slice::from_ref(&prices), collector.handler())
            .unwrap();
    }

    producer
        .send(
            &Destination::for_producer(&prices),
            None,
            Envelope::with_string_payload("tick-1", "101.5"),
        )
        .unwrap();

    eventually_default("one delivery per subscriber identity", || {
        collectors.iter().all(|c| c.len() == 1)
    });
    for collector in &collectors {
        assert_eq!(collector.ids(), vec!["tick-1".to_string()]);
    }
    eventually_default("three independent acks", || broker.ack_count() == 3);

    consumer.shutdown();
}

#[test]
fn same_identity_resumes_its_copy_after_resubscribe() {
    let broker = Arc::new(InMemoryBroker::new());
    let consumer = MessageConsumer::new(Arc::clone(&broker));
    let producer = MessageProducer::new(Arc::clone(&broker));

    let prices = Channel::broadcast("prices");
    let first = Delivered::new();
    let subscription = consumer
        .subscribe("audit", std::slice::from_ref(&prices), first.handler())
        .unwrap();

    producer
        .send(
            &Destination::for_producer(&prices),
            None,
            Envelope::with_string_payload("tick-1", "1"),
        )
        .unwrap();
    eventually_default("first tick delivered", || first.len() == 1);
    subscription.close();

    // Messages sent while the group is down stay buffered on the
    // group's durable destination.
    producer
        .send(
            &Destination::for_producer(&prices),
            None,
            Envelope::with_string_payload("tick-2", "2"),
        )
        .unwrap();

    let second = Delivered::new();
    consumer
        .subscribe("audit", std::slice::from_ref(&prices), second.handler())
        .unwrap();
    eventually_default("buffered tick delivered after resubscribe", || {
        second.len() == 1
    });
    assert_eq!(second.ids(), vec!["tick-2".to_string()]);

    consumer.shutdown();
}

#[test]
fn broadcast_and_point_to_point_with_same_name_do_not_cross() {
    let broker = Arc::new(InMemoryBroker::new());
    let consumer = MessageConsumer::new(Arc::clone(&broker));
    let producer = MessageProducer::new(Arc::clone(&broker));

    let topic = Channel::broadcast("events");
    let queue = Channel::point_to_point("events");
    let topic_deliveries = Delivered::new();
    let queue_deliveries = Delivered::new();
    consumer
        .subscribe("sub", std::slice::from_ref(&topic), topic_deliveries.handler())
        .unwrap();
    consumer
        .subscribe("sub", std::slice::from_ref(&queue), queue_deliveries.handler())
        .unwrap();

    producer
        .send(
            &Destination::for_producer(&queue),
            None,
            Envelope::with_string_payload("q-1", "{}"),
        )
        .unwrap();

    eventually_default("queue message delivered", || queue_deliveries.len() == 1);
    assert!(topic_deliveries.is_empty());

    consumer.shutdown();
}
